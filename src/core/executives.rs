use crate::core::amounts::{date_digits, normalize_name, parse_amount};
use crate::core::career::split_career;
use crate::domain::disclosure::{ExecutiveItem, HoldingItem, PayItem};
use crate::domain::model::{
    BoardRole, CorporationFiling, ExecutiveRecord, SalarySource, SalaryType,
};

const UNREGISTERED: &str = "미등기";
const OUTSIDE_DIRECTOR: &str = "사외이사";
const NON_EXECUTIVE: &str = "비상무";
const AUDIT_COMMITTEE: &str = "감사위원";
const AUDITOR: &str = "감사";

/// 將一家公司的임원 현황轉為高階主管表，每人一列
pub fn build_executive_records(filing: &CorporationFiling) -> Vec<ExecutiveRecord> {
    let company = &filing.company;
    let registered_average = registered_average_pay(filing);
    let unregistered_average = unregistered_average_pay(filing);

    filing
        .executives
        .iter()
        .map(|item| {
            let board_role = classify_board_role(&item.rgist_exctv_at, &item.ofcps);
            let (salary_amount, salary_source, salary_type) = resolve_salary(
                item,
                board_role,
                filing,
                registered_average,
                unregistered_average,
            );
            let (education, work_experience) = split_career(&item.main_career);

            ExecutiveRecord {
                corp_code: non_empty_or(&item.corp_code, &company.corp_code),
                corp_name: non_empty_or(&item.corp_name, &company.corp_name),
                bsns_year: filing.bsns_year,
                reprt_code: filing.report_code.code().to_string(),
                rcept_no: item.rcept_no.trim().to_string(),
                name: item.nm.trim().to_string(),
                gender: item.sexdstn.trim().to_string(),
                birth_ym: item.birth_ym.trim().to_string(),
                position: item.ofcps.trim().to_string(),
                registration: item.rgist_exctv_at.trim().to_string(),
                full_time: item.fte_at.trim().to_string(),
                board_role,
                responsibilities: item.chrg_job.trim().to_string(),
                largest_shareholder_relation: item.mxmm_shrholdr_relate.trim().to_string(),
                employment_period: item.hffc_pd.trim().to_string(),
                term_expiration: item.tenure_end_on.trim().to_string(),
                audit_committee_member: is_audit_committee_member(&item.ofcps, &item.chrg_job),
                auditor: is_auditor(&item.rgist_exctv_at, &item.ofcps),
                salary_amount,
                salary_source,
                salary_type,
                shares_owned: shares_owned(item, &filing.holdings),
                education,
                work_experience,
            }
        })
        .collect()
}

pub fn classify_board_role(registration: &str, position: &str) -> BoardRole {
    let registration = registration.trim();
    if registration.is_empty() || registration == "-" || registration.contains(UNREGISTERED) {
        return BoardRole::Unregistered;
    }

    if registration.contains(OUTSIDE_DIRECTOR) || position.contains(OUTSIDE_DIRECTOR) {
        BoardRole::OutsideDirector
    } else if registration.contains(NON_EXECUTIVE) || position.contains(NON_EXECUTIVE) {
        BoardRole::OtherNonExecutive
    } else if is_auditor(registration, position) {
        BoardRole::Auditor
    } else {
        BoardRole::InsideDirector
    }
}

pub fn is_audit_committee_member(position: &str, responsibilities: &str) -> bool {
    position.contains(AUDIT_COMMITTEE) || responsibilities.contains(AUDIT_COMMITTEE)
}

/// 法定監察人 (감사)：須為登記高管，且不是監察委員會委員
pub fn is_auditor(registration: &str, position: &str) -> bool {
    if registration.contains(UNREGISTERED) {
        return false;
    }
    [registration, position]
        .iter()
        .any(|text| text.contains(AUDITOR) && !text.contains(AUDIT_COMMITTEE))
}

fn resolve_salary(
    item: &ExecutiveItem,
    role: BoardRole,
    filing: &CorporationFiling,
    registered_average: Option<i64>,
    unregistered_average: Option<i64>,
) -> (Option<i64>, Option<SalarySource>, Option<SalaryType>) {
    let disclosed = [
        (&filing.individual_pay, SalarySource::IndividualDisclosure),
        (&filing.top_pay, SalarySource::Top5Disclosure),
    ];
    for (pays, source) in disclosed {
        if let Some(amount) =
            find_pay(pays, &item.nm, &item.ofcps).and_then(|pay| parse_amount(&pay.mendng_totamt))
        {
            return (Some(amount), Some(source), Some(SalaryType::Total));
        }
    }

    let average = if role.is_registered() {
        registered_average.map(|amount| (amount, SalarySource::RegisteredAverage))
    } else {
        unregistered_average.map(|amount| (amount, SalarySource::UnregisteredAverage))
    };

    match average {
        Some((amount, source)) => (Some(amount), Some(source), Some(SalaryType::Average)),
        None => (None, None, None),
    }
}

/// 依姓名比對；同名者優先選擇職位相同的一筆
fn find_pay<'a>(pays: &'a [PayItem], name: &str, position: &str) -> Option<&'a PayItem> {
    let name = normalize_name(name);
    if name.is_empty() {
        return None;
    }

    let mut candidates = pays.iter().filter(|pay| normalize_name(&pay.nm) == name);
    let first = candidates.next()?;
    let position = normalize_name(position);
    Some(
        std::iter::once(first)
            .chain(candidates)
            .find(|pay| normalize_name(&pay.ofcps) == position)
            .unwrap_or(first),
    )
}

/// 總額 ÷ 人數；沒有人數時退回揭露的平均值
fn average_pay<'a>(rows: impl Iterator<Item = (&'a str, &'a str, &'a str)>) -> Option<i64> {
    let mut total = 0i64;
    let mut headcount = 0i64;
    let mut disclosed_average = None;

    for (total_raw, headcount_raw, average_raw) in rows {
        if let (Some(t), Some(n)) = (parse_amount(total_raw), parse_amount(headcount_raw)) {
            if n > 0 {
                total += t;
                headcount += n;
            }
        }
        if disclosed_average.is_none() {
            disclosed_average = parse_amount(average_raw);
        }
    }

    if headcount > 0 {
        Some(total / headcount)
    } else {
        disclosed_average
    }
}

fn registered_average_pay(filing: &CorporationFiling) -> Option<i64> {
    average_pay(filing.aggregate_pay.iter().map(|row| {
        (
            row.mendng_totamt.as_str(),
            row.nmpr.as_str(),
            row.jan_avrg_mendng_am.as_str(),
        )
    }))
}

fn unregistered_average_pay(filing: &CorporationFiling) -> Option<i64> {
    average_pay(filing.unregistered_pay.iter().map(|row| {
        (
            row.fyer_salary_totamt.as_str(),
            row.nmpr.as_str(),
            row.jan_salary_am.as_str(),
        )
    }))
}

/// 報告基準日 (stlm_dt) 以前最新一筆持股報告的持股數
fn shares_owned(item: &ExecutiveItem, holdings: &[HoldingItem]) -> Option<i64> {
    let name = normalize_name(&item.nm);
    if name.is_empty() {
        return None;
    }
    let cutoff = date_digits(&item.stlm_dt);

    let same_name: Vec<&HoldingItem> = holdings
        .iter()
        .filter(|holding| normalize_name(&holding.repror) == name)
        .collect();
    // 同名者以報告上的職位區分
    let position = normalize_name(&item.ofcps);
    let same_position = same_name
        .iter()
        .any(|holding| normalize_name(&holding.isu_exctv_ofcps) == position);

    same_name
        .into_iter()
        .filter(|holding| {
            !same_position || normalize_name(&holding.isu_exctv_ofcps) == position
        })
        .filter(|holding| cutoff.len() != 8 || date_digits(&holding.rcept_dt) <= cutoff)
        .max_by(|a, b| {
            date_digits(&a.rcept_dt)
                .cmp(&date_digits(&b.rcept_dt))
                .then_with(|| a.rcept_no.cmp(&b.rcept_no))
        })
        .and_then(|holding| parse_amount(&holding.sp_stock_lmp_cnt))
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.trim().to_string()
    } else {
        value.to_string()
    }
}
