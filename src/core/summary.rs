use crate::core::amounts::{normalize_name, parse_amount, parse_count};
use crate::domain::disclosure::AccountItem;
use crate::domain::model::{
    BoardRole, CorporationFiling, CorporationSummary, ExecutiveRecord, Gender,
};

const TOTAL_ASSETS: &str = "자산총계";
const BALANCE_SHEET: &str = "BS";
const STATEMENT_PREFERENCE: [&str; 2] = ["CFS", "OFS"];

/// 彙總單一公司的董事、監察人組成與資產總額
pub fn build_summary(filing: &CorporationFiling, executives: &[ExecutiveRecord]) -> CorporationSummary {
    let company = &filing.company;
    let count = |predicate: fn(&ExecutiveRecord) -> bool| -> u32 {
        executives.iter().filter(|record| predicate(record)).count() as u32
    };

    let inside = count(|r| r.board_role == BoardRole::InsideDirector);
    let other_non_executive = count(|r| r.board_role == BoardRole::OtherNonExecutive);
    let outside_from_rows = count(|r| r.board_role == BoardRole::OutsideDirector);
    let auditors = count(|r| r.auditor);
    let registered = count(|r| r.board_role.is_registered());
    let unregistered_rows = count(|r| r.board_role == BoardRole::Unregistered);

    let voting_male = count(|r| {
        r.board_role.has_board_vote() && Gender::from_disclosure(&r.gender) == Gender::Male
    });
    let voting_female = count(|r| {
        r.board_role.has_board_vote() && Gender::from_disclosure(&r.gender) == Gender::Female
    });

    // 사외이사 변동현황 有揭露時以其人數為準
    let disclosed_board = filing.outside_directors.iter().find_map(|row| {
        match (parse_count(&row.drctr_co), parse_count(&row.otcmp_drctr_co)) {
            (None, None) => None,
            counts => Some(counts),
        }
    });
    let (disclosed_total, disclosed_outside) = disclosed_board.unwrap_or((None, None));

    let non_registered = if unregistered_rows > 0 {
        unregistered_rows
    } else {
        filing
            .unregistered_pay
            .iter()
            .filter_map(|row| parse_count(&row.nmpr))
            .sum()
    };

    let (total_assets_current, total_assets_prior, total_assets_two_prior) =
        total_assets(&filing.accounts);

    CorporationSummary {
        corp_code: company.corp_code.clone(),
        corp_name: company.corp_name.clone(),
        stock_code: company.stock_code.trim().to_string(),
        bsns_year: filing.bsns_year,
        reprt_code: filing.report_code.code().to_string(),
        registered_executive_count: registered,
        total_director_count: disclosed_total.unwrap_or(inside + outside_from_rows + other_non_executive),
        inside_director_count: inside,
        outside_director_count: disclosed_outside.unwrap_or(outside_from_rows),
        other_non_executive_director_count: other_non_executive,
        audit_committee_member_count: count(|r| r.audit_committee_member),
        auditor_count: auditors,
        voting_male_count: voting_male,
        voting_female_count: voting_female,
        non_registered_executive_count: non_registered,
        total_assets_current,
        total_assets_prior,
        total_assets_two_prior,
        rcept_no: receipt_number(filing, executives),
    }
}

/// 資產總計：連結財報 (CFS) 優先，其次個別財報 (OFS)
pub fn total_assets(accounts: &[AccountItem]) -> (Option<i64>, Option<i64>, Option<i64>) {
    let candidates: Vec<&AccountItem> = accounts
        .iter()
        .filter(|account| normalize_name(&account.account_nm) == TOTAL_ASSETS)
        .filter(|account| {
            let sj_div = account.sj_div.trim();
            sj_div.is_empty() || sj_div == BALANCE_SHEET
        })
        .collect();

    let chosen = STATEMENT_PREFERENCE
        .iter()
        .find_map(|fs_div| {
            candidates
                .iter()
                .find(|account| account.fs_div.trim() == *fs_div)
        })
        .or_else(|| candidates.first());

    match chosen {
        Some(account) => (
            parse_amount(&account.thstrm_amount),
            parse_amount(&account.frmtrm_amount),
            parse_amount(&account.bfefrmtrm_amount),
        ),
        None => (None, None, None),
    }
}

fn receipt_number(filing: &CorporationFiling, executives: &[ExecutiveRecord]) -> String {
    executives
        .iter()
        .map(|record| record.rcept_no.as_str())
        .chain(filing.accounts.iter().map(|account| account.rcept_no.as_str()))
        .chain(filing.outside_directors.iter().map(|row| row.rcept_no.as_str()))
        .map(str::trim)
        .find(|rcept_no| !rcept_no.is_empty())
        .unwrap_or_default()
        .to_string()
}
