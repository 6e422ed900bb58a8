use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::disclosure::{
    AccountItem, AggregatePayItem, ExecutiveItem, HoldingItem, OutsideDirectorItem, PayItem,
    UnregisteredPayItem,
};

/// 定期報告種類 (reprt_code)。序列化為 "11011" 形式，讀取時也接受 annual/half/q1/q3。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum ReportCode {
    #[default]
    Annual,
    HalfYear,
    FirstQuarter,
    ThirdQuarter,
}

impl ReportCode {
    pub fn code(&self) -> &'static str {
        match self {
            ReportCode::Annual => "11011",
            ReportCode::HalfYear => "11012",
            ReportCode::FirstQuarter => "11013",
            ReportCode::ThirdQuarter => "11014",
        }
    }
}

impl fmt::Display for ReportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ReportCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "11011" | "annual" => Ok(ReportCode::Annual),
            "11012" | "half" | "half_year" => Ok(ReportCode::HalfYear),
            "11013" | "q1" | "first_quarter" => Ok(ReportCode::FirstQuarter),
            "11014" | "q3" | "third_quarter" => Ok(ReportCode::ThirdQuarter),
            other => Err(format!(
                "unknown report code '{}', expected 11011|11012|11013|11014 or annual|half|q1|q3",
                other
            )),
        }
    }
}

impl TryFrom<String> for ReportCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReportCode> for String {
    fn from(report: ReportCode) -> Self {
        report.code().to_string()
    }
}

/// 公司所屬市場 (corp_cls)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum CorpClass {
    #[default]
    Kospi,
    Kosdaq,
    Konex,
    Other,
}

impl CorpClass {
    pub fn code(&self) -> &'static str {
        match self {
            CorpClass::Kospi => "Y",
            CorpClass::Kosdaq => "K",
            CorpClass::Konex => "N",
            CorpClass::Other => "E",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CorpClass::Kospi => "KOSPI",
            CorpClass::Kosdaq => "KOSDAQ",
            CorpClass::Konex => "KONEX",
            CorpClass::Other => "other",
        }
    }
}

impl fmt::Display for CorpClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CorpClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "Y" | "KOSPI" => Ok(CorpClass::Kospi),
            "K" | "KOSDAQ" => Ok(CorpClass::Kosdaq),
            "N" | "KONEX" => Ok(CorpClass::Konex),
            "E" | "OTHER" => Ok(CorpClass::Other),
            other => Err(format!(
                "unknown market '{}', expected Y|K|N|E or KOSPI|KOSDAQ|KONEX|OTHER",
                other
            )),
        }
    }
}

impl TryFrom<String> for CorpClass {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CorpClass> for String {
    fn from(market: CorpClass) -> Self {
        market.code().to_string()
    }
}

/// CORPCODE.xml 的一筆公司代碼
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CorpCode {
    pub corp_code: String,
    pub corp_name: String,
    pub corp_eng_name: String,
    pub stock_code: String,
    pub modify_date: String,
}

impl CorpCode {
    /// 上市公司才有 6 碼股票代碼
    pub fn is_listed(&self) -> bool {
        self.stock_code.trim().chars().count() == 6
    }
}

/// company.json 的公司概況
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CompanyInfo {
    pub corp_code: String,
    pub corp_name: String,
    #[serde(rename(deserialize = "corp_name_eng"))]
    pub corp_eng_name: String,
    pub stock_code: String,
    #[serde(rename(serialize = "ceo_name", deserialize = "ceo_nm"))]
    pub ceo_name: String,
    pub corp_cls: String,
    #[serde(rename(serialize = "industry_code", deserialize = "induty_code"))]
    pub industry_code: String,
    #[serde(rename(serialize = "established_date", deserialize = "est_dt"))]
    pub established_date: String,
    pub ir_url: String,
    #[serde(rename(serialize = "homepage", deserialize = "hm_url"))]
    pub homepage: String,
    #[serde(rename(serialize = "corp_reg_number", deserialize = "jurir_no"))]
    pub corp_reg_number: String,
    #[serde(rename(serialize = "business_no", deserialize = "bizr_no"))]
    pub business_no: String,
    #[serde(rename(serialize = "fiscal_month", deserialize = "acc_mt"))]
    pub fiscal_month: String,
}

impl CompanyInfo {
    pub fn is_in(&self, market: CorpClass) -> bool {
        self.corp_cls.trim() == market.code()
    }
}

/// 一家公司在單一報告期間的全部揭露資料
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorporationFiling {
    pub company: CompanyInfo,
    pub bsns_year: i32,
    pub report_code: ReportCode,
    pub executives: Vec<ExecutiveItem>,
    pub individual_pay: Vec<PayItem>,
    pub top_pay: Vec<PayItem>,
    pub aggregate_pay: Vec<AggregatePayItem>,
    pub unregistered_pay: Vec<UnregisteredPayItem>,
    pub outside_directors: Vec<OutsideDirectorItem>,
    pub accounts: Vec<AccountItem>,
    pub holdings: Vec<HoldingItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCorporation {
    pub corp_code: String,
    pub corp_name: String,
    pub stage: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardRole {
    InsideDirector,
    OutsideDirector,
    OtherNonExecutive,
    Auditor,
    Unregistered,
}

impl BoardRole {
    pub fn is_registered(&self) -> bool {
        !matches!(self, BoardRole::Unregistered)
    }

    /// 有董事會表決權者；監察人 (감사) 列席但不表決
    pub fn has_board_vote(&self) -> bool {
        matches!(
            self,
            BoardRole::InsideDirector | BoardRole::OutsideDirector | BoardRole::OtherNonExecutive
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub fn from_disclosure(text: &str) -> Self {
        match text.trim() {
            "남" | "남성" | "M" | "m" | "male" | "Male" => Gender::Male,
            "여" | "여성" | "F" | "f" | "female" | "Female" => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalarySource {
    IndividualDisclosure,
    Top5Disclosure,
    RegisteredAverage,
    UnregisteredAverage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryType {
    Total,
    Average,
}

/// 每位高階主管一列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveRecord {
    pub corp_code: String,
    pub corp_name: String,
    pub bsns_year: i32,
    pub reprt_code: String,
    pub rcept_no: String,
    pub name: String,
    pub gender: String,
    pub birth_ym: String,
    pub position: String,
    pub registration: String,
    pub full_time: String,
    pub board_role: BoardRole,
    pub responsibilities: String,
    pub largest_shareholder_relation: String,
    pub employment_period: String,
    pub term_expiration: String,
    pub audit_committee_member: bool,
    pub auditor: bool,
    pub salary_amount: Option<i64>,
    pub salary_source: Option<SalarySource>,
    pub salary_type: Option<SalaryType>,
    pub shares_owned: Option<i64>,
    pub education: String,
    pub work_experience: String,
}

/// 每家公司每個報告期間一列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorporationSummary {
    pub corp_code: String,
    pub corp_name: String,
    pub stock_code: String,
    pub bsns_year: i32,
    pub reprt_code: String,
    pub registered_executive_count: u32,
    pub total_director_count: u32,
    pub inside_director_count: u32,
    pub outside_director_count: u32,
    pub other_non_executive_director_count: u32,
    pub audit_committee_member_count: u32,
    pub auditor_count: u32,
    pub voting_male_count: u32,
    pub voting_female_count: u32,
    pub non_registered_executive_count: u32,
    pub total_assets_current: Option<i64>,
    pub total_assets_prior: Option<i64>,
    pub total_assets_two_prior: Option<i64>,
    pub rcept_no: String,
}

/// 萃取階段的完整結果
#[derive(Debug, Clone, Default)]
pub struct ExtractResult {
    pub listed: Vec<CorpCode>,
    pub companies: Vec<CompanyInfo>,
    pub filings: Vec<CorporationFiling>,
    pub skipped: Vec<SkippedCorporation>,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub executives: Vec<ExecutiveRecord>,
    pub summaries: Vec<CorporationSummary>,
    pub listed: Vec<CorpCode>,
    pub companies: Vec<CompanyInfo>,
    pub skipped: Vec<SkippedCorporation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_code_parsing() {
        assert_eq!("11011".parse::<ReportCode>().unwrap(), ReportCode::Annual);
        assert_eq!("Q3".parse::<ReportCode>().unwrap(), ReportCode::ThirdQuarter);
        assert_eq!("half".parse::<ReportCode>().unwrap().code(), "11012");
        assert!("11015".parse::<ReportCode>().is_err());

        let json: ReportCode = serde_json::from_str("\"q1\"").unwrap();
        assert_eq!(json, ReportCode::FirstQuarter);
        assert_eq!(serde_json::to_string(&json).unwrap(), "\"11013\"");
    }

    #[test]
    fn test_corp_class_parsing() {
        assert_eq!("kospi".parse::<CorpClass>().unwrap(), CorpClass::Kospi);
        assert_eq!("K".parse::<CorpClass>().unwrap(), CorpClass::Kosdaq);
        assert!("NYSE".parse::<CorpClass>().is_err());
    }

    #[test]
    fn test_listed_requires_six_digit_stock_code() {
        let mut corp = CorpCode {
            corp_code: "00126380".to_string(),
            corp_name: "삼성전자".to_string(),
            stock_code: "005930".to_string(),
            ..Default::default()
        };
        assert!(corp.is_listed());

        corp.stock_code = " ".to_string();
        assert!(!corp.is_listed());
    }

    #[test]
    fn test_company_info_reads_dart_field_names() {
        let json = serde_json::json!({
            "status": "000",
            "message": "정상",
            "corp_code": "00126380",
            "corp_name": "삼성전자(주)",
            "corp_name_eng": "SAMSUNG ELECTRONICS CO,.LTD",
            "stock_code": "005930",
            "ceo_nm": "한종희",
            "corp_cls": "Y",
            "jurir_no": "1301110006246",
            "bizr_no": "1248100998",
            "induty_code": "264",
            "est_dt": "19690113",
            "acc_mt": "12"
        });
        let info: CompanyInfo = serde_json::from_value(json).unwrap();
        assert_eq!(info.ceo_name, "한종희");
        assert_eq!(info.corp_reg_number, "1301110006246");
        assert!(info.is_in(CorpClass::Kospi));
        assert!(!info.is_in(CorpClass::Kosdaq));

        let out = serde_json::to_value(&info).unwrap();
        assert_eq!(out["industry_code"], "264");
        assert_eq!(out["business_no"], "1248100998");
    }

    #[test]
    fn test_gender_from_disclosure() {
        assert_eq!(Gender::from_disclosure("남"), Gender::Male);
        assert_eq!(Gender::from_disclosure(" 여 "), Gender::Female);
        assert_eq!(Gender::from_disclosure("-"), Gender::Unknown);
    }
}
