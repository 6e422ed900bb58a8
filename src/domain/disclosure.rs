// OPENDART 定期報告主要資訊的原始欄位。欄位名稱沿用 API 回應，
// 金額一律是字串 (例如 "1,234,000,000" 或 "-")，由 core::amounts 轉換。

use serde::{Deserialize, Serialize};

/// 임원 현황 (exctvSttus.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExecutiveItem {
    pub rcept_no: String,
    pub corp_code: String,
    pub corp_name: String,
    pub nm: String,
    pub sexdstn: String,
    pub birth_ym: String,
    pub ofcps: String,
    pub rgist_exctv_at: String,
    pub fte_at: String,
    pub chrg_job: String,
    pub main_career: String,
    pub mxmm_shrholdr_relate: String,
    pub hffc_pd: String,
    pub tenure_end_on: String,
    pub stlm_dt: String,
}

/// 이사·감사 개인별 보수현황 (hmvAuditIndvdlBySttus.json) 與
/// 개인별 보수지급 금액 상위 5인 (indvdlByPay.json) 共用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PayItem {
    pub rcept_no: String,
    pub nm: String,
    pub ofcps: String,
    pub mendng_totamt: String,
    pub mendng_totamt_ct_incls_mendng: String,
}

/// 이사·감사 전체의 보수현황 (hmvAuditAllSttus.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AggregatePayItem {
    pub rcept_no: String,
    pub nmpr: String,
    pub mendng_totamt: String,
    pub jan_avrg_mendng_am: String,
    pub rm: String,
}

/// 미등기임원 보수현황 (unrstExctvMendngSttus.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UnregisteredPayItem {
    pub rcept_no: String,
    pub se: String,
    pub nmpr: String,
    pub fyer_salary_totamt: String,
    pub jan_salary_am: String,
    pub rm: String,
}

/// 사외이사 및 그 변동현황 (outcmpnyDrctrNdChangeSttus.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutsideDirectorItem {
    pub rcept_no: String,
    pub drctr_co: String,
    pub otcmp_drctr_co: String,
    pub apnt: String,
    pub rlsofc: String,
    pub mdstrm_resig: String,
}

/// 단일회사 주요계정 (fnlttSinglAcnt.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AccountItem {
    pub rcept_no: String,
    pub bsns_year: String,
    pub stock_code: String,
    pub reprt_code: String,
    pub account_nm: String,
    pub fs_div: String,
    pub fs_nm: String,
    pub sj_div: String,
    pub sj_nm: String,
    pub thstrm_nm: String,
    pub thstrm_dt: String,
    pub thstrm_amount: String,
    pub frmtrm_nm: String,
    pub frmtrm_amount: String,
    pub bfefrmtrm_nm: String,
    pub bfefrmtrm_amount: String,
    pub ord: String,
    pub currency: String,
}

/// 임원ㆍ주요주주 소유보고 (elestock.json)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HoldingItem {
    pub rcept_no: String,
    pub rcept_dt: String,
    pub repror: String,
    pub isu_exctv_rgist_at: String,
    pub isu_exctv_ofcps: String,
    pub isu_main_shrholdr: String,
    pub sp_stock_lmp_cnt: String,
    pub sp_stock_lmp_irds_cnt: String,
    pub sp_stock_lmp_rate: String,
    pub sp_stock_lmp_irds_rate: String,
}
