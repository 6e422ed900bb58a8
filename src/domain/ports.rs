use crate::domain::disclosure::{
    AccountItem, AggregatePayItem, ExecutiveItem, HoldingItem, OutsideDirectorItem, PayItem,
    UnregisteredPayItem,
};
use crate::domain::model::{
    CompanyInfo, CorpClass, CorpCode, ExtractResult, ReportCode, TransformResult,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Tsv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Tsv => "tsv",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "tsv" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "unsupported output format '{}', valid formats: csv, tsv, json",
                other
            )),
        }
    }
}

/// HTTP 請求的逾時、重試與節流設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPolicy {
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub min_interval: Duration,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_delay: Duration::from_secs(2),
            min_interval: Duration::from_millis(700),
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn api_key(&self) -> &str;
    fn api_base_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn bsns_year(&self) -> i32;
    fn report_code(&self) -> ReportCode;
    fn market(&self) -> CorpClass;
    fn corp_codes(&self) -> &[String];
    fn max_corporations(&self) -> Option<usize>;
    fn include_holdings(&self) -> bool;
    fn output_formats(&self) -> &[OutputFormat];
    /// 設定時所有輸出打包成此檔名的 ZIP
    fn archive_name(&self) -> Option<&str>;
    fn request_policy(&self) -> RequestPolicy;
}

/// OPENDART 揭露資料來源。`corp_code` 以外的報告查詢都以 (事業年度, 報告種類) 為範圍。
#[async_trait]
pub trait DisclosureApi: Send + Sync {
    async fn corp_codes(&self) -> Result<Vec<CorpCode>>;
    async fn company(&self, corp_code: &str) -> Result<CompanyInfo>;
    async fn executives(
        &self,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<ExecutiveItem>>;
    async fn individual_pay(
        &self,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<PayItem>>;
    async fn top_pay(
        &self,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<PayItem>>;
    async fn aggregate_pay(
        &self,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<AggregatePayItem>>;
    async fn unregistered_pay(
        &self,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<UnregisteredPayItem>>;
    async fn outside_directors(
        &self,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<OutsideDirectorItem>>;
    async fn major_accounts(
        &self,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<AccountItem>>;
    async fn executive_holdings(&self, corp_code: &str) -> Result<Vec<HoldingItem>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractResult>;
    async fn transform(&self, data: ExtractResult) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
