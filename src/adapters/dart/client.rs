use crate::adapters::dart::corp_code::parse_corp_code_archive;
use crate::domain::disclosure::{
    AccountItem, AggregatePayItem, ExecutiveItem, HoldingItem, OutsideDirectorItem, PayItem,
    UnregisteredPayItem,
};
use crate::domain::model::{CompanyInfo, CorpCode, ReportCode};
use crate::domain::ports::{ConfigProvider, DisclosureApi, RequestPolicy};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Instant;
use tokio::sync::Mutex;

pub const DEFAULT_BASE_URL: &str = "https://opendart.fss.or.kr/api";

pub mod endpoints {
    pub const CORP_CODE: &str = "corpCode.xml";
    pub const COMPANY: &str = "company.json";
    pub const EXECUTIVES: &str = "exctvSttus.json";
    pub const INDIVIDUAL_PAY: &str = "hmvAuditIndvdlBySttus.json";
    pub const TOP_PAY: &str = "indvdlByPay.json";
    pub const AGGREGATE_PAY: &str = "hmvAuditAllSttus.json";
    pub const UNREGISTERED_PAY: &str = "unrstExctvMendngSttus.json";
    pub const OUTSIDE_DIRECTORS: &str = "outcmpnyDrctrNdChangeSttus.json";
    pub const MAJOR_ACCOUNTS: &str = "fnlttSinglAcnt.json";
    pub const HOLDINGS: &str = "elestock.json";
}

const STATUS_OK: &str = "000";
const STATUS_NO_DATA: &str = "013";

/// OPENDART HTTP 用戶端。所有請求依序送出，兩次請求之間至少間隔 `min_interval`。
pub struct DartClient {
    client: Client,
    api_key: String,
    base_url: String,
    policy: RequestPolicy,
    last_request: Mutex<Option<Instant>>,
}

impl DartClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        policy: RequestPolicy,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(policy.timeout)
            .user_agent(concat!("kospi-exec-etl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            policy,
            last_request: Mutex::new(None),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(
            config.api_key(),
            config.api_base_url(),
            config.request_policy(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.policy.min_interval {
                tokio::time::sleep(self.policy.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn with_retry<T, F, Fut>(&self, endpoint: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            self.throttle().await;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.policy.retry_attempts => {
                    attempt += 1;
                    tracing::warn!(
                        "🔁 {} failed ({}), retry {}/{} in {:?}",
                        endpoint,
                        e,
                        attempt,
                        self.policy.retry_attempts,
                        self.policy.retry_delay
                    );
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Vec<u8>> {
        let url = self.endpoint_url(endpoint);
        tracing::debug!("📡 GET {} {:?}", url, params);

        // reqwest 的錯誤訊息含完整 URL (包含金鑰)，先移除
        let response = self
            .client
            .get(&url)
            .query(&[("crtfc_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| EtlError::ApiError(e.without_url()))?;

        let status = response.status();
        tracing::debug!("📡 {} response status: {}", endpoint, status);
        if !status.is_success() {
            return Err(EtlError::HttpStatusError {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| EtlError::ApiError(e.without_url()))?;
        Ok(body.to_vec())
    }

    async fn json_once(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Option<Value>> {
        let body = self.send_once(endpoint, params).await?;
        let value: Value = serde_json::from_slice(&body)?;
        check_status(endpoint, value)
    }

    /// 取得原始 JSON 回應；狀態 013 (查無資料) 回傳 `None`
    pub async fn fetch_json(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Option<Value>> {
        self.with_retry(endpoint, || self.json_once(endpoint, params))
            .await
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let Some(mut value) = self.fetch_json(endpoint, params).await? else {
            tracing::debug!("📭 {}: no data for {:?}", endpoint, params);
            return Ok(Vec::new());
        };

        let list = value
            .get_mut("list")
            .map(Value::take)
            .unwrap_or_else(|| Value::Array(Vec::new()));
        Ok(serde_json::from_value(list)?)
    }

    async fn fetch_report<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<T>> {
        let params = report_params(corp_code, bsns_year, report);
        self.fetch_list(endpoint, &params).await
    }
}

pub fn report_params(corp_code: &str, bsns_year: i32, report: ReportCode) -> Vec<(&'static str, String)> {
    vec![
        ("corp_code", corp_code.to_string()),
        ("bsns_year", bsns_year.to_string()),
        ("reprt_code", report.code().to_string()),
    ]
}

fn check_status(endpoint: &str, value: Value) -> Result<Option<Value>> {
    let status = value
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match status.as_str() {
        STATUS_OK => Ok(Some(value)),
        STATUS_NO_DATA => Ok(None),
        "" => Err(EtlError::processing(format!(
            "{} response has no status field",
            endpoint
        ))),
        _ => {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default();
            Err(EtlError::dart(status.clone(), message))
        }
    }
}

#[async_trait]
impl DisclosureApi for DartClient {
    async fn corp_codes(&self) -> Result<Vec<CorpCode>> {
        tracing::info!("📥 Downloading corporation code list");
        let body = self
            .with_retry(endpoints::CORP_CODE, || {
                self.send_once(endpoints::CORP_CODE, &[])
            })
            .await?;
        let corps = parse_corp_code_archive(&body)?;
        tracing::info!("📥 Parsed {} corporation codes", corps.len());
        Ok(corps)
    }

    async fn company(&self, corp_code: &str) -> Result<CompanyInfo> {
        let params = [("corp_code", corp_code.to_string())];
        match self.fetch_json(endpoints::COMPANY, &params).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err(EtlError::dart(
                STATUS_NO_DATA,
                format!("no company profile for {}", corp_code),
            )),
        }
    }

    async fn executives(
        &self,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<ExecutiveItem>> {
        self.fetch_report(endpoints::EXECUTIVES, corp_code, bsns_year, report)
            .await
    }

    async fn individual_pay(
        &self,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<PayItem>> {
        self.fetch_report(endpoints::INDIVIDUAL_PAY, corp_code, bsns_year, report)
            .await
    }

    async fn top_pay(
        &self,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<PayItem>> {
        self.fetch_report(endpoints::TOP_PAY, corp_code, bsns_year, report)
            .await
    }

    async fn aggregate_pay(
        &self,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<AggregatePayItem>> {
        self.fetch_report(endpoints::AGGREGATE_PAY, corp_code, bsns_year, report)
            .await
    }

    async fn unregistered_pay(
        &self,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<UnregisteredPayItem>> {
        self.fetch_report(endpoints::UNREGISTERED_PAY, corp_code, bsns_year, report)
            .await
    }

    async fn outside_directors(
        &self,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<OutsideDirectorItem>> {
        self.fetch_report(endpoints::OUTSIDE_DIRECTORS, corp_code, bsns_year, report)
            .await
    }

    async fn major_accounts(
        &self,
        corp_code: &str,
        bsns_year: i32,
        report: ReportCode,
    ) -> Result<Vec<AccountItem>> {
        self.fetch_report(endpoints::MAJOR_ACCOUNTS, corp_code, bsns_year, report)
            .await
    }

    async fn executive_holdings(&self, corp_code: &str) -> Result<Vec<HoldingItem>> {
        let params = [("corp_code", corp_code.to_string())];
        self.fetch_list(endpoints::HOLDINGS, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_status() {
        let ok = check_status("x", json!({"status": "000", "message": "정상"})).unwrap();
        assert!(ok.is_some());

        let empty = check_status("x", json!({"status": "013", "message": "조회된 데이타가 없습니다."}))
            .unwrap();
        assert!(empty.is_none());

        let err = check_status("x", json!({"status": "100", "message": "필드의 부적절한 값입니다."}))
            .unwrap_err();
        assert!(matches!(err, EtlError::DartApiError { ref status, .. } if status == "100"));

        assert!(check_status("x", json!({"list": []})).is_err());
    }

    #[test]
    fn test_report_params() {
        let params = report_params("00126380", 2023, ReportCode::HalfYear);
        assert_eq!(params[0], ("corp_code", "00126380".to_string()));
        assert_eq!(params[1], ("bsns_year", "2023".to_string()));
        assert_eq!(params[2], ("reprt_code", "11012".to_string()));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = DartClient::new("key", "http://localhost:1234/api/", RequestPolicy::default())
            .unwrap();
        assert_eq!(client.endpoint_url("company.json"), "http://localhost:1234/api/company.json");
    }
}
