use crate::core::executives::build_executive_records;
use crate::core::export::{encode_table, TableRow};
use crate::core::summary::build_summary;
use crate::core::{ConfigProvider, DisclosureApi, ExtractResult, Pipeline, Storage, TransformResult};
use crate::domain::model::{CompanyInfo, CorpCode, CorporationFiling, SkippedCorporation};
use crate::domain::ports::OutputFormat;
use crate::utils::error::{EtlError, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const EXECUTIVES_TABLE: &str = "executives";
pub const SUMMARY_TABLE: &str = "corporation_summary";
pub const LISTED_TABLE: &str = "listed_corp_codes";
pub const RUN_REPORT_FILE: &str = "run_report.json";

/// 單次執行的摘要，與輸出表格一起寫出
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: String,
    pub bsns_year: i32,
    pub reprt_code: String,
    pub market: String,
    pub listed_corporations: usize,
    pub market_corporations: usize,
    pub executive_rows: usize,
    pub summary_rows: usize,
    pub skipped: Vec<SkippedCorporation>,
}

pub struct DisclosurePipeline<S: Storage, C: ConfigProvider, D: DisclosureApi> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) api: D,
}

impl<S: Storage, C: ConfigProvider, D: DisclosureApi> DisclosurePipeline<S, C, D> {
    pub fn new(storage: S, config: C, api: D) -> Self {
        Self {
            storage,
            config,
            api,
        }
    }

    fn company_table(&self) -> String {
        format!("{}_company_info", self.config.market().label().to_lowercase())
    }

    /// 依 corp_codes 篩選上市公司；未指定時全部保留
    fn select_candidates<'a>(&self, listed: &'a [CorpCode]) -> Vec<&'a CorpCode> {
        let requested: HashSet<&str> = self
            .config
            .corp_codes()
            .iter()
            .map(|code| code.trim())
            .collect();

        if requested.is_empty() {
            return listed.iter().collect();
        }

        let candidates: Vec<&CorpCode> = listed
            .iter()
            .filter(|corp| requested.contains(corp.corp_code.as_str()))
            .collect();

        let found: HashSet<&str> = candidates.iter().map(|corp| corp.corp_code.as_str()).collect();
        for code in requested.difference(&found) {
            tracing::warn!("⚠️ Requested corp_code {} is not a listed corporation", code);
        }

        candidates
    }

    /// 取得單一公司的全部揭露資料。임원 현황為必要，其餘端點失敗時以空清單繼續。
    async fn fetch_filing(&self, company: CompanyInfo) -> Result<CorporationFiling> {
        let corp_code = company.corp_code.clone();
        let year = self.config.bsns_year();
        let report = self.config.report_code();

        let executives = self.api.executives(&corp_code, year, report).await?;
        let individual_pay = optional(
            &corp_code,
            "individual_pay",
            self.api.individual_pay(&corp_code, year, report).await,
        )?;
        let top_pay = optional(
            &corp_code,
            "top_pay",
            self.api.top_pay(&corp_code, year, report).await,
        )?;
        let aggregate_pay = optional(
            &corp_code,
            "aggregate_pay",
            self.api.aggregate_pay(&corp_code, year, report).await,
        )?;
        let unregistered_pay = optional(
            &corp_code,
            "unregistered_pay",
            self.api.unregistered_pay(&corp_code, year, report).await,
        )?;
        let outside_directors = optional(
            &corp_code,
            "outside_directors",
            self.api.outside_directors(&corp_code, year, report).await,
        )?;
        let accounts = optional(
            &corp_code,
            "major_accounts",
            self.api.major_accounts(&corp_code, year, report).await,
        )?;
        let holdings = if self.config.include_holdings() {
            optional(
                &corp_code,
                "executive_holdings",
                self.api.executive_holdings(&corp_code).await,
            )?
        } else {
            Vec::new()
        };

        Ok(CorporationFiling {
            company,
            bsns_year: year,
            report_code: report,
            executives,
            individual_pay,
            top_pay,
            aggregate_pay,
            unregistered_pay,
            outside_directors,
            accounts,
            holdings,
        })
    }

    fn encode_outputs(&self, result: &TransformResult) -> Result<Vec<(String, Vec<u8>)>> {
        let company_table = self.company_table();
        let mut files = Vec::new();

        for &format in self.config.output_formats() {
            files.push(table_file(EXECUTIVES_TABLE, &result.executives, format)?);
            files.push(table_file(SUMMARY_TABLE, &result.summaries, format)?);
            files.push(table_file(LISTED_TABLE, &result.listed, format)?);
            files.push(table_file(&company_table, &result.companies, format)?);
        }

        let report = RunReport {
            generated_at: chrono::Local::now().to_rfc3339(),
            bsns_year: self.config.bsns_year(),
            reprt_code: self.config.report_code().code().to_string(),
            market: self.config.market().label().to_string(),
            listed_corporations: result.listed.len(),
            market_corporations: result.companies.len(),
            executive_rows: result.executives.len(),
            summary_rows: result.summaries.len(),
            skipped: result.skipped.clone(),
        };
        files.push((
            RUN_REPORT_FILE.to_string(),
            serde_json::to_vec_pretty(&report)?,
        ));

        Ok(files)
    }
}

/// 非致命錯誤降級為空清單並記錄警告
fn optional<T>(corp_code: &str, endpoint: &str, result: Result<Vec<T>>) -> Result<Vec<T>> {
    match result {
        Ok(rows) => Ok(rows),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::warn!("⚠️ {} for {} unavailable: {}", endpoint, corp_code, e);
            Ok(Vec::new())
        }
    }
}

/// 致命錯誤中止執行，其餘錯誤記錄為略過的公司
fn skip_or_abort(
    error: EtlError,
    corp: &CorpCode,
    stage: &str,
    skipped: &mut Vec<SkippedCorporation>,
) -> Result<()> {
    if error.is_fatal() {
        tracing::error!("❌ Aborting at {} ({}): {}", corp.corp_code, stage, error);
        return Err(error);
    }

    tracing::warn!(
        "⚠️ Skipping {} {} at {}: {}",
        corp.corp_code,
        corp.corp_name,
        stage,
        error
    );
    skipped.push(SkippedCorporation {
        corp_code: corp.corp_code.clone(),
        corp_name: corp.corp_name.clone(),
        stage: stage.to_string(),
        reason: error.to_string(),
    });
    Ok(())
}

fn table_file<T: TableRow>(name: &str, rows: &[T], format: OutputFormat) -> Result<(String, Vec<u8>)> {
    Ok((
        format!("{}.{}", name, format.extension()),
        encode_table(rows, format)?,
    ))
}

fn build_archive(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for (name, data) in files {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(data)?;
    }

    // 完成並取回底層 Vec<u8>
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, D: DisclosureApi> Pipeline for DisclosurePipeline<S, C, D> {
    async fn extract(&self) -> Result<ExtractResult> {
        let market = self.config.market();

        tracing::debug!("📥 Downloading corporation code list");
        let listed: Vec<CorpCode> = self
            .api
            .corp_codes()
            .await?
            .into_iter()
            .filter(CorpCode::is_listed)
            .collect();
        tracing::info!("📋 {} listed corporations", listed.len());

        let candidates = self.select_candidates(&listed);
        let limit = self.config.max_corporations();
        let mut companies = Vec::new();
        let mut filings = Vec::new();
        let mut skipped = Vec::new();

        for corp in candidates {
            if limit.is_some_and(|max| companies.len() >= max) {
                tracing::info!("🛑 Reached max_corporations limit ({})", companies.len());
                break;
            }

            let company = match self.api.company(&corp.corp_code).await {
                Ok(company) => company,
                Err(e) => {
                    skip_or_abort(e, corp, "company", &mut skipped)?;
                    continue;
                }
            };

            if !company.is_in(market) {
                tracing::trace!("{} is not in {} ({})", corp.corp_code, market, company.corp_cls);
                continue;
            }

            companies.push(company.clone());
            tracing::debug!("🏢 Fetching disclosures for {} {}", corp.corp_code, corp.corp_name);

            match self.fetch_filing(company).await {
                Ok(filing) => {
                    tracing::debug!(
                        "✅ {}: {} executives",
                        corp.corp_code,
                        filing.executives.len()
                    );
                    filings.push(filing);
                }
                Err(e) => skip_or_abort(e, corp, "disclosures", &mut skipped)?,
            }
        }

        tracing::info!(
            "📊 {} {} corporations, {} filings, {} skipped",
            companies.len(),
            market,
            filings.len(),
            skipped.len()
        );

        Ok(ExtractResult {
            listed,
            companies,
            filings,
            skipped,
        })
    }

    async fn transform(&self, data: ExtractResult) -> Result<TransformResult> {
        let mut executives = Vec::new();
        let mut summaries = Vec::with_capacity(data.filings.len());

        for filing in &data.filings {
            let records = build_executive_records(filing);
            summaries.push(build_summary(filing, &records));
            executives.extend(records);
        }

        tracing::debug!(
            "🔄 Built {} executive rows and {} summary rows",
            executives.len(),
            summaries.len()
        );

        Ok(TransformResult {
            executives,
            summaries,
            listed: data.listed,
            companies: data.companies,
            skipped: data.skipped,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let files = self.encode_outputs(&result)?;
        let output_path = self.config.output_path().trim_end_matches('/');

        match self.config.archive_name() {
            Some(archive) => {
                tracing::debug!("Creating ZIP file with {} files", files.len());
                let zip_data = build_archive(&files)?;
                self.storage.write_file(archive, &zip_data).await?;
                Ok(format!("{}/{}", output_path, archive))
            }
            None => {
                for (name, data) in &files {
                    self.storage.write_file(name, data).await?;
                }
                tracing::debug!("Wrote {} files", files.len());
                Ok(output_path.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::disclosure::{
        AccountItem, AggregatePayItem, ExecutiveItem, HoldingItem, OutsideDirectorItem, PayItem,
        UnregisteredPayItem,
    };
    use crate::domain::model::{CorpClass, ReportCode};
    use crate::domain::ports::RequestPolicy;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::io::Read;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }

        async fn text(&self, path: &str) -> String {
            String::from_utf8(self.get_file(path).await.unwrap()).unwrap()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.files
                .lock()
                .await
                .get(path)
                .cloned()
                .ok_or_else(|| EtlError::processing(format!("missing {}", path)))
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .lock()
                .await
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        corp_codes: Vec<String>,
        max_corporations: Option<usize>,
        include_holdings: bool,
        output_formats: Vec<OutputFormat>,
        archive: Option<String>,
    }

    impl Default for MockConfig {
        fn default() -> Self {
            Self {
                corp_codes: Vec::new(),
                max_corporations: None,
                include_holdings: true,
                output_formats: vec![OutputFormat::Csv],
                archive: None,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn api_key(&self) -> &str {
            "test"
        }
        fn api_base_url(&self) -> &str {
            "http://localhost"
        }
        fn output_path(&self) -> &str {
            "./test-output"
        }
        fn bsns_year(&self) -> i32 {
            2023
        }
        fn report_code(&self) -> ReportCode {
            ReportCode::Annual
        }
        fn market(&self) -> CorpClass {
            CorpClass::Kospi
        }
        fn corp_codes(&self) -> &[String] {
            &self.corp_codes
        }
        fn max_corporations(&self) -> Option<usize> {
            self.max_corporations
        }
        fn include_holdings(&self) -> bool {
            self.include_holdings
        }
        fn output_formats(&self) -> &[OutputFormat] {
            &self.output_formats
        }
        fn archive_name(&self) -> Option<&str> {
            self.archive.as_deref()
        }
        fn request_policy(&self) -> RequestPolicy {
            RequestPolicy::default()
        }
    }

    /// 記憶體內的 OPENDART：corp_code → (corp_cls, executives)
    #[derive(Default)]
    struct MockApi {
        corps: Vec<CorpCode>,
        classes: HashMap<String, &'static str>,
        executives: HashMap<String, Vec<ExecutiveItem>>,
        company_failures: HashMap<String, &'static str>,
        executive_failures: HashMap<String, &'static str>,
        top_pay_status: Option<&'static str>,
        holdings_calls: AtomicUsize,
    }

    impl MockApi {
        fn corp(mut self, code: &str, name: &str, stock: &str, cls: &'static str) -> Self {
            self.corps.push(CorpCode {
                corp_code: code.to_string(),
                corp_name: name.to_string(),
                stock_code: stock.to_string(),
                ..Default::default()
            });
            self.classes.insert(code.to_string(), cls);
            self.executives.insert(
                code.to_string(),
                vec![ExecutiveItem {
                    rcept_no: "20240312000736".to_string(),
                    corp_code: code.to_string(),
                    corp_name: name.to_string(),
                    nm: format!("{} 대표", name),
                    sexdstn: "남".to_string(),
                    ofcps: "대표이사".to_string(),
                    rgist_exctv_at: "사내이사".to_string(),
                    ..Default::default()
                }],
            );
            self
        }
    }

    #[async_trait]
    impl DisclosureApi for MockApi {
        async fn corp_codes(&self) -> Result<Vec<CorpCode>> {
            Ok(self.corps.clone())
        }

        async fn company(&self, corp_code: &str) -> Result<CompanyInfo> {
            if let Some(status) = self.company_failures.get(corp_code) {
                return Err(EtlError::dart(*status, "mock failure"));
            }
            let corp = self
                .corps
                .iter()
                .find(|corp| corp.corp_code == corp_code)
                .ok_or_else(|| EtlError::dart("013", "no data"))?;
            Ok(CompanyInfo {
                corp_code: corp.corp_code.clone(),
                corp_name: corp.corp_name.clone(),
                stock_code: corp.stock_code.clone(),
                corp_cls: self.classes.get(corp_code).copied().unwrap_or("E").to_string(),
                ..Default::default()
            })
        }

        async fn executives(&self, corp_code: &str, _: i32, _: ReportCode) -> Result<Vec<ExecutiveItem>> {
            if let Some(status) = self.executive_failures.get(corp_code) {
                return Err(EtlError::dart(*status, "mock failure"));
            }
            Ok(self.executives.get(corp_code).cloned().unwrap_or_default())
        }

        async fn individual_pay(&self, _: &str, _: i32, _: ReportCode) -> Result<Vec<PayItem>> {
            Ok(Vec::new())
        }

        async fn top_pay(&self, _: &str, _: i32, _: ReportCode) -> Result<Vec<PayItem>> {
            if let Some(status) = self.top_pay_status {
                return Err(EtlError::dart(status, "mock failure"));
            }
            Err(EtlError::HttpStatusError {
                endpoint: "indvdlByPay.json".to_string(),
                status: 502,
            })
        }

        async fn aggregate_pay(&self, _: &str, _: i32, _: ReportCode) -> Result<Vec<AggregatePayItem>> {
            Ok(vec![AggregatePayItem {
                nmpr: "1".to_string(),
                mendng_totamt: "1,200,000,000".to_string(),
                ..Default::default()
            }])
        }

        async fn unregistered_pay(&self, _: &str, _: i32, _: ReportCode) -> Result<Vec<UnregisteredPayItem>> {
            Ok(Vec::new())
        }

        async fn outside_directors(&self, _: &str, _: i32, _: ReportCode) -> Result<Vec<OutsideDirectorItem>> {
            Ok(Vec::new())
        }

        async fn major_accounts(&self, _: &str, _: i32, _: ReportCode) -> Result<Vec<AccountItem>> {
            Ok(Vec::new())
        }

        async fn executive_holdings(&self, _: &str) -> Result<Vec<HoldingItem>> {
            self.holdings_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn market_api() -> MockApi {
        MockApi::default()
            .corp("00126380", "삼성전자", "005930", "Y")
            .corp("00164779", "SK하이닉스", "000660", "Y")
            .corp("00258801", "카카오게임즈", "293490", "K")
            .corp("00999999", "비상장회사", " ", "E")
    }

    #[tokio::test]
    async fn test_extract_filters_listed_and_market() {
        let pipeline = DisclosurePipeline::new(MockStorage::new(), MockConfig::default(), market_api());

        let result = pipeline.extract().await.unwrap();

        assert_eq!(result.listed.len(), 3);
        assert_eq!(result.companies.len(), 2);
        assert_eq!(result.filings.len(), 2);
        assert!(result.skipped.is_empty());
        assert!(result.companies.iter().all(|c| c.corp_cls == "Y"));
        assert_eq!(pipeline.api.holdings_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_extract_respects_corp_codes_and_limit() {
        let config = MockConfig {
            corp_codes: vec!["00164779".to_string(), "00258801".to_string()],
            include_holdings: false,
            ..Default::default()
        };
        let pipeline = DisclosurePipeline::new(MockStorage::new(), config, market_api());
        let result = pipeline.extract().await.unwrap();
        assert_eq!(result.companies.len(), 1);
        assert_eq!(result.companies[0].corp_code, "00164779");
        assert_eq!(pipeline.api.holdings_calls.load(Ordering::SeqCst), 0);

        let config = MockConfig {
            max_corporations: Some(1),
            ..Default::default()
        };
        let pipeline = DisclosurePipeline::new(MockStorage::new(), config, market_api());
        let result = pipeline.extract().await.unwrap();
        assert_eq!(result.companies.len(), 1);
        assert_eq!(result.filings.len(), 1);
    }

    #[tokio::test]
    async fn test_non_fatal_errors_are_skipped() {
        let mut api = market_api();
        api.company_failures.insert("00126380".to_string(), "013");
        api.executive_failures.insert("00164779".to_string(), "100");

        let pipeline = DisclosurePipeline::new(MockStorage::new(), MockConfig::default(), api);
        let result = pipeline.extract().await.unwrap();

        assert_eq!(result.filings.len(), 0);
        assert_eq!(result.skipped.len(), 2);
        assert_eq!(result.skipped[0].stage, "company");
        assert_eq!(result.skipped[1].stage, "disclosures");
        assert_eq!(result.skipped[1].corp_name, "SK하이닉스");
    }

    #[tokio::test]
    async fn test_fatal_error_aborts() {
        let mut api = market_api();
        api.executive_failures.insert("00126380".to_string(), "020");

        let pipeline = DisclosurePipeline::new(MockStorage::new(), MockConfig::default(), api);
        match pipeline.extract().await {
            Err(EtlError::DartApiError { status, .. }) => assert_eq!(status, "020"),
            other => panic!("expected fatal error, got {:?}", other.map(|r| r.filings.len())),
        }
    }

    #[tokio::test]
    async fn test_fatal_error_on_auxiliary_endpoint_aborts() {
        let mut api = market_api();
        api.top_pay_status = Some("020");

        let pipeline = DisclosurePipeline::new(MockStorage::new(), MockConfig::default(), api);
        match pipeline.extract().await {
            Err(EtlError::DartApiError { status, .. }) => assert_eq!(status, "020"),
            other => panic!("expected fatal error, got {:?}", other.map(|r| r.filings.len())),
        }
        assert_eq!(pipeline.api.holdings_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_fatal_auxiliary_status_leaves_empty_list() {
        let mut api = market_api();
        api.top_pay_status = Some("013");

        let pipeline = DisclosurePipeline::new(MockStorage::new(), MockConfig::default(), api);
        let result = pipeline.extract().await.unwrap();
        assert_eq!(result.filings.len(), 2);
        assert!(result.skipped.is_empty());
        assert!(result.filings.iter().all(|filing| filing.top_pay.is_empty()));
    }

    #[tokio::test]
    async fn test_transform_and_load_tables() {
        let storage = MockStorage::new();
        let config = MockConfig {
            output_formats: vec![OutputFormat::Csv, OutputFormat::Json],
            ..Default::default()
        };
        let pipeline = DisclosurePipeline::new(storage.clone(), config, market_api());

        let extracted = pipeline.extract().await.unwrap();
        let transformed = pipeline.transform(extracted).await.unwrap();
        assert_eq!(transformed.executives.len(), 2);
        assert_eq!(transformed.summaries.len(), 2);
        // 揭露的등기이사 평균報酬 1명 1.2억
        assert_eq!(transformed.executives[0].salary_amount, Some(1_200_000_000));

        let path = pipeline.load(transformed).await.unwrap();
        assert_eq!(path, "./test-output");

        let executives = storage.text("executives.csv").await;
        assert_eq!(executives.lines().count(), 3);
        assert!(executives.starts_with("corp_code,corp_name,bsns_year"));

        let summary = storage.text("corporation_summary.csv").await;
        assert!(summary.contains("00126380,삼성전자,005930,2023,11011,1,1,1,0"));

        assert!(storage.get_file("listed_corp_codes.csv").await.is_some());
        assert!(storage.get_file("kospi_company_info.json").await.is_some());

        let report: serde_json::Value =
            serde_json::from_slice(&storage.get_file(RUN_REPORT_FILE).await.unwrap()).unwrap();
        assert_eq!(report["market_corporations"], 2);
        assert_eq!(report["executive_rows"], 2);
        assert_eq!(report["market"], "KOSPI");
    }

    #[tokio::test]
    async fn test_load_into_archive() {
        let storage = MockStorage::new();
        let config = MockConfig {
            archive: Some("kospi.zip".to_string()),
            output_formats: vec![OutputFormat::Tsv],
            ..Default::default()
        };
        let pipeline = DisclosurePipeline::new(storage.clone(), config, market_api());

        let extracted = pipeline.extract().await.unwrap();
        let transformed = pipeline.transform(extracted).await.unwrap();
        let path = pipeline.load(transformed).await.unwrap();
        assert_eq!(path, "./test-output/kospi.zip");
        assert!(storage.get_file("executives.tsv").await.is_none());

        let zip_data = storage.get_file("kospi.zip").await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "corporation_summary.tsv",
                "executives.tsv",
                "kospi_company_info.tsv",
                "listed_corp_codes.tsv",
                "run_report.json",
            ]
        );

        let mut executives = String::new();
        archive
            .by_name("executives.tsv")
            .unwrap()
            .read_to_string(&mut executives)
            .unwrap();
        assert!(executives.starts_with("corp_code\tcorp_name"));
    }
}
