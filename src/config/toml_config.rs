use crate::adapters::dart::DEFAULT_BASE_URL;
use crate::config::{default_business_year, validate_provider};
use crate::domain::model::{CorpClass, ReportCode};
use crate::domain::ports::{ConfigProvider, OutputFormat, RequestPolicy};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub dart: DartConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DartConfig {
    pub api_key: String,
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_seconds: Option<u64>,
    pub request_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    pub bsns_year: Option<i32>,
    #[serde(default)]
    pub reprt_code: ReportCode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub market: CorpClass,
    #[serde(default)]
    pub corp_codes: Vec<String>,
    pub max_corporations: Option<usize>,
    #[serde(default = "default_true")]
    pub include_holdings: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            market: CorpClass::default(),
            corp_codes: Vec::new(),
            max_corporations: None,
            include_holdings: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    #[serde(default = "default_formats")]
    pub output_formats: Vec<OutputFormat>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    /// "text" 或 "json"
    pub log_format: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::Csv]
}

impl std::fmt::Debug for DartConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DartConfig")
            .field("api_key", &crate::utils::validation::mask_secret(&self.api_key))
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay_seconds", &self.retry_delay_seconds)
            .field("request_delay_ms", &self.request_delay_ms)
            .finish()
    }
}

impl std::fmt::Debug for TomlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TomlConfig")
            .field("dart", &self.dart)
            .field("report", &self.report)
            .field("filter", &self.filter)
            .field("load", &self.load)
            .field("monitoring", &self.monitoring)
            .finish()
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENDART_API_KEY})，未設定的變數原樣保留
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if self.dart.api_key.contains("${") {
            return Err(EtlError::MissingConfigError {
                field: "dart.api_key".to_string(),
            });
        }

        if let Some(compression) = self.compression() {
            validate_non_empty_string("load.compression.filename", &compression.filename)?;
        }

        if let Some(format) = self.monitoring.as_ref().and_then(|m| m.log_format.as_deref()) {
            if !matches!(format, "text" | "json") {
                return Err(EtlError::InvalidConfigValueError {
                    field: "monitoring.log_format".to_string(),
                    value: format.to_string(),
                    reason: "Valid formats: text, json".to_string(),
                });
            }
        }

        validate_provider(self)
    }

    fn compression(&self) -> Option<&CompressionConfig> {
        self.load.compression.as_ref().filter(|c| c.enabled)
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .map(|format| format == "json")
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn api_key(&self) -> &str {
        &self.dart.api_key
    }

    fn api_base_url(&self) -> &str {
        self.dart.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn bsns_year(&self) -> i32 {
        self.report.bsns_year.unwrap_or_else(default_business_year)
    }

    fn report_code(&self) -> ReportCode {
        self.report.reprt_code
    }

    fn market(&self) -> CorpClass {
        self.filter.market
    }

    fn corp_codes(&self) -> &[String] {
        &self.filter.corp_codes
    }

    fn max_corporations(&self) -> Option<usize> {
        self.filter.max_corporations
    }

    fn include_holdings(&self) -> bool {
        self.filter.include_holdings
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.load.output_formats
    }

    fn archive_name(&self) -> Option<&str> {
        self.compression().map(|c| c.filename.as_str())
    }

    fn request_policy(&self) -> RequestPolicy {
        let defaults = RequestPolicy::default();
        RequestPolicy {
            timeout: self
                .dart
                .timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            retry_attempts: self.dart.retry_attempts.unwrap_or(defaults.retry_attempts),
            retry_delay: self
                .dart
                .retry_delay_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry_delay),
            min_interval: self
                .dart
                .request_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.min_interval),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
