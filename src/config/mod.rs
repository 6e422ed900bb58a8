pub mod toml_config;

use crate::adapters::dart::DEFAULT_BASE_URL;
use crate::domain::model::{CorpClass, ReportCode};
use crate::domain::ports::{ConfigProvider, OutputFormat, RequestPolicy};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_api_key, validate_corp_codes, validate_non_empty_string, validate_path,
    validate_positive_number, validate_range, validate_url, Validate,
};
use chrono::Datelike;
use std::time::Duration;

/// OPENDART 的定期報告主要資訊自 2015 事業年度起提供
pub const FIRST_SUPPORTED_YEAR: i32 = 2015;

/// 未指定事業年度時取前一年 (最近一份完整的年報)
pub fn default_business_year() -> i32 {
    chrono::Local::now().year() - 1
}

/// CLI 與 TOML 設定共用的檢查
pub fn validate_provider<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_api_key("api_key", config.api_key())?;
    validate_url("api_base_url", config.api_base_url())?;
    validate_path("output_path", config.output_path())?;
    validate_range(
        "bsns_year",
        config.bsns_year(),
        FIRST_SUPPORTED_YEAR,
        chrono::Local::now().year(),
    )?;
    validate_corp_codes("corp_codes", config.corp_codes())?;

    if let Some(max) = config.max_corporations() {
        validate_positive_number("max_corporations", max, 1)?;
    }

    if config.output_formats().is_empty() {
        return Err(EtlError::MissingConfigError {
            field: "output_formats".to_string(),
        });
    }

    if let Some(archive) = config.archive_name() {
        validate_non_empty_string("archive", archive)?;
        if !archive.to_ascii_lowercase().ends_with(".zip") {
            return Err(EtlError::InvalidConfigValueError {
                field: "archive".to_string(),
                value: archive.to_string(),
                reason: "Archive file name must end with .zip".to_string(),
            });
        }
    }

    if config.request_policy().timeout.is_zero() {
        return Err(EtlError::InvalidConfigValueError {
            field: "timeout_seconds".to_string(),
            value: "0".to_string(),
            reason: "Timeout must be at least one second".to_string(),
        });
    }

    Ok(())
}

#[cfg(feature = "cli")]
pub use cli::CliConfig;

#[cfg(feature = "cli")]
mod cli {
    use super::*;
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Serialize, Deserialize, Parser)]
    #[command(name = "kospi-exec-etl")]
    #[command(about = "Collect executive and compensation disclosures of KOSPI corporations from OPENDART")]
    pub struct CliConfig {
        /// OPENDART API key (40 characters)
        #[arg(long, env = "OPENDART_API_KEY", hide_env_values = true, default_value = "")]
        #[serde(skip_serializing, default)]
        pub api_key: String,

        #[arg(long, default_value = DEFAULT_BASE_URL)]
        pub api_base_url: String,

        #[arg(long, default_value = "./data")]
        pub output_path: String,

        /// Business year; defaults to the previous calendar year
        #[arg(long)]
        pub bsns_year: Option<i32>,

        /// 11011|11012|11013|11014 or annual|half|q1|q3
        #[arg(long, default_value = "annual")]
        pub report_code: ReportCode,

        /// Y|K|N|E or KOSPI|KOSDAQ|KONEX|OTHER
        #[arg(long, default_value = "KOSPI")]
        pub market: CorpClass,

        /// Restrict the run to these corporation codes
        #[arg(long, value_delimiter = ',')]
        pub corp_codes: Vec<String>,

        #[arg(long)]
        pub max_corporations: Option<usize>,

        /// Skip the executive share-holding reports (elestock)
        #[arg(long)]
        pub skip_holdings: bool,

        #[arg(long, value_delimiter = ',', default_value = "csv")]
        pub output_formats: Vec<OutputFormat>,

        /// Bundle every output into this ZIP file
        #[arg(long)]
        pub archive: Option<String>,

        #[arg(long, default_value = "30")]
        pub timeout_seconds: u64,

        #[arg(long, default_value = "3")]
        pub retry_attempts: u32,

        #[arg(long, default_value = "2")]
        pub retry_delay_seconds: u64,

        /// Minimum interval between API requests
        #[arg(long, default_value = "700")]
        pub request_delay_ms: u64,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log process CPU and memory after each phase")]
        pub monitor: bool,

        #[arg(long, help = "Emit logs as JSON lines")]
        pub json_logs: bool,
    }

    // API 金鑰不可出現在日誌
    impl std::fmt::Debug for CliConfig {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("CliConfig")
                .field("api_key", &crate::utils::validation::mask_secret(&self.api_key))
                .field("api_base_url", &self.api_base_url)
                .field("output_path", &self.output_path)
                .field("bsns_year", &self.bsns_year())
                .field("report_code", &self.report_code)
                .field("market", &self.market)
                .field("corp_codes", &self.corp_codes)
                .field("max_corporations", &self.max_corporations)
                .field("skip_holdings", &self.skip_holdings)
                .field("output_formats", &self.output_formats)
                .field("archive", &self.archive)
                .finish_non_exhaustive()
        }
    }

    impl ConfigProvider for CliConfig {
        fn api_key(&self) -> &str {
            &self.api_key
        }

        fn api_base_url(&self) -> &str {
            &self.api_base_url
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn bsns_year(&self) -> i32 {
            self.bsns_year.unwrap_or_else(default_business_year)
        }

        fn report_code(&self) -> ReportCode {
            self.report_code
        }

        fn market(&self) -> CorpClass {
            self.market
        }

        fn corp_codes(&self) -> &[String] {
            &self.corp_codes
        }

        fn max_corporations(&self) -> Option<usize> {
            self.max_corporations
        }

        fn include_holdings(&self) -> bool {
            !self.skip_holdings
        }

        fn output_formats(&self) -> &[OutputFormat] {
            &self.output_formats
        }

        fn archive_name(&self) -> Option<&str> {
            self.archive.as_deref()
        }

        fn request_policy(&self) -> RequestPolicy {
            RequestPolicy {
                timeout: Duration::from_secs(self.timeout_seconds),
                retry_attempts: self.retry_attempts,
                retry_delay: Duration::from_secs(self.retry_delay_seconds),
                min_interval: Duration::from_millis(self.request_delay_ms),
            }
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_provider(self)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn parse(args: &[&str]) -> CliConfig {
            let mut argv = vec!["kospi-exec-etl"];
            argv.extend_from_slice(args);
            CliConfig::try_parse_from(argv).unwrap()
        }

        fn key_arg() -> String {
            "k".repeat(40)
        }

        #[test]
        fn test_defaults() {
            let key = key_arg();
            let config = parse(&["--api-key", &key]);
            assert_eq!(config.report_code(), ReportCode::Annual);
            assert_eq!(config.market(), CorpClass::Kospi);
            assert_eq!(config.output_formats(), &[OutputFormat::Csv]);
            assert_eq!(config.bsns_year(), default_business_year());
            assert_eq!(config.request_policy().min_interval, Duration::from_millis(700));
            assert!(config.include_holdings());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_explicit_arguments() {
            let key = key_arg();
            let config = parse(&[
                "--api-key",
                &key,
                "--bsns-year",
                "2022",
                "--report-code",
                "q3",
                "--market",
                "Y",
                "--corp-codes",
                "00126380,00164779",
                "--output-formats",
                "csv,json",
                "--archive",
                "kospi.zip",
                "--skip-holdings",
            ]);
            assert_eq!(config.bsns_year(), 2022);
            assert_eq!(config.report_code().code(), "11014");
            assert_eq!(config.corp_codes().len(), 2);
            assert_eq!(
                config.output_formats(),
                &[OutputFormat::Csv, OutputFormat::Json]
            );
            assert_eq!(config.archive_name(), Some("kospi.zip"));
            assert!(!config.include_holdings());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_corp_codes_with_spaces_accepted() {
            let key = key_arg();
            let config = parse(&["--api-key", &key, "--corp-codes", "00126380, 00164779"]);
            assert_eq!(config.corp_codes().len(), 2);
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_invalid_values_rejected() {
            let key = key_arg();
            assert!(CliConfig::try_parse_from(["kospi-exec-etl", "--report-code", "11099"]).is_err());

            let config = parse(&["--api-key", &key, "--bsns-year", "2010"]);
            assert!(config.validate().is_err());

            let config = parse(&["--api-key", &key, "--archive", "out.tar"]);
            assert!(config.validate().is_err());

            let config = parse(&["--api-key", &key, "--corp-codes", "005930"]);
            assert!(config.validate().is_err());
        }

        #[test]
        fn test_debug_masks_api_key() {
            let key = key_arg();
            let config = parse(&["--api-key", &key]);
            let debug = format!("{:?}", config);
            assert!(!debug.contains(&key));
            assert!(debug.contains("kkkk****"));
        }
    }
}
