//! 對單一公司呼叫每個 OPENDART 端點並印出原始 JSON，用來檢查欄位格式

use clap::Parser;
use kospi_exec_etl::adapters::dart::client::{endpoints, report_params};
use kospi_exec_etl::core::DisclosureApi;
use kospi_exec_etl::domain::model::ReportCode;
use kospi_exec_etl::domain::ports::RequestPolicy;
use kospi_exec_etl::utils::error::Result;
use kospi_exec_etl::utils::logger;
use kospi_exec_etl::utils::validation::validate_api_key;
use kospi_exec_etl::DartClient;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "dart-probe")]
#[command(about = "Print the raw OPENDART responses for one corporation")]
struct Args {
    /// 8-digit OPENDART corporation code
    #[arg(long, default_value = "00126380")]
    corp_code: String,

    #[arg(long, env = "OPENDART_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, default_value = kospi_exec_etl::adapters::dart::DEFAULT_BASE_URL)]
    api_base_url: String,

    #[arg(long)]
    bsns_year: Option<i32>,

    #[arg(long, default_value = "annual")]
    report_code: ReportCode,

    /// Also download corpCode.xml and print the matching entry
    #[arg(long)]
    corp_list: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    validate_api_key("api_key", &args.api_key)?;

    let year = args
        .bsns_year
        .unwrap_or_else(kospi_exec_etl::config::default_business_year);
    let policy = RequestPolicy {
        retry_attempts: 1,
        min_interval: Duration::from_millis(700),
        ..RequestPolicy::default()
    };
    let client = DartClient::new(args.api_key.clone(), args.api_base_url.clone(), policy)?;

    println!(
        "🚀 Probing OPENDART for {} ({} / {})",
        args.corp_code,
        year,
        args.report_code.code()
    );

    if args.corp_list {
        let corps = client.corp_codes().await?;
        println!("📋 corpCode.xml: {} entries", corps.len());
        match corps.iter().find(|corp| corp.corp_code == args.corp_code) {
            Some(corp) => println!("{}", serde_json::to_string_pretty(corp)?),
            None => println!("⚠️ {} not found in corpCode.xml", args.corp_code),
        }
    }

    let company_params = [("corp_code", args.corp_code.clone())];
    print_response(&client, endpoints::COMPANY, &company_params).await;
    print_response(&client, endpoints::HOLDINGS, &company_params).await;

    let params = report_params(&args.corp_code, year, args.report_code);
    for endpoint in [
        endpoints::EXECUTIVES,
        endpoints::INDIVIDUAL_PAY,
        endpoints::TOP_PAY,
        endpoints::AGGREGATE_PAY,
        endpoints::UNREGISTERED_PAY,
        endpoints::OUTSIDE_DIRECTORS,
        endpoints::MAJOR_ACCOUNTS,
    ] {
        print_response(&client, endpoint, &params).await;
    }

    println!("✅ Probe complete");
    Ok(())
}

async fn print_response(client: &DartClient, endpoint: &str, params: &[(&str, String)]) {
    println!();
    println!("📡 {}", endpoint);
    match client.fetch_json(endpoint, params).await {
        Ok(Some(value)) => match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(e) => println!("❌ {}", e),
        },
        Ok(None) => println!("📭 no data (013)"),
        Err(e) => {
            println!("❌ {}", e.user_friendly_message());
            println!("💡 {}", e.recovery_suggestion());
        }
    }
}
