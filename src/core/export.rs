use crate::domain::model::{CompanyInfo, CorpCode, CorporationSummary, ExecutiveRecord};
use crate::domain::ports::OutputFormat;
use crate::utils::error::{EtlError, Result};
use serde::Serialize;

/// 可輸出成表格的列型別。表頭獨立定義，空表也能輸出表頭。
pub trait TableRow: Serialize {
    const HEADERS: &'static [&'static str];
}

impl TableRow for ExecutiveRecord {
    const HEADERS: &'static [&'static str] = &[
        "corp_code",
        "corp_name",
        "bsns_year",
        "reprt_code",
        "rcept_no",
        "name",
        "gender",
        "birth_ym",
        "position",
        "registration",
        "full_time",
        "board_role",
        "responsibilities",
        "largest_shareholder_relation",
        "employment_period",
        "term_expiration",
        "audit_committee_member",
        "auditor",
        "salary_amount",
        "salary_source",
        "salary_type",
        "shares_owned",
        "education",
        "work_experience",
    ];
}

impl TableRow for CorporationSummary {
    const HEADERS: &'static [&'static str] = &[
        "corp_code",
        "corp_name",
        "stock_code",
        "bsns_year",
        "reprt_code",
        "registered_executive_count",
        "total_director_count",
        "inside_director_count",
        "outside_director_count",
        "other_non_executive_director_count",
        "audit_committee_member_count",
        "auditor_count",
        "voting_male_count",
        "voting_female_count",
        "non_registered_executive_count",
        "total_assets_current",
        "total_assets_prior",
        "total_assets_two_prior",
        "rcept_no",
    ];
}

impl TableRow for CorpCode {
    const HEADERS: &'static [&'static str] = &[
        "corp_code",
        "corp_name",
        "corp_eng_name",
        "stock_code",
        "modify_date",
    ];
}

impl TableRow for CompanyInfo {
    const HEADERS: &'static [&'static str] = &[
        "corp_code",
        "corp_name",
        "corp_eng_name",
        "stock_code",
        "ceo_name",
        "corp_cls",
        "industry_code",
        "established_date",
        "ir_url",
        "homepage",
        "corp_reg_number",
        "business_no",
        "fiscal_month",
    ];
}

pub fn encode_table<T: TableRow>(rows: &[T], format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Csv => encode_delimited(rows, b','),
        OutputFormat::Tsv => encode_delimited(rows, b'\t'),
        OutputFormat::Json => Ok(serde_json::to_vec_pretty(rows)?),
    }
}

fn encode_delimited<T: TableRow>(rows: &[T], delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(T::HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::processing(format!("failed to flush table: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{BoardRole, SalarySource, SalaryType};

    fn executive() -> ExecutiveRecord {
        ExecutiveRecord {
            corp_code: "00126380".to_string(),
            corp_name: "삼성전자".to_string(),
            bsns_year: 2023,
            reprt_code: "11011".to_string(),
            rcept_no: "20240312000736".to_string(),
            name: "한종희".to_string(),
            gender: "남".to_string(),
            birth_ym: "1962년 03월".to_string(),
            position: "대표이사".to_string(),
            registration: "사내이사".to_string(),
            full_time: "상근".to_string(),
            board_role: BoardRole::InsideDirector,
            responsibilities: "DX부문장, 경영전반 총괄".to_string(),
            largest_shareholder_relation: "계열회사 임원".to_string(),
            employment_period: "35년".to_string(),
            term_expiration: "2025년 03월 15일".to_string(),
            audit_committee_member: false,
            auditor: false,
            salary_amount: Some(5_150_000_000),
            salary_source: Some(SalarySource::IndividualDisclosure),
            salary_type: Some(SalaryType::Total),
            shares_owned: None,
            education: "인하대 전자공학 학사".to_string(),
            work_experience: "삼성전자 VD사업부장".to_string(),
        }
    }

    fn serde_header<T: Serialize>(row: &T) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(row).unwrap();
        let bytes = writer.into_inner().unwrap();
        String::from_utf8(bytes).unwrap().lines().next().unwrap().to_string()
    }

    #[test]
    fn test_headers_match_serialized_fields() {
        assert_eq!(serde_header(&executive()), ExecutiveRecord::HEADERS.join(","));
        assert_eq!(
            serde_header(&CompanyInfo::default()),
            CompanyInfo::HEADERS.join(",")
        );
        assert_eq!(serde_header(&CorpCode::default()), CorpCode::HEADERS.join(","));
    }

    #[test]
    fn test_csv_row_values() {
        let bytes = encode_table(&[executive()], OutputFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("inside_director"));
        assert!(lines[1].contains("individual_disclosure"));
        assert!(lines[1].contains("5150000000"));
        assert!(lines[1].contains("\"DX부문장, 경영전반 총괄\""));
        // 持股數缺值時輸出空欄位
        assert!(lines[1].contains(",total,,인하대"));
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let rows: Vec<CorporationSummary> = Vec::new();
        let bytes = encode_table(&rows, OutputFormat::Tsv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.trim_end(), CorporationSummary::HEADERS.join("\t"));
    }

    #[test]
    fn test_json_output() {
        let bytes = encode_table(&[executive()], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value[0]["salary_source"], "individual_disclosure");
        assert_eq!(value[0]["shares_owned"], serde_json::Value::Null);
    }
}
