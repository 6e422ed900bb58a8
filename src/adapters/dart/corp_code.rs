use crate::domain::model::CorpCode;
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// 解析 corpCode.xml 回傳的 ZIP，取出其中的 CORPCODE.xml
pub fn parse_corp_code_archive(body: &[u8]) -> Result<Vec<CorpCode>> {
    // 金鑰錯誤時 OPENDART 回傳的是錯誤文件而不是 ZIP
    if !body.starts_with(b"PK") {
        return Err(error_from_document(body));
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(body))?;
    let entry_name = archive
        .file_names()
        .find(|name| name.to_ascii_lowercase().ends_with(".xml"))
        .map(str::to_string)
        .ok_or_else(|| EtlError::CorpCodeParseError {
            message: "archive does not contain an XML file".to_string(),
        })?;

    let mut xml = String::new();
    archive.by_name(&entry_name)?.read_to_string(&mut xml)?;
    tracing::debug!("📦 Extracted {} ({} bytes)", entry_name, xml.len());

    parse_corp_code_xml(&xml)
}

pub fn parse_corp_code_xml(xml: &str) -> Result<Vec<CorpCode>> {
    let block_re = Regex::new(r"(?s)<list>(.*?)</list>").map_err(regex_error)?;
    let leaf_re = Regex::new(r"<([A-Za-z_]+)>([^<]*)</([A-Za-z_]+)>").map_err(regex_error)?;

    let corps: Vec<CorpCode> = block_re
        .captures_iter(xml)
        .map(|block| {
            let fields: HashMap<&str, String> = leaf_re
                .captures_iter(&block[1])
                .filter(|leaf| leaf[1] == leaf[3])
                .filter_map(|leaf| {
                    let name = leaf.get(1)?.as_str();
                    Some((name, unescape_xml(leaf[2].trim())))
                })
                .collect();
            let field = |name: &str| fields.get(name).cloned().unwrap_or_default();

            CorpCode {
                corp_code: field("corp_code"),
                corp_name: field("corp_name"),
                corp_eng_name: field("corp_eng_name"),
                stock_code: field("stock_code"),
                modify_date: field("modify_date"),
            }
        })
        .collect();

    if corps.is_empty() {
        return Err(EtlError::CorpCodeParseError {
            message: "no <list> entries found in CORPCODE.xml".to_string(),
        });
    }

    Ok(corps)
}

/// 將 OPENDART 的錯誤回應 (JSON 或 XML) 轉為 DartApiError
pub fn error_from_document(body: &[u8]) -> EtlError {
    let text = String::from_utf8_lossy(body);

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
        if let Some(status) = value.get("status").and_then(|s| s.as_str()) {
            let message = value
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or_default();
            return EtlError::dart(status, message);
        }
    }

    let tag = |name: &str| -> Option<String> {
        let re = Regex::new(&format!(r"<{0}>([^<]*)</{0}>", name)).ok()?;
        re.captures(&text).map(|c| unescape_xml(c[1].trim()))
    };

    match tag("status") {
        Some(status) => EtlError::dart(status, tag("message").unwrap_or_default()),
        None => EtlError::CorpCodeParseError {
            message: format!(
                "expected a ZIP archive, got {} bytes starting with {:?}",
                body.len(),
                text.chars().take(40).collect::<String>()
            ),
        },
    }
}

fn regex_error(e: regex::Error) -> EtlError {
    EtlError::processing(format!("invalid pattern: {}", e))
}

fn unescape_xml(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => out.push(c),
            None => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    out
}
