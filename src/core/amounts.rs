// 揭露資料的金額與日期皆為字串，例如 "1,234,000,000"、"-"、"(1,000)"、"2023.12.31"。

/// 解析金額；空值、"-" 與無法解析的內容回傳 `None`
pub fn parse_amount(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }

    // 會計表的負數以括號表示
    let (negative, digits) = match cleaned
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };

    let value = digits
        .parse::<i64>()
        .ok()
        .or_else(|| digits.parse::<f64>().ok().map(|v| v.round() as i64))?;

    Some(if negative { -value } else { value })
}

pub fn parse_count(raw: &str) -> Option<u32> {
    parse_amount(raw).and_then(|v| u32::try_from(v).ok())
}

/// 比對姓名時忽略空白
pub fn normalize_name(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// "2023.12.31"、"2023-12-31"、"2023년 12월 31일" → "20231231"
pub fn date_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234,000,000"), Some(1_234_000_000));
        assert_eq!(parse_amount(" 42 "), Some(42));
        assert_eq!(parse_amount("(1,000)"), Some(-1000));
        assert_eq!(parse_amount("-1,500"), Some(-1500));
        assert_eq!(parse_amount("12.6"), Some(13));
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("해당없음"), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("11"), Some(11));
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count("-"), None);
    }

    #[test]
    fn test_normalize_name_and_dates() {
        assert_eq!(normalize_name("이 재 용"), "이재용");
        assert_eq!(date_digits("2023.12.31"), "20231231");
        assert_eq!(date_digits("2023년 12월 31일"), "20231231");
    }
}
