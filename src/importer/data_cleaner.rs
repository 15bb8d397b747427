// ==========================================
// 开票与订单管理系统 - 数据清洗器实现
// ==========================================
// 职责: 表头规范化 / 邮编清洗 / NULL 标准化 / 宽松日期解析
// 约束: 纯函数，无内部状态
// ==========================================

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

/// 邮编位数
pub const PINCODE_LEN: usize = 6;

static HEADER_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s/]+").expect("表头分隔符正则非法"));

/// 规范化表头：去首尾空白 → 小写 → 连续空白或 `/` 折叠为 `_`
pub fn normalize_header(value: &str) -> String {
    let lower = value.trim().to_lowercase();
    HEADER_SEPARATORS.replace_all(&lower, "_").into_owned()
}

/// 仅保留数字字符
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// 清洗邮编：去除非数字字符，最多保留 6 位
///
/// "400 053" / "400-053" → "400053"
pub fn clean_pincode(value: &str) -> String {
    digits_only(value).chars().take(PINCODE_LEN).collect()
}

/// 标准化 NULL 值（空字符串/空白 → None）
pub fn normalize_null(value: Option<&str>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// 带时间的常见格式
const DATETIME_FORMATS: [&str; 7] = [
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m-%d-%Y %H:%M:%S",
];

/// 纯日期的常见格式
const DATE_FORMATS: [&str; 10] = [
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%B %d %Y",
];

/// 宽松日期解析（表单导出的时间戳 / ISO / 英文月份）
///
/// 斜杠日期按 月/日/年 解释。
pub fn parse_loose_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  First Name "), "first_name");
        assert_eq!(
            normalize_header("Building/House/Apartment Name"),
            "building_house_apartment_name"
        );
        assert_eq!(
            normalize_header("Any Delivery Instructions/Notes"),
            "any_delivery_instructions_notes"
        );
        assert_eq!(normalize_header("E-Mail"), "e-mail");
        assert_eq!(normalize_header("Phone \t / Mobile"), "phone_mobile");
    }

    #[test]
    fn test_clean_pincode() {
        assert_eq!(clean_pincode("400 053"), "400053");
        assert_eq!(clean_pincode("400-053"), "400053");
        assert_eq!(clean_pincode("4000531"), "400053");
        assert_eq!(clean_pincode("PIN: 110001"), "110001");
        assert_eq!(clean_pincode("abc"), "");
    }

    #[test]
    fn test_normalize_null() {
        assert_eq!(normalize_null(Some("  ")), None);
        assert_eq!(normalize_null(None), None);
        assert_eq!(normalize_null(Some(" x ")), Some("x".to_string()));
    }

    #[test]
    fn test_parse_loose_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 12, 26);
        assert_eq!(parse_loose_date("12/26/2024 10:30:00"), expected);
        assert_eq!(parse_loose_date("12/26/2024"), expected);
        assert_eq!(parse_loose_date("2024-12-26"), expected);
        assert_eq!(parse_loose_date("2024-12-26T10:30:00Z"), expected);
        assert_eq!(parse_loose_date("26 Dec 2024"), expected);
        assert_eq!(parse_loose_date("Rahul"), None);
        assert_eq!(parse_loose_date("9876543210"), None);
    }
}
