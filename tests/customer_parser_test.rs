// ==========================================
// 客户数据解析器集成测试
// ==========================================
// 测试目标: 表头通道 / 固定布局 / 启发式通道 / 空输入 / 无结果
// ==========================================

mod test_helpers;

use std::sync::Arc;

use invoice_genie::importer::{
    is_phone, CustomerDataParser, FieldSchema, ImportError, ParseAttempt, ParseSource,
};
use invoice_genie::logging;
use invoice_genie::CanonicalField;
use proptest::prelude::*;

fn parser() -> CustomerDataParser {
    logging::init_test();
    CustomerDataParser::default()
}

// ==========================================
// 错误与无结果
// ==========================================

#[test]
fn test_blank_input_is_empty_input_error() {
    let parser = parser();
    assert!(matches!(parser.parse(""), Err(ImportError::EmptyInput)));
    assert!(matches!(parser.parse("   "), Err(ImportError::EmptyInput)));
    assert!(matches!(parser.raw_columns("\n\t\n"), Err(ImportError::EmptyInput)));
}

#[test]
fn test_random_text_yields_no_record() {
    let parser = parser();
    let outcome = parser
        .parse_with_outcome("just some random text without email or phone")
        .unwrap();
    assert!(outcome.record.is_none());
    assert!(outcome.source.is_none());
    assert_eq!(outcome.attempts.last(), Some(&ParseAttempt::HeuristicLowConfidence));
}

// ==========================================
// 表头通道
// ==========================================

#[test]
fn test_form_export_with_header() {
    let parser = parser();
    let outcome = parser
        .parse_with_outcome(test_helpers::FORM_EXPORT_SAMPLE)
        .unwrap();
    assert_eq!(outcome.source, Some(ParseSource::Header));

    let record = outcome.record.unwrap();
    assert_eq!(record.get(CanonicalField::FirstName), Some("Rahul"));
    assert_eq!(record.get(CanonicalField::LastName), Some("Sharma"));
    assert_eq!(record.get(CanonicalField::Email), Some("rahul.sharma@email.com"));
    assert_eq!(record.get(CanonicalField::Phone), Some("9876543210"));
    assert_eq!(record.get(CanonicalField::Pincode), Some("400053"));
    assert_eq!(record.get(CanonicalField::Timestamp), Some("12/26/2024 10:30:00"));
    assert_eq!(
        record.get(CanonicalField::DeliveryNotes),
        Some("Please call before delivery")
    );
}

#[test]
fn test_header_pincode_is_normalized() {
    let parser = parser();
    for raw in ["400 053", "400-053"] {
        let text = format!("Name\tPhone\tPincode\nAsha\t9876543210\t{}", raw);
        let record = parser.parse(&text).unwrap().unwrap();
        assert_eq!(record.get(CanonicalField::Pincode), Some("400053"));
    }
}

#[test]
fn test_header_synonyms_and_value_fallthrough() {
    let parser = parser();
    // email 列为空时取 e-mail 列
    let text = "first,email,e-mail,mobile,town\nMeera,,meera@example.com,+91 98200 12345,Nagpur";
    let record = parser.parse(text).unwrap().unwrap();
    assert_eq!(record.get(CanonicalField::FirstName), Some("Meera"));
    assert_eq!(record.get(CanonicalField::Email), Some("meera@example.com"));
    assert_eq!(record.get(CanonicalField::Phone), Some("+91 98200 12345"));
    assert_eq!(record.get(CanonicalField::City), Some("Nagpur"));
}

#[test]
fn test_header_without_anchor_falls_back_to_heuristic() {
    let parser = parser();
    let outcome = parser
        .parse_with_outcome("City,State\nPune,Maharashtra")
        .unwrap();
    assert_eq!(outcome.attempts[0], ParseAttempt::HeaderParseInsufficient);
    // 启发式通道只看首行（表头），无锚点且不足 3 个字段
    assert!(outcome.record.is_none());
}

// ==========================================
// 启发式通道
// ==========================================

#[test]
fn test_headerless_tab_sample() {
    let parser = parser();
    let outcome = parser
        .parse_with_outcome(test_helpers::HEADERLESS_TAB_SAMPLE)
        .unwrap();
    assert_eq!(outcome.source, Some(ParseSource::FixedLayout));

    let record = outcome.record.unwrap();
    assert_eq!(record.get(CanonicalField::Email), Some("test@test.com"));
    assert_eq!(record.get(CanonicalField::Phone), Some("9998887776"));
    assert_eq!(record.get(CanonicalField::Pincode), Some("500001"));
    assert_eq!(record.get(CanonicalField::FirstName), Some("Unknown"));
}

#[test]
fn test_short_headerless_row_uses_content_detection() {
    let parser = parser();
    let outcome = parser
        .parse_with_outcome("Kiran\tkiran@example.org\t411001\t98230 11223")
        .unwrap();
    assert_eq!(outcome.source, Some(ParseSource::Heuristic));

    let record = outcome.record.unwrap();
    assert_eq!(record.get(CanonicalField::Email), Some("kiran@example.org"));
    assert_eq!(record.get(CanonicalField::Phone), Some("98230 11223"));
    assert_eq!(record.get(CanonicalField::Pincode), Some("411001"));
    assert_eq!(record.get(CanonicalField::FirstName), Some("Kiran"));
}

#[test]
fn test_phone_predicate_rejects_dates() {
    assert!(!is_phone("12/26/2024"));
    assert!(!is_phone("2024-12-26 10:30:00"));
    assert!(is_phone("+91 98765-43210"));
}

// ==========================================
// 自定义字段配置
// ==========================================

#[test]
fn test_custom_synonyms_are_honoured() {
    let schema = FieldSchema::default().with_synonyms(CanonicalField::FirstName, &["customer"]);
    let parser = CustomerDataParser::new(Arc::new(schema));

    let record = parser.parse("Customer,City\nAsha,Pune").unwrap().unwrap();
    assert_eq!(record.get(CanonicalField::FirstName), Some("Asha"));
}

// ==========================================
// 性质测试
// ==========================================

proptest! {
    #[test]
    fn prop_parse_is_deterministic(text in "[ -~\t\n]{0,120}") {
        let parser = CustomerDataParser::default();
        let first = parser.parse(&text).ok();
        let second = parser.parse(&text).ok();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_headered_email_is_recovered(local in "[a-z]{1,10}", domain in "[a-z]{2,10}") {
        let email = format!("{}@{}.com", local, domain);
        let text = format!("Email,City\n{},Pune", email);
        let record = CustomerDataParser::default().parse(&text).unwrap().unwrap();
        prop_assert_eq!(record.get(CanonicalField::Email), Some(email.as_str()));
    }
}
