// ==========================================
// 开票与订单管理系统 - 字段映射配置
// ==========================================
// 职责: 标准字段的显示标签、表头同义词、表头关键词、固定列布局
// 约束: 构造后不可变，由解析器在创建时持有
//       （测试可注入自定义同义词表）
// ==========================================

use crate::domain::types::CanonicalField;
use crate::importer::data_cleaner::normalize_header;

// ==========================================
// FieldSpec - 单个字段的配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: CanonicalField,
    /// 显示标签（映射助手生成表头时使用）
    pub label: String,
    /// 已规范化的同义词（按优先级排列）
    pub synonyms: Vec<String>,
}

// ==========================================
// FixedLayout - 固定列布局（快速通道）
// ==========================================
// 对应一种常用表单导出的列顺序：
// 时间戳, 名, 姓, 邮箱, 电话, 楼栋, 街道, 区域, 城市, 州, 邮编
// 仅当锚点列（邮箱/电话）内容吻合时才启用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedLayout {
    /// 启用所需的最少列数
    pub min_columns: usize,
    /// 邮箱锚点列
    pub email_column: usize,
    /// 电话锚点列
    pub phone_column: usize,
    /// 字段 → 列号
    pub columns: Vec<(CanonicalField, usize)>,
}

impl Default for FixedLayout {
    fn default() -> Self {
        Self {
            min_columns: 11,
            email_column: 3,
            phone_column: 4,
            columns: vec![
                (CanonicalField::Timestamp, 0),
                (CanonicalField::FirstName, 1),
                (CanonicalField::LastName, 2),
                (CanonicalField::Email, 3),
                (CanonicalField::Phone, 4),
                (CanonicalField::Building, 5),
                (CanonicalField::StreetAddress, 6),
                (CanonicalField::Locality, 7),
                (CanonicalField::City, 8),
                (CanonicalField::State, 9),
                (CanonicalField::Pincode, 10),
            ],
        }
    }
}

// ==========================================
// FieldSchema - 字段映射配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
    header_keywords: Vec<String>,
    fixed_layout: Option<FixedLayout>,
}

/// 默认同义词表（规范化前的原始写法）
const DEFAULT_SYNONYMS: [(CanonicalField, &str, &[&str]); 12] = [
    (CanonicalField::Timestamp, "Timestamp", &["timestamp", "date", "time"]),
    (CanonicalField::FirstName, "First Name", &["first_name", "firstname", "first"]),
    (CanonicalField::LastName, "Last Name", &["last_name", "lastname", "last"]),
    (CanonicalField::Email, "Email ID", &["email_id", "email", "emailid", "e-mail"]),
    (
        CanonicalField::Phone,
        "Phone Number",
        &["phone_number", "phone", "mobile", "contact", "phonenumber"],
    ),
    (
        CanonicalField::Building,
        "Building/House/Apartment Name",
        &["building_house_apartment_name", "building", "house", "apartment", "flat"],
    ),
    (
        CanonicalField::StreetAddress,
        "Street Address",
        &["street_address", "streetaddress", "street", "address"],
    ),
    (CanonicalField::Locality, "Locality", &["locality", "area", "neighborhood"]),
    (CanonicalField::City, "City", &["city", "town"]),
    (CanonicalField::State, "State", &["state", "province"]),
    (
        CanonicalField::Pincode,
        "Pincode",
        &["pincode", "zip", "zipcode", "postal_code", "postalcode"],
    ),
    (
        CanonicalField::DeliveryNotes,
        "Delivery Notes",
        &[
            "any_delivery_instructions_notes",
            "delivery_instructions",
            "notes",
            "instructions",
            "delivery_notes",
        ],
    ),
];

/// 默认表头关键词（首行小写后子串匹配）
const DEFAULT_HEADER_KEYWORDS: [&str; 8] =
    ["name", "email", "phone", "address", "city", "state", "zip", "pin"];

impl Default for FieldSchema {
    fn default() -> Self {
        let fields = DEFAULT_SYNONYMS
            .iter()
            .map(|(field, label, synonyms)| FieldSpec {
                field: *field,
                label: (*label).to_string(),
                synonyms: synonyms.iter().map(|s| normalize_header(s)).collect(),
            })
            .collect();

        Self {
            fields,
            header_keywords: DEFAULT_HEADER_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            fixed_layout: Some(FixedLayout::default()),
        }
    }
}

impl FieldSchema {
    /// 全部字段配置（声明顺序）
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn spec(&self, field: CanonicalField) -> Option<&FieldSpec> {
        self.fields.iter().find(|s| s.field == field)
    }

    /// 字段显示标签（未配置时退回字段键）
    pub fn label(&self, field: CanonicalField) -> &str {
        self.spec(field)
            .map(|s| s.label.as_str())
            .unwrap_or_else(|| field.key())
    }

    pub fn synonyms(&self, field: CanonicalField) -> &[String] {
        self.spec(field).map(|s| s.synonyms.as_slice()).unwrap_or(&[])
    }

    pub fn header_keywords(&self) -> &[String] {
        &self.header_keywords
    }

    pub fn fixed_layout(&self) -> Option<&FixedLayout> {
        self.fixed_layout.as_ref()
    }

    /// 判断首行是否像表头（包含任一关键词）
    pub fn looks_like_header(&self, first_line: &str) -> bool {
        let lower = first_line.to_lowercase();
        self.header_keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    // ===== 构建方法（测试替身 / 定制配置） =====

    /// 替换某字段的同义词列表
    pub fn with_synonyms<S: AsRef<str>>(mut self, field: CanonicalField, synonyms: &[S]) -> Self {
        let normalized: Vec<String> = synonyms.iter().map(|s| normalize_header(s.as_ref())).collect();
        match self.fields.iter_mut().find(|s| s.field == field) {
            Some(spec) => spec.synonyms = normalized,
            None => self.fields.push(FieldSpec {
                field,
                label: field.key().to_string(),
                synonyms: normalized,
            }),
        }
        self
    }

    pub fn with_header_keywords<S: AsRef<str>>(mut self, keywords: &[S]) -> Self {
        self.header_keywords = keywords.iter().map(|k| k.as_ref().to_lowercase()).collect();
        self
    }

    pub fn with_fixed_layout(mut self, layout: Option<FixedLayout>) -> Self {
        self.fixed_layout = layout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_covers_all_fields() {
        let schema = FieldSchema::default();
        for field in CanonicalField::ALL {
            assert!(!schema.synonyms(field).is_empty(), "{} 缺少同义词", field);
        }
    }

    #[test]
    fn test_labels_normalize_to_known_synonyms() {
        // 映射助手生成的表头必须能被解析器识别
        let schema = FieldSchema::default();
        for spec in schema.fields() {
            let normalized = normalize_header(&spec.label);
            assert!(
                spec.synonyms.contains(&normalized),
                "标签 {} 规范化后为 {}，不在同义词表中",
                spec.label,
                normalized
            );
        }
    }

    #[test]
    fn test_looks_like_header() {
        let schema = FieldSchema::default();
        assert!(schema.looks_like_header("Timestamp\tFirst Name\tLast Name"));
        assert!(schema.looks_like_header("PINCODE"));
        assert!(!schema.looks_like_header("12/26/2024\tRahul\t9876543210"));
    }

    #[test]
    fn test_with_synonyms_normalizes() {
        let schema = FieldSchema::default().with_synonyms(CanonicalField::Phone, &["Cell No"]);
        assert_eq!(schema.synonyms(CanonicalField::Phone), &["cell_no".to_string()]);
    }
}
