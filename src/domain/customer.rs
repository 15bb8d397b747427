// ==========================================
// 开票与订单管理系统 - 客户领域模型
// ==========================================
// ParsedCustomerRecord: 单次解析的瞬时结果（不落库）
// Customer: 客户档案实体（customers 表）
// ==========================================

use crate::domain::types::CanonicalField;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ParsedCustomerRecord - 解析结果
// ==========================================
/// 从一行数据中解析出的客户记录（可能只含部分字段）
///
/// 空字符串视为缺失，不会被写入记录。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedCustomerRecord {
    fields: BTreeMap<CanonicalField, String>,
}

impl ParsedCustomerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入字段值（去首尾空白；空值忽略）
    pub fn set(&mut self, field: CanonicalField, value: impl Into<String>) {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, trimmed.to_string());
        }
    }

    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// 读取字段值，缺失时返回空串
    pub fn value_or_empty(&self, field: CanonicalField) -> String {
        self.get(field).unwrap_or_default().to_string()
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.fields.contains_key(&field)
    }

    /// 是否包含任意一个给定字段
    pub fn has_any(&self, fields: &[CanonicalField]) -> bool {
        fields.iter().any(|f| self.contains(*f))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// 客户全名（名 + 姓）
    pub fn full_name(&self) -> String {
        [CanonicalField::FirstName, CanonicalField::LastName]
            .iter()
            .filter_map(|f| self.get(*f))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromIterator<(CanonicalField, String)> for ParsedCustomerRecord {
    fn from_iter<I: IntoIterator<Item = (CanonicalField, String)>>(iter: I) -> Self {
        let mut record = ParsedCustomerRecord::new();
        for (field, value) in iter {
            record.set(field, value);
        }
        record
    }
}

// ==========================================
// Customer - 客户档案
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,

    // 结构化地址
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,

    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Customer {
    /// 由解析结果生成客户档案（姓名缺失时退回邮箱/电话）
    pub fn from_record(record: &ParsedCustomerRecord) -> Self {
        let owned = |f: CanonicalField| record.get(f).map(str::to_string);

        let mut name = record.full_name();
        if name.is_empty() {
            name = owned(CanonicalField::Email)
                .or_else(|| owned(CanonicalField::Phone))
                .unwrap_or_default();
        }

        Self {
            id: None,
            name,
            email: owned(CanonicalField::Email),
            phone: owned(CanonicalField::Phone),
            building: owned(CanonicalField::Building),
            street_address: owned(CanonicalField::StreetAddress),
            locality: owned(CanonicalField::Locality),
            city: owned(CanonicalField::City),
            state: owned(CanonicalField::State),
            pincode: owned(CanonicalField::Pincode),
            tax_id: None,
            payment_terms: None,
            notes: owned(CanonicalField::DeliveryNotes),
            created_at: Some(Utc::now()),
        }
    }
}
