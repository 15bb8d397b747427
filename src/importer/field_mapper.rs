// ==========================================
// 开票与订单管理系统 - 字段映射器实现
// ==========================================
// 职责: 标准字段 → 列号 的映射结构 + 基于表头名的映射
// 约束: 同一映射内一个列号至多分配给一个字段
// ==========================================

use crate::domain::customer::ParsedCustomerRecord;
use crate::domain::types::CanonicalField;
use crate::importer::data_cleaner::{clean_pincode, normalize_header};
use crate::importer::field_schema::FieldSchema;
use crate::importer::importer_trait::HeaderMapper;
use crate::importer::raw_table::RawTable;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// 映射来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MappingOrigin {
    /// 按表头同义词匹配
    Header,
    /// 固定列布局快速通道
    FixedLayout,
    /// 按内容特征推断
    Heuristic,
    /// 用户在映射助手中指定
    Manual,
}

// ==========================================
// FieldMapping - 标准字段 → 列号
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    origin: MappingOrigin,
    /// 按分配顺序保存
    columns: Vec<(CanonicalField, usize)>,
}

impl FieldMapping {
    pub fn new(origin: MappingOrigin) -> Self {
        Self {
            origin,
            columns: Vec::new(),
        }
    }

    /// 分配字段到列
    ///
    /// 字段或列已被占用时拒绝并返回 false。
    pub fn assign(&mut self, field: CanonicalField, column: usize) -> bool {
        if self.column_of(field).is_some() || self.field_at(column).is_some() {
            return false;
        }
        self.columns.push((field, column));
        true
    }

    pub fn origin(&self) -> MappingOrigin {
        self.origin
    }

    pub fn column_of(&self, field: CanonicalField) -> Option<usize> {
        self.columns
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, c)| *c)
    }

    pub fn field_at(&self, column: usize) -> Option<CanonicalField> {
        self.columns
            .iter()
            .find(|(_, c)| *c == column)
            .map(|(f, _)| *f)
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.column_of(field).is_some()
    }

    pub fn has_any(&self, fields: &[CanonicalField]) -> bool {
        fields.iter().any(|f| self.contains(*f))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, usize)> + '_ {
        self.columns.iter().copied()
    }

    /// 从一行数据提取客户记录（去空白；邮编清洗；空值视为缺失）
    pub fn extract(&self, row: &[String]) -> ParsedCustomerRecord {
        let mut record = ParsedCustomerRecord::new();
        for (field, column) in self.iter() {
            let raw = row.get(column).map(String::as_str).unwrap_or("").trim();
            let value = match field {
                CanonicalField::Pincode => clean_pincode(raw),
                _ => raw.to_string(),
            };
            record.set(field, value);
        }
        record
    }
}

// ==========================================
// HeaderFieldMapper - 表头映射
// ==========================================
/// 基于表头同义词的映射器
///
/// 首行为表头，第二行为数据行。每个字段依次尝试其同义词，
/// 取第一个在数据行中有值的列。
pub struct HeaderFieldMapper;

impl HeaderFieldMapper {
    /// 构建 规范化表头 → 列号 查找表（重复表头取第一次出现）
    pub fn header_lookup(header_row: &[String]) -> HashMap<String, usize> {
        let mut lookup = HashMap::new();
        for (idx, cell) in header_row.iter().enumerate() {
            lookup.entry(normalize_header(cell)).or_insert(idx);
        }
        lookup
    }

    /// 仅凭表头名建立映射（不看数据值），供映射助手预填
    pub fn map_header_names(schema: &FieldSchema, header_row: &[String]) -> FieldMapping {
        let lookup = Self::header_lookup(header_row);
        let mut mapping = FieldMapping::new(MappingOrigin::Header);
        for spec in schema.fields() {
            if let Some(idx) = spec.synonyms.iter().find_map(|key| lookup.get(key)) {
                mapping.assign(spec.field, *idx);
            }
        }
        mapping
    }
}

impl HeaderMapper for HeaderFieldMapper {
    fn map_headers(&self, schema: &FieldSchema, table: &RawTable) -> Option<FieldMapping> {
        let header_row = table.first_row()?;
        // 只有表头没有数据行
        let data_row = table.row(1)?;
        let lookup = Self::header_lookup(header_row);

        let mut mapping = FieldMapping::new(MappingOrigin::Header);
        for spec in schema.fields() {
            let hit = spec.synonyms.iter().find_map(|key| {
                lookup.get(key).copied().filter(|idx| {
                    data_row
                        .get(*idx)
                        .map(|v| !v.trim().is_empty())
                        .unwrap_or(false)
                })
            });
            if let Some(idx) = hit {
                mapping.assign(spec.field, idx);
            }
        }

        debug!(mapped = mapping.len(), "表头映射完成");
        Some(mapping)
    }
}
