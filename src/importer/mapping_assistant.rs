// ==========================================
// 开票与订单管理系统 - 手动映射助手
// ==========================================
// 职责: 用户为每个标准字段选择列 → 重建带表头的规范文本
// 约束: 输出表头取自字段标签，可被解析器表头通道重新识别
// ==========================================

use crate::domain::types::CanonicalField;
use crate::importer::column_detector::HeuristicColumnDetector;
use crate::importer::customer_parser::HEADER_ACCEPT_FIELDS;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{FieldMapping, HeaderFieldMapper, MappingOrigin};
use crate::importer::field_schema::FieldSchema;
use crate::importer::importer_trait::ColumnDetector;
use crate::importer::raw_table::{write_delimited, Delimiter, RawTable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// 跳过标记（CLI / 前端传入）
const SKIP_TOKEN: &str = "skip";

// ==========================================
// ColumnChoice - 单个字段的列选择
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "index")]
pub enum ColumnChoice {
    Skip,
    Column(usize),
}

impl fmt::Display for ColumnChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnChoice::Skip => write!(f, "{}", SKIP_TOKEN),
            ColumnChoice::Column(idx) => write!(f, "{}", idx),
        }
    }
}

impl FromStr for ColumnChoice {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(SKIP_TOKEN) {
            return Ok(ColumnChoice::Skip);
        }
        trimmed
            .parse::<usize>()
            .map(ColumnChoice::Column)
            .map_err(|_| ImportError::InvalidMappingSpec(s.to_string()))
    }
}

// ==========================================
// ColumnMapping - 用户映射（保持声明顺序）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    entries: Vec<(CanonicalField, ColumnChoice)>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置字段的列选择；已存在时原位替换
    pub fn set(&mut self, field: CanonicalField, choice: ColumnChoice) -> &mut Self {
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = choice,
            None => self.entries.push((field, choice)),
        }
        self
    }

    pub fn assign(&mut self, field: CanonicalField, column: usize) -> &mut Self {
        self.set(field, ColumnChoice::Column(column))
    }

    pub fn skip(&mut self, field: CanonicalField) -> &mut Self {
        self.set(field, ColumnChoice::Skip)
    }

    pub fn choice(&self, field: CanonicalField) -> Option<ColumnChoice> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, c)| *c)
    }

    pub fn entries(&self) -> &[(CanonicalField, ColumnChoice)] {
        &self.entries
    }

    /// 非跳过的条目（声明顺序）
    pub fn mapped(&self) -> impl Iterator<Item = (CanonicalField, usize)> + '_ {
        self.entries.iter().filter_map(|(field, choice)| match choice {
            ColumnChoice::Column(idx) => Some((*field, *idx)),
            ColumnChoice::Skip => None,
        })
    }

    pub fn mapped_count(&self) -> usize {
        self.mapped().count()
    }

    /// 解析 `字段=列号` / `字段=skip` 列表
    ///
    /// 例: `["email=3", "phone=4", "city=skip"]`
    pub fn parse_specs<S: AsRef<str>>(specs: &[S]) -> ImportResult<Self> {
        let mut mapping = Self::new();
        for spec in specs {
            let spec = spec.as_ref();
            let (field, choice) = spec
                .split_once('=')
                .ok_or_else(|| ImportError::InvalidMappingSpec(spec.to_string()))?;
            let field = field
                .parse::<CanonicalField>()
                .map_err(ImportError::UnknownField)?;
            mapping.set(field, choice.parse()?);
        }
        Ok(mapping)
    }

    /// 由识别结果生成：配置中每个字段一条，未识别的字段为跳过
    pub fn from_field_mapping(schema: &FieldSchema, detected: &FieldMapping) -> Self {
        let mut mapping = Self::new();
        for spec in schema.fields() {
            match detected.column_of(spec.field) {
                Some(idx) => mapping.assign(spec.field, idx),
                None => mapping.skip(spec.field),
            };
        }
        mapping
    }
}

// ==========================================
// MappingAssistant
// ==========================================
pub struct MappingAssistant {
    schema: Arc<FieldSchema>,
}

impl MappingAssistant {
    pub fn new(schema: Arc<FieldSchema>) -> Self {
        Self { schema }
    }

    /// 按用户映射重建带表头的逗号分隔文本
    ///
    /// # 返回
    /// - Ok(String): 表头为字段标签，其后每个原始行一行
    /// - Err(NoFieldsMapped): 所有字段都被跳过
    /// - Err(NoAnchorFieldMapped): 邮箱/电话/名字均未映射，或首行中这些列全为空
    #[instrument(skip(self, table, mapping), fields(rows = table.len()))]
    pub fn apply(&self, table: &RawTable, mapping: &ColumnMapping) -> ImportResult<String> {
        let mapped: Vec<(CanonicalField, usize)> = mapping.mapped().collect();
        if mapped.is_empty() {
            return Err(ImportError::NoFieldsMapped);
        }
        let anchor_has_value = mapped.iter().any(|(field, col)| {
            HEADER_ACCEPT_FIELDS.contains(field) && !table.cell(0, *col).trim().is_empty()
        });
        if !anchor_has_value {
            return Err(ImportError::NoAnchorFieldMapped);
        }

        let header: Vec<String> = mapped
            .iter()
            .map(|(field, _)| self.schema.label(*field).to_string())
            .collect();

        let mut lines = Vec::with_capacity(table.len() + 1);
        lines.push(header);
        for row_idx in 0..table.len() {
            // 制表符会改变分隔符识别结果，替换为空格
            let line = mapped
                .iter()
                .map(|(_, col)| table.cell(row_idx, *col).replace('\t', " "))
                .collect();
            lines.push(line);
        }

        let blob = write_delimited(lines.iter(), Delimiter::Comma)?;
        info!(fields = mapped.len(), "映射助手重建文本完成");
        Ok(blob)
    }

    /// 给出初始映射建议
    ///
    /// 首行像表头且表头名能对上邮箱/电话/名字时按表头名，否则按内容识别。
    pub fn suggest(&self, table: &RawTable) -> ColumnMapping {
        let detected = table.first_row().and_then(|first_row| {
            self.schema
                .looks_like_header(&first_row.join(" "))
                .then(|| HeaderFieldMapper::map_header_names(&self.schema, first_row))
                .filter(|by_name| by_name.has_any(&HEADER_ACCEPT_FIELDS))
                .or_else(|| HeuristicColumnDetector.detect(&self.schema, table))
        });

        let detected = detected.unwrap_or_else(|| FieldMapping::new(MappingOrigin::Manual));
        debug!(origin = ?detected.origin(), mapped = detected.len(), "生成映射建议");
        ColumnMapping::from_field_mapping(&self.schema, &detected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant() -> MappingAssistant {
        MappingAssistant::new(Arc::new(FieldSchema::default()))
    }

    fn sample_table() -> RawTable {
        RawTable::from_text("Asha\tasha@example.com\t9876543210\tPune\n").unwrap()
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut mapping = ColumnMapping::new();
        mapping.assign(CanonicalField::Email, 1);
        mapping.assign(CanonicalField::Phone, 2);
        mapping.skip(CanonicalField::Email);
        assert_eq!(
            mapping.entries(),
            &[
                (CanonicalField::Email, ColumnChoice::Skip),
                (CanonicalField::Phone, ColumnChoice::Column(2)),
            ]
        );
        assert_eq!(mapping.mapped_count(), 1);
    }

    #[test]
    fn test_apply_rejects_all_skipped() {
        let mut mapping = ColumnMapping::new();
        mapping.skip(CanonicalField::Email);
        let err = assistant().apply(&sample_table(), &mapping).unwrap_err();
        assert!(matches!(err, ImportError::NoFieldsMapped));

        let err = assistant()
            .apply(&sample_table(), &ColumnMapping::new())
            .unwrap_err();
        assert!(matches!(err, ImportError::NoFieldsMapped));
    }

    #[test]
    fn test_apply_requires_anchor_with_value() {
        let table = RawTable::from_text("Kapoor\tPune\t411001\t").unwrap();
        let mut mapping = ColumnMapping::new();
        mapping
            .assign(CanonicalField::LastName, 0)
            .assign(CanonicalField::City, 1)
            .assign(CanonicalField::Pincode, 2);
        let err = assistant().apply(&table, &mapping).unwrap_err();
        assert!(matches!(err, ImportError::NoAnchorFieldMapped));

        // 锚点列在首行为空同样拒绝
        mapping.assign(CanonicalField::Phone, 3);
        let err = assistant().apply(&table, &mapping).unwrap_err();
        assert!(matches!(err, ImportError::NoAnchorFieldMapped));

        mapping.assign(CanonicalField::Phone, 9);
        mapping.assign(CanonicalField::FirstName, 0);
        assert!(assistant().apply(&table, &mapping).is_ok());
    }

    #[test]
    fn test_apply_builds_headered_blob() {
        let mut mapping = ColumnMapping::new();
        mapping
            .assign(CanonicalField::FirstName, 0)
            .assign(CanonicalField::Email, 1)
            .assign(CanonicalField::Building, 9);
        let blob = assistant().apply(&sample_table(), &mapping).unwrap();
        assert_eq!(
            blob,
            "First Name,Email ID,Building/House/Apartment Name\nAsha,asha@example.com,\n"
        );
    }

    #[test]
    fn test_parse_specs() {
        let mapping = ColumnMapping::parse_specs(&["email=1", "first_name=0", "city=skip"]).unwrap();
        assert_eq!(mapping.choice(CanonicalField::Email), Some(ColumnChoice::Column(1)));
        assert_eq!(mapping.choice(CanonicalField::FirstName), Some(ColumnChoice::Column(0)));
        assert_eq!(mapping.choice(CanonicalField::City), Some(ColumnChoice::Skip));

        assert!(matches!(
            ColumnMapping::parse_specs(&["email"]),
            Err(ImportError::InvalidMappingSpec(_))
        ));
        assert!(matches!(
            ColumnMapping::parse_specs(&["fax=1"]),
            Err(ImportError::UnknownField(_))
        ));
        assert!(matches!(
            ColumnMapping::parse_specs(&["email=x"]),
            Err(ImportError::InvalidMappingSpec(_))
        ));
    }

    #[test]
    fn test_suggest_from_content() {
        let mapping = assistant().suggest(&sample_table());
        assert_eq!(mapping.choice(CanonicalField::Email), Some(ColumnChoice::Column(1)));
        assert_eq!(mapping.choice(CanonicalField::Phone), Some(ColumnChoice::Column(2)));
        assert_eq!(mapping.choice(CanonicalField::Pincode), Some(ColumnChoice::Skip));
        assert_eq!(mapping.entries().len(), CanonicalField::ALL.len());
    }

    #[test]
    fn test_suggest_from_header_names() {
        let table = RawTable::from_text("Mobile,Town,Customer Email\n1,2,3").unwrap();
        let mapping = assistant().suggest(&table);
        assert_eq!(mapping.choice(CanonicalField::Phone), Some(ColumnChoice::Column(0)));
        assert_eq!(mapping.choice(CanonicalField::City), Some(ColumnChoice::Column(1)));
        // "customer_email" 不是同义词
        assert_eq!(mapping.choice(CanonicalField::Email), Some(ColumnChoice::Skip));
    }
}
