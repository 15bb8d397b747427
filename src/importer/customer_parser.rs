// ==========================================
// 开票与订单管理系统 - 客户数据解析器
// ==========================================
// 职责: 粘贴文本 → 单条客户记录
// 流程: 空输入校验 → 表头通道 → 启发式通道 → 无结果
// 红线: 解析失败不返回错误（仅 EmptyInput 为错误），
//       以 None 引导调用方进入手动映射
// ==========================================

use crate::domain::customer::ParsedCustomerRecord;
use crate::domain::types::CanonicalField;
use crate::importer::column_detector::HeuristicColumnDetector;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{FieldMapping, HeaderFieldMapper, MappingOrigin};
use crate::importer::field_schema::FieldSchema;
use crate::importer::importer_trait::{ColumnDetector, HeaderMapper};
use crate::importer::raw_table::RawTable;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// 表头通道接受结果所需的字段（任一存在即可）
pub(crate) const HEADER_ACCEPT_FIELDS: [CanonicalField; 3] = [
    CanonicalField::Email,
    CanonicalField::Phone,
    CanonicalField::FirstName,
];

/// 记录来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParseSource {
    Header,
    FixedLayout,
    Heuristic,
}

/// 单次解析中每个通道的尝试结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParseAttempt {
    /// 首行不含表头关键词，跳过表头通道
    NoHeaderDetected,
    /// 表头通道未得到邮箱/电话/名字
    HeaderParseInsufficient,
    /// 启发式通道未通过质量门槛
    HeuristicLowConfidence,
    Accepted(ParseSource),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOutcome {
    pub record: Option<ParsedCustomerRecord>,
    pub source: Option<ParseSource>,
    pub attempts: Vec<ParseAttempt>,
}

impl ParseOutcome {
    fn new() -> Self {
        Self {
            record: None,
            source: None,
            attempts: Vec::new(),
        }
    }

    fn accept(mut self, record: ParsedCustomerRecord, source: ParseSource) -> Self {
        self.attempts.push(ParseAttempt::Accepted(source));
        self.record = Some(record);
        self.source = Some(source);
        self
    }

    fn reject(mut self, attempt: ParseAttempt) -> Self {
        self.attempts.push(attempt);
        self
    }
}

// ==========================================
// CustomerDataParser
// ==========================================
pub struct CustomerDataParser {
    schema: Arc<FieldSchema>,
    header_mapper: Box<dyn HeaderMapper>,
    column_detector: Box<dyn ColumnDetector>,
}

impl CustomerDataParser {
    pub fn new(schema: Arc<FieldSchema>) -> Self {
        Self::with_components(
            schema,
            Box::new(HeaderFieldMapper),
            Box::new(HeuristicColumnDetector),
        )
    }

    /// 注入自定义映射器/识别器（测试替身）
    pub fn with_components(
        schema: Arc<FieldSchema>,
        header_mapper: Box<dyn HeaderMapper>,
        column_detector: Box<dyn ColumnDetector>,
    ) -> Self {
        Self {
            schema,
            header_mapper,
            column_detector,
        }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// 解析粘贴文本
    ///
    /// # 返回
    /// - Err(EmptyInput): 空白输入
    /// - Ok(None): 两个通道都无法得出结果
    /// - Ok(Some(record)): 解析结果
    pub fn parse(&self, text: &str) -> ImportResult<Option<ParsedCustomerRecord>> {
        Ok(self.parse_with_outcome(text)?.record)
    }

    /// 解析并返回各通道的尝试记录
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub fn parse_with_outcome(&self, text: &str) -> ImportResult<ParseOutcome> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ImportError::EmptyInput);
        }

        let outcome = ParseOutcome::new();
        let table = RawTable::from_text(trimmed)?;

        let first_line = trimmed.lines().next().unwrap_or_default();
        let outcome = if self.schema.looks_like_header(first_line) {
            match self.try_header(&table) {
                Some(record) => return Ok(outcome.accept(record, ParseSource::Header)),
                None => {
                    debug!("表头通道结果不足，转入启发式识别");
                    outcome.reject(ParseAttempt::HeaderParseInsufficient)
                }
            }
        } else {
            outcome.reject(ParseAttempt::NoHeaderDetected)
        };

        Ok(self.try_heuristic(&table, outcome))
    }

    /// 首行原始单元格（供映射助手展示）
    pub fn raw_columns(&self, text: &str) -> ImportResult<Vec<String>> {
        let table = self.table(text)?;
        Ok(table.first_row().map(<[String]>::to_vec).unwrap_or_default())
    }

    /// 切分文本为原始表格（空白输入报错）
    pub fn table(&self, text: &str) -> ImportResult<RawTable> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ImportError::EmptyInput);
        }
        RawTable::from_text(trimmed)
    }

    fn try_header(&self, table: &RawTable) -> Option<ParsedCustomerRecord> {
        let mapping = self.header_mapper.map_headers(&self.schema, table)?;
        let record = mapping.extract(table.row(1)?);
        record.has_any(&HEADER_ACCEPT_FIELDS).then_some(record)
    }

    fn try_heuristic(&self, table: &RawTable, outcome: ParseOutcome) -> ParseOutcome {
        let detected = self
            .column_detector
            .detect(&self.schema, table)
            .and_then(|mapping| Self::extract_first_row(table, &mapping).map(|r| (r, mapping)));

        match detected {
            Some((record, mapping)) => {
                let source = match mapping.origin() {
                    MappingOrigin::FixedLayout => ParseSource::FixedLayout,
                    _ => ParseSource::Heuristic,
                };
                outcome.accept(record, source)
            }
            None => outcome.reject(ParseAttempt::HeuristicLowConfidence),
        }
    }

    fn extract_first_row(table: &RawTable, mapping: &FieldMapping) -> Option<ParsedCustomerRecord> {
        let record = mapping.extract(table.first_row()?);
        (!record.is_empty()).then_some(record)
    }
}

impl Default for CustomerDataParser {
    fn default() -> Self {
        Self::new(Arc::new(FieldSchema::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_is_error() {
        let parser = CustomerDataParser::default();
        assert!(matches!(parser.parse(""), Err(ImportError::EmptyInput)));
        assert!(matches!(parser.parse("  \n\t "), Err(ImportError::EmptyInput)));
        assert!(matches!(parser.raw_columns(" "), Err(ImportError::EmptyInput)));
    }

    #[test]
    fn test_header_only_falls_through() {
        let parser = CustomerDataParser::default();
        let outcome = parser.parse_with_outcome("Name,Email,Phone").unwrap();
        assert_eq!(
            outcome.attempts,
            vec![
                ParseAttempt::HeaderParseInsufficient,
                ParseAttempt::Accepted(ParseSource::Heuristic)
            ]
        );
        // 表头行自身被当作数据行：三列纯文本
        let record = outcome.record.unwrap();
        assert_eq!(record.get(CanonicalField::FirstName), Some("Name"));
    }

    #[test]
    fn test_header_path_wins_over_heuristic() {
        let parser = CustomerDataParser::default();
        let outcome = parser
            .parse_with_outcome("email,phone\nasha@example.com,9876543210")
            .unwrap();
        assert_eq!(outcome.source, Some(ParseSource::Header));
        assert_eq!(outcome.attempts.len(), 1);
    }

    #[test]
    fn test_raw_columns_returns_first_row() {
        let parser = CustomerDataParser::default();
        let cols = parser.raw_columns("a\tb\tc\n1\t2\t3").unwrap();
        assert_eq!(cols, vec!["a", "b", "c"]);
    }

    struct NoHeaders;

    impl HeaderMapper for NoHeaders {
        fn map_headers(&self, _: &FieldSchema, _: &RawTable) -> Option<FieldMapping> {
            None
        }
    }

    #[test]
    fn test_injected_header_mapper() {
        let parser = CustomerDataParser::with_components(
            Arc::new(FieldSchema::default()),
            Box::new(NoHeaders),
            Box::new(HeuristicColumnDetector),
        );
        let outcome = parser
            .parse_with_outcome("email,phone\nasha@example.com,9876543210")
            .unwrap();
        // 启发式只看首行（即表头行）："email"/"phone" 均非锚点
        assert_eq!(outcome.source, None);
        assert_eq!(outcome.record, None);
    }
}
