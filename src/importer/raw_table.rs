// ==========================================
// 开票与订单管理系统 - 原始表格
// ==========================================
// 职责: 将粘贴文本切分为行/单元格（分隔符自动识别）
// 约束: 不做类型转换；允许参差行；越界单元格视为空串
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use csv::{ReaderBuilder, WriterBuilder};

/// 单元格分隔符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
}

impl Delimiter {
    /// 自动识别：文本含制表符则按 TSV，否则按 CSV
    pub fn detect(text: &str) -> Self {
        if text.contains('\t') {
            Delimiter::Tab
        } else {
            Delimiter::Comma
        }
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Tab => b'\t',
            Delimiter::Comma => b',',
        }
    }
}

// ==========================================
// RawTable - 行 × 单元格
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// 由已切分的行构造（丢弃全空行）
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: rows.into_iter().filter(|row| !is_blank_row(row)).collect(),
        }
    }

    /// 切分粘贴文本（自动识别分隔符）
    pub fn from_text(text: &str) -> ImportResult<Self> {
        Self::from_text_with(text, Delimiter::detect(text))
    }

    /// 按指定分隔符切分文本
    ///
    /// 支持双引号包裹的单元格（内含分隔符/换行）。
    pub fn from_text_with(text: &str, delimiter: Delimiter) -> ImportResult<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(delimiter.as_byte())
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        Ok(Self::from_rows(rows))
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// 首行（启发式识别的样本行）
    pub fn first_row(&self) -> Option<&[String]> {
        self.row(0)
    }

    /// 读取单元格，越界返回空串
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 最宽一行的列数
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// 序列化为分隔文本（必要时加引号），每行以 `\n` 结尾
    pub fn to_delimited(&self, delimiter: Delimiter) -> ImportResult<String> {
        write_delimited(self.rows.iter(), delimiter)
    }
}

/// 写出分隔文本
pub(crate) fn write_delimited<'a, I>(rows: I, delimiter: Delimiter) -> ImportResult<String>
where
    I: IntoIterator<Item = &'a Vec<String>>,
{
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| ImportError::CsvWriteError(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::CsvWriteError(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ImportError::CsvWriteError(e.to_string()))
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(Delimiter::detect("a\tb,c"), Delimiter::Tab);
        assert_eq!(Delimiter::detect("a,b,c"), Delimiter::Comma);
        assert_eq!(Delimiter::detect("single"), Delimiter::Comma);
    }

    #[test]
    fn test_from_text_tab_separated() {
        let table = RawTable::from_text("a\tb\tc\n1\t2\t3").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1], vec!["1", "2", "3"]);
    }

    #[test]
    fn test_from_text_drops_blank_lines() {
        let table = RawTable::from_text("a,b\n\n   \n1,2\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 1), "2");
    }

    #[test]
    fn test_from_text_drops_delimiter_only_rows() {
        let table = RawTable::from_text(",,\nAsha,Pune,411001\n , ,\n").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, 0), "Asha");
    }

    #[test]
    fn test_ragged_rows_and_out_of_range_cells() {
        let table = RawTable::from_text("a,b,c\n1\n").unwrap();
        assert_eq!(table.width(), 3);
        assert_eq!(table.cell(1, 0), "1");
        assert_eq!(table.cell(1, 2), "");
        assert_eq!(table.cell(9, 0), "");
    }

    #[test]
    fn test_quoted_cells_keep_delimiter() {
        let table = RawTable::from_text("name,address\nRahul,\"Flat 402, MG Road\"").unwrap();
        assert_eq!(table.cell(1, 1), "Flat 402, MG Road");
    }

    #[test]
    fn test_to_delimited_quotes_when_needed() {
        let table = RawTable::from_rows(vec![
            vec!["Street Address".to_string(), "City".to_string()],
            vec!["Flat 402, MG Road".to_string(), "Mumbai".to_string()],
        ]);
        let text = table.to_delimited(Delimiter::Comma).unwrap();
        assert_eq!(text, "Street Address,City\n\"Flat 402, MG Road\",Mumbai\n");
        assert_eq!(RawTable::from_text(&text).unwrap(), table);
    }
}
