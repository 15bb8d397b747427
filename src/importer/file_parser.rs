// ==========================================
// 开票与订单管理系统 - 文件解析器实现
// ==========================================
// 职责: 上传文件 → RawTable
// 支持: 文本 (.csv/.tsv/.txt) / Excel (.xlsx/.xls，首个工作表)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use crate::importer::raw_table::{Delimiter, RawTable};
use calamine::{open_workbook_auto, Data, DataType, Range, Reader};
use std::fs;
use std::path::Path;
use tracing::debug;

const TEXT_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];
const EXCEL_EXTENSIONS: [&str; 2] = ["xlsx", "xls"];

/// Excel 日期单元格输出格式，与表单导出的时间戳一致
const EXCEL_DATETIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

// ==========================================
// 文本表格解析
// ==========================================
pub struct CsvTableParser;

impl FileParser for CsvTableParser {
    fn parse_to_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if !TEXT_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let text = fs::read_to_string(file_path)?;
        if text.trim().is_empty() {
            return Err(ImportError::EmptyInput);
        }
        RawTable::from_text(text.trim())
    }
}

// ==========================================
// Excel 表格解析
// ==========================================
pub struct ExcelTableParser;

impl FileParser for ExcelTableParser {
    fn parse_to_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;
        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let rows = range_to_rows(&range);

        debug!(sheet = %sheet_name, rows = rows.len(), "Excel 工作表读取完成");
        Ok(RawTable::from_rows(rows))
    }
}

fn range_to_rows(range: &Range<Data>) -> Vec<Vec<String>> {
    range
        .rows()
        .map(|row| row.iter().map(excel_cell_text).collect())
        .collect()
}

/// 单元格转文本；日期单元格默认显示为序列号，需按日期格式输出
fn excel_cell_text(cell: &Data) -> String {
    match cell {
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(|dt| dt.format(EXCEL_DATETIME_FORMAT).to_string())
            .unwrap_or_else(|| cell.to_string()),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        let ext = extension_of(file_path);
        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            CsvTableParser.parse_to_table(file_path)
        } else if EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            ExcelTableParser.parse_to_table(file_path)
        } else {
            Err(ImportError::UnsupportedFormat(ext))
        }
    }
}

/// 读取上传文件为原始表格
pub fn read_table_file<P: AsRef<Path>>(file_path: P) -> ImportResult<RawTable> {
    UniversalFileParser.parse_to_table(file_path.as_ref())
}

/// 读取上传文件为文本（Excel 转为制表符分隔），供解析器使用
pub fn read_text_file<P: AsRef<Path>>(file_path: P) -> ImportResult<String> {
    let path = file_path.as_ref();
    if TEXT_EXTENSIONS.contains(&extension_of(path).as_str()) {
        ensure_exists(path)?;
        return Ok(fs::read_to_string(path)?);
    }
    read_table_file(path)?.to_delimited(Delimiter::Tab)
}
