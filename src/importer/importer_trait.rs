// ==========================================
// 开票与订单管理系统 - 导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 文件/文本 → RawTable → FieldMapping → ParsedCustomerRecord
// ==========================================

use crate::domain::product::ProductImportReport;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapping;
use crate::importer::field_schema::FieldSchema;
use crate::importer::raw_table::RawTable;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件读取为原始表格
// 实现者: CsvTableParser, ExcelTableParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始表格（不区分表头与数据）
    ///
    /// # 返回
    /// - Ok(RawTable): 全部非空行
    /// - Err: 文件不存在、格式不支持、读取失败
    fn parse_to_table(&self, file_path: &Path) -> ImportResult<RawTable>;
}

// ==========================================
// HeaderMapper Trait
// ==========================================
// 用途: 按表头名建立字段映射
// 实现者: HeaderFieldMapper
pub trait HeaderMapper: Send + Sync {
    /// 首行为表头、第二行为数据行时建立映射
    ///
    /// # 返回
    /// - Some(FieldMapping): 映射（可能为空，由调用方判断是否足够）
    /// - None: 表格不足两行
    fn map_headers(&self, schema: &FieldSchema, table: &RawTable) -> Option<FieldMapping>;
}

// ==========================================
// ColumnDetector Trait
// ==========================================
// 用途: 无表头时按单元格内容推断字段
// 实现者: HeuristicColumnDetector
pub trait ColumnDetector: Send + Sync {
    /// 检查首行并推断映射
    ///
    /// # 返回
    /// - Some(FieldMapping): 通过质量门槛的映射
    /// - None: 置信度不足
    fn detect(&self, schema: &FieldSchema, table: &RawTable) -> Option<FieldMapping>;
}

// ==========================================
// ProductImporter Trait
// ==========================================
// 用途: 商品目录批量导入
// 实现者: ProductCsvImporter
#[async_trait]
pub trait ProductImporter: Send + Sync {
    /// 从带表头的 CSV 文件读取商品
    ///
    /// 缺少名称或价格的行被跳过并记录在报告中。
    async fn import_from_csv(&self, file_path: &Path) -> ImportResult<ProductImportReport>;

    /// 并发导入多个文件，单个文件失败不影响其他文件
    async fn batch_import(&self, file_paths: &[&Path]) -> Vec<ImportResult<ProductImportReport>>;
}
