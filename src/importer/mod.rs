// ==========================================
// 开票与订单管理系统 - 导入层
// ==========================================
// 职责: 粘贴文本/上传文件 → 客户记录；商品 CSV 导入
// 管道: RawTable → 表头映射 / 启发式识别 → ParsedCustomerRecord
//       失败时由映射助手重建规范文本再次解析
// ==========================================

// 模块声明
pub mod column_detector;
pub mod customer_parser;
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod field_schema;
pub mod file_parser;
pub mod importer_trait;
pub mod mapping_assistant;
pub mod product_importer;
pub mod raw_table;

// 重导出核心类型
pub use column_detector::{is_date, is_email, is_phone, is_pincode, HeuristicColumnDetector};
pub use customer_parser::{CustomerDataParser, ParseAttempt, ParseOutcome, ParseSource};
pub use data_cleaner::{clean_pincode, normalize_header, parse_loose_date};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{FieldMapping, HeaderFieldMapper, MappingOrigin};
pub use field_schema::{FieldSchema, FieldSpec, FixedLayout};
pub use file_parser::{
    read_table_file, read_text_file, CsvTableParser, ExcelTableParser, UniversalFileParser,
};
pub use mapping_assistant::{ColumnChoice, ColumnMapping, MappingAssistant};
pub use product_importer::ProductCsvImporter;
pub use raw_table::{Delimiter, RawTable};

// 重导出 Trait 接口
pub use importer_trait::{ColumnDetector, FileParser, HeaderMapper, ProductImporter};
