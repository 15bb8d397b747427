// ==========================================
// 开票与订单管理系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 表头解析不足 / 启发式置信度不足 不属于错误，
//       它们以 None 返回，由调用方引导用户进入手动映射
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 输入校验错误 =====
    #[error("输入为空: 请先粘贴数据")]
    EmptyInput,

    #[error("未映射任何字段: 请至少为一个字段选择列")]
    NoFieldsMapped,

    #[error("映射缺少锚点字段: 邮箱、电话、名字中至少一个需要选择有值的列")]
    NoAnchorFieldMapped,

    #[error("未知的标准字段: {0}")]
    UnknownField(String),

    #[error("映射格式错误: {0}（期望 字段=列号）")]
    InvalidMappingSpec(String),

    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.tsv/.txt/.xlsx/.xls）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("CSV 写出失败: {0}")]
    CsvWriteError(String),

    // ===== 数据映射错误 =====
    #[error("缺少必需列: {0}")]
    MissingColumn(String),

    #[error("类型转换失败 (行 {row}, 字段 {field}): {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
