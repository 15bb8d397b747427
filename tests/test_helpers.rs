// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的临时数据库、应用状态、样例数据
// ==========================================

#![allow(dead_code)]

use invoice_genie::app::AppState;
use invoice_genie::db::init_schema;
use rusqlite::Connection;
use std::error::Error;
use tempfile::NamedTempFile;

/// 表单导出样例（逗号 + 空格分隔，带表头）
pub const FORM_EXPORT_SAMPLE: &str = "Timestamp, First Name, Last Name, Email ID, Phone Number, Building, Street Address, Locality, City, State, Pincode, Notes\n\
12/26/2024 10:30:00, Rahul, Sharma, rahul.sharma@email.com, 9876543210, Flat 402, MG Road, Andheri West, Mumbai, Maharashtra, 400053, Please call before delivery";

/// 无表头的制表符样例
pub const HEADERLESS_TAB_SAMPLE: &str =
    "12/26/2024\tUnknown\tUser\ttest@test.com\t9998887776\tHouse\tStreet\tLoc\tCity\tState\t500001";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = Connection::open(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 在临时数据库上装配完整的应用状态
pub fn create_test_state() -> Result<(NamedTempFile, AppState), Box<dyn Error>> {
    let (temp_file, db_path) = create_test_db()?;
    let state = AppState::new(db_path)?;
    Ok((temp_file, state))
}

/// 打开测试数据库连接
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(Connection::open(db_path)?)
}
