// ==========================================
// 开票与订单管理系统 - 应用层
// ==========================================
// 职责: 应用状态装配，连接命令行 / 前端壳层与后端
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
