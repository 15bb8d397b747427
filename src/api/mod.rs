// ==========================================
// 开票与订单管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行 / 前端壳层调用
// 约束: 下层错误统一转换为 ApiError
// ==========================================

pub mod customer_api;
pub mod dashboard_api;
pub mod data_api;
pub mod error;
pub mod order_api;
pub mod product_api;

// 重导出核心类型
pub use customer_api::CustomerApi;
pub use dashboard_api::{DailySales, DashboardApi, DashboardFilter, DashboardSummary};
pub use data_api::{BackupData, DataApi, RestoreMode, BACKUP_VERSION};
pub use error::{ApiError, ApiResult};
pub use order_api::OrderApi;
pub use product_api::{ProductApi, ProductImportResponse};
