// ==========================================
// 开票与订单管理系统 - 应用状态
// ==========================================
// 职责: 打开数据库、建表、装配共享连接上的全部仓储与 API
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{CustomerApi, DashboardApi, DataApi, OrderApi, ProductApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::importer::field_schema::FieldSchema;
use crate::repository::{
    BackupRepository, CustomerRepository, OrderRepository, ProductRepository,
};
use rusqlite::Connection;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "INVOICE_GENIE_DB_PATH";

/// 应用状态
///
/// 所有仓储共享同一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 共享连接
    pub conn: Arc<Mutex<Connection>>,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 客户API（解析 / 映射 / 档案）
    pub customer_api: Arc<CustomerApi>,

    /// 订单API
    pub order_api: Arc<OrderApi>,

    /// 商品API
    pub product_api: Arc<ProductApi>,

    /// 数据管理API
    pub data_api: Arc<DataApi>,

    /// 仪表盘API
    pub dashboard_api: Arc<DashboardApi>,
}

impl AppState {
    /// 创建新的AppState实例（默认字段配置）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（":memory:" 为内存库）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_schema(db_path, Arc::new(FieldSchema::default()))
    }

    pub fn with_schema(db_path: String, schema: Arc<FieldSchema>) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let customer_repo = Arc::new(CustomerRepository::from_connection(conn.clone()));
        let product_repo = Arc::new(ProductRepository::from_connection(conn.clone()));
        let order_repo = Arc::new(OrderRepository::from_connection(conn.clone()));
        let backup_repo = Arc::new(BackupRepository::from_connection(conn.clone()));

        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let customer_api = Arc::new(CustomerApi::new(schema, customer_repo));
        let order_api = Arc::new(OrderApi::new(conn.clone(), order_repo.clone(), config.clone()));
        let product_api = Arc::new(ProductApi::new(product_repo));
        let data_api = Arc::new(DataApi::new(backup_repo));
        let dashboard_api = Arc::new(DashboardApi::new(order_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            conn,
            config,
            customer_api,
            order_api,
            product_api,
            data_api,
            dashboard_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先使用环境变量 INVOICE_GENIE_DB_PATH，其次为用户数据目录，
/// 都不可用时退回当前目录。
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./invoice_genie.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("invoice-genie");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("invoice_genie.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_state_wires_shared_connection() {
        let state = AppState::new(":memory:".to_string()).unwrap();
        assert!(Arc::strong_count(&state.conn) > 1);

        let record = state
            .customer_api
            .parse_pasted("Name,Email,Phone\nAsha Rao,asha@example.com,9876543210")
            .unwrap()
            .unwrap();
        state.customer_api.save_customer_from_record(&record).unwrap();
        assert_eq!(state.customer_api.list_customers().unwrap().len(), 1);
    }
}
