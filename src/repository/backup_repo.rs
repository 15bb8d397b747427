// ==========================================
// 开票与订单管理系统 - 备份/恢复仓储
// ==========================================
// 职责: 业务数据整体导出、事务化恢复、清空
// 范围: orders / customers / products / settings
// ==========================================

use crate::domain::customer::Customer;
use crate::domain::order::Order;
use crate::domain::product::Product;
use crate::repository::customer_repo::CustomerRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::order_repo::OrderRepository;
use crate::repository::product_repo::ProductRepository;
use crate::repository::settings_repo::{SettingEntry, SettingsRepository};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// 备份文件中的数据段
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupTables {
    pub orders: Vec<Order>,
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub settings: Vec<SettingEntry>,
}

impl BackupTables {
    pub fn total(&self) -> usize {
        self.orders.len() + self.customers.len() + self.products.len() + self.settings.len()
    }
}

/// 恢复统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreSummary {
    pub orders: usize,
    pub customers: usize,
    pub products: usize,
    pub settings: usize,
}

pub struct BackupRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BackupRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 导出全部业务数据
    pub fn dump(&self) -> RepositoryResult<BackupTables> {
        let conn = self.get_conn()?;
        Ok(BackupTables {
            orders: OrderRepository::list_with(&conn)?,
            customers: CustomerRepository::list_with(&conn)?,
            products: ProductRepository::list_with(&conn)?,
            settings: SettingsRepository::entries_with(&conn)?,
        })
    }

    /// 恢复数据（单事务）
    ///
    /// overwrite = true 时先清空四张表；否则按主键合并。
    pub fn restore(&self, tables: &BackupTables, overwrite: bool) -> RepositoryResult<RestoreSummary> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        if overwrite {
            Self::clear_with(&tx)?;
        }

        for order in &tables.orders {
            OrderRepository::upsert_with(&tx, order)?;
        }
        for customer in &tables.customers {
            CustomerRepository::upsert_with(&tx, customer)?;
        }
        for product in &tables.products {
            ProductRepository::upsert_with(&tx, product)?;
        }
        for entry in &tables.settings {
            SettingsRepository::put_with(&tx, &entry.key, &serde_json::to_string(&entry.value)?)?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let summary = RestoreSummary {
            orders: tables.orders.len(),
            customers: tables.customers.len(),
            products: tables.products.len(),
            settings: tables.settings.len(),
        };
        info!(overwrite, ?summary, "备份数据恢复完成");
        Ok(summary)
    }

    /// 清空全部业务数据
    pub fn clear_all(&self) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        Self::clear_with(&tx)?;
        tx.commit()?;
        warn!("业务数据已全部清空");
        Ok(())
    }

    fn clear_with(conn: &Connection) -> RepositoryResult<()> {
        // 同时重置自增序号，清空后的新记录从 1 开始
        conn.execute_batch(
            r#"
            DELETE FROM orders;
            DELETE FROM customers;
            DELETE FROM products;
            DELETE FROM settings;
            DELETE FROM sqlite_sequence WHERE name IN ('orders', 'customers', 'products');
            "#,
        )?;
        Ok(())
    }
}
