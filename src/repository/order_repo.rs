// ==========================================
// 开票与订单管理系统 - 订单仓储
// ==========================================
// 存储: orders 表 = 索引列（编号/日期/时间戳）+ payload JSON 全量
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::order::Order;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};
use tracing::debug;

fn decode_order(id: i64, payload: &str) -> RepositoryResult<Order> {
    let mut order: Order = serde_json::from_str(payload)?;
    order.id = Some(id);
    Ok(order)
}

/// payload 不保存 id（以表主键为准）
fn encode_order(order: &Order) -> RepositoryResult<String> {
    let mut value = serde_json::to_value(order)?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("id");
    }
    Ok(serde_json::to_string(&value)?)
}

// ==========================================
// OrderRepository - 订单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    /// 创建新的 OrderRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = Connection::open(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增订单（在调用方事务内执行）
    pub fn insert_with(conn: &Connection, order: &Order) -> RepositoryResult<i64> {
        conn.execute(
            r#"
            INSERT INTO orders (order_number, invoice_number, order_date, timestamp, payload)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                order.order_number,
                order.invoice_number,
                order.order_date.to_string(),
                order.customer.timestamp,
                encode_order(order)?,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, order_number = %order.order_number, "订单已写入");
        Ok(id)
    }

    pub fn insert(&self, order: &Order) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_with(&conn, order)
    }

    /// 更新订单（必须带 id）
    pub fn update(&self, order: &Order) -> RepositoryResult<()> {
        let id = order.id.ok_or_else(|| RepositoryError::FieldValueError {
            field: "id".to_string(),
            message: "更新订单时缺少 id".to_string(),
        })?;

        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE orders SET
                order_number = ?2, invoice_number = ?3, order_date = ?4,
                timestamp = ?5, payload = ?6
            WHERE id = ?1
            "#,
            params![
                id,
                order.order_number,
                order.invoice_number,
                order.order_date.to_string(),
                order.customer.timestamp,
                encode_order(order)?,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Order", id));
        }
        Ok(())
    }

    /// 按主键写入（存在则覆盖）
    pub fn upsert_with(conn: &Connection, order: &Order) -> RepositoryResult<i64> {
        conn.execute(
            r#"
            INSERT OR REPLACE INTO orders (id, order_number, invoice_number, order_date, timestamp, payload)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                order.id,
                order.order_number,
                order.invoice_number,
                order.order_date.to_string(),
                order.customer.timestamp,
                encode_order(order)?,
            ],
        )?;
        Ok(order.id.unwrap_or_else(|| conn.last_insert_rowid()))
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        let payload = conn
            .query_row(
                "SELECT payload FROM orders WHERE id = ?1",
                params![id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        payload.map(|p| decode_order(id, &p)).transpose()
    }

    /// 全部订单（订单日期倒序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;
        Self::list_with(&conn)
    }

    pub fn list_with(conn: &Connection) -> RepositoryResult<Vec<Order>> {
        let mut stmt =
            conn.prepare("SELECT id, payload FROM orders ORDER BY order_date DESC, id DESC")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<SqliteResult<Vec<_>>>()?;

        rows.iter()
            .map(|(id, payload)| decode_order(*id, payload))
            .collect()
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM orders WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::company::CompanyProfile;
    use crate::domain::order::OrderCustomer;
    use chrono::NaiveDate;

    fn repo() -> OrderRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        OrderRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn order(number: &str, day: u32) -> Order {
        let date = NaiveDate::from_ymd_opt(2024, 12, day).unwrap();
        let mut order = Order::draft(OrderCustomer::default(), &CompanyProfile::default(), date);
        order.order_number = number.to_string();
        order.invoice_number = number.replace("ORD", "INV");
        order
    }

    #[test]
    fn test_insert_and_list_by_date_desc() {
        let repo = repo();
        repo.insert(&order("ORD-0001", 1)).unwrap();
        let id = repo.insert(&order("ORD-0002", 20)).unwrap();

        let orders = repo.list_all().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order_number, "ORD-0002");
        assert_eq!(orders[0].id, Some(id));
    }

    #[test]
    fn test_update_and_delete() {
        let repo = repo();
        let id = repo.insert(&order("ORD-0001", 1)).unwrap();
        let mut saved = repo.find_by_id(id).unwrap().unwrap();
        saved.tracking_number = "TRK123".to_string();
        repo.update(&saved).unwrap();
        assert_eq!(repo.find_by_id(id).unwrap().unwrap().tracking_number, "TRK123");

        assert!(repo.delete(id).unwrap());
        assert!(repo.find_by_id(id).unwrap().is_none());
    }
}
