// ==========================================
// 开票与订单管理系统 - 客户档案仓储
// ==========================================
// 职责: customers 表的 CRUD 与模糊查询
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::customer::Customer;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

const CUSTOMER_COLUMNS: &str = "id, name, email, phone, building, street_address, locality, \
     city, state, pincode, tax_id, payment_terms, notes, created_at";

fn map_customer_row(row: &Row<'_>) -> SqliteResult<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        building: row.get(4)?,
        street_address: row.get(5)?,
        locality: row.get(6)?,
        city: row.get(7)?,
        state: row.get(8)?,
        pincode: row.get(9)?,
        tax_id: row.get(10)?,
        payment_terms: row.get(11)?,
        notes: row.get(12)?,
        created_at: row.get(13)?,
    })
}

// ==========================================
// CustomerRepository - 客户档案仓储
// ==========================================
pub struct CustomerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CustomerRepository {
    /// 创建新的 CustomerRepository 实例
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

    /// 新增客户，返回自增主键
    pub fn insert(&self, customer: &Customer) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO customers (
                name, email, phone, building, street_address, locality,
                city, state, pincode, tax_id, payment_terms, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                customer.name,
                customer.email,
                customer.phone,
                customer.building,
                customer.street_address,
                customer.locality,
                customer.city,
                customer.state,
                customer.pincode,
                customer.tax_id,
                customer.payment_terms,
                customer.notes,
                customer.created_at,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, name = %customer.name, "客户已保存");
        Ok(id)
    }

    /// 更新客户（必须带 id）
    pub fn update(&self, customer: &Customer) -> RepositoryResult<()> {
        let id = customer
            .id
            .ok_or_else(|| RepositoryError::FieldValueError {
                field: "id".to_string(),
                message: "更新客户时缺少 id".to_string(),
            })?;

        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE customers SET
                name = ?2, email = ?3, phone = ?4, building = ?5, street_address = ?6,
                locality = ?7, city = ?8, state = ?9, pincode = ?10, tax_id = ?11,
                payment_terms = ?12, notes = ?13
            WHERE id = ?1
            "#,
            params![
                id,
                customer.name,
                customer.email,
                customer.phone,
                customer.building,
                customer.street_address,
                customer.locality,
                customer.city,
                customer.state,
                customer.pincode,
                customer.tax_id,
                customer.payment_terms,
                customer.notes,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Customer", id));
        }
        Ok(())
    }

    /// 按主键写入（存在则覆盖，不存在则插入）；无 id 时等同 insert
    ///
    /// 备份恢复使用同一逻辑，因此以连接为参数。
    pub fn upsert_with(conn: &Connection, customer: &Customer) -> RepositoryResult<i64> {
        conn.execute(
            r#"
            INSERT OR REPLACE INTO customers (
                id, name, email, phone, building, street_address, locality,
                city, state, pincode, tax_id, payment_terms, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                customer.id,
                customer.name,
                customer.email,
                customer.phone,
                customer.building,
                customer.street_address,
                customer.locality,
                customer.city,
                customer.state,
                customer.pincode,
                customer.tax_id,
                customer.payment_terms,
                customer.notes,
                customer.created_at,
            ],
        )?;
        Ok(customer.id.unwrap_or_else(|| conn.last_insert_rowid()))
    }

    pub fn upsert_by_id(&self, customer: &Customer) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::upsert_with(&conn, customer)
    }

    /// 按主键查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Customer>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLUMNS);
        let customer = conn
            .query_row(&sql, params![id], map_customer_row)
            .optional()?;
        Ok(customer)
    }

    /// 全部客户（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Customer>> {
        let conn = self.get_conn()?;
        Self::list_with(&conn)
    }

    pub fn list_with(conn: &Connection) -> RepositoryResult<Vec<Customer>> {
        let sql = format!(
            "SELECT {} FROM customers ORDER BY name COLLATE NOCASE ASC, id ASC",
            CUSTOMER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let customers = stmt
            .query_map([], map_customer_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(customers)
    }

    /// 按名称/邮箱/电话模糊查询
    pub fn search(&self, keyword: &str) -> RepositoryResult<Vec<Customer>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM customers
            WHERE name LIKE ?1 OR email LIKE ?1 OR phone LIKE ?1
            ORDER BY name COLLATE NOCASE ASC, id ASC
            "#,
            CUSTOMER_COLUMNS
        );
        let pattern = format!("%{}%", keyword.trim());
        let mut stmt = conn.prepare(&sql)?;
        let customers = stmt
            .query_map(params![pattern], map_customer_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(customers)
    }

    /// 删除客户，返回是否存在
    pub fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM customers WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM customers", [], |row| row.get(0))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn repo() -> CustomerRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        CustomerRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn customer(name: &str, email: &str) -> Customer {
        Customer {
            name: name.to_string(),
            email: Some(email.to_string()),
            city: Some("Mumbai".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_find_update_delete() {
        let repo = repo();
        let id = repo.insert(&customer("Rahul Sharma", "rahul@example.com")).unwrap();

        let mut found = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(found.city.as_deref(), Some("Mumbai"));

        found.city = Some("Pune".to_string());
        repo.update(&found).unwrap();
        assert_eq!(
            repo.find_by_id(id).unwrap().unwrap().city.as_deref(),
            Some("Pune")
        );

        assert!(repo.delete(id).unwrap());
        assert!(!repo.delete(id).unwrap());
        assert!(repo.find_by_id(id).unwrap().is_none());
    }

    #[test]
    fn test_update_missing_customer() {
        let repo = repo();
        let mut ghost = customer("Ghost", "ghost@example.com");
        ghost.id = Some(42);
        assert!(matches!(
            repo.update(&ghost),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_search_and_upsert() {
        let repo = repo();
        repo.insert(&customer("Asha Verma", "asha@example.com")).unwrap();
        repo.insert(&customer("Rahul Sharma", "rahul@example.com")).unwrap();

        let hits = repo.search("rahul").unwrap();
        assert_eq!(hits.len(), 1);

        let mut restored = customer("Imported", "imported@example.com");
        restored.id = Some(100);
        assert_eq!(repo.upsert_by_id(&restored).unwrap(), 100);
        restored.name = "Imported Again".to_string();
        repo.upsert_by_id(&restored).unwrap();
        assert_eq!(repo.count().unwrap(), 3);
        assert_eq!(repo.find_by_id(100).unwrap().unwrap().name, "Imported Again");
    }
}
