// ==========================================
// 开票与订单管理系统 - 商品仓储
// ==========================================
// 职责: products 表的 CRUD、批量写入、库存调整
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::product::Product;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, sku, inventory, min_stock, cost_price, category, created_at";

fn map_product_row(row: &Row<'_>) -> SqliteResult<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        sku: row.get(4)?,
        inventory: row.get(5)?,
        min_stock: row.get(6)?,
        cost_price: row.get(7)?,
        category: row.get(8)?,
        created_at: row.get(9)?,
    })
}

// ==========================================
// ProductRepository - 商品仓储
// ==========================================
pub struct ProductRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepository {
    /// 创建新的 ProductRepository 实例
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

    fn insert_with(conn: &Connection, product: &Product) -> RepositoryResult<i64> {
        conn.execute(
            r#"
            INSERT INTO products (
                name, description, price, sku, inventory, min_stock, cost_price, category, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                product.name,
                product.description,
                product.price,
                product.sku,
                product.inventory,
                product.min_stock,
                product.cost_price,
                product.category,
                product.created_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 新增商品，返回自增主键
    pub fn insert(&self, product: &Product) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_with(&conn, product)
    }

    /// 批量新增（单事务）
    pub fn bulk_insert(&self, products: &[Product]) -> RepositoryResult<Vec<i64>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(products.len());
        for product in products {
            ids.push(Self::insert_with(&tx, product)?);
        }
        tx.commit()?;
        info!(count = ids.len(), "商品批量写入完成");
        Ok(ids)
    }

    /// 更新商品（必须带 id）
    pub fn update(&self, product: &Product) -> RepositoryResult<()> {
        let id = product.id.ok_or_else(|| RepositoryError::FieldValueError {
            field: "id".to_string(),
            message: "更新商品时缺少 id".to_string(),
        })?;

        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE products SET
                name = ?2, description = ?3, price = ?4, sku = ?5, inventory = ?6,
                min_stock = ?7, cost_price = ?8, category = ?9
            WHERE id = ?1
            "#,
            params![
                id,
                product.name,
                product.description,
                product.price,
                product.sku,
                product.inventory,
                product.min_stock,
                product.cost_price,
                product.category,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Product", id));
        }
        Ok(())
    }

    /// 按主键写入（存在则覆盖）
    pub fn upsert_with(conn: &Connection, product: &Product) -> RepositoryResult<i64> {
        conn.execute(
            r#"
            INSERT OR REPLACE INTO products (
                id, name, description, price, sku, inventory, min_stock, cost_price, category, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                product.id,
                product.name,
                product.description,
                product.price,
                product.sku,
                product.inventory,
                product.min_stock,
                product.cost_price,
                product.category,
                product.created_at,
            ],
        )?;
        Ok(product.id.unwrap_or_else(|| conn.last_insert_rowid()))
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Product>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let product = conn
            .query_row(&sql, params![id], map_product_row)
            .optional()?;
        Ok(product)
    }

    /// 全部商品（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Product>> {
        let conn = self.get_conn()?;
        Self::list_with(&conn)
    }

    pub fn list_with(conn: &Connection) -> RepositoryResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products ORDER BY name COLLATE NOCASE ASC, id ASC",
            PRODUCT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map([], map_product_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(products)
    }

    /// 库存低于预警值的商品
    pub fn list_low_stock(&self) -> RepositoryResult<Vec<Product>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(Product::is_low_stock)
            .collect())
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// 调整库存（delta 可为负），返回调整后的库存
    pub fn adjust_stock(&self, id: i64, delta: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::adjust_stock_with(&conn, id, delta)
    }

    pub fn adjust_stock_with(conn: &Connection, id: i64, delta: i64) -> RepositoryResult<i64> {
        let affected = conn.execute(
            "UPDATE products SET inventory = inventory + ?2 WHERE id = ?1",
            params![id, delta],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Product", id));
        }
        let inventory: i64 = conn.query_row(
            "SELECT inventory FROM products WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        debug!(id, delta, inventory, "库存已调整");
        Ok(inventory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn repo() -> ProductRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ProductRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn product(name: &str, inventory: i64) -> Product {
        Product {
            name: name.to_string(),
            price: 100.0,
            inventory,
            ..Default::default()
        }
    }

    #[test]
    fn test_bulk_insert_and_list() {
        let repo = repo();
        let ids = repo
            .bulk_insert(&[product("Mug", 10), product("Bowl", 2)])
            .unwrap();
        assert_eq!(ids.len(), 2);

        let names: Vec<String> = repo.list_all().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Bowl", "Mug"]);

        let low = repo.list_low_stock().unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Bowl");
    }

    #[test]
    fn test_adjust_stock() {
        let repo = repo();
        let id = repo.insert(&product("Mug", 10)).unwrap();
        assert_eq!(repo.adjust_stock(id, -3).unwrap(), 7);
        assert_eq!(repo.adjust_stock(id, 5).unwrap(), 12);
        assert!(matches!(
            repo.adjust_stock(999, 1),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
