// ==========================================
// 开票与订单管理系统 - 订单 API
// ==========================================
// 职责: 由解析结果生成订单草稿、保存订单（扣库存 + 占用编号）、订单维护
// 约束: 保存订单的三个写操作在同一事务内完成
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::customer::ParsedCustomerRecord;
use crate::domain::order::{Order, OrderCustomer};
use crate::domain::types::{CanonicalField, OrderStatus, SequenceKind};
use crate::importer::data_cleaner::parse_loose_date;
use crate::repository::error::RepositoryError;
use crate::repository::order_repo::OrderRepository;
use crate::repository::product_repo::ProductRepository;

// ==========================================
// OrderApi - 订单 API
// ==========================================
pub struct OrderApi {
    conn: Arc<Mutex<Connection>>,
    order_repo: Arc<OrderRepository>,
    config: Arc<ConfigManager>,
}

impl OrderApi {
    /// 创建新的OrderApi实例
    ///
    /// # 参数
    /// - conn: 共享连接（保存订单时开启事务）
    /// - order_repo: 订单仓储
    /// - config: 配置管理器（公司资料 / 编号序列）
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        order_repo: Arc<OrderRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            conn,
            order_repo,
            config,
        }
    }

    // ==========================================
    // 草稿
    // ==========================================

    /// 由解析结果生成订单草稿
    ///
    /// 订单日期优先取记录中的时间戳，无法解析时取今天；
    /// 编号为预览值，保存时才真正占用。
    pub fn draft_from_record(&self, record: &ParsedCustomerRecord) -> ApiResult<Order> {
        let today = Local::now().date_naive();
        self.draft_from_record_on(record, today)
    }

    pub fn draft_from_record_on(
        &self,
        record: &ParsedCustomerRecord,
        today: NaiveDate,
    ) -> ApiResult<Order> {
        let company = self.config.get_company_profile()?;
        let order_date = record
            .get(CanonicalField::Timestamp)
            .and_then(parse_loose_date)
            .unwrap_or(today);

        let mut order = Order::draft(OrderCustomer::from(record), &company, order_date);
        order.order_number = self.config.next_sequence(SequenceKind::Order)?;
        order.invoice_number = self.config.next_sequence(SequenceKind::Invoice)?;
        Ok(order)
    }

    // ==========================================
    // 保存
    // ==========================================

    /// 保存新订单
    ///
    /// 单事务内: 占用订单号/发票号 → 写入订单 → 扣减库存（有商品且数量为正时）。
    /// 草稿上的编号为空时使用本次占用的编号。
    ///
    /// # 返回
    /// - Ok(Order): 已保存订单（含 id、重算后的金额）
    /// - Err(NotFound): 关联商品不存在（整单回滚）
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    pub fn save_order(&self, order: &Order) -> ApiResult<Order> {
        validate_order(order)?;

        let mut saved = order.clone();
        saved.id = None;
        saved.recalculate();

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", e)))?;
        let tx = conn
            .transaction()
            .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))?;

        let order_number = ConfigManager::increment_sequence_with(&tx, SequenceKind::Order)?;
        let invoice_number = ConfigManager::increment_sequence_with(&tx, SequenceKind::Invoice)?;
        if saved.order_number.trim().is_empty() {
            saved.order_number = order_number;
        }
        if saved.invoice_number.trim().is_empty() {
            saved.invoice_number = invoice_number;
        }

        let id = OrderRepository::insert_with(&tx, &saved)?;

        let deducted = stock_deduction(&saved);
        if let (Some(product_id), Some(qty)) = (saved.product_id, deducted) {
            let remaining = ProductRepository::adjust_stock_with(&tx, product_id, -qty)?;
            info!(product_id, qty, remaining, "订单扣减库存");
        }

        tx.commit()
            .map_err(|e| ApiError::DatabaseTransactionError(e.to_string()))?;

        saved.id = Some(id);
        info!(id, invoice_number = %saved.invoice_number, "订单已保存");
        Ok(saved)
    }

    /// 更新已有订单（不影响库存与编号）
    pub fn update_order(&self, order: &Order) -> ApiResult<Order> {
        if order.id.is_none() {
            return Err(ApiError::InvalidInput("更新订单需要 id".to_string()));
        }
        validate_order(order)?;

        let mut updated = order.clone();
        updated.recalculate();
        self.order_repo.update(&updated)?;
        Ok(updated)
    }

    pub fn update_status(&self, id: i64, status: OrderStatus) -> ApiResult<Order> {
        let mut order = self.get_order(id)?;
        order.status = status;
        self.order_repo.update(&order)?;
        Ok(order)
    }

    // ==========================================
    // 查询 / 删除
    // ==========================================

    pub fn get_order(&self, id: i64) -> ApiResult<Order> {
        self.order_repo
            .find_by_id(id)?
            .ok_or_else(|| RepositoryError::not_found("Order", id).into())
    }

    /// 按订单日期倒序
    pub fn list_orders(&self) -> ApiResult<Vec<Order>> {
        Ok(self.order_repo.list_all()?)
    }

    pub fn delete_order(&self, id: i64) -> ApiResult<()> {
        if !self.order_repo.delete(id)? {
            return Err(RepositoryError::not_found("Order", id).into());
        }
        Ok(())
    }
}

fn validate_order(order: &Order) -> ApiResult<()> {
    if !order.quantity.is_finite() || order.quantity < 0.0 {
        return Err(ApiError::InvalidInput(format!("数量无效: {}", order.quantity)));
    }
    if !order.unit_price.is_finite() || order.unit_price < 0.0 {
        return Err(ApiError::InvalidInput(format!("单价无效: {}", order.unit_price)));
    }
    if order.due_date < order.order_date {
        return Err(ApiError::InvalidInput("到期日早于订单日期".to_string()));
    }
    Ok(())
}

/// 需扣减的库存数量（数量四舍五入为整数，非正数不扣）
fn stock_deduction(order: &Order) -> Option<i64> {
    let qty = order.quantity.round() as i64;
    (qty > 0).then_some(qty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::product::Product;

    struct Fixture {
        api: OrderApi,
        products: ProductRepository,
    }

    fn fixture() -> Fixture {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let config = ConfigManager::from_connection(conn.clone()).unwrap();
        Fixture {
            api: OrderApi::new(
                conn.clone(),
                Arc::new(OrderRepository::from_connection(conn.clone())),
                Arc::new(config),
            ),
            products: ProductRepository::from_connection(conn),
        }
    }

    fn record(timestamp: &str) -> ParsedCustomerRecord {
        let mut record = ParsedCustomerRecord::new();
        record.set(CanonicalField::Timestamp, timestamp);
        record.set(CanonicalField::FirstName, "Rahul");
        record.set(CanonicalField::Phone, "9876543210");
        record
    }

    #[test]
    fn test_draft_uses_timestamp_and_peeks_numbers() {
        let fx = fixture();
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let draft = fx
            .api
            .draft_from_record_on(&record("12/26/2024 10:30:00"), today)
            .unwrap();
        assert_eq!(draft.order_date, NaiveDate::from_ymd_opt(2024, 12, 26).unwrap());
        assert_eq!(draft.order_number, "ORD-0001");
        assert_eq!(draft.invoice_number, "INV-0001");
        assert_eq!(draft.customer.first_name, "Rahul");

        let draft = fx.api.draft_from_record_on(&record("soon"), today).unwrap();
        assert_eq!(draft.order_date, today);
        assert_eq!(draft.order_number, "ORD-0001");
    }

    #[test]
    fn test_save_order_deducts_stock_and_commits_sequences() {
        let fx = fixture();
        let product_id = fx
            .products
            .insert(&Product {
                name: "Mug".to_string(),
                price: 250.0,
                inventory: 10,
                ..Default::default()
            })
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut draft = fx.api.draft_from_record_on(&record(""), today).unwrap();
        draft.product_id = Some(product_id);
        draft.product_name = "Mug".to_string();
        draft.quantity = 3.0;
        draft.unit_price = 250.0;

        let saved = fx.api.save_order(&draft).unwrap();
        assert!(saved.id.is_some());
        assert!((saved.total_amount - 885.0).abs() < 1e-9);
        assert_eq!(fx.products.find_by_id(product_id).unwrap().unwrap().inventory, 7);

        let next = fx.api.draft_from_record_on(&record(""), today).unwrap();
        assert_eq!(next.order_number, "ORD-0002");
        assert_eq!(next.invoice_number, "INV-0002");
    }

    #[test]
    fn test_save_order_with_missing_product_rolls_back() {
        let fx = fixture();
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut draft = fx.api.draft_from_record_on(&record(""), today).unwrap();
        draft.product_id = Some(999);

        assert!(matches!(fx.api.save_order(&draft), Err(ApiError::NotFound(_))));
        assert!(fx.api.list_orders().unwrap().is_empty());
        let next = fx.api.draft_from_record_on(&record(""), today).unwrap();
        assert_eq!(next.order_number, "ORD-0001");
    }

    #[test]
    fn test_update_status() {
        let fx = fixture();
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let draft = fx.api.draft_from_record_on(&record(""), today).unwrap();
        let saved = fx.api.save_order(&draft).unwrap();

        let paid = fx.api.update_status(saved.id.unwrap(), OrderStatus::Paid).unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        assert_eq!(fx.api.get_order(saved.id.unwrap()).unwrap().status, OrderStatus::Paid);
    }
}
