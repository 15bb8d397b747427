// ==========================================
// 开票与订单管理系统 - 仪表盘 API
// ==========================================
// 职责: 订单营收聚合（总营收 / 订单数 / 客单价 / 按日销售）
// 口径: 营收 = 数量 × 单价 + 运费（不含税）
// 说明: 只输出数据，不负责图表
// ==========================================

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::order::Order;
use crate::repository::order_repo::OrderRepository;

/// 仪表盘过滤条件（月份 1-12，需与年份同时或单独使用）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl DashboardFilter {
    pub fn matches(&self, date: NaiveDate) -> bool {
        self.year.map_or(true, |y| date.year() == y)
            && self.month.map_or(true, |m| date.month() == m)
    }
}

/// 单日销售
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
    pub date: NaiveDate,
    pub sales: f64,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_revenue: f64,
    pub total_orders: usize,
    pub average_order_value: f64,
    /// 按日期升序
    pub sales_by_date: Vec<DailySales>,
    /// 有订单的年份（降序，不受过滤影响）
    pub available_years: Vec<i32>,
}

// ==========================================
// DashboardApi - 仪表盘 API
// ==========================================
pub struct DashboardApi {
    order_repo: Arc<OrderRepository>,
}

impl DashboardApi {
    pub fn new(order_repo: Arc<OrderRepository>) -> Self {
        Self { order_repo }
    }

    /// 查询仪表盘汇总
    ///
    /// # 参数
    /// - filter: 年/月过滤
    ///
    /// # 返回
    /// - Err(InvalidInput): 月份超出 1-12
    pub fn get_summary(&self, filter: DashboardFilter) -> ApiResult<DashboardSummary> {
        if let Some(month) = filter.month {
            if !(1..=12).contains(&month) {
                return Err(ApiError::InvalidInput(format!("月份无效: {}", month)));
            }
        }
        let orders = self.order_repo.list_all()?;
        Ok(summarize(&orders, filter))
    }
}

/// 聚合订单列表
pub fn summarize(orders: &[Order], filter: DashboardFilter) -> DashboardSummary {
    let available_years: BTreeSet<i32> = orders.iter().map(|o| o.order_date.year()).collect();

    let mut by_date: BTreeMap<NaiveDate, DailySales> = BTreeMap::new();
    let mut total_revenue = 0.0;
    let mut total_orders = 0;

    for order in orders.iter().filter(|o| filter.matches(o.order_date)) {
        let revenue = order.revenue();
        total_revenue += revenue;
        total_orders += 1;

        let day = by_date.entry(order.order_date).or_insert(DailySales {
            date: order.order_date,
            sales: 0.0,
            orders: 0,
        });
        day.sales += revenue;
        day.orders += 1;
    }

    DashboardSummary {
        total_revenue,
        total_orders,
        average_order_value: if total_orders > 0 {
            total_revenue / total_orders as f64
        } else {
            0.0
        },
        sales_by_date: by_date.into_values().collect(),
        available_years: available_years.into_iter().rev().collect(),
    }
}
