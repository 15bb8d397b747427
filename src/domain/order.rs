// ==========================================
// 开票与订单管理系统 - 订单领域模型
// ==========================================
// 订单 = 客户快照 + 手工录入字段 + 金额 + 公司资料快照
// 存储: orders 表（索引列 + JSON 全量）
// ==========================================

use crate::domain::company::CompanyProfile;
use crate::domain::customer::ParsedCustomerRecord;
use crate::domain::types::{CanonicalField, OrderStatus};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// 默认账期（天）
pub const DEFAULT_DUE_DAYS: i64 = 7;

/// 默认付款方式
pub const DEFAULT_PAYMENT_METHOD: &str = "Prepaid";

// ==========================================
// OrderCustomer - 订单上的客户快照
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderCustomer {
    pub timestamp: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub building: String,
    pub street_address: String,
    pub locality: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub delivery_notes: String,
}

impl From<&ParsedCustomerRecord> for OrderCustomer {
    fn from(record: &ParsedCustomerRecord) -> Self {
        let v = |f| record.value_or_empty(f);
        Self {
            timestamp: v(CanonicalField::Timestamp),
            first_name: v(CanonicalField::FirstName),
            last_name: v(CanonicalField::LastName),
            email: v(CanonicalField::Email),
            phone: v(CanonicalField::Phone),
            building: v(CanonicalField::Building),
            street_address: v(CanonicalField::StreetAddress),
            locality: v(CanonicalField::Locality),
            city: v(CanonicalField::City),
            state: v(CanonicalField::State),
            pincode: v(CanonicalField::Pincode),
            delivery_notes: v(CanonicalField::DeliveryNotes),
        }
    }
}

// ==========================================
// OrderTotals - 金额计算
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub sub_total: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
}

impl OrderTotals {
    /// 小计 = 数量 × 单价；税额 = 小计 × 税率%；合计 = 小计 + 税额 + 运费
    pub fn compute(quantity: f64, unit_price: f64, shipping: f64, tax_rate: f64) -> Self {
        let sub_total = quantity * unit_price;
        let tax_amount = sub_total * (tax_rate / 100.0);
        Self {
            sub_total,
            tax_amount,
            total_amount: sub_total + tax_amount + shipping,
        }
    }
}

// ==========================================
// Order - 订单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(flatten)]
    pub customer: OrderCustomer,

    // 手工录入字段
    pub order_number: String,
    pub invoice_number: String,
    pub order_date: NaiveDate,
    pub product_name: String,
    #[serde(default)]
    pub product_id: Option<i64>,
    pub quantity: f64,
    pub unit_price: f64,
    pub shipping_charges: f64,
    pub payment_method: String,
    #[serde(default)]
    pub tracking_number: String,

    // 金额
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub currency: String,

    #[serde(default)]
    pub status: OrderStatus,
    pub due_date: NaiveDate,

    // 公司资料快照
    #[serde(default)]
    pub company_tax_name: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub company: Option<CompanyProfile>,
}

impl Order {
    /// 以默认值创建订单草稿（数量 1，状态 Pending，账期 7 天）
    pub fn draft(customer: OrderCustomer, company: &CompanyProfile, order_date: NaiveDate) -> Self {
        let mut order = Self {
            id: None,
            customer,
            order_number: String::new(),
            invoice_number: String::new(),
            order_date,
            product_name: String::new(),
            product_id: None,
            quantity: 1.0,
            unit_price: 0.0,
            shipping_charges: 0.0,
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            tracking_number: String::new(),
            tax_rate: company.default_tax_rate,
            tax_amount: 0.0,
            total_amount: 0.0,
            currency: company.currency.clone(),
            status: OrderStatus::Pending,
            due_date: order_date + Duration::days(DEFAULT_DUE_DAYS),
            company_tax_name: Some(company.tax_name.clone()),
            template: Some(company.default_template.clone()),
            company: Some(company.clone()),
        };
        order.recalculate();
        order
    }

    pub fn totals(&self) -> OrderTotals {
        OrderTotals::compute(
            self.quantity,
            self.unit_price,
            self.shipping_charges,
            self.tax_rate,
        )
    }

    /// 按当前数量/单价/运费/税率重算税额与合计
    pub fn recalculate(&mut self) {
        let totals = self.totals();
        self.tax_amount = totals.tax_amount;
        self.total_amount = totals.total_amount;
    }

    /// 仪表盘口径的营收（数量 × 单价 + 运费，不含税）
    pub fn revenue(&self) -> f64 {
        self.quantity * self.unit_price + self.shipping_charges
    }
}
