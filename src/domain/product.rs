// ==========================================
// 开票与订单管理系统 - 商品领域模型
// ==========================================
// 职责: 商品与库存字段定义（products 表）
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 默认最低库存预警值
pub const DEFAULT_MIN_STOCK: i64 = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub sku: Option<String>,

    // 库存管理
    #[serde(default)]
    pub inventory: i64,
    #[serde(default)]
    pub min_stock: Option<i64>,
    #[serde(default)]
    pub cost_price: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// 是否低于最低库存
    pub fn is_low_stock(&self) -> bool {
        self.inventory <= self.min_stock.unwrap_or(DEFAULT_MIN_STOCK)
    }
}

// ==========================================
// 商品批量导入结果
// ==========================================
/// 被跳过的行（行号从 1 开始，不含表头）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowIssue {
    pub row_number: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImportReport {
    pub batch_id: String,
    pub file_name: String,
    pub total_rows: usize,
    pub products: Vec<Product>,
    pub issues: Vec<RowIssue>,
    pub elapsed_ms: u64,
}

impl ProductImportReport {
    pub fn imported(&self) -> usize {
        self.products.len()
    }

    pub fn skipped(&self) -> usize {
        self.issues.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock_uses_default_threshold() {
        let mut product = Product {
            name: "Mug".to_string(),
            price: 250.0,
            inventory: 5,
            ..Default::default()
        };
        assert!(product.is_low_stock());
        product.inventory = 6;
        assert!(!product.is_low_stock());
        product.min_stock = Some(10);
        assert!(product.is_low_stock());
    }
}
