// ==========================================
// 开票与订单管理系统 - 商品 CSV 导入器
// ==========================================
// 职责: 带表头的商品 CSV → Product 列表 + 跳过行报告
// 列名: name, price, sku, inventory, minStock, category, costPrice
// 约束: 只负责读取与校验，落库由 ProductApi 完成
// ==========================================

use crate::domain::product::{Product, ProductImportReport, RowIssue, DEFAULT_MIN_STOCK};
use crate::importer::data_cleaner::normalize_null;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::ProductImporter;
use async_trait::async_trait;
use chrono::Utc;
use csv::ReaderBuilder;
use futures::future::join_all;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

pub struct ProductCsvImporter;

impl ProductCsvImporter {
    /// 解析 CSV 文本（首行为表头）
    pub fn parse_text(&self, text: &str) -> ImportResult<(usize, Vec<Product>, Vec<RowIssue>)> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut products = Vec::new();
        let mut issues = Vec::new();
        let mut total_rows = 0;

        for result in reader.records() {
            let record = result?;

            let row: HashMap<&str, &str> = headers
                .iter()
                .map(String::as_str)
                .zip(record.iter())
                .collect();

            // 跳过完全空白的行
            if row.values().all(|v| v.trim().is_empty()) {
                continue;
            }
            total_rows += 1;

            match Self::row_to_product(&row) {
                Ok(product) => products.push(product),
                Err(message) => issues.push(RowIssue {
                    row_number: total_rows,
                    message,
                }),
            }
        }

        Ok((total_rows, products, issues))
    }

    fn row_to_product(row: &HashMap<&str, &str>) -> Result<Product, String> {
        let text = |key: &str| normalize_null(row.get(key).copied());

        let (Some(name), Some(price)) = (text("name"), text("price")) else {
            return Err("缺少名称或价格".to_string());
        };
        let price = price
            .parse::<f64>()
            .map_err(|_| format!("价格无法解析: {}", price))?;

        Ok(Product {
            id: None,
            name,
            description: text("description"),
            price,
            sku: text("sku"),
            inventory: text("inventory")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            min_stock: Some(
                text("minStock")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MIN_STOCK),
            ),
            cost_price: text("costPrice").and_then(|v| v.parse().ok()),
            category: text("category"),
            created_at: Some(Utc::now()),
        })
    }
}

#[async_trait]
impl ProductImporter for ProductCsvImporter {
    #[instrument(skip(self), fields(batch_id))]
    async fn import_from_csv(&self, file_path: &Path) -> ImportResult<ProductImportReport> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }
        let text = tokio::fs::read_to_string(file_path).await?;
        let (total_rows, products, issues) = self.parse_text(&text)?;

        if !issues.is_empty() {
            warn!(skipped = issues.len(), "部分商品行被跳过");
        }
        info!(
            batch_id = %batch_id,
            total = total_rows,
            imported = products.len(),
            "商品 CSV 解析完成"
        );

        Ok(ProductImportReport {
            batch_id,
            file_name: file_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            total_rows,
            products,
            issues,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    async fn batch_import(&self, file_paths: &[&Path]) -> Vec<ImportResult<ProductImportReport>> {
        info!(count = file_paths.len(), "开始批量导入商品文件");

        let tasks = file_paths.iter().map(|path| async move {
            let result = self.import_from_csv(path).await;
            if let Err(e) = &result {
                error!(file = %path.display(), error = %e, "文件导入失败");
            }
            result
        });

        let results = join_all(tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );
        results
    }
}
