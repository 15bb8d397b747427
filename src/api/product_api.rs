// ==========================================
// 开票与订单管理系统 - 商品 API
// ==========================================
// 职责: 商品 CSV 导入落库、商品维护、库存调整与低库存查询
// ==========================================

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::product::{Product, RowIssue};
use crate::importer::importer_trait::ProductImporter;
use crate::importer::product_importer::ProductCsvImporter;
use crate::repository::error::RepositoryError;
use crate::repository::product_repo::ProductRepository;

/// 商品导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImportResponse {
    /// 批次ID
    pub batch_id: String,
    /// 数据行总数（不含表头与空行）
    pub total_rows: usize,
    /// 成功落库的商品 id
    pub imported_ids: Vec<i64>,
    /// 被跳过的行
    pub issues: Vec<RowIssue>,
    /// 导入耗时（毫秒）
    pub elapsed_ms: u64,
}

// ==========================================
// ProductApi - 商品 API
// ==========================================
pub struct ProductApi {
    product_repo: Arc<ProductRepository>,
    importer: Arc<dyn ProductImporter>,
}

impl ProductApi {
    /// 创建新的ProductApi实例（使用 CSV 导入器）
    pub fn new(product_repo: Arc<ProductRepository>) -> Self {
        Self::with_importer(product_repo, Arc::new(ProductCsvImporter))
    }

    pub fn with_importer(
        product_repo: Arc<ProductRepository>,
        importer: Arc<dyn ProductImporter>,
    ) -> Self {
        Self {
            product_repo,
            importer,
        }
    }

    /// 导入商品 CSV 并批量落库
    ///
    /// # 返回
    /// - Ok(ProductImportResponse): 落库 id 与跳过行
    /// - Err(ApiError): 文件读取/解析失败或落库失败（整批回滚）
    pub async fn import_csv(&self, file_path: &Path) -> ApiResult<ProductImportResponse> {
        let report = self.importer.import_from_csv(file_path).await?;
        let imported_ids = self.product_repo.bulk_insert(&report.products)?;

        info!(
            batch_id = %report.batch_id,
            imported = imported_ids.len(),
            skipped = report.skipped(),
            "商品导入落库完成"
        );

        Ok(ProductImportResponse {
            batch_id: report.batch_id,
            total_rows: report.total_rows,
            imported_ids,
            issues: report.issues,
            elapsed_ms: report.elapsed_ms,
        })
    }

    pub fn create_product(&self, product: &Product) -> ApiResult<i64> {
        validate_product(product)?;
        Ok(self.product_repo.insert(product)?)
    }

    pub fn update_product(&self, product: &Product) -> ApiResult<()> {
        if product.id.is_none() {
            return Err(ApiError::InvalidInput("更新商品需要 id".to_string()));
        }
        validate_product(product)?;
        Ok(self.product_repo.update(product)?)
    }

    pub fn get_product(&self, id: i64) -> ApiResult<Product> {
        self.product_repo
            .find_by_id(id)?
            .ok_or_else(|| RepositoryError::not_found("Product", id).into())
    }

    pub fn list_products(&self) -> ApiResult<Vec<Product>> {
        Ok(self.product_repo.list_all()?)
    }

    /// 低于最低库存的商品
    pub fn list_low_stock(&self) -> ApiResult<Vec<Product>> {
        Ok(self.product_repo.list_low_stock()?)
    }

    /// 调整库存，返回调整后的库存
    pub fn adjust_stock(&self, id: i64, delta: i64) -> ApiResult<i64> {
        Ok(self.product_repo.adjust_stock(id, delta)?)
    }

    pub fn delete_product(&self, id: i64) -> ApiResult<()> {
        if !self.product_repo.delete(id)? {
            return Err(RepositoryError::not_found("Product", id).into());
        }
        Ok(())
    }
}

fn validate_product(product: &Product) -> ApiResult<()> {
    if product.name.trim().is_empty() {
        return Err(ApiError::InvalidInput("商品名称不能为空".to_string()));
    }
    if !product.price.is_finite() || product.price < 0.0 {
        return Err(ApiError::InvalidInput(format!("商品价格无效: {}", product.price)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use rusqlite::Connection;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::Builder;

    fn api() -> ProductApi {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ProductApi::new(Arc::new(ProductRepository::from_connection(Arc::new(
            Mutex::new(conn),
        ))))
    }

    #[tokio::test]
    async fn test_import_csv_persists_valid_rows() {
        let api = api();
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(
            file,
            "name,price,sku,inventory\nMug,250,MUG-1,3\n,100,NONAME,1\nPlate,abc,PL-1,2\n"
        )
        .unwrap();

        let response = api.import_csv(file.path()).await.unwrap();
        assert_eq!(response.total_rows, 3);
        assert_eq!(response.imported_ids.len(), 1);
        assert_eq!(response.issues.len(), 2);
        assert_eq!(response.issues[0].row_number, 2);

        let products = api.list_products().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].min_stock, Some(5));
        assert!(products[0].is_low_stock());
        assert_eq!(api.list_low_stock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_import_missing_file() {
        let api = api();
        let result = api.import_csv(Path::new("/nonexistent/products.csv")).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_create_product_rejects_blank_name() {
        let product = Product {
            name: " ".to_string(),
            price: 10.0,
            ..Default::default()
        };
        assert!(matches!(api().create_product(&product), Err(ApiError::InvalidInput(_))));
    }
}
