// ==========================================
// 开票与订单管理系统 - 数据管理 API
// ==========================================
// 职责: JSON 备份导出/恢复、恢复出厂设置
// 格式: { version: 1, timestamp, data: { orders, customers, products, settings } }
// 红线: 恢复在单事务内完成，校验失败时不改动任何数据
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::repository::backup_repo::{BackupRepository, BackupTables, RestoreSummary};

/// 当前备份格式版本
pub const BACKUP_VERSION: u32 = 1;

/// 备份文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupData {
    pub version: u32,
    pub timestamp: String,
    pub data: BackupTables,
}

/// 恢复模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RestoreMode {
    /// 按主键合并（同 id 覆盖）
    #[default]
    Merge,
    /// 先清空再写入
    Overwrite,
}

// ==========================================
// DataApi - 数据管理 API
// ==========================================
pub struct DataApi {
    backup_repo: Arc<BackupRepository>,
}

impl DataApi {
    pub fn new(backup_repo: Arc<BackupRepository>) -> Self {
        Self { backup_repo }
    }

    /// 导出备份（格式化 JSON）
    pub fn export_backup(&self) -> ApiResult<String> {
        let backup = BackupData {
            version: BACKUP_VERSION,
            timestamp: Utc::now().to_rfc3339(),
            data: self.backup_repo.dump()?,
        };
        let json = serde_json::to_string_pretty(&backup)
            .map_err(|e| ApiError::InternalError(format!("备份序列化失败: {}", e)))?;
        info!(records = backup.data.total(), "备份导出完成");
        Ok(json)
    }

    /// 默认备份文件名: invoice-genie-backup-YYYY-MM-DD.json
    pub fn backup_file_name(date: NaiveDate) -> String {
        format!("invoice-genie-backup-{}.json", date.format("%Y-%m-%d"))
    }

    /// 从备份恢复
    ///
    /// # 返回
    /// - Ok(RestoreSummary): 各表写入数量
    /// - Err(InvalidBackup): JSON 无效、缺少 version/data、版本不支持
    pub fn import_backup(&self, json: &str, mode: RestoreMode) -> ApiResult<RestoreSummary> {
        let backup = parse_backup(json)?;
        let summary = self
            .backup_repo
            .restore(&backup.data, mode == RestoreMode::Overwrite)?;
        info!(?mode, timestamp = %backup.timestamp, "备份恢复完成");
        Ok(summary)
    }

    /// 恢复出厂设置: 清空订单、客户、商品与设置
    pub fn factory_reset(&self) -> ApiResult<()> {
        warn!("执行恢复出厂设置");
        Ok(self.backup_repo.clear_all()?)
    }
}

/// 校验并解析备份 JSON（先校验结构，再反序列化数据段）
fn parse_backup(json: &str) -> ApiResult<BackupData> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| ApiError::InvalidBackup(format!("JSON 解析失败: {}", e)))?;

    let version = value
        .get("version")
        .and_then(serde_json::Value::as_u64)
        .filter(|v| *v > 0)
        .ok_or_else(|| ApiError::InvalidBackup("缺少 version".to_string()))?;
    if version > u64::from(BACKUP_VERSION) {
        return Err(ApiError::InvalidBackup(format!("不支持的备份版本: {}", version)));
    }

    let data = value
        .get("data")
        .filter(|d| d.is_object())
        .cloned()
        .ok_or_else(|| ApiError::InvalidBackup("缺少 data".to_string()))?;
    let data: BackupTables = serde_json::from_value(data)
        .map_err(|e| ApiError::InvalidBackup(format!("数据段格式错误: {}", e)))?;

    let timestamp = value
        .get("timestamp")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(BackupData {
        version: version as u32,
        timestamp,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::customer::Customer;
    use crate::repository::customer_repo::CustomerRepository;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup() -> (DataApi, CustomerRepository) {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (
            DataApi::new(Arc::new(BackupRepository::from_connection(conn.clone()))),
            CustomerRepository::from_connection(conn),
        )
    }

    fn customer(name: &str) -> Customer {
        Customer {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rejects_invalid_backups() {
        let (api, _) = setup();
        for json in [
            "not json",
            r#"{"data":{}}"#,
            r#"{"version":1}"#,
            r#"{"version":2,"data":{}}"#,
            r#"{"version":1,"data":{"orders":"x"}}"#,
        ] {
            assert!(
                matches!(api.import_backup(json, RestoreMode::Merge), Err(ApiError::InvalidBackup(_))),
                "{}",
                json
            );
        }
    }

    #[test]
    fn test_export_then_overwrite_restore() {
        let (api, customers) = setup();
        customers.insert(&customer("Asha")).unwrap();
        let json = api.export_backup().unwrap();
        assert!(json.contains("\"version\": 1"));

        customers.insert(&customer("Ravi")).unwrap();
        let summary = api.import_backup(&json, RestoreMode::Overwrite).unwrap();
        assert_eq!(summary.customers, 1);
        assert_eq!(customers.count().unwrap(), 1);
    }

    #[test]
    fn test_merge_keeps_existing_rows() {
        let (api, customers) = setup();
        customers.insert(&customer("Asha")).unwrap();
        let json = api.export_backup().unwrap();

        api.factory_reset().unwrap();
        customers.insert(&customer("Ravi")).unwrap();
        customers.insert(&customer("Meera")).unwrap();

        // Asha 的 id 为 1，与 Ravi 冲突时被备份覆盖
        api.import_backup(&json, RestoreMode::Merge).unwrap();
        let names: Vec<String> = customers.list_all().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Asha".to_string()));
        assert!(names.contains(&"Meera".to_string()));
    }

    #[test]
    fn test_backup_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
        assert_eq!(DataApi::backup_file_name(date), "invoice-genie-backup-2025-01-09.json");
    }
}
