// ==========================================
// 开票与订单管理系统 - 设置项仓储
// ==========================================
// 职责: settings 表（key → JSON 文本）的读写
// 红线: 不解释值的含义，类型化读取由 ConfigManager 负责
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 单个设置项（备份文件中的形态）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub key: String,
    pub value: serde_json::Value,
}

pub struct SettingsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SettingsRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = Connection::open(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取原始 JSON 文本
    pub fn get(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        Self::get_with(&conn, key)
    }

    pub fn get_with(conn: &Connection, key: &str) -> RepositoryResult<Option<String>> {
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入原始 JSON 文本（存在则覆盖）
    pub fn put(&self, key: &str, value_json: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::put_with(&conn, key, value_json)
    }

    pub fn put_with(conn: &Connection, key: &str, value_json: &str) -> RepositoryResult<()> {
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value_json],
        )?;
        Ok(())
    }

    pub fn delete(&self, key: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }

    /// 全部设置项（按键排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<(String, String)>> {
        let conn = self.get_conn()?;
        Self::list_with(&conn)
    }

    pub fn list_with(conn: &Connection) -> RepositoryResult<Vec<(String, String)>> {
        let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 以备份形态列出（值解析为 JSON；非法 JSON 按字符串保留）
    pub fn entries_with(conn: &Connection) -> RepositoryResult<Vec<SettingEntry>> {
        Ok(Self::list_with(conn)?
            .into_iter()
            .map(|(key, raw)| {
                let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
                SettingEntry { key, value }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    #[test]
    fn test_put_get_delete() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let repo = SettingsRepository::from_connection(Arc::new(Mutex::new(conn)));

        repo.put("lastInvoiceSequence", "3").unwrap();
        repo.put("lastInvoiceSequence", "4").unwrap();
        assert_eq!(repo.get("lastInvoiceSequence").unwrap().as_deref(), Some("4"));
        assert_eq!(repo.list_all().unwrap().len(), 1);

        assert!(repo.delete("lastInvoiceSequence").unwrap());
        assert!(repo.get("lastInvoiceSequence").unwrap().is_none());
    }
}
