// ==========================================
// 开票与订单管理系统 - 配置管理器
// ==========================================
// 职责: 设置项类型化读写、快照/恢复、公司资料、编号序列
// 存储: settings 表 (key → JSON 文本)
// ==========================================

use crate::db::configure_sqlite_connection;
use crate::domain::company::CompanyProfile;
use crate::domain::types::SequenceKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::settings_repo::SettingsRepository;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// 配置键
pub mod config_keys {
    /// 公司资料
    pub const COMPANY_INFO: &str = "companyInfo";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
    settings: SettingsRepository,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }

        Ok(Self {
            settings: SettingsRepository::from_connection(conn.clone()),
            conn,
        })
    }

    /// 读取并反序列化设置项
    ///
    /// # 返回
    /// - Ok(Some(T)): 配置存在且格式正确
    /// - Ok(None): 配置不存在
    /// - Err: 数据库错误或格式错误
    pub fn get_value<T: DeserializeOwned>(&self, key: &str) -> RepositoryResult<Option<T>> {
        match self.settings.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_value<T: Serialize>(&self, key: &str, value: &T) -> RepositoryResult<()> {
        let raw = serde_json::to_string(value)?;
        self.settings.put(key, &raw)?;
        debug!(key, "设置项已保存");
        Ok(())
    }

    pub fn delete_value(&self, key: &str) -> RepositoryResult<bool> {
        self.settings.delete(key)
    }

    /// 获取所有设置项的快照（JSON 对象：key → 原始值）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let map: BTreeMap<String, serde_json::Value> = self
            .settings
            .list_all()?
            .into_iter()
            .map(|(k, raw)| {
                let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
                (k, value)
            })
            .collect();
        Ok(serde_json::to_string(&map)?)
    }

    /// 从快照恢复设置项（覆盖同名键），返回恢复数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> RepositoryResult<usize> {
        let map: BTreeMap<String, serde_json::Value> = serde_json::from_str(snapshot_json)?;

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn.transaction()?;
        for (key, value) in &map {
            SettingsRepository::put_with(&tx, key, &serde_json::to_string(value)?)?;
        }
        tx.commit()?;

        Ok(map.len())
    }

    // ===== 公司资料 =====

    /// 读取公司资料；缺失或格式错误时返回默认值
    pub fn get_company_profile(&self) -> RepositoryResult<CompanyProfile> {
        match self.get_value::<CompanyProfile>(config_keys::COMPANY_INFO) {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Ok(CompanyProfile::default()),
            Err(RepositoryError::SerializationError(e)) => {
                warn!(
                    config_key = config_keys::COMPANY_INFO,
                    error = %e,
                    "公司资料格式错误，使用默认配置"
                );
                Ok(CompanyProfile::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn save_company_profile(&self, profile: &CompanyProfile) -> RepositoryResult<()> {
        self.set_value(config_keys::COMPANY_INFO, profile)
    }

    // ===== 编号序列 =====

    fn read_sequence(conn: &Connection, kind: SequenceKind) -> RepositoryResult<u64> {
        let raw = SettingsRepository::get_with(conn, kind.settings_key())?;
        Ok(raw
            .and_then(|v| serde_json::from_str::<u64>(&v).ok())
            .unwrap_or(0))
    }

    /// 预览下一个编号（不占用）
    pub fn next_sequence(&self, kind: SequenceKind) -> RepositoryResult<String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let current = Self::read_sequence(&conn, kind)?;
        Ok(kind.format(current + 1))
    }

    /// 占用下一个编号，返回被占用的编号
    pub fn increment_sequence(&self, kind: SequenceKind) -> RepositoryResult<String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        Self::increment_sequence_with(&conn, kind)
    }

    /// 在调用方事务内占用编号
    pub fn increment_sequence_with(conn: &Connection, kind: SequenceKind) -> RepositoryResult<String> {
        let next = Self::read_sequence(conn, kind)? + 1;
        SettingsRepository::put_with(conn, kind.settings_key(), &next.to_string())?;
        Ok(kind.format(next))
    }
}
