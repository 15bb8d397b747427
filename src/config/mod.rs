// ==========================================
// 开票与订单管理系统 - 配置层
// ==========================================
// 职责: 系统设置、公司资料、编号序列
// 存储: settings 表
// 说明: 解析器的字段配置 (FieldSchema) 位于 importer 层
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
