// ==========================================
// 开票与订单管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 本地优先的开票后端（客户数据粘贴解析为核心入口）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 表格解析 / 列识别 / 手动映射 / 商品导入
pub mod importer;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 设置 / 公司资料 / 编号序列
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CanonicalField, OrderStatus, SequenceKind};

// 领域实体
pub use domain::{CompanyProfile, Customer, Order, OrderCustomer, ParsedCustomerRecord, Product};

// 解析核心
pub use importer::{
    ColumnChoice, ColumnMapping, CustomerDataParser, FieldSchema, HeuristicColumnDetector,
    MappingAssistant, ParseOutcome, ParseSource, RawTable,
};

// API
pub use api::{ApiError, ApiResult, CustomerApi, DashboardApi, DataApi, OrderApi, ProductApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Invoice Genie";

// 数据库版本
pub const DB_VERSION: &str = "v1";
