// ==========================================
// 开票与订单管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含解析逻辑
// ==========================================

pub mod company;
pub mod customer;
pub mod order;
pub mod product;
pub mod types;

// 重导出核心类型
pub use company::CompanyProfile;
pub use customer::{Customer, ParsedCustomerRecord};
pub use order::{Order, OrderCustomer, OrderTotals};
pub use product::{Product, ProductImportReport, RowIssue};
pub use types::{CanonicalField, OrderStatus, SequenceKind};
