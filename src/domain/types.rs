// ==========================================
// 开票与订单管理系统 - 领域类型定义
// ==========================================
// 职责: 标准字段枚举、订单状态、编号序列类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 标准字段 (Canonical Field)
// ==========================================
// 系统能识别的全部客户数据字段，声明顺序即映射声明顺序
// 序列化格式: camelCase (与备份文件 / 前端一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalField {
    Timestamp,
    FirstName,
    LastName,
    Email,
    Phone,
    Building,
    StreetAddress,
    Locality,
    City,
    State,
    Pincode,
    DeliveryNotes,
}

impl CanonicalField {
    /// 全部标准字段（声明顺序）
    pub const ALL: [CanonicalField; 12] = [
        CanonicalField::Timestamp,
        CanonicalField::FirstName,
        CanonicalField::LastName,
        CanonicalField::Email,
        CanonicalField::Phone,
        CanonicalField::Building,
        CanonicalField::StreetAddress,
        CanonicalField::Locality,
        CanonicalField::City,
        CanonicalField::State,
        CanonicalField::Pincode,
        CanonicalField::DeliveryNotes,
    ];

    /// 锚点字段：具有强内容特征，可用于启发式识别的质量门槛
    pub const ANCHORS: [CanonicalField; 4] = [
        CanonicalField::Email,
        CanonicalField::Phone,
        CanonicalField::Pincode,
        CanonicalField::Timestamp,
    ];

    /// 字段键（camelCase）
    pub fn key(&self) -> &'static str {
        match self {
            CanonicalField::Timestamp => "timestamp",
            CanonicalField::FirstName => "firstName",
            CanonicalField::LastName => "lastName",
            CanonicalField::Email => "email",
            CanonicalField::Phone => "phone",
            CanonicalField::Building => "building",
            CanonicalField::StreetAddress => "streetAddress",
            CanonicalField::Locality => "locality",
            CanonicalField::City => "city",
            CanonicalField::State => "state",
            CanonicalField::Pincode => "pincode",
            CanonicalField::DeliveryNotes => "deliveryNotes",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for CanonicalField {
    type Err = String;

    /// 按字段键解析（大小写不敏感，兼容 snake_case）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "").to_lowercase();
        CanonicalField::ALL
            .iter()
            .copied()
            .find(|field| field.key().to_lowercase() == wanted)
            .ok_or_else(|| s.to_string())
    }
}

// ==========================================
// 订单状态 (Order Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Overdue => "Overdue",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "overdue" => Ok(OrderStatus::Overdue),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("未知订单状态: {}", other)),
        }
    }
}

// ==========================================
// 编号序列类型 (Sequence Kind)
// ==========================================
// 连续编号: INV-0001 / ORD-0001
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceKind {
    Invoice,
    Order,
}

impl SequenceKind {
    /// settings 表中保存当前序号的键
    pub fn settings_key(&self) -> &'static str {
        match self {
            SequenceKind::Invoice => "lastInvoiceSequence",
            SequenceKind::Order => "lastOrderSequence",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            SequenceKind::Invoice => "INV",
            SequenceKind::Order => "ORD",
        }
    }

    /// 格式化编号（4 位补零）
    pub fn format(&self, seq: u64) -> String {
        format!("{}-{:04}", self.prefix(), seq)
    }
}
