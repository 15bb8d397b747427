// ==========================================
// 开票与订单管理系统 - 公司资料
// ==========================================
// 职责: 开票方信息与全局偏好（币种/税种/默认税率/模板）
// 存储: settings 表 key = companyInfo
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyProfile {
    pub company_name: String,
    pub company_address: String,
    pub company_phone: String,
    pub company_email: String,
    pub company_logo: Option<String>,
    /// 签名图片（Base64 data URL）
    pub signature: Option<String>,

    // 全局偏好
    pub currency: String,
    pub currency_symbol: String,
    pub tax_name: String,
    pub default_tax_rate: f64,
    pub default_template: String,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            company_name: "Your Company Name".to_string(),
            company_address: "123 Business Street, Commercial Area".to_string(),
            company_phone: "+91 98765 43210".to_string(),
            company_email: "contact@yourcompany.com".to_string(),
            company_logo: None,
            signature: None,
            currency: "INR".to_string(),
            currency_symbol: "₹".to_string(),
            tax_name: "GST".to_string(),
            default_tax_rate: 18.0,
            default_template: "modern".to_string(),
        }
    }
}
