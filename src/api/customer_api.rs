// ==========================================
// 开票与订单管理系统 - 客户 API
// ==========================================
// 职责: 粘贴文本解析、手动映射、客户档案维护、客户 CSV 导出
// 架构: API 层 → importer (解析/映射) + repository (客户)
// ==========================================

use std::path::Path;
use std::sync::Arc;

use csv::WriterBuilder;
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::customer::{Customer, ParsedCustomerRecord};
use crate::domain::types::CanonicalField;
use crate::importer::customer_parser::{CustomerDataParser, ParseOutcome};
use crate::importer::field_schema::FieldSchema;
use crate::importer::file_parser::read_text_file;
use crate::importer::mapping_assistant::{ColumnMapping, MappingAssistant};
use crate::repository::customer_repo::CustomerRepository;

/// 导出 CSV 中位于姓名之后的字段列（标签取自字段配置）
const EXPORT_FIELDS: [CanonicalField; 8] = [
    CanonicalField::Email,
    CanonicalField::Phone,
    CanonicalField::Building,
    CanonicalField::StreetAddress,
    CanonicalField::Locality,
    CanonicalField::City,
    CanonicalField::State,
    CanonicalField::Pincode,
];

// ==========================================
// CustomerApi - 客户 API
// ==========================================
pub struct CustomerApi {
    parser: CustomerDataParser,
    assistant: MappingAssistant,
    schema: Arc<FieldSchema>,
    customer_repo: Arc<CustomerRepository>,
}

impl CustomerApi {
    /// 创建新的CustomerApi实例
    ///
    /// # 参数
    /// - schema: 字段配置（解析器与映射助手共用）
    /// - customer_repo: 客户仓储
    pub fn new(schema: Arc<FieldSchema>, customer_repo: Arc<CustomerRepository>) -> Self {
        Self {
            parser: CustomerDataParser::new(schema.clone()),
            assistant: MappingAssistant::new(schema.clone()),
            schema,
            customer_repo,
        }
    }

    // ==========================================
    // 粘贴解析
    // ==========================================

    /// 解析粘贴文本
    ///
    /// # 返回
    /// - Ok(Some(record)): 解析成功
    /// - Ok(None): 无法识别，调用方应引导用户手动映射
    /// - Err(ApiError::EmptyInput): 空白输入
    pub fn parse_pasted(&self, text: &str) -> ApiResult<Option<ParsedCustomerRecord>> {
        Ok(self.parser.parse(text)?)
    }

    pub fn parse_with_outcome(&self, text: &str) -> ApiResult<ParseOutcome> {
        Ok(self.parser.parse_with_outcome(text)?)
    }

    /// 解析上传文件（Excel 先转为制表符文本）
    pub fn parse_file(&self, file_path: &Path) -> ApiResult<Option<ParsedCustomerRecord>> {
        let text = read_text_file(file_path)?;
        self.parse_pasted(&text)
    }

    /// 首行原始列（手动映射界面展示用）
    pub fn raw_columns(&self, text: &str) -> ApiResult<Vec<String>> {
        Ok(self.parser.raw_columns(text)?)
    }

    // ==========================================
    // 手动映射
    // ==========================================

    /// 给出映射建议
    pub fn suggest_mapping(&self, text: &str) -> ApiResult<ColumnMapping> {
        let table = self.parser.table(text)?;
        Ok(self.assistant.suggest(&table))
    }

    /// 按映射重建带表头文本
    pub fn apply_mapping(&self, text: &str, mapping: &ColumnMapping) -> ApiResult<String> {
        let table = self.parser.table(text)?;
        Ok(self.assistant.apply(&table, mapping)?)
    }

    /// 按映射重建后重新解析
    #[instrument(skip(self, text, mapping))]
    pub fn remap_and_parse(
        &self,
        text: &str,
        mapping: &ColumnMapping,
    ) -> ApiResult<Option<ParsedCustomerRecord>> {
        let blob = self.apply_mapping(text, mapping)?;
        self.parse_pasted(&blob)
    }

    // ==========================================
    // 客户档案
    // ==========================================

    /// 由解析结果保存客户档案
    ///
    /// # 返回
    /// - Ok(Customer): 已保存（含 id）
    /// - Err(InvalidInput): 记录为空或无法得到姓名
    pub fn save_customer_from_record(&self, record: &ParsedCustomerRecord) -> ApiResult<Customer> {
        if record.is_empty() {
            return Err(ApiError::InvalidInput("解析结果为空".to_string()));
        }
        let mut customer = Customer::from_record(record);
        if customer.name.is_empty() {
            return Err(ApiError::InvalidInput("无法确定客户姓名".to_string()));
        }
        customer.id = Some(self.customer_repo.insert(&customer)?);
        info!(id = ?customer.id, name = %customer.name, "客户档案已保存");
        Ok(customer)
    }

    pub fn create_customer(&self, customer: &Customer) -> ApiResult<i64> {
        if customer.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("客户姓名不能为空".to_string()));
        }
        Ok(self.customer_repo.insert(customer)?)
    }

    pub fn update_customer(&self, customer: &Customer) -> ApiResult<()> {
        if customer.id.is_none() {
            return Err(ApiError::InvalidInput("更新客户需要 id".to_string()));
        }
        Ok(self.customer_repo.update(customer)?)
    }

    pub fn get_customer(&self, id: i64) -> ApiResult<Customer> {
        self.customer_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Customer(id={})不存在", id)))
    }

    pub fn list_customers(&self) -> ApiResult<Vec<Customer>> {
        Ok(self.customer_repo.list_all()?)
    }

    pub fn search_customers(&self, keyword: &str) -> ApiResult<Vec<Customer>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return self.list_customers();
        }
        Ok(self.customer_repo.search(keyword)?)
    }

    pub fn delete_customer(&self, id: i64) -> ApiResult<()> {
        if !self.customer_repo.delete(id)? {
            return Err(ApiError::NotFound(format!("Customer(id={})不存在", id)));
        }
        Ok(())
    }

    // ==========================================
    // 导出
    // ==========================================

    /// 导出全部客户为 CSV（表头: Name + 标准字段标签 + Notes）
    pub fn export_customers_csv(&self) -> ApiResult<String> {
        let customers = self.customer_repo.list_all()?;

        let mut writer = WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        let mut header = vec!["Name".to_string()];
        header.extend(EXPORT_FIELDS.iter().map(|f| self.schema.label(*f).to_string()));
        header.push("Notes".to_string());
        writer.write_record(&header).map_err(csv_error)?;

        for customer in &customers {
            let text = |v: &Option<String>| v.clone().unwrap_or_default();
            writer
                .write_record([
                    customer.name.clone(),
                    text(&customer.email),
                    text(&customer.phone),
                    text(&customer.building),
                    text(&customer.street_address),
                    text(&customer.locality),
                    text(&customer.city),
                    text(&customer.state),
                    text(&customer.pincode),
                    text(&customer.notes),
                ])
                .map_err(csv_error)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;
        info!(count = customers.len(), "客户 CSV 导出完成");
        String::from_utf8(bytes).map_err(|e| ApiError::InternalError(e.to_string()))
    }
}

fn csv_error(err: csv::Error) -> ApiError {
    ApiError::InternalError(format!("CSV 写出失败: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn api() -> CustomerApi {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let repo = CustomerRepository::from_connection(Arc::new(Mutex::new(conn)));
        CustomerApi::new(Arc::new(FieldSchema::default()), Arc::new(repo))
    }

    #[test]
    fn test_blank_paste_is_empty_input() {
        assert!(matches!(api().parse_pasted("  \n "), Err(ApiError::EmptyInput)));
    }

    #[test]
    fn test_remap_and_parse() {
        let api = api();
        let text = "x1\tAsha\tKapoor\tPune";
        let mut mapping = ColumnMapping::new();
        mapping
            .assign(CanonicalField::FirstName, 1)
            .assign(CanonicalField::LastName, 2)
            .assign(CanonicalField::City, 3);

        let record = api.remap_and_parse(text, &mapping).unwrap().unwrap();
        assert_eq!(record.get(CanonicalField::FirstName), Some("Asha"));
        assert_eq!(record.get(CanonicalField::City), Some("Pune"));
    }

    #[test]
    fn test_save_and_export() {
        let api = api();
        let record = api
            .parse_pasted("First Name\tEmail\tCity\nAsha\tasha@example.com\tPune")
            .unwrap()
            .unwrap();
        let saved = api.save_customer_from_record(&record).unwrap();
        assert_eq!(saved.name, "Asha");
        assert!(saved.id.is_some());

        let csv = api.export_customers_csv().unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("Name,Email ID,Phone Number"));
        assert!(lines.next().unwrap().starts_with("Asha,asha@example.com,,"));
    }

    #[test]
    fn test_delete_missing_customer() {
        assert!(matches!(api().delete_customer(42), Err(ApiError::NotFound(_))));
    }
}
