// ==========================================
// 开票与订单管理系统 - 启发式列识别器
// ==========================================
// 职责: 无表头数据按单元格内容推断字段
// 顺序: 固定布局快速通道 → 锚点字段（邮箱/电话/邮编/日期）
//       → 剩余列按位置与长度分配
// 约束: 只检查首行；每列至多分配一次；无内部状态
// ==========================================

use crate::domain::types::CanonicalField;
use crate::importer::data_cleaner::{digits_only, parse_loose_date, PINCODE_LEN};
use crate::importer::field_mapper::{FieldMapping, MappingOrigin};
use crate::importer::field_schema::{FieldSchema, FixedLayout};
use crate::importer::importer_trait::ColumnDetector;
use crate::importer::raw_table::RawTable;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::debug;

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("邮箱正则非法"));

static PHONE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-+()]").expect("电话分隔符正则非法"));

/// 电话号码位数范围
const PHONE_MIN_DIGITS: usize = 10;
const PHONE_MAX_DIGITS: usize = 15;

/// 少于该字段数且无锚点时视为置信度不足
const MIN_FIELDS_WITHOUT_ANCHOR: usize = 3;

// ==========================================
// 内容判定
// ==========================================

pub fn is_email(value: &str) -> bool {
    EMAIL_SHAPE.is_match(value.trim())
}

/// 含 `/` 或 `:` 的值一律不是电话（避免与日期时间混淆）
pub fn is_phone(value: &str) -> bool {
    if value.contains('/') || value.contains(':') {
        return false;
    }
    let digits = digits_only(value).len();
    (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits)
}

/// 恰好 6 位数字
pub fn is_pincode(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.len() == PINCODE_LEN && trimmed.chars().all(|c| c.is_ascii_digit())
}

pub fn is_date(value: &str) -> bool {
    value.chars().count() > 5
        && value.chars().any(|c| c.is_ascii_digit())
        && parse_loose_date(value).is_some()
}

fn looks_like_email_anchor(value: &str) -> bool {
    is_email(value) || value.contains('@')
}

fn looks_like_phone_anchor(value: &str) -> bool {
    if is_phone(value) {
        return true;
    }
    let stripped = PHONE_SEPARATORS.replace_all(value, "");
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
}

// ==========================================
// ColumnPool - 未使用列集合
// ==========================================
/// 候选列池：每次取出的列不再参与后续判定
#[derive(Debug, Clone)]
pub struct ColumnPool<'a> {
    cells: &'a [String],
    unused: BTreeSet<usize>,
}

impl<'a> ColumnPool<'a> {
    pub fn new(cells: &'a [String]) -> Self {
        Self {
            cells,
            unused: (0..cells.len()).collect(),
        }
    }

    fn value(&self, idx: usize) -> &str {
        self.cells[idx].trim()
    }

    /// 取出从左到右第一个满足判定的列
    pub fn take_first_matching<F>(&mut self, predicate: F) -> Option<usize>
    where
        F: Fn(&str) -> bool,
    {
        let hit = self
            .unused
            .iter()
            .copied()
            .find(|idx| predicate(self.value(*idx)))?;
        self.unused.remove(&hit);
        Some(hit)
    }

    /// 取出最左侧的剩余列
    pub fn take_next(&mut self) -> Option<usize> {
        self.unused.pop_first()
    }

    /// 取出内容最长的剩余列（长度相同取最左）
    pub fn take_longest(&mut self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for idx in self.unused.iter().copied() {
            let len = self.value(idx).chars().count();
            if best.map(|(_, l)| len > l).unwrap_or(true) {
                best = Some((idx, len));
            }
        }
        let (idx, _) = best?;
        self.unused.remove(&idx);
        Some(idx)
    }

    pub fn remaining(&self) -> usize {
        self.unused.len()
    }
}

// ==========================================
// HeuristicColumnDetector
// ==========================================
pub struct HeuristicColumnDetector;

impl HeuristicColumnDetector {
    /// 固定布局快速通道：列数足够且锚点列内容吻合
    fn match_fixed_layout(layout: &FixedLayout, row: &[String]) -> Option<FieldMapping> {
        if row.len() < layout.min_columns {
            return None;
        }
        let email = row.get(layout.email_column)?.trim();
        let phone = row.get(layout.phone_column)?.trim();
        if !(looks_like_email_anchor(email) && looks_like_phone_anchor(phone)) {
            return None;
        }

        let mut mapping = FieldMapping::new(MappingOrigin::FixedLayout);
        for (field, column) in &layout.columns {
            mapping.assign(*field, *column);
        }
        Some(mapping)
    }

    /// 通用内容识别
    fn detect_by_content(row: &[String]) -> FieldMapping {
        let mut mapping = FieldMapping::new(MappingOrigin::Heuristic);
        let mut pool = ColumnPool::new(row);

        let anchors: [(CanonicalField, fn(&str) -> bool); 4] = [
            (CanonicalField::Email, is_email),
            (CanonicalField::Phone, is_phone),
            (CanonicalField::Pincode, is_pincode),
            (CanonicalField::Timestamp, is_date),
        ];
        for (field, predicate) in anchors {
            if let Some(idx) = pool.take_first_matching(predicate) {
                mapping.assign(field, idx);
            }
        }

        if let Some(idx) = pool.take_next() {
            mapping.assign(CanonicalField::FirstName, idx);
        }
        if let Some(idx) = pool.take_next() {
            mapping.assign(CanonicalField::LastName, idx);
        }
        if let Some(idx) = pool.take_longest() {
            mapping.assign(CanonicalField::StreetAddress, idx);
        }
        if let Some(idx) = pool.take_next() {
            mapping.assign(CanonicalField::City, idx);
        }
        if let Some(idx) = pool.take_next() {
            mapping.assign(CanonicalField::State, idx);
        }

        mapping
    }

    /// 质量门槛：有锚点字段，或至少分配 3 个字段
    pub fn passes_quality_gate(mapping: &FieldMapping) -> bool {
        mapping.has_any(&CanonicalField::ANCHORS) || mapping.len() >= MIN_FIELDS_WITHOUT_ANCHOR
    }
}

impl ColumnDetector for HeuristicColumnDetector {
    fn detect(&self, schema: &FieldSchema, table: &RawTable) -> Option<FieldMapping> {
        let row = table.first_row()?;

        if let Some(layout) = schema.fixed_layout() {
            if let Some(mapping) = Self::match_fixed_layout(layout, row) {
                debug!(columns = row.len(), "命中固定列布局");
                return Some(mapping);
            }
        }

        let mapping = Self::detect_by_content(row);
        if !Self::passes_quality_gate(&mapping) {
            debug!(assigned = mapping.len(), "启发式识别置信度不足");
            return None;
        }

        debug!(assigned = mapping.len(), "启发式识别完成");
        Some(mapping)
    }
}
