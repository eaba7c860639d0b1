// ==========================================
// 倡议追踪系统 - 倡议/标签领域模型
// ==========================================
// 职责: 持久化实体（Initiative / Tag）与导入中间产物
//       （StagedRecord / ImportOutcome）
// 红线: 不含数据访问逻辑
// ==========================================

use crate::domain::types::InitiativeField;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Tag - 标签
// ==========================================
// 名称全局唯一；身份以 tag_id 为准
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub tag_id: i64,
    pub name: String,
}

// ==========================================
// Initiative - 倡议（已落库）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Initiative {
    pub initiative_id: i64,
    pub name: String,
    pub url: Option<String>,
    pub person: Option<String>,
    pub category: Option<String>,
    pub timing: Option<String>,
    pub public: bool,
    pub funders: Option<String>,
    pub place: Option<String>,
    pub region: Option<String>,
    pub description: Option<String>,
    pub target: Option<String>,
    pub thematic_category: Option<String>,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// FieldValue - 转换后的单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    OptionalText(Option<String>),
    Bool(bool),
    Tags(Vec<Tag>),
}

impl FieldValue {
    fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::OptionalText(_) => "optional text",
            FieldValue::Bool(_) => "bool",
            FieldValue::Tags(_) => "tags",
        }
    }
}

// ==========================================
// StagedRecord - 待落库的倡议
// ==========================================
// 用途: 导入管道中间产物（行解码 → 转换 → 此结构 → 落库）
// 生命周期: 仅在单行处理内；行无效即丢弃
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StagedRecord {
    pub row_number: usize,
    pub name: String,
    pub url: Option<String>,
    pub person: Option<String>,
    pub category: Option<String>,
    pub timing: Option<String>,
    pub public: bool,
    pub funders: Option<String>,
    pub place: Option<String>,
    pub region: Option<String>,
    pub description: Option<String>,
    pub target: Option<String>,
    pub thematic_category: Option<String>,
    pub tags: Vec<Tag>,
}

impl StagedRecord {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            ..Default::default()
        }
    }

    /// 写入单个字段
    ///
    /// # 返回
    /// - Err: 值类型与字段不匹配（映射表配置错误）
    pub fn apply(&mut self, field: InitiativeField, value: FieldValue) -> Result<(), String> {
        match (field, value) {
            (InitiativeField::Name, FieldValue::Text(v)) => self.name = v,
            (InitiativeField::Public, FieldValue::Bool(v)) => self.public = v,
            (InitiativeField::Tags, FieldValue::Tags(v)) => self.tags = v,
            (InitiativeField::Url, FieldValue::OptionalText(v)) => self.url = v,
            (InitiativeField::Person, FieldValue::OptionalText(v)) => self.person = v,
            (InitiativeField::Category, FieldValue::OptionalText(v)) => self.category = v,
            (InitiativeField::Timing, FieldValue::OptionalText(v)) => self.timing = v,
            (InitiativeField::Funders, FieldValue::OptionalText(v)) => self.funders = v,
            (InitiativeField::Place, FieldValue::OptionalText(v)) => self.place = v,
            (InitiativeField::Region, FieldValue::OptionalText(v)) => self.region = v,
            (InitiativeField::Description, FieldValue::OptionalText(v)) => self.description = v,
            (InitiativeField::Target, FieldValue::OptionalText(v)) => self.target = v,
            (InitiativeField::ThematicCategory, FieldValue::OptionalText(v)) => {
                self.thematic_category = v
            }
            (field, value) => {
                return Err(format!(
                    "field {} does not accept {} values",
                    field,
                    value.kind_name()
                ))
            }
        }
        Ok(())
    }
}

// ==========================================
// SkippedRow - 被跳过的行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row: usize,     // 原始文件行号（表头为第 1 行）
    pub reason: String, // 跳过原因（已本地化）
}

// ==========================================
// ImportOutcome - 导入结果
// ==========================================
// 不变量: fatal_errors 非空 → imported == 0 且 skipped 为空
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
    pub fatal_errors: Vec<String>,
}

impl ImportOutcome {
    pub fn success(imported: usize, skipped: Vec<SkippedRow>) -> Self {
        Self {
            imported,
            skipped,
            fatal_errors: Vec::new(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            imported: 0,
            skipped: Vec::new(),
            fatal_errors: vec![message.into()],
        }
    }

    pub fn is_success(&self) -> bool {
        self.fatal_errors.is_empty()
    }
}
