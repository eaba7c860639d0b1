// ==========================================
// 倡议追踪系统 - 领域类型定义
// ==========================================
// 职责: 导入管道共用的枚举（文件格式 / 字段标识 / 转换规则）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ==========================================
// 文件格式 (File Format)
// ==========================================
// 仅由扩展名决定，不做内容嗅探
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileFormat {
    Csv,  // 分隔文本
    Xlsx, // 结构化工作簿
}

impl FileFormat {
    /// 根据文件名扩展名识别格式（大小写不敏感）
    ///
    /// # 返回
    /// - Some(FileFormat): 支持的格式
    /// - None: 不支持的扩展名（含无扩展名）
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "xlsx" => Some(FileFormat::Xlsx),
            _ => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Csv => write!(f, "csv"),
            FileFormat::Xlsx => write!(f, "xlsx"),
        }
    }
}

// ==========================================
// 目标字段标识 (Initiative Field)
// ==========================================
// 与 initiative 表列一一对应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitiativeField {
    Name,
    Url,
    Person,
    Category,
    Timing,
    Public,
    Funders,
    Place,
    Region,
    Description,
    Target,
    Tags,
    ThematicCategory,
}

impl InitiativeField {
    /// 列名（与数据库一致）
    pub fn column_name(&self) -> &'static str {
        match self {
            InitiativeField::Name => "name",
            InitiativeField::Url => "url",
            InitiativeField::Person => "person",
            InitiativeField::Category => "category",
            InitiativeField::Timing => "timing",
            InitiativeField::Public => "public",
            InitiativeField::Funders => "funders",
            InitiativeField::Place => "place",
            InitiativeField::Region => "region",
            InitiativeField::Description => "description",
            InitiativeField::Target => "target",
            InitiativeField::Tags => "tags",
            InitiativeField::ThematicCategory => "thematic_category",
        }
    }

    /// 空值是否落库为 NULL
    ///
    /// name 必填；public/tags 不是文本列，不适用。
    pub fn is_nullable(&self) -> bool {
        !matches!(
            self,
            InitiativeField::Name | InitiativeField::Public | InitiativeField::Tags
        )
    }

    /// 文本字段最大长度（字符数）
    ///
    /// description 为长文本，不限长
    pub fn max_length(&self) -> Option<usize> {
        match self {
            InitiativeField::Url | InitiativeField::Funders => Some(500),
            InitiativeField::Category
            | InitiativeField::Region
            | InitiativeField::ThematicCategory => Some(100),
            InitiativeField::Description | InitiativeField::Public | InitiativeField::Tags => None,
            _ => Some(255),
        }
    }
}

impl fmt::Display for InitiativeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

// ==========================================
// 值转换规则 (Coercion Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoercionKind {
    PlainText, // 普通文本（空值按字段可空性处理）
    YesNo,     // "Tak" → true，其余 → false
    NameList,  // 逗号分隔的标签名列表
}

/// 标签名最大长度（与 tag 表一致）
pub const TAG_NAME_MAX_LENGTH: usize = 100;
