// ==========================================
// 倡议追踪系统 - 导入模块错误类型
// ==========================================
// 分级:
// - 致命错误（整次导入回滚）: 格式不支持 / 解码失败 / 缺列 / 运行中止（数据库、锁等）
// - 行级错误（仅跳过该行）: 缺名称 / 字段处理失败 / 落库失败
// 工具: thiserror 派生宏
// ==========================================

use crate::i18n::t_in;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 致命错误 =====
    #[error("文件格式不支持: {0}（仅支持 .csv/.xlsx）")]
    UnsupportedFormat(String),

    #[error("文件解码失败: {0}")]
    Decode(String),

    #[error("缺少必需列: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// 运行中其他未分类错误（数据库 / 锁 / 提交失败）
    #[error("导入中止: {0}")]
    FatalRun(String),

    #[error("文件读取失败: {0}")]
    FileRead(String),

    #[error("配置读取失败: {0}")]
    Config(String),

    // ===== 行级错误 =====
    #[error("缺少必填名称 (行 {row}, 列 {header})")]
    MissingRequiredName { row: usize, header: String },

    #[error("字段处理失败 (行 {row}, 列 {header}): {source}")]
    RowField {
        row: usize,
        header: String,
        #[source]
        source: FieldError,
    },

    #[error("行落库失败 (行 {row}): {source}")]
    RowPersist {
        row: usize,
        #[source]
        source: RepositoryError,
    },
}

/// 单个字段转换失败的原因
#[derive(Error, Debug)]
pub enum FieldError {
    #[error("值超过 {max} 个字符")]
    TooLong { max: usize },

    #[error("标签 \"{tag}\" 超过 {max} 个字符")]
    TagTooLong { tag: String, max: usize },

    #[error("字段类型不匹配: {0}")]
    Mismatch(String),

    #[error("标签解析失败: {0}")]
    TagStore(#[from] RepositoryError),
}

impl FieldError {
    fn user_message(&self, locale: &str) -> String {
        match self {
            FieldError::TooLong { max } => {
                t_in(locale, "import.value_too_long", &[("max", &max.to_string())])
            }
            FieldError::TagTooLong { tag, max } => t_in(
                locale,
                "import.tag_too_long",
                &[("tag", tag), ("max", &max.to_string())],
            ),
            FieldError::Mismatch(msg) => msg.clone(),
            FieldError::TagStore(e) => e.to_string(),
        }
    }
}

impl ImportError {
    /// 是否为致命错误（整次导入回滚，不产生任何持久化效果）
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ImportError::MissingRequiredName { .. }
                | ImportError::RowField { .. }
                | ImportError::RowPersist { .. }
        )
    }

    /// 面向用户的本地化消息
    pub fn user_message(&self, locale: &str) -> String {
        match self {
            ImportError::UnsupportedFormat(ext) => {
                t_in(locale, "import.unsupported_format", &[("ext", ext)])
            }
            ImportError::Decode(e) => t_in(locale, "import.decode_error", &[("error", e)]),
            ImportError::MissingColumns(columns) => t_in(
                locale,
                "import.missing_columns",
                &[("columns", &columns.join(", "))],
            ),
            ImportError::FatalRun(e)
            | ImportError::FileRead(e)
            | ImportError::Config(e) => t_in(locale, "import.fatal_error", &[("error", e)]),
            ImportError::MissingRequiredName { header, .. } => {
                t_in(locale, "import.missing_name", &[("header", header)])
            }
            ImportError::RowField { header, source, .. } => t_in(
                locale,
                "import.row_field_error",
                &[("header", header), ("error", &source.user_message(locale))],
            ),
            ImportError::RowPersist { source, .. } => t_in(
                locale,
                "import.row_persist_error",
                &[("error", &source.to_string())],
            ),
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileRead(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Decode(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::Decode(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::FatalRun(err.to_string())
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::FatalRun(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
