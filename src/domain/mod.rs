// ==========================================
// 倡议追踪系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod initiative;
pub mod types;

// 重导出核心类型
pub use initiative::{FieldValue, ImportOutcome, Initiative, SkippedRow, StagedRecord, Tag};
pub use types::{CoercionKind, FileFormat, InitiativeField, TAG_NAME_MAX_LENGTH};
