// ==========================================
// 倡议追踪系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 核心: CSV/Excel 倡议批量导入引擎（整批原子提交 + 逐行诊断）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/schema）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CoercionKind, FileFormat, InitiativeField};

// 领域实体
pub use domain::{ImportOutcome, Initiative, SkippedRow, StagedRecord, Tag};

// 导入器
pub use importer::{InitiativeImporter, InitiativeImporterImpl};

// API
pub use api::{ImportApi, ImportApiResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "倡议追踪系统";
