// ==========================================
// 倡议追踪系统 - 导入层
// ==========================================
// 职责: CSV/Excel 倡议批量导入
// 管道: 行解码 → 列映射 → 字段转换（含标签解析）→ 事务化落库
// ==========================================

// 模块声明
pub mod column_mapper;
pub mod error;
pub mod field_coercer;
pub mod initiative_importer_impl;
pub mod initiative_importer_trait;
pub mod row_decoder;
pub mod tag_resolver;

// 重导出核心类型
pub use column_mapper::{ColumnIndex, ColumnMapper, ColumnMapping, INITIATIVE_COLUMN_MAPPINGS};
pub use error::{FieldError, ImportError, ImportResult};
pub use field_coercer::FieldCoercer;
pub use initiative_importer_impl::InitiativeImporterImpl;
pub use row_decoder::{
    detect_format, open_row_source, CsvRowDecoder, RawRow, RowSource, SheetRowDecoder,
};
pub use tag_resolver::{TagResolver, TagStore};

// 重导出 Trait 接口
pub use initiative_importer_trait::InitiativeImporter;
