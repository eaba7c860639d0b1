// ==========================================
// 倡议追踪系统 - 倡议导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 识别格式 → 解码 → 表头校验 → 逐行（校验 → 转换 → 落库）→ 提交
// 事务:
// - 整次导入一个外层事务（IMMEDIATE）；致命错误 → 整体回滚
// - 每行一个保存点；行级失败只回滚该行（含该行新建的标签）
// ==========================================

use crate::config::{ImportConfigReader, ImportSettings};
use crate::domain::initiative::{ImportOutcome, SkippedRow, StagedRecord};
use crate::domain::types::InitiativeField;
use crate::importer::column_mapper::{ColumnIndex, ColumnMapper};
use crate::importer::error::{FieldError, ImportError, ImportResult};
use crate::importer::field_coercer::FieldCoercer;
use crate::importer::initiative_importer_trait::InitiativeImporter;
use crate::importer::row_decoder::{detect_format, open_row_source, RowSource};
use crate::importer::tag_resolver::TagResolver;
use crate::repository::InitiativeRepository;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// InitiativeImporterImpl - 倡议导入器实现
// ==========================================
pub struct InitiativeImporterImpl<C>
where
    C: ImportConfigReader,
{
    // 数据库连接（整次导入期间持有锁）
    conn: Arc<Mutex<Connection>>,

    // 配置读取器
    config: C,

    // 导入组件
    column_mapper: ColumnMapper,
    field_coercer: FieldCoercer,
}

impl<C> InitiativeImporterImpl<C>
where
    C: ImportConfigReader,
{
    /// 创建导入器（使用默认映射表）
    ///
    /// # 参数
    /// - conn: 已初始化 schema 的数据库连接
    /// - config: 配置读取器
    pub fn new(conn: Arc<Mutex<Connection>>, config: C) -> Self {
        Self::with_mapper(conn, config, ColumnMapper::default())
    }

    pub fn with_mapper(conn: Arc<Mutex<Connection>>, config: C, column_mapper: ColumnMapper) -> Self {
        Self {
            conn,
            config,
            column_mapper,
            field_coercer: FieldCoercer,
        }
    }

    /// 读取本次导入的配置快照
    pub fn load_settings(&self) -> ImportResult<ImportSettings> {
        self.config
            .load_settings()
            .map_err(|e| ImportError::Config(e.to_string()))
    }

    /// 对已打开的行序列执行导入
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 外层事务已提交
    /// - Err: 致命错误，外层事务已回滚
    pub fn import_rows(
        &self,
        source: Box<dyn RowSource>,
        settings: &ImportSettings,
    ) -> ImportResult<ImportOutcome> {
        let format = source.format();
        let columns = self.column_mapper.resolve(source.header())?;
        debug!(format = %format, columns = columns.columns().len(), "表头校验通过");

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::FatalRun(format!("锁获取失败: {}", e)))?;
        // 外层事务持有写锁直到提交：其他导入最多等待 busy_timeout_ms
        conn.busy_timeout(Duration::from_millis(settings.busy_timeout_ms))?;
        let mut tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut resolver = TagResolver::new(settings.tag_retry_limit);
        let mut imported = 0usize;
        let mut skipped = Vec::new();

        for (idx, row) in source.enumerate() {
            // 表头为第 1 行
            let row_number = idx + 2;
            let raw = row?;

            match self.stage_row(&mut tx, &columns, &raw, row_number, &mut resolver) {
                Ok(initiative_id) => {
                    debug!(row = row_number, initiative_id = initiative_id, "行已落库");
                    imported += 1;
                }
                Err(e) if !e.is_fatal() => {
                    warn!(row = row_number, error = %e, "跳过行");
                    skipped.push(SkippedRow {
                        row: row_number,
                        reason: e.user_message(&settings.locale),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        tx.commit()?;

        info!(
            imported = imported,
            skipped = skipped.len(),
            tags_created = resolver.created_count(),
            "导入事务已提交"
        );
        Ok(ImportOutcome::success(imported, skipped))
    }

    /// 处理单行：名称校验 → 保存点内转换并落库
    ///
    /// 行级错误返回前保存点已回滚，标签缓存同步回退。
    fn stage_row(
        &self,
        tx: &mut Transaction,
        columns: &ColumnIndex,
        raw: &[String],
        row_number: usize,
        resolver: &mut TagResolver,
    ) -> ImportResult<i64> {
        let name = columns
            .index_of(InitiativeField::Name)
            .and_then(|idx| raw.get(idx))
            .map(|cell| cell.trim())
            .unwrap_or("");
        if name.is_empty() {
            return Err(ImportError::MissingRequiredName {
                row: row_number,
                header: self.name_header(),
            });
        }

        let mark = resolver.mark();
        let savepoint = tx.savepoint()?;

        match self.persist_row(&savepoint, columns, raw, row_number, resolver) {
            Ok(initiative_id) => {
                savepoint.commit()?;
                Ok(initiative_id)
            }
            Err(e) => {
                // drop → ROLLBACK TO
                drop(savepoint);
                resolver.rollback_to(mark);
                Err(e)
            }
        }
    }

    /// 按映射表顺序转换字段，首个失败字段终止该行
    fn persist_row(
        &self,
        conn: &Connection,
        columns: &ColumnIndex,
        raw: &[String],
        row_number: usize,
        resolver: &mut TagResolver,
    ) -> ImportResult<i64> {
        let mut record = StagedRecord::new(row_number);

        for column in columns.columns() {
            let mapping = &column.mapping;
            // 短行：缺失单元格按空值处理
            let cell = raw.get(column.index).map(String::as_str).unwrap_or("");

            let value = self
                .field_coercer
                .coerce(mapping, cell, resolver, conn)
                .and_then(|value| {
                    record
                        .apply(mapping.field, value)
                        .map_err(FieldError::Mismatch)
                });

            if let Err(source) = value {
                return Err(ImportError::RowField {
                    row: row_number,
                    header: mapping.header.to_string(),
                    source,
                });
            }
        }

        InitiativeRepository::insert_tx(conn, &record).map_err(|source| ImportError::RowPersist {
            row: row_number,
            source,
        })
    }

    fn name_header(&self) -> String {
        self.column_mapper
            .header_for(InitiativeField::Name)
            .unwrap_or_else(|| InitiativeField::Name.column_name())
            .to_string()
    }

    fn run(&self, file_name: &str, bytes: Vec<u8>, settings: &ImportSettings) -> ImportResult<ImportOutcome> {
        let source = open_row_source(file_name, bytes, settings.csv_delimiter)?;
        self.import_rows(source, settings)
    }

    fn fatal_outcome(&self, err: ImportError, locale: &str) -> ImportOutcome {
        error!(error = %err, "导入失败，已整体回滚");
        ImportOutcome::fatal(err.user_message(locale))
    }
}

impl<C> InitiativeImporter for InitiativeImporterImpl<C>
where
    C: ImportConfigReader,
{
    #[instrument(skip(self, path), fields(path = %path.display()))]
    fn import_file(&self, path: &Path) -> ImportOutcome {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let locale = self
            .config
            .get_locale()
            .unwrap_or_else(|_| crate::i18n::DEFAULT_LOCALE.to_string());

        if let Err(e) = detect_format(&file_name) {
            return self.fatal_outcome(e, &locale);
        }

        match std::fs::read(path) {
            Ok(bytes) => self.import_bytes(&file_name, bytes),
            Err(e) => self.fatal_outcome(ImportError::from(e), &locale),
        }
    }

    #[instrument(skip(self, bytes), fields(run_id, size = bytes.len()))]
    fn import_bytes(&self, file_name: &str, bytes: Vec<u8>) -> ImportOutcome {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());
        info!(run_id = %run_id, file_name = %file_name, "开始导入倡议");

        let settings = match self.load_settings() {
            Ok(settings) => settings,
            Err(e) => return self.fatal_outcome(e, crate::i18n::DEFAULT_LOCALE),
        };

        let outcome = match self.run(file_name, bytes, &settings) {
            Ok(outcome) => outcome,
            Err(e) => self.fatal_outcome(e, &settings.locale),
        };

        info!(
            run_id = %run_id,
            imported = outcome.imported,
            skipped = outcome.skipped.len(),
            fatal = !outcome.is_success(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "导入结束"
        );
        outcome
    }
}
