// ==========================================
// 倡议导入API
// ==========================================
// 职责: 封装倡议导入相关功能（单文件 / 内存字节 / 并发批量）
// 约束: 每次导入独立打开连接，独立事务
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::initiative::{ImportOutcome, Initiative, SkippedRow, Tag};
use crate::importer::{detect_format, InitiativeImporter, InitiativeImporterImpl};
use crate::repository::{InitiativeRepository, TagRepository};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, warn};

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 源文件名
    pub file_name: String,
    /// 成功导入的倡议数量
    pub imported: usize,
    /// 被跳过的行（行号 + 已本地化原因）
    pub skipped: Vec<SkippedRow>,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 导入文件
    ///
    /// # 参数
    /// - file_path: .csv / .xlsx 文件路径
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果（可能含被跳过的行）
    /// - Err(ApiError): 格式不支持 / 缺列 / 解码失败等，数据库无任何变化
    pub fn import_file(&self, file_path: &str) -> ApiResult<ImportApiResponse> {
        // 格式不支持时不打开数据库、不读取文件
        detect_format(file_path)?;

        let start_time = Instant::now();
        let importer = self.create_importer()?;
        let outcome = importer.import_file(Path::new(file_path));

        let file_name = Path::new(file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.to_string());
        Self::to_response(file_name, outcome, start_time)
    }

    /// 导入内存中的文件内容（如上传的附件）
    ///
    /// # 参数
    /// - file_name: 仅用于识别格式
    /// - bytes: 文件完整内容
    pub fn import_bytes(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<ImportApiResponse> {
        detect_format(file_name)?;

        let start_time = Instant::now();
        let importer = self.create_importer()?;
        let outcome = importer.import_bytes(file_name, bytes);
        Self::to_response(file_name.to_string(), outcome, start_time)
    }

    /// 批量导入多个文件（并发执行）
    ///
    /// # 说明
    /// - 每个文件在独立的阻塞任务中导入，使用各自的连接和事务
    /// - 单个文件失败不影响其他文件
    /// - 返回顺序与输入顺序一致
    pub async fn batch_import(&self, file_paths: Vec<String>) -> Vec<ApiResult<ImportApiResponse>> {
        info!(files = file_paths.len(), "开始批量导入");

        let tasks = file_paths.into_iter().map(|file_path| {
            let api = ImportApi::new(self.db_path.clone());
            tokio::task::spawn_blocking(move || api.import_file(&file_path))
        });

        futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    warn!(error = %e, "导入任务异常终止");
                    Err(ApiError::InternalError(format!("导入任务异常终止: {}", e)))
                })
            })
            .collect()
    }

    /// 列出全部倡议（含标签）
    pub fn list_initiatives(&self) -> ApiResult<Vec<Initiative>> {
        let repo = InitiativeRepository::new(self.open_connection()?);
        Ok(repo.list_all()?)
    }

    /// 列出全部标签（按名称排序）
    pub fn list_tags(&self) -> ApiResult<Vec<Tag>> {
        let repo = TagRepository::new(self.open_connection()?);
        Ok(repo.list_all()?)
    }

    fn open_connection(&self) -> ApiResult<Arc<Mutex<Connection>>> {
        let conn = open_sqlite_connection(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("{}: {}", self.db_path, e)))?;
        init_schema(&conn)?;
        Ok(Arc::new(Mutex::new(conn)))
    }

    fn create_importer(&self) -> ApiResult<InitiativeImporterImpl<ConfigManager>> {
        let conn = self.open_connection()?;
        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::InternalError(format!("创建配置管理器失败: {}", e)))?;

        Ok(InitiativeImporterImpl::new(conn, config))
    }

    fn to_response(
        file_name: String,
        outcome: ImportOutcome,
        start_time: Instant,
    ) -> ApiResult<ImportApiResponse> {
        if !outcome.is_success() {
            return Err(ApiError::ImportRejected(outcome.fatal_errors.join("; ")));
        }

        Ok(ImportApiResponse {
            file_name,
            imported: outcome.imported,
            skipped: outcome.skipped,
            elapsed_ms: start_time.elapsed().as_millis() as i64,
        })
    }
}
