// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试文件生成等功能
// ==========================================

#![allow(dead_code)]

use initiative_import::config::ConfigManager;
use initiative_import::db::{init_schema, open_sqlite_connection};
use initiative_import::domain::types::InitiativeField;
use initiative_import::importer::{InitiativeImporterImpl, INITIATIVE_COLUMN_MAPPINGS};
use rusqlite::Connection;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接（导入器与配置管理器共用）
pub fn open_shared(db_path: &str) -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(
        open_sqlite_connection(db_path).expect("Failed to open db"),
    ))
}

/// 创建使用数据库配置的导入器
pub fn create_test_importer(
    conn: Arc<Mutex<Connection>>,
) -> InitiativeImporterImpl<ConfigManager> {
    let config = ConfigManager::from_connection(conn.clone()).expect("Failed to create config");
    InitiativeImporterImpl::new(conn, config)
}

/// 统计表行数
pub fn count_rows(conn: &Arc<Mutex<Connection>>, table: &str) -> i64 {
    let conn = conn.lock().unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
    .unwrap()
}

/// 写入测试文件
pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

// ==========================================
// CSV 构造器
// ==========================================

/// 完整表头（映射表顺序）
pub fn header_cells() -> Vec<String> {
    INITIATIVE_COLUMN_MAPPINGS
        .iter()
        .map(|m| m.header.to_string())
        .collect()
}

/// 单个数据行（按映射表顺序存放单元格）
#[derive(Debug, Clone)]
pub struct InitiativeRow {
    cells: Vec<String>,
}

impl InitiativeRow {
    pub fn named(name: &str) -> Self {
        Self {
            cells: vec![String::new(); INITIATIVE_COLUMN_MAPPINGS.len()],
        }
        .with(InitiativeField::Name, name)
    }

    pub fn with(mut self, field: InitiativeField, value: &str) -> Self {
        let idx = INITIATIVE_COLUMN_MAPPINGS
            .iter()
            .position(|m| m.field == field)
            .expect("field not mapped");
        self.cells[idx] = value.to_string();
        self
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

fn quote_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn csv_line(cells: &[String], delimiter: char) -> String {
    cells
        .iter()
        .map(|c| quote_cell(c))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string())
}

/// 构造带完整表头的 CSV 内容
pub fn build_csv(rows: &[InitiativeRow]) -> String {
    build_csv_with_header(&header_cells(), rows)
}

/// 构造自定义表头的 CSV 内容
pub fn build_csv_with_header(header: &[String], rows: &[InitiativeRow]) -> String {
    let mut content = csv_line(header, ',');
    content.push('\n');
    for row in rows {
        content.push_str(&csv_line(row.cells(), ','));
        content.push('\n');
    }
    content
}

/// 以分号分隔构造 CSV（单元格不含分号）
pub fn build_csv_semicolon(rows: &[InitiativeRow]) -> String {
    let mut content = header_cells().join(";");
    content.push('\n');
    for row in rows {
        content.push_str(&row.cells().join(";"));
        content.push('\n');
    }
    content
}
