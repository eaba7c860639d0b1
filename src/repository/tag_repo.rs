// ==========================================
// 倡议追踪系统 - 标签 Repository
// ==========================================
// 职责: tag 表数据访问
// 红线: Repository 不含业务规则（名称规范化/缓存由 TagResolver 负责）
// ==========================================

use crate::domain::initiative::Tag;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct TagRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TagRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 按名称精确查询
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Tag>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        Self::find_by_name_tx(&conn, name)
    }

    /// 查询全部标签（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Tag>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare("SELECT tag_id, name FROM tag ORDER BY name")?;
        let tags = stmt
            .query_map([], |row| {
                Ok(Tag {
                    tag_id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    /// 统计标签数量
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM tag", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ===== 事务内操作（由调用方持有事务/保存点）=====

    /// 在事务中按名称查询
    pub fn find_by_name_tx(conn: &Connection, name: &str) -> RepositoryResult<Option<Tag>> {
        let tag = conn
            .query_row(
                "SELECT tag_id, name FROM tag WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Tag {
                        tag_id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(tag)
    }

    /// 在事务中插入标签
    ///
    /// # 返回
    /// - Err(UniqueConstraintViolation): 同名标签已存在（可能由并发导入创建）
    pub fn insert_tx(conn: &Connection, name: &str) -> RepositoryResult<Tag> {
        conn.execute("INSERT INTO tag (name) VALUES (?1)", params![name])?;

        Ok(Tag {
            tag_id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_repo() -> (Arc<Mutex<Connection>>, TagRepository) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (conn.clone(), TagRepository::new(conn))
    }

    #[test]
    fn test_insert_and_find_by_name() {
        let (conn, repo) = setup_repo();

        let inserted = {
            let c = conn.lock().unwrap();
            TagRepository::insert_tx(&c, "ekologia").unwrap()
        };

        let found = repo.find_by_name("ekologia").unwrap().unwrap();
        assert_eq!(found, inserted);
        assert!(repo.find_by_name("Ekologia").unwrap().is_none());
    }

    #[test]
    fn test_insert_duplicate_is_unique_violation() {
        let (conn, repo) = setup_repo();
        let c = conn.lock().unwrap();

        TagRepository::insert_tx(&c, "sport").unwrap();
        let err = TagRepository::insert_tx(&c, "sport").unwrap_err();
        drop(c);

        assert!(err.is_unique_violation());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_list_all_sorted_by_name() {
        let (conn, repo) = setup_repo();
        {
            let c = conn.lock().unwrap();
            TagRepository::insert_tx(&c, "zdrowie").unwrap();
            TagRepository::insert_tx(&c, "edukacja").unwrap();
        }

        let names: Vec<String> = repo.list_all().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["edukacja".to_string(), "zdrowie".to_string()]);
    }
}
