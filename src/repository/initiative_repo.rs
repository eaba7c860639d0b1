// ==========================================
// 倡议追踪系统 - 倡议 Repository
// ==========================================
// 职责: initiative / initiative_tags 表数据访问
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::initiative::{Initiative, StagedRecord, Tag};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const INITIATIVE_COLUMNS: &str = "initiative_id, name, url, person, category, timing, public, \
     funders, place, region, description, target, thematic_category, created_at, updated_at";

pub struct InitiativeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InitiativeRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 在事务/保存点中插入倡议及其标签关联
    ///
    /// # 返回
    /// - Ok(i64): 新建的 initiative_id
    /// - Err: 约束违反等数据库错误（调用方回滚保存点）
    pub fn insert_tx(conn: &Connection, record: &StagedRecord) -> RepositoryResult<i64> {
        let now = Utc::now();

        conn.execute(
            r#"
            INSERT INTO initiative (
                name, url, person, category, timing, public, funders, place,
                region, description, target, thematic_category, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14
            )
            "#,
            params![
                record.name,
                record.url,
                record.person,
                record.category,
                record.timing,
                record.public,
                record.funders,
                record.place,
                record.region,
                record.description,
                record.target,
                record.thematic_category,
                now,
                now,
            ],
        )?;
        let initiative_id = conn.last_insert_rowid();

        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO initiative_tags (initiative_id, tag_id) VALUES (?1, ?2)",
        )?;
        for tag in &record.tags {
            stmt.execute(params![initiative_id, tag.tag_id])?;
        }

        Ok(initiative_id)
    }

    /// 统计倡议数量
    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM initiative", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// 按名称查询（名称不唯一，可能返回多条）
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Vec<Initiative>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let sql = format!(
            "SELECT {} FROM initiative WHERE name = ?1 ORDER BY initiative_id",
            INITIATIVE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut initiatives = stmt
            .query_map(params![name], map_initiative_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for initiative in &mut initiatives {
            initiative.tags = load_tags(&conn, initiative.initiative_id)?;
        }

        Ok(initiatives)
    }

    /// 查询全部倡议（按创建顺序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Initiative>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let sql = format!(
            "SELECT {} FROM initiative ORDER BY initiative_id",
            INITIATIVE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut initiatives = stmt
            .query_map([], map_initiative_row)?
            .collect::<Result<Vec<_>, _>>()?;

        for initiative in &mut initiatives {
            initiative.tags = load_tags(&conn, initiative.initiative_id)?;
        }

        Ok(initiatives)
    }
}

fn map_initiative_row(row: &Row<'_>) -> rusqlite::Result<Initiative> {
    Ok(Initiative {
        initiative_id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        person: row.get(3)?,
        category: row.get(4)?,
        timing: row.get(5)?,
        public: row.get(6)?,
        funders: row.get(7)?,
        place: row.get(8)?,
        region: row.get(9)?,
        description: row.get(10)?,
        target: row.get(11)?,
        thematic_category: row.get(12)?,
        tags: Vec::new(),
        created_at: row.get::<_, DateTime<Utc>>(13)?,
        updated_at: row.get::<_, DateTime<Utc>>(14)?,
    })
}

fn load_tags(conn: &Connection, initiative_id: i64) -> RepositoryResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT t.tag_id, t.name
        FROM initiative_tags it
        JOIN tag t ON t.tag_id = it.tag_id
        WHERE it.initiative_id = ?1
        ORDER BY t.name
        "#,
    )?;

    let tags = stmt
        .query_map(params![initiative_id], |row| {
            Ok(Tag {
                tag_id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::TagRepository;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn make_record(name: &str, tags: Vec<Tag>) -> StagedRecord {
        StagedRecord {
            row_number: 2,
            name: name.to_string(),
            url: Some("https://example.org".to_string()),
            public: true,
            region: Some("Mazowieckie".to_string()),
            description: None,
            tags,
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_with_tags_and_read_back() {
        let conn = setup_test_db();
        let repo = InitiativeRepository::new(conn.clone());

        {
            let c = conn.lock().unwrap();
            let tag = TagRepository::insert_tx(&c, "ekologia").unwrap();
            InitiativeRepository::insert_tx(&c, &make_record("Czyste Powietrze", vec![tag]))
                .unwrap();
        }

        let found = repo.find_by_name("Czyste Powietrze").unwrap();
        assert_eq!(found.len(), 1);
        let initiative = &found[0];
        assert!(initiative.public);
        assert_eq!(initiative.url.as_deref(), Some("https://example.org"));
        assert_eq!(initiative.person, None);
        assert_eq!(initiative.description, None);
        assert_eq!(initiative.tags.len(), 1);
        assert_eq!(initiative.tags[0].name, "ekologia");
    }

    #[test]
    fn test_duplicate_tag_links_are_collapsed() {
        let conn = setup_test_db();
        let repo = InitiativeRepository::new(conn.clone());

        {
            let c = conn.lock().unwrap();
            let tag = TagRepository::insert_tx(&c, "sport").unwrap();
            InitiativeRepository::insert_tx(
                &c,
                &make_record("Bieg", vec![tag.clone(), tag]),
            )
            .unwrap();
        }

        let all = repo.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].tags.len(), 1);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_unknown_tag_is_foreign_key_violation() {
        let conn = setup_test_db();
        let c = conn.lock().unwrap();

        let ghost = Tag {
            tag_id: 999,
            name: "ghost".to_string(),
        };
        let err = InitiativeRepository::insert_tx(&c, &make_record("X", vec![ghost])).unwrap_err();

        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    }
}
