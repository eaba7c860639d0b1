// ==========================================
// 倡议追踪系统 - 标签解析器
// ==========================================
// 职责: 按名称 get-or-create 标签，并在单次导入内缓存
// 约束:
// - 名称去除首尾空白；空名称静默跳过
// - 同一次导入内同名标签始终解析为同一实体
// - 创建发生在调用方的事务/保存点内：回滚后须调用 rollback_to 清理缓存
// - 唯一约束冲突（并发导入抢先创建）→ 重新查询，而不是判该行失败
// ==========================================

use crate::domain::initiative::Tag;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::TagRepository;
use rusqlite::Connection;
use std::collections::HashMap;
use tracing::{debug, info, warn};

// ==========================================
// TagStore - 标签存储接口
// ==========================================
// 实现者: rusqlite::Connection（事务/保存点通过 Deref 得到）
pub trait TagStore {
    fn find_tag(&self, name: &str) -> RepositoryResult<Option<Tag>>;

    /// 插入新标签；同名已存在时返回 UniqueConstraintViolation
    fn insert_tag(&self, name: &str) -> RepositoryResult<Tag>;
}

impl TagStore for Connection {
    fn find_tag(&self, name: &str) -> RepositoryResult<Option<Tag>> {
        TagRepository::find_by_name_tx(self, name)
    }

    fn insert_tag(&self, name: &str) -> RepositoryResult<Tag> {
        TagRepository::insert_tx(self, name)
    }
}

// ==========================================
// TagResolver
// ==========================================
pub struct TagResolver {
    cache: HashMap<String, Tag>,
    retry_limit: u32,
    created: Vec<String>,
}

impl TagResolver {
    /// # 参数
    /// - retry_limit: 唯一约束冲突后的最大重试次数
    pub fn new(retry_limit: u32) -> Self {
        Self {
            cache: HashMap::new(),
            retry_limit,
            created: Vec::new(),
        }
    }

    /// 解析单个标签名
    ///
    /// # 返回
    /// - Ok(None): 名称为空（去空白后），未创建任何实体
    /// - Ok(Some(tag)): 已存在或新建的标签
    /// - Err(TagConflictUnresolved): 重试耗尽仍无法读到冲突的标签
    pub fn resolve(&mut self, store: &dyn TagStore, name: &str) -> RepositoryResult<Option<Tag>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        if let Some(tag) = self.cache.get(name) {
            return Ok(Some(tag.clone()));
        }

        let attempts = self.retry_limit.saturating_add(1);
        for attempt in 1..=attempts {
            if let Some(tag) = store.find_tag(name)? {
                debug!(tag = %name, tag_id = tag.tag_id, "复用已有标签");
                return Ok(Some(self.remember(tag)));
            }

            match store.insert_tag(name) {
                Ok(tag) => {
                    info!(tag = %name, tag_id = tag.tag_id, "新建标签");
                    self.created.push(name.to_string());
                    return Ok(Some(self.remember(tag)));
                }
                Err(e) if e.is_unique_violation() => {
                    warn!(tag = %name, attempt = attempt, "标签已被并发创建，重新查询");
                }
                Err(e) => return Err(e),
            }
        }

        Err(RepositoryError::TagConflictUnresolved {
            name: name.to_string(),
            attempts,
        })
    }

    /// 解析名称列表，按首次出现顺序去重（以标签身份为准）
    pub fn resolve_all<S: AsRef<str>>(
        &mut self,
        store: &dyn TagStore,
        names: &[S],
    ) -> RepositoryResult<Vec<Tag>> {
        let mut tags: Vec<Tag> = Vec::with_capacity(names.len());
        for name in names {
            if let Some(tag) = self.resolve(store, name.as_ref())? {
                if !tags.iter().any(|t| t.tag_id == tag.tag_id) {
                    tags.push(tag);
                }
            }
        }
        Ok(tags)
    }

    /// 本次导入新建的标签数
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    /// 记录当前位置（配合保存点使用）
    pub fn mark(&self) -> usize {
        self.created.len()
    }

    /// 保存点回滚后调用：遗忘 mark 之后新建的标签
    pub fn rollback_to(&mut self, mark: usize) {
        if mark >= self.created.len() {
            return;
        }
        for name in self.created.drain(mark..) {
            self.cache.remove(&name);
        }
    }

    fn remember(&mut self, tag: Tag) -> Tag {
        self.cache.insert(tag.name.clone(), tag.clone());
        tag
    }
}
