// ==========================================
// 倡议追踪系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;

// ==========================================
// ImportSettings - 单次导入使用的配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    /// CSV 分隔符（单个 ASCII 字符）
    pub csv_delimiter: u8,
    /// 标签唯一约束冲突后的重试次数
    pub tag_retry_limit: u32,
    /// 跳过原因/致命错误的语言
    pub locale: String,
    /// 等待其他导入释放写锁的最长时间（毫秒）
    ///
    /// 外层事务在整个文件导入期间持有写锁；并发批量导入时，
    /// 大文件的耗时必须小于该值，否则后到的文件以致命错误结束。
    pub busy_timeout_ms: u64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            csv_delimiter: b',',
            tag_retry_limit: 3,
            locale: crate::i18n::DEFAULT_LOCALE.to_string(),
            busy_timeout_ms: crate::db::DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ImportConfigReader: Send + Sync {
    /// 获取 CSV 分隔符
    ///
    /// # 默认值
    /// - ','
    fn get_csv_delimiter(&self) -> Result<u8, Box<dyn Error>>;

    /// 获取标签创建冲突重试次数
    ///
    /// # 默认值
    /// - 3
    fn get_tag_retry_limit(&self) -> Result<u32, Box<dyn Error>>;

    /// 获取消息语言
    ///
    /// # 默认值
    /// - "en"
    fn get_locale(&self) -> Result<String, Box<dyn Error>>;

    /// 获取写锁等待时间（毫秒）
    ///
    /// # 默认值
    /// - 5000
    fn get_busy_timeout_ms(&self) -> Result<u64, Box<dyn Error>>;

    /// 读取本次导入的完整配置快照
    fn load_settings(&self) -> Result<ImportSettings, Box<dyn Error>> {
        Ok(ImportSettings {
            csv_delimiter: self.get_csv_delimiter()?,
            tag_retry_limit: self.get_tag_retry_limit()?,
            locale: self.get_locale()?,
            busy_timeout_ms: self.get_busy_timeout_ms()?,
        })
    }
}

/// 固定配置（测试及无数据库配置场景使用）
impl ImportConfigReader for ImportSettings {
    fn get_csv_delimiter(&self) -> Result<u8, Box<dyn Error>> {
        Ok(self.csv_delimiter)
    }

    fn get_tag_retry_limit(&self) -> Result<u32, Box<dyn Error>> {
        Ok(self.tag_retry_limit)
    }

    fn get_locale(&self) -> Result<String, Box<dyn Error>> {
        Ok(self.locale.clone())
    }

    fn get_busy_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        Ok(self.busy_timeout_ms)
    }
}
