// ==========================================
// 倡议追踪系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{ImportConfigReader, ImportSettings};
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;

        Ok(())
    }

    /// 获取导入配置快照（JSON格式）
    ///
    /// # 用途
    /// - 导入日志中记录本次运行使用的配置
    pub fn snapshot_json(&self) -> Result<String, Box<dyn Error>> {
        let settings = self.load_settings()?;
        Ok(serde_json::to_string(&settings)?)
    }
}

impl ImportConfigReader for ConfigManager {
    fn get_csv_delimiter(&self) -> Result<u8, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::CSV_DELIMITER, ",")?;
        let value = match value.as_str() {
            "\\t" | "tab" | "TAB" => "\t".to_string(),
            _ => value,
        };

        match value.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(format!(
                "配置值格式错误 (key: {}, value: {}): 分隔符必须是单个 ASCII 字符",
                config_keys::CSV_DELIMITER,
                value
            )
            .into()),
        }
    }

    fn get_tag_retry_limit(&self) -> Result<u32, Box<dyn Error>> {
        let default = ImportSettings::default().tag_retry_limit.to_string();
        let value = self.get_config_or_default(config_keys::TAG_RETRY_LIMIT, &default)?;
        value.parse::<u32>().map_err(|e| {
            format!(
                "配置值格式错误 (key: {}, value: {}): {}",
                config_keys::TAG_RETRY_LIMIT,
                value,
                e
            )
            .into()
        })
    }

    fn get_locale(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::LOCALE, crate::i18n::DEFAULT_LOCALE)?;
        match value.to_lowercase().as_str() {
            "pl" => Ok("pl".to_string()),
            "en" => Ok("en".to_string()),
            _ => Ok(crate::i18n::DEFAULT_LOCALE.to_string()), // 未知语言回退默认
        }
    }

    fn get_busy_timeout_ms(&self) -> Result<u64, Box<dyn Error>> {
        let default = crate::db::DEFAULT_BUSY_TIMEOUT_MS.to_string();
        let value = self.get_config_or_default(config_keys::BUSY_TIMEOUT_MS, &default)?;
        value.parse::<u64>().map_err(|e| {
            format!(
                "配置值格式错误 (key: {}, value: {}): {}",
                config_keys::BUSY_TIMEOUT_MS,
                value,
                e
            )
            .into()
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 文件解析
    pub const CSV_DELIMITER: &str = "import/csv_delimiter";

    // 标签
    pub const TAG_RETRY_LIMIT: &str = "import/tag_retry_limit";

    // 消息
    pub const LOCALE: &str = "import/locale";

    // 并发
    pub const BUSY_TIMEOUT_MS: &str = "import/busy_timeout_ms";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let manager = setup_manager();
        let settings = manager.load_settings().unwrap();
        assert_eq!(settings, ImportSettings::default());
    }

    #[test]
    fn test_overrides_from_config_kv() {
        let manager = setup_manager();
        manager
            .set_global_config_value(config_keys::CSV_DELIMITER, ";")
            .unwrap();
        manager
            .set_global_config_value(config_keys::TAG_RETRY_LIMIT, "5")
            .unwrap();
        manager
            .set_global_config_value(config_keys::LOCALE, "PL")
            .unwrap();
        manager
            .set_global_config_value(config_keys::BUSY_TIMEOUT_MS, "60000")
            .unwrap();

        let settings = manager.load_settings().unwrap();
        assert_eq!(settings.csv_delimiter, b';');
        assert_eq!(settings.tag_retry_limit, 5);
        assert_eq!(settings.locale, "pl");
        assert_eq!(settings.busy_timeout_ms, 60_000);
    }

    #[test]
    fn test_tab_delimiter_alias() {
        let manager = setup_manager();
        manager
            .set_global_config_value(config_keys::CSV_DELIMITER, "\\t")
            .unwrap();
        assert_eq!(manager.get_csv_delimiter().unwrap(), b'\t');
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let manager = setup_manager();
        manager
            .set_global_config_value(config_keys::CSV_DELIMITER, ";;")
            .unwrap();
        manager
            .set_global_config_value(config_keys::TAG_RETRY_LIMIT, "-1")
            .unwrap();

        assert!(manager.get_csv_delimiter().is_err());
        assert!(manager.get_tag_retry_limit().is_err());
        assert!(manager.load_settings().is_err());

        manager
            .set_global_config_value(config_keys::BUSY_TIMEOUT_MS, "5s")
            .unwrap();
        assert!(manager.get_busy_timeout_ms().is_err());
    }

    #[test]
    fn test_snapshot_json() {
        let manager = setup_manager();
        let json = manager.snapshot_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tag_retry_limit"], 3);
        assert_eq!(value["locale"], "en");
        assert_eq!(value["busy_timeout_ms"], 5000);
    }
}
