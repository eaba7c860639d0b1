// ==========================================
// 倡议追踪系统 - 字段转换器
// ==========================================
// 职责: 原始单元格字符串 → 目标字段值
// 规则:
// - PlainText: TRIM；空值 → NULL（可空字段）或空串（描述）；超长报错
// - YesNo: TRIM 后不区分大小写等于 "tak" 为 true，其余一律 false
// - NameList: 逗号切分 → TRIM → 丢弃空项 → get-or-create 标签 → 按身份去重
// ==========================================

use crate::domain::initiative::FieldValue;
use crate::domain::types::{CoercionKind, InitiativeField, TAG_NAME_MAX_LENGTH};
use crate::importer::column_mapper::ColumnMapping;
use crate::importer::error::FieldError;
use crate::importer::tag_resolver::{TagResolver, TagStore};

const YES_TOKEN: &str = "tak";

pub struct FieldCoercer;

impl FieldCoercer {
    /// 按映射规则转换单元格
    ///
    /// # 参数
    /// - resolver/store: 仅 NameList 规则使用（可能创建标签）
    pub fn coerce(
        &self,
        mapping: &ColumnMapping,
        raw: &str,
        resolver: &mut TagResolver,
        store: &dyn TagStore,
    ) -> Result<FieldValue, FieldError> {
        match mapping.coercion {
            CoercionKind::PlainText => self.clean_text(mapping.field, raw),
            CoercionKind::YesNo => Ok(FieldValue::Bool(self.parse_yes_no(raw))),
            CoercionKind::NameList => {
                let names = self.split_names(raw)?;
                let tags = resolver.resolve_all(store, &names)?;
                Ok(FieldValue::Tags(tags))
            }
        }
    }

    /// TRIM + 长度校验 + NULL 标准化
    pub fn clean_text(&self, field: InitiativeField, raw: &str) -> Result<FieldValue, FieldError> {
        let value = raw.trim();

        if let Some(max) = field.max_length() {
            if value.chars().count() > max {
                return Err(FieldError::TooLong { max });
            }
        }

        if !field.is_nullable() {
            return Ok(FieldValue::Text(value.to_string()));
        }

        if value.is_empty() {
            Ok(FieldValue::OptionalText(None))
        } else {
            Ok(FieldValue::OptionalText(Some(value.to_string())))
        }
    }

    pub fn parse_yes_no(&self, raw: &str) -> bool {
        raw.trim().to_lowercase() == YES_TOKEN
    }

    /// 逗号切分标签名（保留重复项，去重在解析后按身份进行）
    pub fn split_names(&self, raw: &str) -> Result<Vec<String>, FieldError> {
        let mut names = Vec::new();
        for part in raw.split(',') {
            let name = part.trim();
            if name.is_empty() {
                continue;
            }
            if name.chars().count() > TAG_NAME_MAX_LENGTH {
                return Err(FieldError::TagTooLong {
                    tag: name.to_string(),
                    max: TAG_NAME_MAX_LENGTH,
                });
            }
            names.push(name.to_string());
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::column_mapper::INITIATIVE_COLUMN_MAPPINGS;
    use rusqlite::Connection;

    fn setup_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn
    }

    fn mapping_for(field: InitiativeField) -> ColumnMapping {
        *INITIATIVE_COLUMN_MAPPINGS
            .iter()
            .find(|m| m.field == field)
            .unwrap()
    }

    #[test]
    fn test_yes_no_coercion() {
        let coercer = FieldCoercer;
        assert!(coercer.parse_yes_no("Tak"));
        assert!(coercer.parse_yes_no(" TAK "));
        assert!(coercer.parse_yes_no("tak"));
        assert!(!coercer.parse_yes_no("Nie"));
        assert!(!coercer.parse_yes_no(""));
        assert!(!coercer.parse_yes_no("yes"));
        assert!(!coercer.parse_yes_no("taki"));
    }

    #[test]
    fn test_clean_text_nullable_and_required() {
        let coercer = FieldCoercer;

        assert_eq!(
            coercer.clean_text(InitiativeField::Region, "  ").unwrap(),
            FieldValue::OptionalText(None)
        );
        assert_eq!(
            coercer.clean_text(InitiativeField::Region, " Mazowsze ").unwrap(),
            FieldValue::OptionalText(Some("Mazowsze".to_string()))
        );
        assert_eq!(
            coercer.clean_text(InitiativeField::Description, "").unwrap(),
            FieldValue::OptionalText(None)
        );
        assert_eq!(
            coercer.clean_text(InitiativeField::Name, " Nazwa ").unwrap(),
            FieldValue::Text("Nazwa".to_string())
        );
    }

    #[test]
    fn test_clean_text_too_long() {
        let coercer = FieldCoercer;
        let long_url = "u".repeat(501);
        let err = coercer.clean_text(InitiativeField::Url, &long_url).unwrap_err();
        assert!(matches!(err, FieldError::TooLong { max: 500 }));

        // 上限按字符计，不按字节
        let polish = "ż".repeat(255);
        assert!(coercer.clean_text(InitiativeField::Place, &polish).is_ok());
    }

    #[test]
    fn test_split_names() {
        let coercer = FieldCoercer;
        assert_eq!(
            coercer.split_names("a, b ,,a").unwrap(),
            vec!["a".to_string(), "b".to_string(), "a".to_string()]
        );
        assert!(coercer.split_names(" , ,").unwrap().is_empty());
        assert!(coercer.split_names("").unwrap().is_empty());
    }

    #[test]
    fn test_split_names_rejects_long_tag() {
        let coercer = FieldCoercer;
        let raw = format!("ok,{}", "t".repeat(101));
        let err = coercer.split_names(&raw).unwrap_err();
        assert!(matches!(err, FieldError::TagTooLong { max: 100, .. }));
    }

    #[test]
    fn test_coerce_name_list_resolves_distinct_tags() {
        let conn = setup_conn();
        let mut resolver = TagResolver::new(3);
        let coercer = FieldCoercer;

        let value = coercer
            .coerce(&mapping_for(InitiativeField::Tags), "a, b ,,a", &mut resolver, &conn)
            .unwrap();

        match value {
            FieldValue::Tags(tags) => {
                let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
                assert_eq!(names, vec!["a", "b"]);
            }
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn test_coerce_dispatches_by_rule() {
        let conn = setup_conn();
        let mut resolver = TagResolver::new(3);
        let coercer = FieldCoercer;

        let public = coercer
            .coerce(&mapping_for(InitiativeField::Public), "Tak", &mut resolver, &conn)
            .unwrap();
        assert_eq!(public, FieldValue::Bool(true));

        let url = coercer
            .coerce(&mapping_for(InitiativeField::Url), "", &mut resolver, &conn)
            .unwrap();
        assert_eq!(url, FieldValue::OptionalText(None));
    }
}
