// ==========================================
// 倡议追踪系统 - 列映射器
// ==========================================
// 职责: 外部表头 → 目标字段 + 转换规则（静态映射表）
//       表头校验（一次性报告全部缺失列）
// ==========================================

use crate::domain::types::{CoercionKind, InitiativeField};
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

/// 单条映射：外部表头 → 目标字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub header: &'static str,
    pub field: InitiativeField,
    pub coercion: CoercionKind,
}

const fn mapping(
    header: &'static str,
    field: InitiativeField,
    coercion: CoercionKind,
) -> ColumnMapping {
    ColumnMapping {
        header,
        field,
        coercion,
    }
}

/// 倡议导入映射表（表头精确匹配，顺序无关）
pub const INITIATIVE_COLUMN_MAPPINGS: &[ColumnMapping] = &[
    mapping("Nazwa", InitiativeField::Name, CoercionKind::PlainText),
    mapping("URL", InitiativeField::Url, CoercionKind::PlainText),
    mapping("Osoba Kontaktowa", InitiativeField::Person, CoercionKind::PlainText),
    mapping("Kategoria", InitiativeField::Category, CoercionKind::PlainText),
    mapping("Timing", InitiativeField::Timing, CoercionKind::PlainText),
    mapping("Czy Publiczna (Tak/Nie)", InitiativeField::Public, CoercionKind::YesNo),
    mapping("Finansujący", InitiativeField::Funders, CoercionKind::PlainText),
    mapping("Miejsce", InitiativeField::Place, CoercionKind::PlainText),
    mapping("Region", InitiativeField::Region, CoercionKind::PlainText),
    mapping("Opis", InitiativeField::Description, CoercionKind::PlainText),
    mapping("Grupa Docelowa", InitiativeField::Target, CoercionKind::PlainText),
    mapping("Tagi (oddzielone przecinkiem)", InitiativeField::Tags, CoercionKind::NameList),
    mapping("Kategoria Tematyczna", InitiativeField::ThematicCategory, CoercionKind::PlainText),
];

/// 已解析的列：映射 + 在表头中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub mapping: ColumnMapping,
    pub index: usize,
}

/// 字段 → 列位置（本次导入期间不变）
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    columns: Vec<ResolvedColumn>,
    by_field: HashMap<InitiativeField, usize>,
}

impl ColumnIndex {
    /// 按映射表顺序遍历
    pub fn columns(&self) -> &[ResolvedColumn] {
        &self.columns
    }

    pub fn index_of(&self, field: InitiativeField) -> Option<usize> {
        self.by_field.get(&field).copied()
    }
}

pub struct ColumnMapper {
    mappings: &'static [ColumnMapping],
}

impl Default for ColumnMapper {
    fn default() -> Self {
        Self::new(INITIATIVE_COLUMN_MAPPINGS)
    }
}

impl ColumnMapper {
    pub fn new(mappings: &'static [ColumnMapping]) -> Self {
        Self { mappings }
    }

    pub fn mappings(&self) -> &'static [ColumnMapping] {
        self.mappings
    }

    /// 目标字段对应的外部表头
    pub fn header_for(&self, field: InitiativeField) -> Option<&'static str> {
        self.mappings
            .iter()
            .find(|m| m.field == field)
            .map(|m| m.header)
    }

    /// 校验表头并生成字段 → 列位置
    ///
    /// 表头单元格去除首尾空白后精确匹配；同名表头取第一次出现的位置。
    ///
    /// # 返回
    /// - Err(MissingColumns): 列出全部缺失表头（按映射表顺序）
    pub fn resolve(&self, header_row: &[String]) -> ImportResult<ColumnIndex> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (idx, header) in header_row.iter().enumerate() {
            positions.entry(header.trim()).or_insert(idx);
        }

        let mut columns = Vec::with_capacity(self.mappings.len());
        let mut missing = Vec::new();
        for mapping in self.mappings {
            match positions.get(mapping.header) {
                Some(&index) => columns.push(ResolvedColumn {
                    mapping: *mapping,
                    index,
                }),
                None => missing.push(mapping.header.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(ImportError::MissingColumns(missing));
        }

        let by_field = columns
            .iter()
            .map(|c| (c.mapping.field, c.index))
            .collect();

        Ok(ColumnIndex { columns, by_field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn full_header() -> Vec<String> {
        INITIATIVE_COLUMN_MAPPINGS
            .iter()
            .map(|m| m.header.to_string())
            .collect()
    }

    #[test]
    fn test_mapping_table_headers_and_fields_are_unique() {
        let headers: HashSet<_> = INITIATIVE_COLUMN_MAPPINGS.iter().map(|m| m.header).collect();
        let fields: HashSet<_> = INITIATIVE_COLUMN_MAPPINGS.iter().map(|m| m.field).collect();
        assert_eq!(headers.len(), INITIATIVE_COLUMN_MAPPINGS.len());
        assert_eq!(fields.len(), INITIATIVE_COLUMN_MAPPINGS.len());
    }

    #[test]
    fn test_resolve_order_independent() {
        let mut header = full_header();
        header.reverse();
        header.push("Dodatkowa kolumna".to_string());

        let index = ColumnMapper::default().resolve(&header).unwrap();

        assert_eq!(index.index_of(InitiativeField::Name), Some(12));
        assert_eq!(index.index_of(InitiativeField::ThematicCategory), Some(0));
        assert_eq!(index.columns().len(), INITIATIVE_COLUMN_MAPPINGS.len());
    }

    #[test]
    fn test_resolve_trims_header_cells() {
        let header: Vec<String> = full_header().into_iter().map(|h| format!(" {} ", h)).collect();
        let index = ColumnMapper::default().resolve(&header).unwrap();
        assert_eq!(index.index_of(InitiativeField::Url), Some(1));
    }

    #[test]
    fn test_resolve_reports_all_missing_headers() {
        let header: Vec<String> = full_header()
            .into_iter()
            .filter(|h| h != "URL" && h != "Region")
            .collect();

        let err = ColumnMapper::default().resolve(&header).unwrap_err();
        match err {
            ImportError::MissingColumns(missing) => {
                assert_eq!(missing, vec!["URL".to_string(), "Region".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_header_uses_first_position() {
        let mut header = full_header();
        header.push("Nazwa".to_string());
        let index = ColumnMapper::default().resolve(&header).unwrap();
        assert_eq!(index.index_of(InitiativeField::Name), Some(0));
    }

    #[test]
    fn test_header_for_field() {
        let mapper = ColumnMapper::default();
        assert_eq!(mapper.header_for(InitiativeField::Name), Some("Nazwa"));
        assert_eq!(
            mapper.header_for(InitiativeField::Tags),
            Some("Tagi (oddzielone przecinkiem)")
        );
    }
}
