//! Structural resolver
//!
//! Cross-references the raw column, index and constraint rows of one table
//! into a [`ResolvedTable`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::error::Result;
use crate::schema::reader::RawCatalog;
use crate::schema::types::{
    CatalogRow, ColumnDescriptor, ForeignKeyDescriptor, IndexAlgorithm, IndexDescriptor,
    ResolvedTable,
};

// nextval('baseline_id_seq'::regclass)
static NEXTVAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^nextval\('(.+)'::regclass\)$").expect("valid nextval pattern"));

/// Name of the index backing a table's primary key
pub fn primary_key_index_name(table: &str) -> String {
    format!("{}_pkey", table)
}

/// Sequence referenced by a `nextval('<seq>'::regclass)` default
pub fn sequence_from_default(default: &str) -> Option<String> {
    NEXTVAL_RE
        .captures(default.trim())
        .map(|caps| caps[1].to_string())
}

/// Split `pg_get_indexdef` output into its key list and partial-index predicate.
///
/// The key list is the parenthesized group following `USING <method>`,
/// with each top-level element trimmed and rejoined by `,`. The predicate
/// is whatever follows the top-level ` WHERE `.
pub fn parse_index_definition(definition: &str) -> (String, Option<String>) {
    let (head, condition) = match find_top_level(definition, " WHERE ") {
        Some(pos) => (
            &definition[..pos],
            Some(definition[pos + " WHERE ".len()..].trim().to_string()),
        ),
        None => (definition, None),
    };

    let search_from = head.find(" USING ").unwrap_or(0);
    let columns = match head[search_from..].find('(') {
        Some(rel) => {
            let open = search_from + rel;
            let inner = match matching_paren(head, open) {
                Some(close) => &head[open + 1..close],
                None => &head[open + 1..],
            };
            split_top_level(inner)
                .into_iter()
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(",")
        }
        None => String::new(),
    };

    (columns, condition.filter(|c| !c.is_empty()))
}

/// Key elements of a parsed column list, identifier quotes removed.
///
/// An element that is a single quoted identifier such as `"order"` comes back
/// as `order` with doubled quotes collapsed. Anything else is returned as is.
pub fn key_column_names(columns: &str) -> Vec<String> {
    if columns.is_empty() {
        return Vec::new();
    }
    split_top_level(columns)
        .into_iter()
        .map(|part| unquote_ident(part.trim()))
        .collect()
}

fn unquote_ident(element: &str) -> String {
    let quoted = element.len() >= 2 && element.starts_with('"') && element.ends_with('"');
    if quoted && !element[1..element.len() - 1].replace("\"\"", "").contains('"') {
        element[1..element.len() - 1].replace("\"\"", "\"")
    } else {
        element.to_string()
    }
}

/// Byte offset of `needle` outside parentheses and quotes
fn find_top_level(haystack: &str, needle: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for (pos, ch) in haystack.char_indices() {
        match ch {
            '\'' | '"' if quote.map_or(true, |q| q == ch) => {
                quote = if quote.is_some() { None } else { Some(ch) }
            }
            '(' if quote.is_none() => depth += 1,
            ')' if quote.is_none() => depth -= 1,
            _ if depth == 0 && quote.is_none() && haystack[pos..].starts_with(needle) => {
                return Some(pos)
            }
            _ => {}
        }
    }
    None
}

/// Offset of the parenthesis closing the one at `open`
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for (pos, ch) in text[open..].char_indices() {
        match ch {
            '\'' | '"' if quote.map_or(true, |q| q == ch) => {
                quote = if quote.is_some() { None } else { Some(ch) }
            }
            '(' if quote.is_none() => depth += 1,
            ')' if quote.is_none() => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + pos);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas that are not nested in parentheses or quotes
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (pos, ch) in text.char_indices() {
        match ch {
            '\'' | '"' if quote.map_or(true, |q| q == ch) => {
                quote = if quote.is_some() { None } else { Some(ch) }
            }
            '(' if quote.is_none() => depth += 1,
            ')' if quote.is_none() => depth -= 1,
            ',' if depth == 0 && quote.is_none() => {
                parts.push(&text[start..pos]);
                start = pos + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Build an index descriptor, rejecting access methods that cannot be rendered
pub fn index_from_row(row: &CatalogRow) -> Result<IndexDescriptor> {
    let name = row.get_str("index_name");
    let algorithm = IndexAlgorithm::parse(&name, &row.get_str("index_algorithm"))?;
    let definition = row.get_str("index_definition");
    let (columns, condition) = parse_index_definition(&definition);
    let key_columns = key_column_names(&columns);

    Ok(IndexDescriptor {
        name,
        algorithm,
        is_unique: row.get_bool("is_unique"),
        definition,
        columns,
        key_columns,
        condition,
        comment: row.get_opt_str("comment"),
    })
}

pub fn foreign_key_from_row(row: &CatalogRow) -> ForeignKeyDescriptor {
    ForeignKeyDescriptor {
        name: row.get_str("foreign_key"),
        definition: row.get_str("definition"),
    }
}

/// Resolves raw catalog rows into a renderable table
pub struct StructuralResolver;

impl StructuralResolver {
    /// Resolve `raw` into a [`ResolvedTable`]
    pub fn resolve(raw: RawCatalog) -> Result<ResolvedTable> {
        let mut columns: Vec<ColumnDescriptor> =
            raw.columns.iter().map(ColumnDescriptor::from_row).collect();
        columns.sort_by_key(|c| c.ordinal_position);

        let indexes = raw
            .indexes
            .iter()
            .map(index_from_row)
            .collect::<Result<Vec<_>>>()?;

        let pkey_name = primary_key_index_name(&raw.table);
        let primary_key = {
            let by_name: HashMap<&str, &IndexDescriptor> =
                indexes.iter().map(|i| (i.name.as_str(), i)).collect();
            by_name
                .get(pkey_name.as_str())
                .map(|i| i.key_columns.clone())
                .unwrap_or_default()
        };

        for column in &mut columns {
            column.is_primary_key = primary_key.len() == 1 && column.name == primary_key[0];
            column.sequence = column.default.as_deref().and_then(sequence_from_default);
        }

        let indexes = indexes
            .into_iter()
            .filter(|i| i.name != pkey_name)
            .collect();

        let foreign_keys = raw.foreign_keys.iter().map(foreign_key_from_row).collect();

        Ok(ResolvedTable {
            name: raw.table,
            comment: raw.comment,
            columns,
            primary_key,
            indexes,
            foreign_keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::schema::types::CatalogValue;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn column(position: i64, name: &str, data_type: &str, default: Option<&str>) -> CatalogRow {
        CatalogRow::new()
            .with("ordinal_position", position)
            .with("column_name", name)
            .with("data_type", data_type)
            .with("is_nullable", "NO")
            .with("column_default", default)
    }

    fn index(name: &str, algorithm: &str, definition: &str) -> CatalogRow {
        CatalogRow::new()
            .with("index_name", name)
            .with("index_algorithm", algorithm)
            .with("is_unique", true)
            .with("index_definition", definition)
            .with("comment", CatalogValue::Null)
    }

    #[rstest]
    #[case(
        "CREATE UNIQUE INDEX users_pkey ON public.users USING btree (id)",
        "id",
        None
    )]
    #[case(
        "CREATE INDEX users_name_idx ON public.users USING btree (last_name, first_name)",
        "last_name,first_name",
        None
    )]
    #[case(
        "CREATE INDEX users_active_idx ON public.users USING btree (email) WHERE (deleted_at IS NULL)",
        "email",
        Some("(deleted_at IS NULL)")
    )]
    #[case(
        "CREATE INDEX users_lower_idx ON public.users USING btree (lower((email)::text))",
        "lower((email)::text)",
        None
    )]
    #[case(
        "CREATE INDEX users_cover_idx ON public.users USING btree (id) INCLUDE (email)",
        "id",
        None
    )]
    #[case(
        "CREATE INDEX users_sort_idx ON public.users USING btree (email DESC, name text_pattern_ops)",
        "email DESC,name text_pattern_ops",
        None
    )]
    #[case(
        "CREATE INDEX orders_pair_idx ON public.orders USING btree (\"a,b\", \"order\")",
        "\"a,b\",\"order\"",
        None
    )]
    fn test_parse_index_definition(
        #[case] definition: &str,
        #[case] columns: &str,
        #[case] condition: Option<&str>,
    ) {
        let (parsed_columns, parsed_condition) = parse_index_definition(definition);
        assert_eq!(parsed_columns, columns);
        assert_eq!(parsed_condition.as_deref(), condition);
    }

    #[test]
    fn test_sequence_from_default() {
        assert_eq!(
            sequence_from_default("nextval('users_id_seq'::regclass)").as_deref(),
            Some("users_id_seq")
        );
        assert_eq!(sequence_from_default("0"), None);
        assert_eq!(sequence_from_default("'nextval'::text"), None);
    }

    #[rstest]
    #[case("id", vec!["id"])]
    #[case("\"order\"", vec!["order"])]
    #[case("\"UserId\",\"group\"", vec!["UserId", "group"])]
    #[case("\"say \"\"hi\"\"\"", vec!["say \"hi\""])]
    #[case("email DESC,lower((name)::text)", vec!["email DESC", "lower((name)::text)"])]
    #[case("", vec![])]
    fn test_key_column_names(#[case] columns: &str, #[case] expected: Vec<&str>) {
        assert_eq!(key_column_names(columns), expected);
    }

    #[test]
    fn test_resolve_matches_quoted_primary_key() {
        let raw = RawCatalog {
            table: "orders".to_string(),
            comment: None,
            columns: vec![
                column(1, "order", "int4", None),
                column(2, "UserId", "int4", None),
            ],
            indexes: vec![index(
                "orders_pkey",
                "BTREE",
                "CREATE UNIQUE INDEX orders_pkey ON public.orders USING btree (\"order\")",
            )],
            foreign_keys: vec![],
        };

        let table = StructuralResolver::resolve(raw).unwrap();
        assert_eq!(table.primary_key, vec!["order"]);
        assert!(table.has_column_primary_key());
        assert!(table.columns[0].is_primary_key);
        assert!(!table.columns[1].is_primary_key);
    }

    #[test]
    fn test_resolve_matches_mixed_case_primary_key() {
        let raw = RawCatalog {
            table: "accounts".to_string(),
            comment: None,
            columns: vec![column(1, "UserId", "int8", None)],
            indexes: vec![index(
                "accounts_pkey",
                "BTREE",
                "CREATE UNIQUE INDEX accounts_pkey ON public.accounts USING btree (\"UserId\")",
            )],
            foreign_keys: vec![],
        };

        let table = StructuralResolver::resolve(raw).unwrap();
        assert!(table.has_column_primary_key());
    }

    #[test]
    fn test_resolve_marks_primary_key_and_sequence() {
        let raw = RawCatalog {
            table: "users".to_string(),
            comment: None,
            columns: vec![
                column(2, "email", "varchar", None),
                column(1, "id", "int4", Some("nextval('users_id_seq'::regclass)")),
            ],
            indexes: vec![
                index(
                    "users_pkey",
                    "BTREE",
                    "CREATE UNIQUE INDEX users_pkey ON public.users USING btree (id)",
                ),
                index(
                    "users_email_key",
                    "HASH",
                    "CREATE UNIQUE INDEX users_email_key ON public.users USING hash (email)",
                ),
            ],
            foreign_keys: vec![],
        };

        let table = StructuralResolver::resolve(raw).unwrap();

        assert_eq!(table.primary_key, vec!["id"]);
        assert_eq!(table.columns[0].name, "id");
        assert!(table.columns[0].is_primary_key);
        assert_eq!(table.columns[0].sequence.as_deref(), Some("users_id_seq"));
        assert!(!table.columns[1].is_primary_key);
        assert_eq!(table.indexes.len(), 1);
        assert_eq!(table.indexes[0].name, "users_email_key");
        assert_eq!(table.indexes[0].algorithm, IndexAlgorithm::Hash);
    }

    #[test]
    fn test_resolve_composite_key_marks_no_column() {
        let raw = RawCatalog {
            table: "memberships".to_string(),
            comment: None,
            columns: vec![
                column(1, "user_id", "int8", None),
                column(2, "group_id", "int8", None),
            ],
            indexes: vec![index(
                "memberships_pkey",
                "BTREE",
                "CREATE UNIQUE INDEX memberships_pkey ON public.memberships USING btree (user_id, group_id)",
            )],
            foreign_keys: vec![],
        };

        let table = StructuralResolver::resolve(raw).unwrap();
        assert_eq!(table.primary_key, vec!["user_id", "group_id"]);
        assert!(!table.has_column_primary_key());
        assert!(table.indexes.is_empty());
    }

    #[test]
    fn test_resolve_rejects_unknown_algorithm() {
        let raw = RawCatalog {
            table: "docs".to_string(),
            comment: None,
            columns: vec![column(1, "body", "tsvector", None)],
            indexes: vec![index(
                "docs_body_idx",
                "GIN",
                "CREATE INDEX docs_body_idx ON public.docs USING gin (body)",
            )],
            foreign_keys: vec![],
        };

        let err = StructuralResolver::resolve(raw).unwrap_err();
        assert!(matches!(err, Error::UnsupportedIndexAlgorithm { .. }));
    }
}
