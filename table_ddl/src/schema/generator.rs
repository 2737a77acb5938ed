//! DDL generator
//!
//! Renders a [`ResolvedTable`] as replayable PostgreSQL DDL.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::schema::typemap::promote_to_auto_increment;
use crate::schema::types::{ColumnDescriptor, IndexDescriptor, ResolvedTable};

static PLAIN_IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_$]*$").expect("valid identifier pattern"));

// Reserved and type/function-name keywords; neither may name a table or column bare
static RESERVED_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
        "authorization", "binary", "both", "case", "cast", "check", "collate", "collation",
        "column", "concurrently", "constraint", "create", "cross", "current_catalog",
        "current_date", "current_role", "current_schema", "current_time", "current_timestamp",
        "current_user", "default", "deferrable", "desc", "distinct", "do", "else", "end",
        "except", "false", "fetch", "for", "foreign", "freeze", "from", "full", "grant",
        "group", "having", "ilike", "in", "initially", "inner", "intersect", "into", "is",
        "isnull", "join", "lateral", "leading", "left", "like", "limit", "localtime",
        "localtimestamp", "natural", "not", "notnull", "null", "offset", "on", "only", "or",
        "order", "outer", "overlaps", "placing", "primary", "references", "returning", "right",
        "select", "session_user", "similar", "some", "symmetric", "system_user", "table",
        "tablesample", "then", "to", "trailing", "true", "union", "unique", "user", "using",
        "variadic", "verbose", "when", "where", "window", "with",
    ]
    .into_iter()
    .collect()
});

/// Builds the DDL text of one table
pub struct DdlBuilder<'a> {
    table: &'a ResolvedTable,
}

impl<'a> DdlBuilder<'a> {
    /// Create a builder for `table`
    pub fn new(table: &'a ResolvedTable) -> Self {
        Self { table }
    }

    /// Render the table.
    ///
    /// Statement order is fixed: `CREATE TABLE`, secondary indexes, table
    /// comment, column comments, index comments. Every statement ends with
    /// `;` and a newline.
    pub fn build(&self) -> String {
        let mut sql = self.create_table_sql();

        for index in &self.table.indexes {
            sql.push_str(&self.create_index_sql(index));
            sql.push('\n');
        }

        if let Some(comment) = &self.table.comment {
            sql.push_str(&format!(
                "COMMENT ON TABLE {} IS '{}';\n",
                quote_ident(&self.table.name),
                quote_literal(comment)
            ));
        }

        for column in &self.table.columns {
            if let Some(comment) = &column.comment {
                sql.push_str(&format!(
                    "COMMENT ON COLUMN {}.{} IS '{}';\n",
                    quote_ident(&self.table.name),
                    quote_ident(&column.name),
                    quote_literal(comment)
                ));
            }
        }

        for index in &self.table.indexes {
            if let Some(comment) = &index.comment {
                sql.push_str(&format!(
                    "COMMENT ON INDEX {} IS '{}';\n",
                    quote_ident(&index.name),
                    quote_literal(comment)
                ));
            }
        }

        sql
    }

    /// `CREATE TABLE` statement including constraints
    fn create_table_sql(&self) -> String {
        let mut sql = format!("CREATE TABLE {} (\n", quote_ident(&self.table.name));

        let mut definitions: Vec<String> = self
            .table
            .columns
            .iter()
            .map(|column| format!("  {}", self.column_definition(column)))
            .collect();

        // Keys no single column can carry, e.g. composite keys
        if !self.table.primary_key.is_empty() && !self.table.has_column_primary_key() {
            let key: Vec<String> =
                self.table.primary_key.iter().map(|c| quote_ident(c)).collect();
            definitions.push(format!("  PRIMARY KEY ({})", key.join(",")));
        }

        for fk in &self.table.foreign_keys {
            definitions.push(format!(
                "  CONSTRAINT {} {}",
                quote_ident(&fk.name),
                fk.definition
            ));
        }

        sql.push_str(&definitions.join(",\n"));
        sql.push_str("\n);\n");
        sql
    }

    /// `<name> <TYPE> [PRIMARY KEY|NOT NULL] [DEFAULT <expr>]`
    fn column_definition(&self, column: &ColumnDescriptor) -> String {
        let mut parts = vec![quote_ident(&column.name), column_type(column)];

        if column.is_primary_key {
            parts.push("PRIMARY KEY".to_string());
        } else if !column.nullable {
            parts.push("NOT NULL".to_string());
        }

        // The serial type already implies the sequence default
        if !column.is_auto_increment() {
            if let Some(default) = &column.default {
                parts.push(format!("DEFAULT {}", default));
            }
        }

        parts.join(" ")
    }

    /// Key list is replayed as the catalog printed it, quoting included
    fn create_index_sql(&self, index: &IndexDescriptor) -> String {
        let unique = if index.is_unique { "UNIQUE " } else { "" };
        let mut sql = format!(
            "CREATE {}INDEX {} ON {} USING {} ({})",
            unique,
            quote_ident(&index.name),
            quote_ident(&self.table.name),
            index.algorithm,
            index.columns
        );
        if let Some(condition) = &index.condition {
            sql.push_str(&format!(" WHERE {}", condition));
        }
        sql.push(';');
        sql
    }
}

/// Canonical type with its size parameters
pub fn column_type(column: &ColumnDescriptor) -> String {
    let canonical = if column.is_auto_increment() {
        promote_to_auto_increment(column.canonical_type.clone())
    } else {
        column.canonical_type.clone()
    };

    if canonical.is_decimal() {
        if let Some(precision) = column.numeric_precision.filter(|p| *p > 0) {
            return match column.numeric_scale.filter(|s| *s > 0) {
                Some(scale) => format!("{}({},{})", canonical, precision, scale),
                None => format!("{}({})", canonical, precision),
            };
        }
    } else if canonical.is_sized_character() {
        if let Some(length) = column.character_maximum_length.filter(|l| *l > 0) {
            return format!("{}({})", canonical, length);
        }
    }

    canonical.to_string()
}

/// Identifier as it must appear in SQL: bare when PostgreSQL would fold it
/// back to the same name, double-quoted otherwise
pub fn quote_ident(name: &str) -> String {
    if PLAIN_IDENT_RE.is_match(name) && !RESERVED_WORDS.contains(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Double embedded single quotes for a string literal
fn quote_literal(text: &str) -> String {
    text.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::typemap::{map_type, CanonicalType};
    use crate::schema::types::{ForeignKeyDescriptor, IndexAlgorithm};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn column(position: i64, name: &str, vendor_type: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            ordinal_position: position,
            name: name.to_string(),
            vendor_type: vendor_type.to_string(),
            canonical_type: map_type(vendor_type),
            numeric_precision: None,
            numeric_scale: None,
            character_maximum_length: None,
            nullable: true,
            default: None,
            comment: None,
            is_primary_key: false,
            sequence: None,
        }
    }

    fn table(columns: Vec<ColumnDescriptor>) -> ResolvedTable {
        ResolvedTable {
            name: "orders".to_string(),
            comment: None,
            columns,
            primary_key: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    #[test]
    fn test_decimal_parameters() {
        let mut price = column(1, "price", "numeric");
        assert_eq!(column_type(&price), "DECIMAL");

        price.numeric_precision = Some(10);
        price.numeric_scale = Some(2);
        assert_eq!(column_type(&price), "DECIMAL(10,2)");

        price.numeric_scale = Some(0);
        assert_eq!(column_type(&price), "DECIMAL(10)");

        price.numeric_scale = None;
        assert_eq!(column_type(&price), "DECIMAL(10)");
    }

    #[test]
    fn test_character_length() {
        let mut code = column(1, "code", "bpchar");
        assert_eq!(column_type(&code), "CHAR");
        code.character_maximum_length = Some(3);
        assert_eq!(column_type(&code), "CHAR(3)");

        let mut text = column(2, "body", "text");
        text.character_maximum_length = Some(3);
        assert_eq!(column_type(&text), "TEXT");
    }

    #[test]
    fn test_column_attribute_order() {
        let mut id = column(1, "id", "int8");
        id.is_primary_key = true;
        id.nullable = false;
        id.default = Some("nextval('orders_id_seq'::regclass)".to_string());
        id.sequence = Some("orders_id_seq".to_string());

        let mut status = column(2, "status", "varchar");
        status.character_maximum_length = Some(16);
        status.nullable = false;
        status.default = Some("'new'::character varying".to_string());

        let notes = column(3, "notes", "text");

        let sql = DdlBuilder::new(&table(vec![id, status, notes])).build();
        assert_eq!(
            sql,
            "CREATE TABLE orders (\n\
             \x20 id BIGSERIAL PRIMARY KEY,\n\
             \x20 status VARCHAR(16) NOT NULL DEFAULT 'new'::character varying,\n\
             \x20 notes TEXT\n\
             );\n"
        );
    }

    #[test]
    fn test_constraints_indexes_and_comments() {
        let mut id = column(1, "id", "int4");
        id.is_primary_key = true;
        let customer = column(2, "customer_id", "int4");

        let mut orders = table(vec![id, customer]);
        orders.primary_key = vec!["id".to_string()];
        orders.comment = Some("customer's orders".to_string());
        orders.columns[1].comment = Some("buyer".to_string());
        orders.foreign_keys.push(ForeignKeyDescriptor {
            name: "orders_customer_fk".to_string(),
            definition: "FOREIGN KEY (customer_id) REFERENCES customers(id)".to_string(),
        });
        orders.indexes.push(IndexDescriptor {
            name: "orders_customer_idx".to_string(),
            algorithm: IndexAlgorithm::BTree,
            is_unique: false,
            definition: String::new(),
            columns: "customer_id".to_string(),
            key_columns: vec!["customer_id".to_string()],
            condition: Some("(customer_id > 0)".to_string()),
            comment: Some("lookup".to_string()),
        });

        let sql = DdlBuilder::new(&orders).build();
        assert_eq!(
            sql,
            "CREATE TABLE orders (\n\
             \x20 id INT PRIMARY KEY,\n\
             \x20 customer_id INT,\n\
             \x20 CONSTRAINT orders_customer_fk FOREIGN KEY (customer_id) REFERENCES customers(id)\n\
             );\n\
             CREATE INDEX orders_customer_idx ON orders USING BTREE (customer_id) WHERE (customer_id > 0);\n\
             COMMENT ON TABLE orders IS 'customer''s orders';\n\
             COMMENT ON COLUMN orders.customer_id IS 'buyer';\n\
             COMMENT ON INDEX orders_customer_idx IS 'lookup';\n"
        );
    }

    #[test]
    fn test_composite_primary_key_clause() {
        let mut memberships = table(vec![column(1, "user_id", "int8"), column(2, "group_id", "int8")]);
        memberships.primary_key = vec!["user_id".to_string(), "group_id".to_string()];

        let sql = DdlBuilder::new(&memberships).build();
        assert!(sql.contains("  group_id BIGINT,\n  PRIMARY KEY (user_id,group_id)\n);"));
    }

    #[test]
    fn test_sequence_default_on_non_integer_is_dropped() {
        let mut code = column(1, "code", "numeric");
        code.default = Some("nextval('codes_seq'::regclass)".to_string());
        code.sequence = Some("codes_seq".to_string());

        let sql = DdlBuilder::new(&table(vec![code])).build();
        assert!(!sql.contains("nextval"));
        assert!(sql.contains("  code DECIMAL\n"));
        assert_eq!(map_type("numeric"), CanonicalType::Decimal);
    }

    #[rstest]
    #[case("orders", "orders")]
    #[case("created_at", "created_at")]
    #[case("order", "\"order\"")]
    #[case("user", "\"user\"")]
    #[case("UserId", "\"UserId\"")]
    #[case("line item", "\"line item\"")]
    #[case("2fa", "\"2fa\"")]
    #[case("say\"hi", "\"say\"\"hi\"")]
    #[case("", "\"\"")]
    fn test_quote_ident(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(quote_ident(name), expected);
    }

    #[test]
    fn test_reserved_and_mixed_case_names_are_quoted() {
        let mut order = column(1, "order", "int4");
        order.is_primary_key = true;
        let mut user_id = column(2, "UserId", "int8");
        user_id.comment = Some("owner".to_string());

        let mut group = table(vec![order, user_id]);
        group.name = "group".to_string();
        group.primary_key = vec!["order".to_string()];
        group.indexes.push(IndexDescriptor {
            name: "Group_User_idx".to_string(),
            algorithm: IndexAlgorithm::Hash,
            is_unique: false,
            definition: String::new(),
            columns: "\"UserId\"".to_string(),
            key_columns: vec!["UserId".to_string()],
            condition: None,
            comment: None,
        });

        let sql = DdlBuilder::new(&group).build();
        assert_eq!(
            sql,
            "CREATE TABLE \"group\" (\n\
             \x20 \"order\" INT PRIMARY KEY,\n\
             \x20 \"UserId\" BIGINT\n\
             );\n\
             CREATE INDEX \"Group_User_idx\" ON \"group\" USING HASH (\"UserId\");\n\
             COMMENT ON COLUMN \"group\".\"UserId\" IS 'owner';\n"
        );
    }

    #[test]
    fn test_composite_primary_key_quotes_members() {
        let mut events = table(vec![column(1, "Tenant", "int8"), column(2, "order", "int8")]);
        events.primary_key = vec!["Tenant".to_string(), "order".to_string()];

        let sql = DdlBuilder::new(&events).build();
        assert!(sql.contains("  PRIMARY KEY (\"Tenant\",\"order\")\n);"));
    }
}
