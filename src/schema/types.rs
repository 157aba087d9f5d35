//! Types describing the data engine's schema.

use serde::{Deserialize, Serialize};

/// A single column: name plus the engine's declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Declared type as reported by the engine (e.g. "STRING", "INT64").
    #[serde(rename = "type")]
    pub data_type: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A table with its ordered column list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Look up a column by name (case-insensitive, matching SQL identifiers).
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Immutable snapshot of the queryable schema, one per fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub tables: Vec<TableDescriptor>,
}

impl SchemaDescriptor {
    pub fn new(tables: Vec<TableDescriptor>) -> Self {
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Look up a table by name (case-insensitive).
    pub fn table(&self, name: &str) -> Option<&TableDescriptor> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Whether `column` exists in any of the named tables.
    pub fn resolves_in(&self, tables: &[String], column: &str) -> bool {
        tables
            .iter()
            .filter_map(|t| self.table(t))
            .any(|t| t.column(column).is_some())
    }

    /// Render the schema as a DDL-style enumeration for prompt embedding.
    pub fn to_prompt_block(&self) -> String {
        let mut out = String::new();
        for table in &self.tables {
            out.push_str(&format!("TABLE {} (\n", table.name));
            for column in &table.columns {
                out.push_str(&format!("  {} {},\n", column.name, column.data_type));
            }
            out.push_str(")\n");
        }
        out
    }
}
