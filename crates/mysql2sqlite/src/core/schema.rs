//! Catalog descriptors for tables, columns, primary keys and indexes.
//!
//! These types are the engine-neutral shape of what the catalog reader
//! discovers. They are built once per run and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Name of the index that carries the primary key in MySQL catalogs.
pub const PRIMARY_INDEX_NAME: &str = "PRIMARY";

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name, unique within the catalog.
    pub name: String,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Role a column plays in the table's keys (`COLUMN_KEY`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyRole {
    #[default]
    None,
    /// Part of the primary key (`PRI`).
    Primary,
    /// Part of a unique or secondary index (`UNI`, `MUL`).
    Other,
}

impl KeyRole {
    /// Parse the catalog's `COLUMN_KEY` value.
    pub fn from_catalog(key: &str) -> Self {
        match key.trim().to_uppercase().as_str() {
            "" => KeyRole::None,
            "PRI" => KeyRole::Primary,
            _ => KeyRole::Other,
        }
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,

    /// Raw source type, e.g. `int(10) unsigned` or `varchar(50)`.
    pub raw_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Key role of the column.
    pub key: KeyRole,

    /// Extra modifier, e.g. `auto_increment`.
    pub extra: String,

    /// Default value. `None` when the catalog has no default, which is
    /// distinct from an empty-string default.
    pub default: Option<String>,
}

impl ColumnDescriptor {
    /// Whether the column is marked auto-increment.
    pub fn is_auto_increment(&self) -> bool {
        self.extra.to_lowercase().contains("auto_increment")
    }
}

/// One raw row of index metadata, as the catalog reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRow {
    /// Index name (`PRIMARY` for the primary key).
    pub index_name: String,

    /// Indexed column.
    pub column_name: String,

    /// 1-based position of the column within the index.
    pub seq_in_index: u32,

    /// `false` when the index enforces uniqueness.
    pub non_unique: bool,
}

impl IndexRow {
    /// Whether this row belongs to the primary key index.
    pub fn is_primary(&self) -> bool {
        self.index_name == PRIMARY_INDEX_NAME
    }
}

/// Ordered primary key columns of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyDescriptor {
    pub columns: Vec<String>,
}

impl PrimaryKeyDescriptor {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A secondary index reassembled from its raw rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexGroupDescriptor {
    /// Index name as reported by the source.
    pub name: String,

    /// `(column, seq_in_index)` pairs, ascending by sequence.
    pub columns: Vec<(String, u32)>,

    /// Uniqueness of the index, taken from its lowest-sequence row.
    pub is_unique: bool,
}

impl IndexGroupDescriptor {
    /// Column names in index order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_column(name: &str, extra: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.to_string(),
            raw_type: "int(11)".to_string(),
            is_nullable: false,
            key: KeyRole::None,
            extra: extra.to_string(),
            default: None,
        }
    }

    #[test]
    fn test_key_role_from_catalog() {
        assert_eq!(KeyRole::from_catalog(""), KeyRole::None);
        assert_eq!(KeyRole::from_catalog("PRI"), KeyRole::Primary);
        assert_eq!(KeyRole::from_catalog("pri"), KeyRole::Primary);
        assert_eq!(KeyRole::from_catalog("UNI"), KeyRole::Other);
        assert_eq!(KeyRole::from_catalog("MUL"), KeyRole::Other);
    }

    #[test]
    fn test_is_auto_increment() {
        assert!(make_test_column("id", "auto_increment").is_auto_increment());
        assert!(make_test_column("id", "AUTO_INCREMENT").is_auto_increment());
        assert!(!make_test_column("id", "").is_auto_increment());
        assert!(!make_test_column("ts", "on update CURRENT_TIMESTAMP").is_auto_increment());
    }

    #[test]
    fn test_index_row_is_primary() {
        let row = IndexRow {
            index_name: "PRIMARY".to_string(),
            column_name: "id".to_string(),
            seq_in_index: 1,
            non_unique: false,
        };
        assert!(row.is_primary());

        let row = IndexRow {
            index_name: "primary_idx".to_string(),
            ..row
        };
        assert!(!row.is_primary());
    }

    #[test]
    fn test_primary_key_empty() {
        assert!(PrimaryKeyDescriptor::default().is_empty());
        assert!(!PrimaryKeyDescriptor::new(vec!["id".into()]).is_empty());
    }
}
