//! Typed SQLite statement model.
//!
//! Source descriptors are turned into small statement values ([`CreateTable`],
//! [`CreateIndex`], [`InsertTemplate`]) whose `Display` impls render the SQL.
//! Identifiers go through [`sqlite_ident`]; data values never appear in the
//! text except column defaults, which SQLite cannot take as parameters.
//!
//! Two source behaviors are reproduced on purpose:
//!
//! - When a table has an auto-increment column, `AUTOINCREMENT` follows every
//!   primary key column, composite keys included.
//! - Default values are wrapped in single quotes without escaping.

use std::fmt;

use indexmap::IndexMap;

use crate::core::identifier::sqlite_ident;
use crate::core::schema::{
    ColumnDescriptor, IndexGroupDescriptor, IndexRow, PrimaryKeyDescriptor, TableDescriptor,
};
use crate::typemap::map_column_type;

/// Keyword attached to primary key columns of auto-increment tables.
const AUTOINCREMENT: &str = "AUTOINCREMENT";

/// One column definition inside `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

impl From<&ColumnDescriptor> for ColumnDef {
    fn from(col: &ColumnDescriptor) -> Self {
        Self {
            name: col.name.clone(),
            sql_type: map_column_type(&col.raw_type),
            nullable: col.is_nullable,
            // An empty default is treated like no default at all.
            default: col.default.clone().filter(|d| !d.is_empty()),
        }
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", sqlite_ident(&self.name))?;
        if !self.sql_type.is_empty() {
            write!(f, " {}", self.sql_type)?;
        }
        // Omitting the token leaves nullability to SQLite, mirroring MySQL's
        // SHOW FIELDS convention where only nullable columns are flagged.
        if self.nullable {
            f.write_str(" NULL")?;
        }
        if let Some(default) = &self.default {
            write!(f, " DEFAULT '{}'", default)?;
        }
        Ok(())
    }
}

/// `PRIMARY KEY (...)` table constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKeyClause {
    pub columns: Vec<String>,
    pub autoincrement: bool,
}

impl PrimaryKeyClause {
    /// Build the clause, or `None` for a table without primary key.
    pub fn new(pk: &PrimaryKeyDescriptor, autoincrement: bool) -> Option<Self> {
        if pk.is_empty() {
            return None;
        }
        Some(Self {
            columns: pk.columns.clone(),
            autoincrement,
        })
    }
}

impl fmt::Display for PrimaryKeyClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                if self.autoincrement {
                    format!("{} {}", sqlite_ident(c), AUTOINCREMENT)
                } else {
                    sqlite_ident(c)
                }
            })
            .collect();
        write!(f, "PRIMARY KEY ({})", columns.join(", "))
    }
}

/// `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    pub table: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Option<PrimaryKeyClause>,
}

impl CreateTable {
    /// Assemble the statement from the catalog's column and key descriptors.
    pub fn new(
        table: &TableDescriptor,
        columns: &[ColumnDescriptor],
        pk: &PrimaryKeyDescriptor,
    ) -> Self {
        let autoincrement = columns.iter().any(ColumnDescriptor::is_auto_increment);
        Self {
            table: table.name.clone(),
            columns: columns.iter().map(ColumnDef::from).collect(),
            primary_key: PrimaryKeyClause::new(pk, autoincrement),
        }
    }

    /// The same statement with `AUTOINCREMENT` removed, or `None` when the
    /// primary key does not carry it.
    ///
    /// SQLite only accepts the keyword on a single `INTEGER` key column.
    pub fn without_autoincrement(&self) -> Option<Self> {
        match &self.primary_key {
            Some(pk) if pk.autoincrement => Some(Self {
                primary_key: Some(PrimaryKeyClause {
                    columns: pk.columns.clone(),
                    autoincrement: false,
                }),
                ..self.clone()
            }),
            _ => None,
        }
    }
}

impl fmt::Display for CreateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.columns.iter().map(ToString::to_string).collect();
        if let Some(pk) = &self.primary_key {
            parts.push(pk.to_string());
        }
        write!(
            f,
            "CREATE TABLE {} ({})",
            sqlite_ident(&self.table),
            parts.join(", ")
        )
    }
}

/// `CREATE [UNIQUE] INDEX` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndex {
    pub table: String,
    /// Target index name: table name and source index name concatenated.
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

impl CreateIndex {
    pub fn new(table: &str, group: &IndexGroupDescriptor) -> Self {
        Self {
            table: table.to_string(),
            name: format!("{}{}", table, group.name),
            unique: group.is_unique,
            columns: group.column_names().map(str::to_string).collect(),
        }
    }
}

impl fmt::Display for CreateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<String> = self.columns.iter().map(|c| sqlite_ident(c)).collect();
        write!(
            f,
            "CREATE {}INDEX {} ON {} ({})",
            if self.unique { "UNIQUE " } else { "" },
            sqlite_ident(&self.name),
            sqlite_ident(&self.table),
            columns.join(", ")
        )
    }
}

/// Parameterized `INSERT` reused for every row of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertTemplate {
    pub table: String,
    pub columns: Vec<String>,
    sql: String,
}

impl InsertTemplate {
    pub fn new(table: &TableDescriptor, columns: &[ColumnDescriptor]) -> Self {
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        let col_list: Vec<String> = names.iter().map(|c| sqlite_ident(c)).collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            sqlite_ident(&table.name),
            col_list.join(","),
            placeholders.join(",")
        );
        Self {
            table: table.name.clone(),
            columns: names,
            sql,
        }
    }

    /// SQL text with numbered placeholders `?1..?n` in column order.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of parameters each execution binds.
    pub fn arity(&self) -> usize {
        self.columns.len()
    }
}

impl fmt::Display for InsertTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Render one column clause: `<name> <type> [NULL] [DEFAULT '<value>']`.
pub fn map_column_clause(col: &ColumnDescriptor) -> String {
    ColumnDef::from(col).to_string()
}

/// Render the primary key clause, or an empty string for no primary key.
pub fn map_primary_key_clause(pk: &PrimaryKeyDescriptor, autoincrement: bool) -> String {
    PrimaryKeyClause::new(pk, autoincrement)
        .map(|clause| clause.to_string())
        .unwrap_or_default()
}

/// Render the `CREATE INDEX` statement for one secondary index.
pub fn map_index_clause(table: &str, group: &IndexGroupDescriptor) -> String {
    CreateIndex::new(table, group).to_string()
}

/// Reassemble secondary indexes from raw index rows.
///
/// Groups keep the order in which their names first appear. Inside a group
/// columns are sorted by sequence-in-index and the lowest-sequence row decides
/// uniqueness. The primary key index is skipped.
pub fn group_indexes(rows: &[IndexRow]) -> Vec<IndexGroupDescriptor> {
    let mut grouped: IndexMap<&str, Vec<&IndexRow>> = IndexMap::new();
    for row in rows.iter().filter(|r| !r.is_primary()) {
        grouped.entry(row.index_name.as_str()).or_default().push(row);
    }

    grouped
        .into_iter()
        .map(|(name, mut members)| {
            members.sort_by_key(|r| r.seq_in_index);
            let is_unique = members.first().map(|r| !r.non_unique).unwrap_or(false);
            IndexGroupDescriptor {
                name: name.to_string(),
                columns: members
                    .iter()
                    .map(|r| (r.column_name.clone(), r.seq_in_index))
                    .collect(),
                is_unique,
            }
        })
        .collect()
}
