use serde::{Deserialize, Serialize};

/// Logical description of a table the router needs from the storage client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    /// Ordered column definitions. Exactly one column is the primary key.
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub col_type: ColumnType,
    pub primary_key: bool,
    /// Closed set of accepted text values (a `CHECK (.. IN ..)` constraint).
    #[serde(default)]
    pub allowed: Option<Vec<String>>,
}

/// Logical column types and their SQLite affinities.
///
/// Decimals and timestamps travel as strings so that no precision is lost on
/// the way through JSON rows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    Decimal,
    Timestamp,
}

impl ColumnType {
    pub fn to_sqlite_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
            ColumnType::Decimal => "TEXT",
            ColumnType::Timestamp => "TEXT",
        }
    }
}

impl ColumnDef {
    pub fn new(name: &str, col_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            col_type,
            primary_key: false,
            allowed: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn allowed(mut self, values: &[&str]) -> Self {
        self.allowed = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }
}

impl TableSchema {
    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Renders `CREATE TABLE IF NOT EXISTS` for SQLite.
    pub fn create_sql(&self) -> String {
        let col_defs: Vec<String> = self
            .columns
            .iter()
            .map(|col| {
                let mut def = format!("\"{}\" {}", col.name, col.col_type.to_sqlite_type());
                if col.primary_key {
                    def.push_str(" PRIMARY KEY");
                } else {
                    def.push_str(" NOT NULL");
                }
                if let Some(allowed) = &col.allowed {
                    let values: Vec<String> =
                        allowed.iter().map(|v| format!("'{}'", v.replace('\'', "''"))).collect();
                    def.push_str(&format!(" CHECK (\"{}\" IN ({}))", col.name, values.join(", ")));
                }
                def
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
            self.name,
            col_defs.join(", ")
        )
    }
}
