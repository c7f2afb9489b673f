//! Table removal model

use serde::{Deserialize, Serialize};

/// Model built from a DROP TABLE statement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTableModel {
    pub table_names: Vec<String>,
    pub if_exists: bool,
    pub cascade: bool,
}

impl DropTableModel {
    pub fn new(table_names: Vec<String>) -> Self {
        Self {
            table_names,
            if_exists: false,
            cascade: false,
        }
    }
}
