//! DROP TABLE model builder

use sqlparser::ast::ObjectName;

use super::object_name_text;
use crate::models::DropTableModel;

pub fn build(names: &[ObjectName], if_exists: bool, cascade: bool) -> DropTableModel {
    DropTableModel {
        table_names: names.iter().map(object_name_text).collect(),
        if_exists,
        cascade,
    }
}
