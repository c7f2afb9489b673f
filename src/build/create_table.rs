//! CREATE TABLE model builder

use sqlparser::ast::{ColumnDef, ColumnOption, CreateTable, Expr, TableConstraint};

use super::{BuildError, normalize_default, object_name_text};
use crate::models::{ColumnModel, CreateTableModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyKind {
    PrimaryKey,
    Unique,
}

/// One element of a table body, in declaration order
#[derive(Debug)]
enum TableElement<'a> {
    Column(&'a ColumnDef),
    Key { kind: KeyKind, columns: Vec<String> },
    Check,
    Unsupported(&'static str),
}

/// Build a [`CreateTableModel`] from a CREATE TABLE statement.
///
/// Every column is followed by its inline key options, then table-level
/// constraints follow in declaration order. Check constraints are ignored;
/// foreign keys, inline or table-level, fail the build.
pub fn build(create: &CreateTable) -> Result<CreateTableModel, BuildError> {
    let mut model = CreateTableModel::new(object_name_text(&create.name));

    for element in table_elements(create) {
        match element {
            TableElement::Column(column) => model.columns.push(column_model(column)),
            TableElement::Key { kind, columns } => apply_key(&mut model, kind, &columns),
            TableElement::Check => {}
            TableElement::Unsupported(element) => {
                return Err(BuildError::UnsupportedStatementElement {
                    element: element.to_string(),
                });
            }
        }
    }

    Ok(model)
}

fn table_elements(create: &CreateTable) -> Vec<TableElement<'_>> {
    let mut elements = Vec::with_capacity(create.columns.len() + create.constraints.len());

    for column in &create.columns {
        elements.push(TableElement::Column(column));
        for option in &column.options {
            match &option.option {
                ColumnOption::PrimaryKey { .. } => elements.push(TableElement::Key {
                    kind: KeyKind::PrimaryKey,
                    columns: vec![column.name.value.clone()],
                }),
                ColumnOption::Unique { .. } => elements.push(TableElement::Key {
                    kind: KeyKind::Unique,
                    columns: vec![column.name.value.clone()],
                }),
                ColumnOption::Check { .. } => elements.push(TableElement::Check),
                ColumnOption::ForeignKey { .. } => {
                    elements.push(TableElement::Unsupported("ForeignKey"))
                }
                _ => {}
            }
        }
    }

    for constraint in &create.constraints {
        let element = match constraint {
            TableConstraint::PrimaryKey(primary_key) => TableElement::Key {
                kind: KeyKind::PrimaryKey,
                columns: key_column_names(primary_key.columns.iter().map(|c| &c.column.expr)),
            },
            TableConstraint::Unique(unique) => TableElement::Key {
                kind: KeyKind::Unique,
                columns: key_column_names(unique.columns.iter().map(|c| &c.column.expr)),
            },
            TableConstraint::Check { .. } => TableElement::Check,
            TableConstraint::ForeignKey { .. } => TableElement::Unsupported("ForeignKey"),
            TableConstraint::Index { .. } => TableElement::Unsupported("Index"),
            TableConstraint::FulltextOrSpatial { .. } => {
                TableElement::Unsupported("FulltextOrSpatial")
            }
        };
        elements.push(element);
    }

    elements
}

fn key_column_names<'a>(exprs: impl Iterator<Item = &'a Expr>) -> Vec<String> {
    exprs
        .map(|expr| match expr {
            Expr::Identifier(ident) => ident.value.clone(),
            other => other.to_string(),
        })
        .collect()
}

fn column_model(column: &ColumnDef) -> ColumnModel {
    let mut is_nullable = true;
    let mut default_expr = None;

    for option in &column.options {
        match &option.option {
            ColumnOption::Null => is_nullable = true,
            ColumnOption::NotNull => is_nullable = false,
            ColumnOption::Default(expr) => default_expr = Some(expr),
            _ => {}
        }
    }

    let default = default_expr
        .map(|expr| normalize_default(&expr.to_string()))
        .unwrap_or_default();

    ColumnModel {
        column_name: column.name.value.clone(),
        data_type: column.data_type.to_string(),
        is_nullable,
        default: Some(default),
        is_primary_key: false,
        is_unique: false,
    }
}

// Non-primary key constraints clear the unique flag, they never set it.
// See the open questions in DESIGN.md.
fn apply_key(model: &mut CreateTableModel, kind: KeyKind, columns: &[String]) {
    for name in columns {
        if let Some(column) = model.column_mut(name) {
            match kind {
                KeyKind::PrimaryKey => column.is_primary_key = true,
                KeyKind::Unique => column.is_unique = false,
            }
        }
    }
}
