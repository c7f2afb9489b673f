//! INSERT model builder

use std::ops::ControlFlow;

use sqlparser::ast::{
    Expr, Insert, SetExpr, TableObject, UnaryOperator, Value, ValueWithSpan, visit_expressions,
};

use super::{BuildError, object_name_text};
use crate::models::InsertModel;

/// Build an [`InsertModel`] from an INSERT statement.
///
/// Values of the source are visited in document order and appended through
/// [`InsertModel::push_value`], which re-segments the flat value stream into
/// rows of `column_names.len()` values. A `VALUES` tuple therefore maps onto
/// one row only when it has exactly as many entries as declared columns.
pub fn build(insert: &Insert) -> Result<InsertModel, BuildError> {
    let table_name = match &insert.table {
        TableObject::TableName(name) => object_name_text(name),
        other => return Err(BuildError::UnsupportedTarget(other.to_string())),
    };
    let column_names = insert
        .columns
        .iter()
        .map(|column| column.value.clone())
        .collect();

    let mut model = InsertModel::new(table_name, column_names);
    let mut values = Vec::new();

    if let Some(source) = &insert.source {
        match source.body.as_ref() {
            SetExpr::Values(rows) => {
                for expr in rows.rows.iter().flatten() {
                    collect_values(expr, &mut values);
                }
            }
            _ => {
                let _ = visit_expressions(source.as_ref(), |expr| {
                    if let Some(value) = leaf_value(expr) {
                        values.push(value);
                    }
                    ControlFlow::<()>::Continue(())
                });
            }
        }
    }

    for value in values {
        model.push_value(value);
    }

    Ok(model)
}

/// Collect identifier and literal leaves of `expr` in document order
fn collect_values(expr: &Expr, out: &mut Vec<Option<String>>) {
    if let Some(value) = leaf_value(expr) {
        out.push(value);
        return;
    }

    match expr {
        Expr::Nested(inner) | Expr::UnaryOp { expr: inner, .. } => collect_values(inner, out),
        Expr::BinaryOp { left, right, .. } => {
            collect_values(left, out);
            collect_values(right, out);
        }
        Expr::Tuple(items) => {
            for item in items {
                collect_values(item, out);
            }
        }
        other => {
            let _ = visit_expressions(other, |expr| {
                if let Some(value) = leaf_value(expr) {
                    out.push(value);
                }
                ControlFlow::<()>::Continue(())
            });
        }
    }
}

/// Value carried by a leaf expression; `Some(None)` is SQL NULL
fn leaf_value(expr: &Expr) -> Option<Option<String>> {
    match expr {
        Expr::Value(ValueWithSpan { value, .. }) => Some(literal_text(value)),
        Expr::Identifier(ident) => Some(Some(ident.value.clone())),
        Expr::CompoundIdentifier(parts) => Some(Some(
            parts
                .iter()
                .map(|ident| ident.value.as_str())
                .collect::<Vec<_>>()
                .join("."),
        )),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => match expr.as_ref() {
            Expr::Value(ValueWithSpan {
                value: Value::Number(number, _),
                ..
            }) => Some(Some(format!("-{number}"))),
            _ => None,
        },
        _ => None,
    }
}

fn literal_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::SingleQuotedString(text)
        | Value::DoubleQuotedString(text)
        | Value::NationalStringLiteral(text)
        | Value::EscapedStringLiteral(text) => Some(text.clone()),
        Value::Number(number, _) => Some(number.clone()),
        Value::Boolean(flag) => Some(flag.to_string()),
        other => Some(other.to_string()),
    }
}
