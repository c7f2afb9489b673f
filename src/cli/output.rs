//! Output formatting for CLI

use crate::models::QueryResult;
use crate::processor::{ErrorReport, ScriptReport};

/// Result of parsing and building one statement without dispatching it
#[derive(Debug)]
pub enum ParsedStatement {
    Model(QueryResult),
    /// Parsed, but no builder exists for its kind
    Unsupported(String),
    Error(String),
}

/// Format segmented statements, one numbered entry per statement
pub fn format_statements(statements: &[String]) -> String {
    let mut output = String::new();
    for (idx, statement) in statements.iter().enumerate() {
        output.push_str(&format!("[{}] {}\n", idx + 1, statement));
    }
    output.push_str(&format!("\n{} statement(s)\n", statements.len()));
    output
}

/// Format built models in compact mode
pub fn format_parsed(parsed: &[(String, ParsedStatement)]) -> String {
    let mut output = String::new();

    for (idx, (statement, result)) in parsed.iter().enumerate() {
        output.push_str(&format!("\nStatement {}: {}\n", idx + 1, statement));
        match result {
            ParsedStatement::Model(QueryResult::CreateTable(table)) => {
                output.push_str(&format!("  CreateTable {}\n", table.table_name));
                for column in &table.columns {
                    let mut flags = Vec::new();
                    if column.is_primary_key {
                        flags.push("PK");
                    }
                    if !column.is_nullable {
                        flags.push("NOT NULL");
                    }
                    output.push_str(&format!("    {}:{}", column.column_name, column.data_type));
                    if !flags.is_empty() {
                        output.push_str(&format!(" [{}]", flags.join(", ")));
                    }
                    if let Some(default) = column.default.as_deref().filter(|d| !d.is_empty()) {
                        output.push_str(&format!(" default={}", default));
                    }
                    output.push('\n');
                }
            }
            ParsedStatement::Model(QueryResult::Insert(insert)) => {
                output.push_str(&format!(
                    "  Insert {} ({}) rows={}\n",
                    insert.table_name,
                    insert.column_names.join(", "),
                    insert.rows.len()
                ));
                for row in &insert.rows {
                    let values: Vec<&str> = row
                        .values
                        .iter()
                        .map(|v| v.as_deref().unwrap_or("NULL"))
                        .collect();
                    output.push_str(&format!("    ({})\n", values.join(", ")));
                }
            }
            ParsedStatement::Model(QueryResult::DropTable(drop)) => {
                output.push_str(&format!("  DropTable {}\n", drop.table_names.join(", ")));
            }
            ParsedStatement::Unsupported(kind) => {
                output.push_str(&format!("  ⚠️  Unsupported statement kind: {}\n", kind));
            }
            ParsedStatement::Error(message) => {
                output.push_str(&format!("  ❌ {}\n", message));
            }
        }
    }

    output
}

/// Format a script report with one line per statement
pub fn format_report(report: &ScriptReport) -> String {
    let mut output = String::new();
    output.push_str(&format!("Run {}\n", report.run_id));

    for outcome in &report.outcomes {
        let marker = if outcome.is_success() { "✅" } else { "❌" };
        output.push_str(&format!(
            "{} [{}] {} -> {}\n",
            marker,
            outcome.index + 1,
            outcome.status,
            outcome.body
        ));
    }

    let failed = report.failed_count();
    if failed > 0 {
        output.push_str(&format!(
            "\n⚠️  {} of {} statement(s) failed\n",
            failed,
            report.outcomes.len()
        ));
    }
    output.push_str(&format!("\n{}\n", report.summary()));
    output
}

/// Format an error report for stderr
pub fn format_error_report(status: u16, report: &ErrorReport) -> String {
    format!(
        "❌ {} ({}): {}\n  {}\n",
        report.exception_type, status, report.message, report.details.message_exception
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateTableModel, InsertModel};

    #[test]
    fn test_format_statements() {
        let output = format_statements(&["SELECT 1;".to_string(), "SELECT 2;".to_string()]);
        assert!(output.starts_with("[1] SELECT 1;\n[2] SELECT 2;\n"));
        assert!(output.ends_with("2 statement(s)\n"));
    }

    #[test]
    fn test_format_parsed() {
        let mut table = CreateTableModel::new("users");
        let mut id = crate::models::ColumnModel::new("id", "INT");
        id.is_primary_key = true;
        id.is_nullable = false;
        table.columns.push(id);

        let mut insert = InsertModel::new("users", vec!["id".to_string()]);
        insert.push_value(None);

        let output = format_parsed(&[
            ("CREATE TABLE users (...)".to_string(), ParsedStatement::Model(table.into())),
            ("INSERT ...".to_string(), ParsedStatement::Model(insert.into())),
            ("CREATE TABL".to_string(), ParsedStatement::Error("bad".to_string())),
        ]);

        assert!(output.contains("    id:INT [PK, NOT NULL]\n"));
        assert!(output.contains("  Insert users (id) rows=1\n    (NULL)\n"));
        assert!(output.contains("❌ bad"));
    }
}
