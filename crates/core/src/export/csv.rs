//! CSV serialization.
//!
//! The header row comes from the first data row's own keys, not from the
//! configured column list; an empty row set produces an empty artifact
//! rather than an error.

use serde_json::Value;

use crate::aggregate::{ReportOutput, Row};

/// Render a report result as CSV bytes.
pub fn render(output: &ReportOutput) -> Vec<u8> {
    let rows = output.rows();
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();

    let mut out = String::new();
    write_record(&mut out, headers.iter().map(|h| h.to_string()));
    for row in rows {
        write_record(&mut out, headers.iter().map(|h| field_text(row, h)));
    }
    out.into_bytes()
}

fn write_record(out: &mut String, fields: impl Iterator<Item = String>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&escape(&field));
    }
    out.push('\n');
}

fn field_text(row: &Row, key: &str) -> String {
    match row.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        // Nested values (e.g. the `items` member rows of grouped results)
        // are embedded as compact JSON.
        Some(other) => other.to_string(),
    }
}

/// Wrap a value in double quotes, doubling internal quotes, when it
/// contains a comma, a double-quote, or a line break.
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
