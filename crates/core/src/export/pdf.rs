//! Minimal tabular PDF writer.
//!
//! Produces a single-page PDF 1.4 document with one Helvetica text block:
//! a header line from the column metadata, one line per row, and the
//! summary/total footer. Rows past the page capacity are elided with a
//! trailing marker; precise layout is not part of the export contract.

use serde_json::Value;

use crate::aggregate::{ReportOutput, Row};
use crate::report::ReportColumn;

/// Text lines that fit one US-letter page at the chosen leading.
const MAX_BODY_LINES: usize = 55;

/// Render a report result as PDF bytes.
pub fn render(output: &ReportOutput, columns: &[ReportColumn]) -> Vec<u8> {
    let lines = layout_lines(output, columns);
    let content = content_stream(&lines);
    assemble(&content)
}

fn layout_lines(output: &ReportOutput, columns: &[ReportColumn]) -> Vec<String> {
    let rows = output.rows();
    let mut lines = Vec::new();

    if let Some(first) = rows.first() {
        let keys: Vec<&str> = first.keys().map(String::as_str).collect();
        lines.push(
            keys.iter()
                .map(|k| super::header_label(k, columns).to_string())
                .collect::<Vec<_>>()
                .join(" | "),
        );

        for row in rows.iter().take(MAX_BODY_LINES) {
            lines.push(
                keys.iter()
                    .map(|k| cell_text(row, k))
                    .collect::<Vec<_>>()
                    .join(" | "),
            );
        }
        if rows.len() > MAX_BODY_LINES {
            lines.push(format!("... {} more rows", rows.len() - MAX_BODY_LINES));
        }
    } else {
        lines.push("No rows matched this report".to_string());
    }

    lines.push(String::new());
    match output {
        ReportOutput::Flat { summary, total, .. } => {
            for (field, value) in summary {
                lines.push(format!(
                    "{}: {}",
                    super::header_label(field, columns),
                    cell_value_text(value)
                ));
            }
            lines.push(format!("Total rows: {total}"));
        }
        ReportOutput::Grouped { total, groups, .. } => {
            lines.push(format!("Total rows: {total} in {groups} groups"));
        }
    }

    lines
}

fn cell_text(row: &Row, key: &str) -> String {
    match row.get(key) {
        None => String::new(),
        Some(v) => cell_value_text(v),
    }
}

fn cell_value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(_) => "{..}".to_string(),
    }
}

fn content_stream(lines: &[String]) -> String {
    let mut stream = String::from("BT\n/F1 9 Tf\n1 0 0 1 40 750 Tm\n");
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            stream.push_str("0 -12 Td\n");
        }
        stream.push('(');
        stream.push_str(&escape_pdf_text(line));
        stream.push_str(") Tj\n");
    }
    stream.push_str("ET\n");
    stream
}

/// Escape PDF string delimiters; characters outside the printable ASCII
/// range are replaced since the built-in font has no wider encoding.
fn escape_pdf_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            '\\' => "\\\\".to_string(),
            c if (' '..='~').contains(&c) => c.to_string(),
            _ => "?".to_string(),
        })
        .collect()
}

/// Assemble the fixed five-object document and its xref table.
fn assemble(content: &str) -> Vec<u8> {
    let objects = [
        "<</Type /Catalog /Pages 2 0 R>>".to_string(),
        "<</Type /Pages /Kids [3 0 R] /Count 1>>".to_string(),
        "<</Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources <</Font <</F1 4 0 R>>>> /Contents 5 0 R>>"
            .to_string(),
        "<</Type /Font /Subtype /Type1 /BaseFont /Helvetica>>".to_string(),
        format!(
            "<</Length {}>>\nstream\n{content}endstream",
            content.len()
        ),
    ];

    let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());

    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<</Size {} /Root 1 0 R>>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );

    out
}
