//! Minimal SpreadsheetML (.xlsx) writer.
//!
//! Emits the smallest package Excel and LibreOffice both open: content
//! types, package relationships, a one-sheet workbook, and a sheet with
//! inline strings. Numbers are written as native numeric cells so
//! spreadsheet formulas work on exported aggregates.

use std::io::{Cursor, Write};

use serde_json::Value;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::aggregate::ReportOutput;
use crate::error::CoreError;
use crate::report::ReportColumn;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Report" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

/// Render a report result as an .xlsx package.
pub fn render(output: &ReportOutput, columns: &[ReportColumn]) -> Result<Vec<u8>, CoreError> {
    let sheet = sheet_xml(output, columns);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", sheet.as_str()),
    ] {
        zip.start_file(name, options)
            .map_err(|e| CoreError::Internal(format!("xlsx packaging failed: {e}")))?;
        zip.write_all(content.as_bytes())
            .map_err(|e| CoreError::Internal(format!("xlsx packaging failed: {e}")))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| CoreError::Internal(format!("xlsx packaging failed: {e}")))?;
    Ok(cursor.into_inner())
}

fn sheet_xml(output: &ReportOutput, columns: &[ReportColumn]) -> String {
    let rows = output.rows();

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    if let Some(first) = rows.first() {
        let keys: Vec<&str> = first.keys().map(String::as_str).collect();

        xml.push_str("<row r=\"1\">");
        for key in &keys {
            push_text_cell(&mut xml, super::header_label(key, columns));
        }
        xml.push_str("</row>");

        for (i, row) in rows.iter().enumerate() {
            xml.push_str(&format!("<row r=\"{}\">", i + 2));
            for key in &keys {
                match row.get(*key) {
                    Some(Value::Number(n)) => {
                        xml.push_str(&format!("<c><v>{n}</v></c>"));
                    }
                    None | Some(Value::Null) => xml.push_str("<c t=\"inlineStr\"><is><t/></is></c>"),
                    Some(Value::String(s)) => push_text_cell(&mut xml, s),
                    Some(Value::Bool(b)) => {
                        xml.push_str(&format!("<c t=\"b\"><v>{}</v></c>", *b as u8));
                    }
                    Some(other) => push_text_cell(&mut xml, &other.to_string()),
                }
            }
            xml.push_str("</row>");
        }
    }

    xml.push_str("</sheetData></worksheet>");
    xml
}

fn push_text_cell(xml: &mut String, text: &str) {
    xml.push_str("<c t=\"inlineStr\"><is><t>");
    xml.push_str(&xml_escape(text));
    xml.push_str("</t></is></c>");
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(rows: Vec<serde_json::Value>) -> ReportOutput {
        ReportOutput::Flat {
            data: rows
                .into_iter()
                .map(|v| v.as_object().unwrap().clone())
                .collect(),
            summary: serde_json::Map::new(),
            total: 0,
            truncated: false,
        }
    }

    #[test]
    fn package_starts_with_zip_magic() {
        let output = flat(vec![json!({"name": "Acme", "total": 10})]);
        let bytes = render(&output, &[]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn sheet_uses_numeric_cells_for_numbers() {
        let output = flat(vec![json!({"total": 42})]);
        let xml = sheet_xml(&output, &[]);
        assert!(xml.contains("<c><v>42</v></c>"));
    }

    #[test]
    fn sheet_escapes_markup_in_strings() {
        let output = flat(vec![json!({"name": "a<b & c"})]);
        let xml = sheet_xml(&output, &[]);
        assert!(xml.contains("a&lt;b &amp; c"));
    }

    #[test]
    fn header_uses_configured_labels() {
        let output = flat(vec![json!({"total": 1})]);
        let columns = vec![ReportColumn {
            field: "total".to_string(),
            label: "Grand Total".to_string(),
            aggregate: None,
        }];
        let xml = sheet_xml(&output, &columns);
        assert!(xml.contains("Grand Total"));
    }

    #[test]
    fn empty_result_still_renders_a_valid_package() {
        let output = flat(vec![]);
        let bytes = render(&output, &[]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }
}
