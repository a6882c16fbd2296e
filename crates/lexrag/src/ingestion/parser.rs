//! Format-specific text extraction

use calamine::Reader;
use std::io::{Cursor, Read};

use crate::error::{Error, Result};
use crate::types::FileType;

/// Turns the bytes of one document format into plain text
pub trait Extractor: Send + Sync {
    /// Format this extractor handles
    fn file_type(&self) -> FileType;

    /// Extract plain text, failing on corrupt or unreadable content
    fn extract(&self, filename: &str, data: &[u8]) -> Result<String>;
}

/// Fail when extraction produced nothing but whitespace
fn non_empty(filename: &str, text: String) -> Result<String> {
    if text.trim().is_empty() {
        return Err(Error::extraction(filename, "No text content could be extracted"));
    }
    Ok(text)
}

/// PDF text, one line group per page
pub struct PdfExtractor;

impl PdfExtractor {
    fn extract_pages(data: &[u8]) -> std::result::Result<String, String> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| e.to_string())?;

        let mut all_text = String::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => {
                    all_text.push_str(text.trim_end());
                    all_text.push('\n');
                }
                Err(e) => {
                    tracing::debug!("Could not extract text from page {}: {}", page_number, e);
                }
            }
        }
        Ok(all_text)
    }
}

impl Extractor for PdfExtractor {
    fn file_type(&self) -> FileType {
        FileType::Pdf
    }

    fn extract(&self, filename: &str, data: &[u8]) -> Result<String> {
        let paged = match Self::extract_pages(data) {
            Ok(text) if !text.trim().is_empty() => return Ok(text.replace('\0', "")),
            Ok(_) => "no text on any page".to_string(),
            Err(e) => e,
        };

        tracing::warn!("[{}] Page extraction failed ({}), trying pdf-extract", filename, paged);
        let text = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::extraction(filename, format!("Failed to read PDF: {}", e)))?;

        non_empty(filename, text.replace('\0', ""))
    }
}

/// DOCX paragraphs separated by blank lines
pub struct DocxExtractor;

impl DocxExtractor {
    fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
        let mut text = String::new();
        for child in &paragraph.children {
            if let docx_rs::ParagraphChild::Run(run) = child {
                for child in &run.children {
                    match child {
                        docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                        docx_rs::RunChild::Tab(_) => text.push('\t'),
                        _ => {}
                    }
                }
            }
        }
        text
    }

    #[allow(irrefutable_let_patterns)]
    fn table_text(table: &docx_rs::Table, out: &mut String) {
        for row in &table.rows {
            let docx_rs::TableChild::TableRow(row) = row else {
                continue;
            };
            let mut cells = Vec::new();
            for cell in &row.cells {
                let docx_rs::TableRowChild::TableCell(cell) = cell else {
                    continue;
                };
                let text: Vec<String> = cell
                    .children
                    .iter()
                    .filter_map(|content| match content {
                        docx_rs::TableCellContent::Paragraph(p) => Some(Self::paragraph_text(p)),
                        _ => None,
                    })
                    .collect();
                cells.push(text.join(" "));
            }
            out.push_str(cells.join("\t").trim_end());
            out.push('\n');
        }
        out.push('\n');
    }
}

impl Extractor for DocxExtractor {
    fn file_type(&self) -> FileType {
        FileType::Docx
    }

    fn extract(&self, filename: &str, data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data)
            .map_err(|e| Error::extraction(filename, e.to_string()))?;

        let mut content = String::new();
        for child in &doc.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(p) => {
                    content.push_str(&Self::paragraph_text(p));
                    content.push_str("\n\n");
                }
                docx_rs::DocumentChild::Table(table) => Self::table_text(table, &mut content),
                _ => {}
            }
        }

        non_empty(filename, content)
    }
}

/// PPTX slide text, one line per slide
pub struct PptxExtractor;

impl PptxExtractor {
    fn slide_number(name: &str) -> u32 {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse()
            .unwrap_or(0)
    }

    /// Collect `<a:t>` runs from slide XML
    fn slide_text(xml: &str) -> String {
        use quick_xml::events::Event;

        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut runs = Vec::new();
        let mut in_text = false;
        let mut current = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => {
                    in_text = true;
                    current.clear();
                }
                Ok(Event::Text(e)) if in_text => {
                    if let Ok(text) = e.unescape() {
                        current.push_str(&text);
                    }
                }
                Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => {
                    if in_text && !current.trim().is_empty() {
                        runs.push(current.trim().to_string());
                    }
                    in_text = false;
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    tracing::debug!("Stopping at malformed slide XML: {}", e);
                    break;
                }
                _ => {}
            }
        }

        runs.join(" ")
    }
}

impl Extractor for PptxExtractor {
    fn file_type(&self) -> FileType {
        FileType::Pptx
    }

    fn extract(&self, filename: &str, data: &[u8]) -> Result<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::extraction(filename, e.to_string()))?;

        let mut slide_names: Vec<String> = archive
            .file_names()
            .filter(|name| name.starts_with("ppt/slides/slide") && name.ends_with(".xml"))
            .map(str::to_string)
            .collect();
        slide_names.sort_by_key(|name| Self::slide_number(name));

        let mut content = String::new();
        for slide_name in slide_names {
            let mut xml = String::new();
            archive
                .by_name(&slide_name)
                .map_err(|e| Error::extraction(filename, e.to_string()))?
                .read_to_string(&mut xml)?;

            content.push_str(&Self::slide_text(&xml));
            content.push('\n');
        }

        non_empty(filename, content)
    }
}

/// XLSX sheets rendered as CSV, sheets separated by blank lines
pub struct XlsxExtractor;

impl XlsxExtractor {
    fn cell_text(cell: &calamine::Data) -> String {
        let raw = match cell {
            calamine::Data::Empty => String::new(),
            calamine::Data::String(s) => s.clone(),
            calamine::Data::Float(f) => f.to_string(),
            calamine::Data::Int(i) => i.to_string(),
            calamine::Data::Bool(b) => b.to_string(),
            calamine::Data::DateTime(dt) => dt.to_string(),
            calamine::Data::DateTimeIso(s) | calamine::Data::DurationIso(s) => s.clone(),
            calamine::Data::Error(e) => e.to_string(),
            #[allow(unreachable_patterns)]
            _ => String::new(),
        };

        if raw.contains([',', '"', '\n']) {
            format!("\"{}\"", raw.replace('"', "\"\""))
        } else {
            raw
        }
    }
}

impl Extractor for XlsxExtractor {
    fn file_type(&self) -> FileType {
        FileType::Xlsx
    }

    fn extract(&self, filename: &str, data: &[u8]) -> Result<String> {
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(data))
            .map_err(|e| Error::extraction(filename, e.to_string()))?;

        let mut sheets = Vec::new();
        for sheet_name in workbook.sheet_names() {
            let range = match workbook.worksheet_range(&sheet_name) {
                Ok(range) => range,
                Err(e) => {
                    tracing::warn!("[{}] Skipping sheet '{}': {}", filename, sheet_name, e);
                    continue;
                }
            };

            let mut sheet = format!("Sheet: {}\n", sheet_name);
            for row in range.rows() {
                if row.iter().all(|cell| matches!(cell, calamine::Data::Empty)) {
                    continue;
                }
                let cells: Vec<String> = row.iter().map(Self::cell_text).collect();
                sheet.push_str(&cells.join(","));
                sheet.push('\n');
            }
            sheets.push(sheet);
        }

        non_empty(filename, sheets.join("\n"))
    }
}

/// CSV passes through as text, minus a leading byte order mark
pub struct CsvExtractor;

impl Extractor for CsvExtractor {
    fn file_type(&self) -> FileType {
        FileType::Csv
    }

    fn extract(&self, filename: &str, data: &[u8]) -> Result<String> {
        let data = data.strip_prefix(b"\xef\xbb\xbf").unwrap_or(data);
        non_empty(filename, String::from_utf8_lossy(data).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn pptx_with_slides(slides: &[(&str, &str)]) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::SimpleFileOptions::default();
            for (name, body) in slides {
                zip.start_file(*name, options).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_slide_text() {
        let xml = r#"<p:sld xmlns:a="a" xmlns:p="p"><p:txBody>
            <a:p><a:r><a:t>Quarterly</a:t></a:r><a:r><a:t>Results &amp; Outlook</a:t></a:r></a:p>
            </p:txBody></p:sld>"#;
        assert_eq!(PptxExtractor::slide_text(xml), "Quarterly Results & Outlook");
    }

    #[test]
    fn test_pptx_slides_in_numeric_order() {
        let slide = |text: &str| format!(r#"<p:sld xmlns:a="a" xmlns:p="p"><a:t>{}</a:t></p:sld>"#, text);
        let data = pptx_with_slides(&[
            ("ppt/slides/slide10.xml", &slide("tenth")),
            ("ppt/slides/slide2.xml", &slide("second")),
            ("ppt/slides/slide1.xml", &slide("first")),
            ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>"),
        ]);

        let text = PptxExtractor.extract("deck.pptx", &data).unwrap();
        assert_eq!(text, "first\nsecond\ntenth\n");
    }

    #[test]
    fn test_pptx_without_text_fails() {
        let data = pptx_with_slides(&[("ppt/slides/slide1.xml", "<p:sld xmlns:p=\"p\"/>")]);
        let err = PptxExtractor.extract("empty.pptx", &data).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn test_corrupt_archives_fail() {
        let garbage = b"definitely not a zip archive";
        assert!(matches!(
            PptxExtractor.extract("bad.pptx", garbage),
            Err(Error::Extraction { .. })
        ));
        assert!(matches!(
            DocxExtractor.extract("bad.docx", garbage),
            Err(Error::Extraction { .. })
        ));
        assert!(matches!(
            XlsxExtractor.extract("bad.xlsx", garbage),
            Err(Error::Extraction { .. })
        ));
    }

    #[test]
    fn test_corrupt_pdf_fails() {
        let err = PdfExtractor.extract("bad.pdf", b"%PDF-1.4 truncated").unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn test_csv_passthrough() {
        let text = CsvExtractor.extract("data.csv", b"id,name\n1,alice\n").unwrap();
        assert_eq!(text, "id,name\n1,alice\n");
    }

    #[test]
    fn test_csv_byte_order_mark_stripped() {
        let text = CsvExtractor
            .extract("export.csv", b"\xef\xbb\xbfid,name\n1,alice\n")
            .unwrap();
        assert_eq!(text, "id,name\n1,alice\n");
        assert_eq!(crate::ingestion::tokenize(&text)[0], "id");
    }

    #[test]
    fn test_empty_csv_fails() {
        let inputs: [&[u8]; 3] = [b"", b"  \n\r\n", b"\xef\xbb\xbf"];
        for data in inputs {
            let err = CsvExtractor.extract("empty.csv", data).unwrap_err();
            assert!(matches!(err, Error::Extraction { .. }));
        }
    }

    #[test]
    fn test_cell_quoting() {
        assert_eq!(XlsxExtractor::cell_text(&calamine::Data::String("a,b".into())), "\"a,b\"");
        assert_eq!(
            XlsxExtractor::cell_text(&calamine::Data::String("say \"hi\"".into())),
            "\"say \"\"hi\"\"\""
        );
        assert_eq!(XlsxExtractor::cell_text(&calamine::Data::Int(7)), "7");
        assert_eq!(XlsxExtractor::cell_text(&calamine::Data::Empty), "");
    }
}
