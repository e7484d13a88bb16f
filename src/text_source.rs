//! Plain-text extraction from corpus documents.
//!
//! The engine only ever sees a [`TextProvider`]. An empty string means the
//! document could not be read, never that it is legitimately blank.

use std::{io::Read, path::Path};

use quick_xml::{Reader, events::Event};

pub trait TextProvider: Send + Sync {
    /// Extract the plain text of `path`, or `""` on any failure.
    fn text(&self, path: &Path) -> String;
}

/// Format-dispatching provider for PDF, Word and plain-text files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentText;

impl TextProvider for DocumentText {
    fn text(&self, path: &Path) -> String {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let result = match ext.as_str() {
            "pdf" => pdf_text(path),
            "docx" | "doc" => docx_text(path),
            "txt" | "md" => std::fs::read_to_string(path)
                .map_err(|e| e.to_string()),
            other => Err(format!("unsupported file format: .{other}")),
        };

        match result {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "text extraction failed: {e}"
                );
                String::new()
            }
        }
    }
}

fn pdf_text(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    // pdf-extract panics on some malformed inputs.
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
        .map_err(|_| "PDF parser panicked".to_string())?
        .map_err(|e| e.to_string())
}

/// Word documents are zip archives; legacy binary `.doc` files fail here.
fn docx_text(path: &Path) -> Result<String, String> {
    let file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| format!("not a Word archive: {e}"))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| e.to_string())?
        .read_to_string(&mut xml)
        .map_err(|e| e.to_string())?;
    paragraphs_from_document_xml(&xml)
}

/// One line per `<w:p>`, runs concatenated, XML entities unescaped.
fn paragraphs_from_document_xml(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:t" => {
                in_run_text = true;
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:p" | b"w:br" => text.push('\n'),
                b"w:tab" => text.push('\t'),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_run_text => {
                let run = e.unescape().map_err(|e| e.to_string())?;
                text.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "malformed document.xml at {}: {e}",
                    reader.error_position()
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}
