//! Text extraction from files on disk
//!
//! Format is picked from the file extension, falling back to the guessed
//! MIME type. Binary formats are decoded on the blocking pool.

use std::io::Read;
use std::path::Path;

use async_trait::async_trait;
use pulldown_cmark::{Event, Parser, Tag};
use scraper::{ElementRef, Html, Selector};

use crate::domain::ingestion::TextExtractor;
use crate::domain::DomainError;

/// Largest `word/document.xml` we are willing to inflate
const MAX_DOCX_XML_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    PlainText,
    Markdown,
    Html,
    Pdf,
    Docx,
    Image,
    Unknown,
}

fn detect_format(path: &Path) -> FileFormat {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("md" | "markdown") => FileFormat::Markdown,
        Some("html" | "htm") => FileFormat::Html,
        Some("pdf") => FileFormat::Pdf,
        Some("docx") => FileFormat::Docx,
        Some("txt" | "csv" | "json" | "log") => FileFormat::PlainText,
        _ => match mime_guess::from_path(path).first_raw() {
            Some(mime) if mime.starts_with("image/") => FileFormat::Image,
            Some(mime) if mime.starts_with("text/") || mime.ends_with("json") => {
                FileFormat::PlainText
            }
            _ => FileFormat::Unknown,
        },
    }
}

/// Default [`TextExtractor`]: plain text, markdown, HTML, PDF and DOCX.
///
/// Images need OCR, which this extractor does not do.
#[derive(Debug, Clone, Default)]
pub struct FileTextExtractor;

impl FileTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn decode_utf8(locator: &str, bytes: Vec<u8>) -> Result<String, DomainError> {
        String::from_utf8(bytes)
            .map_err(|e| DomainError::extraction(locator, format!("Invalid UTF-8: {}", e)))
    }

    async fn extract_blocking<F>(locator: &str, bytes: Vec<u8>, f: F) -> Result<String, DomainError>
    where
        F: FnOnce(&[u8]) -> Result<String, String> + Send + 'static,
    {
        tokio::task::spawn_blocking(move || f(&bytes))
            .await
            .map_err(|e| DomainError::internal(format!("Extraction task failed: {}", e)))?
            .map_err(|e| DomainError::extraction(locator, e))
    }
}

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String, DomainError> {
        let locator = path.display().to_string();
        let format = detect_format(path);

        if format == FileFormat::Image {
            return Err(ocr_unsupported(&locator));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DomainError::extraction(&locator, e.to_string()))?;

        let text = match format {
            FileFormat::PlainText => Self::decode_utf8(&locator, bytes)?,
            FileFormat::Markdown => markdown_to_text(&Self::decode_utf8(&locator, bytes)?),
            FileFormat::Html => html_to_text(&String::from_utf8_lossy(&bytes)),
            FileFormat::Pdf => {
                Self::extract_blocking(&locator, bytes, |b| {
                    pdf_extract::extract_text_from_mem(b).map_err(|e| e.to_string())
                })
                .await?
            }
            FileFormat::Docx => Self::extract_blocking(&locator, bytes, docx_to_text).await?,
            FileFormat::Unknown => Self::decode_utf8(&locator, bytes).map_err(|_| {
                DomainError::unsupported(format!("Unrecognized binary file '{}'", locator))
            })?,
            FileFormat::Image => return Err(ocr_unsupported(&locator)),
        };

        Ok(text.trim().to_string())
    }
}

fn ocr_unsupported(locator: &str) -> DomainError {
    DomainError::unsupported(format!("OCR is not available for image file '{}'", locator))
}

/// Visible text of an HTML document, one block element per line
pub fn html_to_text(raw: &str) -> String {
    let document = Html::parse_document(raw);
    let body = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next());

    let text = match body {
        Some(body) => element_text(&body),
        None => element_text(&document.root_element()),
    };

    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn element_text(element: &ElementRef) -> String {
    let mut text = String::new();

    for node in element.children() {
        if let Some(el) = ElementRef::wrap(node) {
            let tag = el.value().name();
            if matches!(tag, "script" | "style" | "noscript" | "head" | "template") {
                continue;
            }

            let is_block = matches!(
                tag,
                "p" | "div" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "br" | "li" | "tr"
                    | "section" | "article"
            );
            if is_block && !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }

            text.push_str(&element_text(&el));

            if is_block {
                text.push('\n');
            } else if matches!(tag, "td" | "th") {
                text.push(' ');
            }
        } else if let Some(t) = node.value().as_text() {
            text.push_str(t);
        }
    }

    text
}

/// Markdown reduced to its text, one block per line
pub fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::Start(Tag::Item) => {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str("- ");
            }
            Event::End(
                Tag::Heading(..) | Tag::Paragraph | Tag::Item | Tag::CodeBlock(_),
            ) => {
                if !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            _ => {}
        }
    }

    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Paragraph text of a DOCX package
fn docx_to_text(bytes: &[u8]) -> Result<String, String> {
    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| "word/document.xml not found".to_string())?;

    let mut xml = Vec::new();
    entry
        .take(MAX_DOCX_XML_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| e.to_string())?;
    if xml.len() as u64 >= MAX_DOCX_XML_BYTES {
        return Err("word/document.xml exceeds size limit".to_string());
    }

    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) if e.local_name().as_ref() == b"t" => {
                in_text = true;
            }
            Ok(quick_xml::events::Event::Text(t)) if in_text => {
                let unescaped = t.unescape().map_err(|e| e.to_string())?;
                out.push_str(&unescaped);
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(quick_xml::events::Event::Empty(e)) if e.local_name().as_ref() == b"tab" => {
                out.push('\t');
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}
