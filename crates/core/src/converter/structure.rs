//! Structural and size heuristics for documents.
//!
//! These checks are plausibility tests, not format validators. An HTML page
//! only needs a `<body>`; a DOCX only needs a readable `word/document.xml`
//! with at least one paragraph.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::HashSet;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use super::types::StructureReport;
use crate::fs::format_size;

const DOCUMENT_XML: &str = "word/document.xml";
const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";

static HTML_BODY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<body[\s>/]").unwrap());
static HTML_STRUCTURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(h[1-6]|header|section|article)[\s>/]").unwrap()
});
static HTML_ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<a(\s[^>]*)?>").unwrap());
static HTML_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\shref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap()
});

static DOCX_PARAGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"<w:p[\s>/]").unwrap());
static DOCX_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<w:pStyle\s+w:val="Heading[^"]*""#).unwrap());
static DOCX_HYPERLINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<w:hyperlink\b[^>]*\br:id="([^"]+)""#).unwrap());
static DOCX_RELATIONSHIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<Relationship\b[^>]*\bId="([^"]+)""#).unwrap());

/// Checks that HTML looks like a document worth converting.
pub fn validate_html_structure(content: &str, check_links: bool) -> StructureReport {
    let mut report = StructureReport::default();

    if !HTML_BODY.is_match(content) {
        report.error("HTML document missing body tag");
        return report;
    }

    if !HTML_STRUCTURE.is_match(content) {
        report.warn("HTML document has no header tags or structural elements");
    }

    if check_links {
        let empty_links = HTML_ANCHOR
            .captures_iter(content)
            .filter(|caps| {
                let attrs = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                match HTML_HREF.captures(attrs) {
                    Some(href) => {
                        let value = href
                            .get(1)
                            .or_else(|| href.get(2))
                            .or_else(|| href.get(3))
                            .map(|m| m.as_str())
                            .unwrap_or_default();
                        value.trim().is_empty()
                    }
                    None => true,
                }
            })
            .count();

        if empty_links > 0 {
            report.error(format!("Found {} empty links in document", empty_links));
        }
    }

    report
}

/// Checks that DOCX bytes form a readable word-processing document.
pub fn validate_docx_structure(bytes: &[u8], check_links: bool) -> StructureReport {
    let mut report = StructureReport::default();

    let mut archive = match ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => archive,
        Err(e) => {
            report.error(format!("DOCX validation error: {}", e));
            return report;
        }
    };

    let document = match read_entry(&mut archive, DOCUMENT_XML) {
        Ok(Some(document)) => document,
        Ok(None) => {
            report.error(format!("DOCX document is missing {}", DOCUMENT_XML));
            return report;
        }
        Err(e) => {
            report.error(format!("DOCX validation error: {}", e));
            return report;
        }
    };

    if !DOCX_PARAGRAPH.is_match(&document) {
        report.error("DOCX document has no paragraphs");
        return report;
    }

    if !DOCX_HEADING.is_match(&document) {
        report.warn("DOCX document has no heading styles");
    }

    if check_links {
        let rels = match read_entry(&mut archive, DOCUMENT_RELS) {
            Ok(Some(rels)) => rels,
            _ => {
                report.error("Document structure appears incomplete");
                return report;
            }
        };

        let known: HashSet<&str> = DOCX_RELATIONSHIP
            .captures_iter(&rels)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();
        let broken = DOCX_HYPERLINK
            .captures_iter(&document)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .filter(|id| !known.contains(id))
            .count();

        if broken > 0 {
            report.error(format!(
                "Found {} hyperlinks without a relationship target",
                broken
            ));
        }
    }

    report
}

fn read_entry(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<String>, zip::result::ZipError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(Some(content))
}

/// Checks the converted file meets the minimum size.
pub fn check_file_size(converted_size: u64, min_size: u64) -> Result<(), String> {
    if min_size > 0 && converted_size < min_size {
        return Err(format!(
            "Converted file size ({}) is below the minimum threshold ({})",
            format_size(converted_size),
            format_size(min_size)
        ));
    }
    Ok(())
}

/// Checks the converted file is not drastically smaller than the original.
pub fn check_conversion_ratio(
    converted_size: u64,
    original_size: u64,
    threshold: f64,
) -> Result<(), String> {
    if original_size == 0 {
        return Ok(());
    }

    let ratio = converted_size as f64 / original_size as f64;
    if ratio < threshold {
        return Err(format!(
            "Conversion error: Converted file size ({}) is less than {:.0}% of the original file size ({}) (ratio: {:.2}).",
            format_size(converted_size),
            threshold * 100.0,
            format_size(original_size),
            ratio
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_html_with_body_and_heading_is_valid() {
        let report = validate_html_structure(&fixtures::html_document("Title", "Body"), false);
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_html_missing_body() {
        let report = validate_html_structure("<html><p>loose</p></html>", false);
        assert!(!report.is_valid());
        assert_eq!(report.errors, vec!["HTML document missing body tag"]);
    }

    #[test]
    fn test_html_without_headings_warns() {
        let report = validate_html_structure("<html><body><p>text</p></body></html>", false);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_html_empty_links_only_checked_when_enabled() {
        let html = r#"<html><body><h1>T</h1>
            <a href="https://example.com">ok</a>
            <a href="">empty</a>
            <a name="anchor">missing</a>
            <A HREF='  '>blank</A>
        </body></html>"#;

        assert!(validate_html_structure(html, false).is_valid());

        let report = validate_html_structure(html, true);
        assert_eq!(report.errors, vec!["Found 3 empty links in document"]);
    }

    #[test]
    fn test_html_abbr_is_not_anchor() {
        let html = "<html><body><h1>T</h1><abbr>x</abbr><article>y</article></body></html>";
        assert!(validate_html_structure(html, true).is_valid());
    }

    #[test]
    fn test_docx_valid() {
        let bytes = fixtures::docx_bytes(&["Heading one", "A paragraph"], true);
        let report = validate_docx_structure(&bytes, false);
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_docx_without_heading_warns() {
        let bytes = fixtures::docx_bytes(&["only text"], false);
        let report = validate_docx_structure(&bytes, false);
        assert!(report.is_valid());
        assert_eq!(report.warnings, vec!["DOCX document has no heading styles"]);
    }

    #[test]
    fn test_docx_no_paragraphs() {
        let bytes = fixtures::docx_bytes(&[], false);
        let report = validate_docx_structure(&bytes, false);
        assert_eq!(report.errors, vec!["DOCX document has no paragraphs"]);
    }

    #[test]
    fn test_docx_not_a_zip() {
        let report = validate_docx_structure(b"definitely not a zip", false);
        assert!(!report.is_valid());
        assert!(report.errors[0].starts_with("DOCX validation error:"));
    }

    #[test]
    fn test_docx_check_links_requires_relationships() {
        let bytes = fixtures::docx_bytes(&["Title", "Body"], true);
        // fixture archives carry a relationships part
        assert!(validate_docx_structure(&bytes, true).is_valid());

        let bare = fixtures::docx_archive(&[(
            "word/document.xml",
            r#"<w:document><w:body><w:p><w:r><w:t>x</w:t></w:r></w:p></w:body></w:document>"#,
        )]);
        let report = validate_docx_structure(&bare, true);
        assert_eq!(report.errors, vec!["Document structure appears incomplete"]);
    }

    #[test]
    fn test_docx_broken_hyperlink() {
        let bytes = fixtures::docx_archive(&[
            (
                "word/document.xml",
                r#"<w:document><w:body><w:p><w:hyperlink r:id="rId9"><w:r><w:t>x</w:t></w:r></w:hyperlink></w:p></w:body></w:document>"#,
            ),
            (
                "word/_rels/document.xml.rels",
                r#"<Relationships><Relationship Id="rId1" Target="styles.xml"/></Relationships>"#,
            ),
        ]);
        let report = validate_docx_structure(&bytes, true);
        assert_eq!(
            report.errors,
            vec!["Found 1 hyperlinks without a relationship target"]
        );
    }

    #[test]
    fn test_check_file_size() {
        assert!(check_file_size(100, 50).is_ok());
        assert!(check_file_size(10, 0).is_ok());
        let err = check_file_size(10, 50).unwrap_err();
        assert!(err.contains("below the minimum threshold"));
    }

    #[test]
    fn test_check_conversion_ratio() {
        assert!(check_conversion_ratio(50, 100, 0.1).is_ok());
        assert!(check_conversion_ratio(0, 0, 0.1).is_ok());
        let err = check_conversion_ratio(5, 100, 0.1).unwrap_err();
        assert!(err.contains("less than 10% of the original"));
        assert!(err.contains("ratio: 0.05"));
    }
}
