//! Testing utilities and mock implementations.
//!
//! This module provides in-memory implementations of the filesystem and
//! backend traits, allowing conversion pipelines to be exercised without
//! pandoc or a real disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use quackdoc_core::testing::{fixtures, MemoryFs, MockBackend};
//!
//! let fs = MemoryFs::new();
//! fs.add_file("/in/page.html", fixtures::html_document("Title", "Body")).await;
//!
//! let backend = MockBackend::new().with_fs(fs.clone());
//! let converter = DocumentConverter::new(config, backend, fs).await?;
//! ```

mod memory_fs;
mod mock_backend;

pub use memory_fs::MemoryFs;
pub use mock_backend::{BackendCall, MockBackend};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

    const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

    /// Build a zip archive from `(name, content)` entries.
    pub fn docx_archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in entries {
            writer
                .start_file(*name, options)
                .expect("start zip entry in memory");
            writer
                .write_all(content.as_bytes())
                .expect("write zip entry in memory");
        }

        writer
            .finish()
            .expect("finish zip archive in memory")
            .into_inner()
    }

    /// Build a minimal DOCX with one paragraph per entry.
    ///
    /// With `heading`, the first paragraph uses the `Heading1` style.
    pub fn docx_bytes(paragraphs: &[&str], heading: bool) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let style = if heading && i == 0 {
                    r#"<w:pPr><w:pStyle w:val="Heading1"/></w:pPr>"#
                } else {
                    ""
                };
                format!("<w:p>{}<w:r><w:t>{}</w:t></w:r></w:p>", style, text)
            })
            .collect();

        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body>{}</w:body></w:document>"#,
            body
        );

        docx_archive(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("word/document.xml", &document),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS),
        ])
    }

    /// A small well-formed HTML page with a heading.
    pub fn html_document(title: &str, body: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head><title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n<p>{body}</p>\n</body>\n</html>\n"
        )
    }

    /// A small Markdown document with headings.
    pub fn markdown_document(title: &str) -> String {
        format!(
            "# {title}\n\nThis is a sample document used in tests.\n\n## Details\n\nMore content follows here.\n"
        )
    }
}
