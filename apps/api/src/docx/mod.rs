//! Office document (.docx) container and body model.
//!
//! `package` handles the zip container, `xml` the owned XML tree, and `model`
//! lifts `word/document.xml` into paragraphs and tables that the template
//! engine edits.

pub mod model;
pub mod package;
pub mod xml;

use thiserror::Error;

pub use model::{Block, Cell, Document, Paragraph, Row, Table};

#[derive(Debug, Error)]
pub enum DocxError {
    #[error("invalid document container: {0}")]
    Container(String),

    #[error("document part '{0}' is missing")]
    MissingPart(String),

    #[error("unexpected root element <{0}>")]
    UnexpectedRoot(String),

    #[error("document has no body")]
    MissingBody,

    #[error(transparent)]
    Xml(#[from] xml::XmlError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// In-memory .docx builders shared by the tests of every module that edits documents.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::{Cursor, Write};
    use std::path::{Path, PathBuf};

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    use super::model::{CONTENT_TYPES_XML, PACKAGE_RELS_XML};

    pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    pub const CHECK_DUPLICATE: &str =
        "본 고소장과 같은 내용의 고소장을 다른 검찰청 또는 경찰서에 제출하거나 제출하였던 사실이 ";
    pub const CHECK_RELATED: &str =
        "본 고소장에 기재된 범죄사실과 관련된 사건 또는 공범에 대하여 검찰청이나 경찰서에서 수사 중에 ";

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"/>"#;

    pub fn zip_with(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    pub fn docx_with_body(body: &str) -> Vec<u8> {
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}"><w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#
        );
        zip_with(&[
            ("[Content_Types].xml", CONTENT_TYPES_XML),
            ("_rels/.rels", PACKAGE_RELS_XML),
            ("word/document.xml", &document),
            ("word/styles.xml", STYLES),
        ])
    }

    pub fn p(text: &str) -> String {
        format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
    }

    pub fn row(cells: &[&str]) -> String {
        let cells: String = cells
            .iter()
            .map(|c| format!(r#"<w:tc><w:tcPr><w:tcW w:w="2000" w:type="dxa"/></w:tcPr>{}</w:tc>"#, p(c)))
            .collect();
        format!("<w:tr>{cells}</w:tr>")
    }

    pub fn table(rows: &[&[&str]]) -> String {
        let rows: String = rows.iter().map(|r| row(r)).collect();
        format!(r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/></w:tblPr>{rows}</w:tbl>"#)
    }

    /// A trimmed-down copy of the police complaint form: same anchors, same
    /// table order, same cell labels.
    pub fn template_body() -> String {
        [
            p("고 소 장"),
            p("1. 고소인*"),
            table(&[
                &["성명", "고소인 성명"],
                &["주민등록번호", "고소인 주민등록번호"],
                &["주소", "고소인 주소"],
                &["직업", "고소인 직업"],
                &["전화", "고소인 전화"],
                &["이메일", "고소인 이메일"],
            ]),
            p("2. 피고소인*"),
            table(&[
                &["성명", "피고소인 성명"],
                &["주민등록번호", "피고소인 주민등록번호"],
                &["주소", "피고소인 주소"],
                &["직업", "피고소인 직업"],
                &["전화", "피고소인 전화"],
                &["이메일", "피고소인 이메일"],
                &["기타사항", "피고소인 기타사항"],
            ]),
            p("3. 고소취지"),
            p("(죄명 및 피고소인에 대한 처벌의사 기재)"),
            p("4. 범죄사실*"),
            p("5. 고소이유"),
            p("6. 증거자료"),
            p("7. 관련사건의 수사 및 재판 여부*"),
            table(&[
                &["① 중복 고소 여부", CHECK_DUPLICATE],
                &["② 관련 형사사건 수사 유무", CHECK_RELATED],
            ]),
            p("8. 기타"),
            p("본 고소장에 기재한 내용은 고소인이 알고 있는 지식과 경험을 바탕으로 모두 사실대로 작성하였으며, 만일 허위사실을 고소하였을 때에는 형법 제156조 무고죄로 처벌받을 것임을 서약합니다."),
            p("고소인 (인)"),
            p("※ 고소대리의 경우에는 제출인을 기재하여야 합니다."),
        ]
        .concat()
    }

    pub fn template_docx() -> Vec<u8> {
        docx_with_body(&template_body())
    }

    pub fn write_template(dir: &Path) -> PathBuf {
        let path = dir.join("complaint_template.docx");
        std::fs::write(&path, template_docx()).unwrap();
        path
    }
}
