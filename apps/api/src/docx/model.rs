//! Typed view of a WordprocessingML body.
//!
//! The body is an ordered list of [`Block`]s. Paragraphs and tables are lifted
//! into typed structs; every other node (section properties, bookmarks,
//! content controls, whitespace) rides along as an opaque [`XmlNode`] so the
//! document saves back exactly as it was, apart from what was edited.

use std::path::Path;

use tempfile::NamedTempFile;

use crate::docx::package::DocxPackage;
use crate::docx::xml::{self, XmlDeclaration, XmlDocument, XmlElement, XmlNode};
use crate::docx::DocxError;

pub const DOCUMENT_PART: &str = "word/document.xml";

pub const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

pub const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Empty A4 body with 2.5cm margins.
const BLANK_DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1418" w:right="1418" w:bottom="1418" w:left="1418" w:header="851" w:footer="992" w:gutter="0"/></w:sectPr></w:body></w:document>"#;

const W_DOCUMENT: &str = "w:document";
const W_BODY: &str = "w:body";
const W_P: &str = "w:p";
const W_PPR: &str = "w:pPr";
const W_R: &str = "w:r";
const W_RPR: &str = "w:rPr";
const W_T: &str = "w:t";
const W_TAB: &str = "w:tab";
const W_BR: &str = "w:br";
const W_CR: &str = "w:cr";
const W_HYPERLINK: &str = "w:hyperlink";
const W_TBL: &str = "w:tbl";
const W_TR: &str = "w:tr";
const W_TC: &str = "w:tc";
const W_TCPR: &str = "w:tcPr";
const W_SECTPR: &str = "w:sectPr";

// ────────────────────────────────────────────────────────────────────────────
// Paragraphs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    attributes: Vec<(String, String)>,
    content: Vec<XmlNode>,
}

impl Paragraph {
    /// A bare paragraph (no paragraph properties) holding a single run of `text`.
    pub fn new(text: &str) -> Self {
        Self {
            attributes: Vec::new(),
            content: vec![XmlNode::Element(build_run(text, None))],
        }
    }

    /// Like [`Paragraph::new`], with the run in bold.
    pub fn bold(text: &str) -> Self {
        let mut rpr = XmlElement::new(W_RPR);
        rpr.children.push(XmlNode::Element(XmlElement::new("w:b")));
        Self {
            attributes: Vec::new(),
            content: vec![XmlNode::Element(build_run(text, Some(rpr)))],
        }
    }

    /// Centers the paragraph. Any existing paragraph properties are replaced.
    pub fn centered(mut self) -> Self {
        self.content
            .retain(|node| !matches!(node, XmlNode::Element(e) if e.is(W_PPR)));
        let mut ppr = XmlElement::new(W_PPR);
        ppr.children.push(XmlNode::Element(
            XmlElement::new("w:jc").with_attribute("w:val", "center"),
        ));
        self.content.insert(0, XmlNode::Element(ppr));
        self
    }

    fn from_element(element: XmlElement) -> Self {
        Self {
            attributes: element.attributes,
            content: element.children,
        }
    }

    fn to_element(&self) -> XmlElement {
        XmlElement {
            name: W_P.to_string(),
            attributes: self.attributes.clone(),
            children: self.content.clone(),
        }
    }

    /// Plain text of the paragraph: run text in order, tabs as `\t`, breaks as `\n`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for element in self.content.iter().filter_map(as_element) {
            if element.is(W_R) {
                push_run_text(element, &mut out);
            } else if element.is(W_HYPERLINK) {
                for run in element.child_elements().filter(|e| e.is(W_R)) {
                    push_run_text(run, &mut out);
                }
            }
        }
        out
    }

    /// Replaces all content with a single run of `text`.
    ///
    /// Paragraph properties are kept, and the new run inherits the character
    /// properties of the first existing run.
    pub fn set_text(&mut self, text: &str) {
        let run_properties = self.run_properties(RunPick::First);
        self.content.retain(|node| matches!(node, XmlNode::Element(e) if e.is(W_PPR)));
        self.content
            .push(XmlNode::Element(build_run(text, run_properties)));
    }

    /// Appends `text` as a new inline run after the existing content.
    /// The run inherits the character properties of the last existing run.
    pub fn add_run(&mut self, text: &str) {
        let run_properties = self.run_properties(RunPick::Last);
        self.content
            .push(XmlNode::Element(build_run(text, run_properties)));
    }

    #[cfg(test)]
    pub fn run_count(&self) -> usize {
        self.content
            .iter()
            .filter_map(as_element)
            .filter(|e| e.is(W_R))
            .count()
    }

    fn run_properties(&self, pick: RunPick) -> Option<XmlElement> {
        let mut runs = self
            .content
            .iter()
            .filter_map(as_element)
            .filter(|e| e.is(W_R));
        let run = match pick {
            RunPick::First => runs.next(),
            RunPick::Last => runs.last(),
        };
        run.and_then(|r| r.find_child(W_RPR)).cloned()
    }
}

enum RunPick {
    First,
    Last,
}

fn push_run_text(run: &XmlElement, out: &mut String) {
    for child in run.child_elements() {
        match child.name.as_str() {
            W_T => out.push_str(&child.own_text()),
            W_TAB => out.push('\t'),
            W_BR | W_CR => out.push('\n'),
            _ => {}
        }
    }
}

/// Builds a `w:r` for `text`. Newlines become `w:br`, tabs `w:tab`; text
/// chunks with leading or trailing whitespace are marked `xml:space="preserve"`,
/// otherwise Word collapses the indentation.
fn build_run(text: &str, run_properties: Option<XmlElement>) -> XmlElement {
    let mut run = XmlElement::new(W_R);
    if let Some(rpr) = run_properties {
        run.children.push(XmlNode::Element(rpr));
    }

    let mut chunk = String::new();
    for ch in text.chars() {
        match ch {
            '\n' | '\t' => {
                flush_text(&mut run, &mut chunk);
                let name = if ch == '\n' { W_BR } else { W_TAB };
                run.children.push(XmlNode::Element(XmlElement::new(name)));
            }
            '\r' => {}
            _ => chunk.push(ch),
        }
    }
    flush_text(&mut run, &mut chunk);
    run
}

fn flush_text(run: &mut XmlElement, chunk: &mut String) {
    if chunk.is_empty() {
        return;
    }
    let mut t = XmlElement::new(W_T);
    if chunk.trim().len() < chunk.len() {
        t.set_attribute("xml:space", "preserve");
    }
    t.children.push(XmlNode::Text(std::mem::take(chunk)));
    run.children.push(XmlNode::Element(t));
}

fn as_element(node: &XmlNode) -> Option<&XmlElement> {
    match node {
        XmlNode::Element(e) => Some(e),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tables
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    attributes: Vec<(String, String)>,
    content: Vec<TableNode>,
}

#[derive(Debug, Clone, PartialEq)]
enum TableNode {
    Row(Row),
    Other(XmlNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    attributes: Vec<(String, String)>,
    content: Vec<RowNode>,
}

#[derive(Debug, Clone, PartialEq)]
enum RowNode {
    Cell(Cell),
    Other(XmlNode),
}

/// A table cell. Its content is itself a block sequence (cells can nest tables).
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    attributes: Vec<(String, String)>,
    blocks: Vec<Block>,
}

impl Table {
    /// A table with single-line borders on every edge. `grid` holds the
    /// column widths in twips; each row's cells must span exactly the grid.
    pub fn bordered(grid: &[u32], rows: Vec<Row>) -> Self {
        let width: u32 = grid.iter().sum();

        let mut borders = XmlElement::new("w:tblBorders");
        for edge in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
            borders.children.push(XmlNode::Element(
                XmlElement::new(edge)
                    .with_attribute("w:val", "single")
                    .with_attribute("w:sz", "4")
                    .with_attribute("w:space", "0")
                    .with_attribute("w:color", "000000"),
            ));
        }
        let mut tbl_pr = XmlElement::new("w:tblPr");
        tbl_pr.children.push(XmlNode::Element(
            XmlElement::new("w:tblW")
                .with_attribute("w:w", width.to_string())
                .with_attribute("w:type", "dxa"),
        ));
        tbl_pr.children.push(XmlNode::Element(borders));

        let mut tbl_grid = XmlElement::new("w:tblGrid");
        for column in grid {
            tbl_grid.children.push(XmlNode::Element(
                XmlElement::new("w:gridCol").with_attribute("w:w", column.to_string()),
            ));
        }

        let mut content = vec![
            TableNode::Other(XmlNode::Element(tbl_pr)),
            TableNode::Other(XmlNode::Element(tbl_grid)),
        ];
        content.extend(rows.into_iter().map(TableNode::Row));
        Self {
            attributes: Vec::new(),
            content,
        }
    }

    fn from_element(element: XmlElement) -> Self {
        let content = element
            .children
            .into_iter()
            .map(|node| match node {
                XmlNode::Element(e) if e.is(W_TR) => TableNode::Row(Row::from_element(e)),
                other => TableNode::Other(other),
            })
            .collect();
        Self {
            attributes: element.attributes,
            content,
        }
    }

    fn to_element(&self) -> XmlElement {
        let children = self
            .content
            .iter()
            .map(|node| match node {
                TableNode::Row(row) => XmlNode::Element(row.to_element()),
                TableNode::Other(other) => other.clone(),
            })
            .collect();
        XmlElement {
            name: W_TBL.to_string(),
            attributes: self.attributes.clone(),
            children,
        }
    }

    #[cfg(test)]
    pub fn rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.content.iter().filter_map(|node| match node {
            TableNode::Row(row) => Some(row),
            TableNode::Other(_) => None,
        })
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut Row> + '_ {
        self.content.iter_mut().filter_map(|node| match node {
            TableNode::Row(row) => Some(row),
            TableNode::Other(_) => None,
        })
    }

    pub fn cell_paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> + '_ {
        self.rows_mut()
            .flat_map(|row| row.cells_mut())
            .flat_map(|cell| cell.paragraphs_mut())
    }

    /// Text of the cell at (`row`, `col`), counting physical `w:tc` elements.
    #[cfg(test)]
    pub fn cell_text(&self, row: usize, col: usize) -> Option<String> {
        let cell = self.rows().nth(row)?.cells().nth(col)?;
        Some(
            cell.paragraphs()
                .map(Paragraph::text)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            attributes: Vec::new(),
            content: cells.into_iter().map(RowNode::Cell).collect(),
        }
    }

    fn from_element(element: XmlElement) -> Self {
        let content = element
            .children
            .into_iter()
            .map(|node| match node {
                XmlNode::Element(e) if e.is(W_TC) => RowNode::Cell(Cell::from_element(e)),
                other => RowNode::Other(other),
            })
            .collect();
        Self {
            attributes: element.attributes,
            content,
        }
    }

    fn to_element(&self) -> XmlElement {
        let children = self
            .content
            .iter()
            .map(|node| match node {
                RowNode::Cell(cell) => XmlNode::Element(cell.to_element()),
                RowNode::Other(other) => other.clone(),
            })
            .collect();
        XmlElement {
            name: W_TR.to_string(),
            attributes: self.attributes.clone(),
            children,
        }
    }

    #[cfg(test)]
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.content.iter().filter_map(|node| match node {
            RowNode::Cell(cell) => Some(cell),
            RowNode::Other(_) => None,
        })
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> + '_ {
        self.content.iter_mut().filter_map(|node| match node {
            RowNode::Cell(cell) => Some(cell),
            RowNode::Other(_) => None,
        })
    }
}

impl Cell {
    /// A cell `width` twips wide covering `span` grid columns.
    /// An empty `paragraphs` still gets one empty paragraph, which Word requires.
    pub fn new(paragraphs: Vec<Paragraph>, width: u32, span: usize) -> Self {
        let mut tc_pr = XmlElement::new(W_TCPR);
        tc_pr.children.push(XmlNode::Element(
            XmlElement::new("w:tcW")
                .with_attribute("w:w", width.to_string())
                .with_attribute("w:type", "dxa"),
        ));
        if span > 1 {
            tc_pr.children.push(XmlNode::Element(
                XmlElement::new("w:gridSpan").with_attribute("w:val", span.to_string()),
            ));
        }

        let mut blocks = vec![Block::Other(XmlNode::Element(tc_pr))];
        if paragraphs.is_empty() {
            blocks.push(Block::Paragraph(Paragraph::new("")));
        }
        blocks.extend(paragraphs.into_iter().map(Block::Paragraph));
        Self {
            attributes: Vec::new(),
            blocks,
        }
    }

    /// Grid columns covered by this cell (`w:gridSpan`, 1 when absent).
    #[cfg(test)]
    pub fn grid_span(&self) -> usize {
        self.blocks
            .iter()
            .find_map(|block| match block {
                Block::Other(XmlNode::Element(e)) if e.is(W_TCPR) => e.find_child("w:gridSpan"),
                _ => None,
            })
            .and_then(|span| span.attribute("w:val"))
            .and_then(|val| val.parse().ok())
            .unwrap_or(1)
    }

    fn from_element(element: XmlElement) -> Self {
        Self {
            attributes: element.attributes,
            blocks: element.children.into_iter().map(Block::from_node).collect(),
        }
    }

    fn to_element(&self) -> XmlElement {
        XmlElement {
            name: W_TC.to_string(),
            attributes: self.attributes.clone(),
            children: self.blocks.iter().map(Block::to_node).collect(),
        }
    }

    #[cfg(test)]
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> + '_ {
        self.blocks.iter().filter_map(Block::as_paragraph)
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> + '_ {
        self.blocks.iter_mut().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Blocks and the document
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    Other(XmlNode),
}

impl Block {
    fn from_node(node: XmlNode) -> Self {
        match node {
            XmlNode::Element(e) if e.is(W_P) => Block::Paragraph(Paragraph::from_element(e)),
            XmlNode::Element(e) if e.is(W_TBL) => Block::Table(Table::from_element(e)),
            other => Block::Other(other),
        }
    }

    fn to_node(&self) -> XmlNode {
        match self {
            Block::Paragraph(p) => XmlNode::Element(p.to_element()),
            Block::Table(t) => XmlNode::Element(t.to_element()),
            Block::Other(node) => node.clone(),
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }
}

/// An office document loaded into memory.
///
/// Owns its whole package, so two documents loaded from the same file share
/// nothing and can be edited independently.
#[derive(Debug, Clone)]
pub struct Document {
    package: DocxPackage,
    declaration: Option<XmlDeclaration>,
    /// `w:document` with the body lifted out.
    root: XmlElement,
    /// Position of `w:body` among the root's children.
    body_slot: usize,
    body_attributes: Vec<(String, String)>,
    blocks: Vec<Block>,
}

impl Document {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        Self::from_package(DocxPackage::from_bytes(bytes)?)
    }

    /// A new document with an empty A4 body, for content built in code.
    pub fn blank() -> Result<Self, DocxError> {
        let mut package = DocxPackage::default();
        package.set_part("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes().to_vec());
        package.set_part("_rels/.rels", PACKAGE_RELS_XML.as_bytes().to_vec());
        package.set_part(DOCUMENT_PART, BLANK_DOCUMENT_XML.as_bytes().to_vec());
        Self::from_package(package)
    }

    fn from_package(package: DocxPackage) -> Result<Self, DocxError> {
        let raw = package
            .part(DOCUMENT_PART)
            .ok_or_else(|| DocxError::MissingPart(DOCUMENT_PART.to_string()))?;
        let text = std::str::from_utf8(raw)
            .map_err(|e| DocxError::Container(format!("{DOCUMENT_PART} is not UTF-8: {e}")))?;
        let XmlDocument {
            declaration,
            mut root,
        } = xml::parse(text)?;

        if !root.is(W_DOCUMENT) {
            return Err(DocxError::UnexpectedRoot(root.name));
        }

        let body_slot = root
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(e) if e.is(W_BODY)))
            .ok_or(DocxError::MissingBody)?;
        let body = match root.children.remove(body_slot) {
            XmlNode::Element(body) => body,
            _ => return Err(DocxError::MissingBody),
        };

        Ok(Self {
            package,
            declaration,
            root,
            body_slot,
            body_attributes: body.attributes,
            blocks: body.children.into_iter().map(Block::from_node).collect(),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let body = XmlElement {
            name: W_BODY.to_string(),
            attributes: self.body_attributes.clone(),
            children: self.blocks.iter().map(Block::to_node).collect(),
        };
        let mut root = self.root.clone();
        root.children.insert(self.body_slot, XmlNode::Element(body));

        let xml_bytes = xml::write(&XmlDocument {
            declaration: self.declaration.clone(),
            root,
        })?;

        let mut package = self.package.clone();
        package.set_part(DOCUMENT_PART, xml_bytes);
        package.to_bytes()
    }

    /// Writes the document to `path` in one step: serialized fully in memory,
    /// written to a temporary file beside the target, then renamed over it.
    /// On any error no file appears at `path`.
    pub fn save(&self, path: &Path) -> Result<(), DocxError> {
        let bytes = self.to_bytes()?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, &bytes)?;
        tmp.persist(path).map_err(|e| DocxError::Io(e.error))?;
        Ok(())
    }

    #[cfg(test)]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Body-level paragraphs in document order (table content excluded).
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> + '_ {
        self.blocks.iter().filter_map(Block::as_paragraph)
    }

    /// Body-level tables in document order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> + '_ {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn table(&self, index: usize) -> Option<&Table> {
        self.tables().nth(index)
    }

    pub fn table_mut(&mut self, index: usize) -> Option<&mut Table> {
        self.blocks
            .iter_mut()
            .filter_map(|block| match block {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .nth(index)
    }

    /// Index into [`Document::blocks`] of the first body paragraph matching `predicate`.
    pub fn find_paragraph(&self, predicate: impl Fn(&Paragraph) -> bool) -> Option<usize> {
        self.blocks
            .iter()
            .position(|block| matches!(block, Block::Paragraph(p) if predicate(p)))
    }

    /// Appends a paragraph at the end of the body, before the section properties.
    pub fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.push_block(Block::Paragraph(paragraph));
    }

    pub fn push_table(&mut self, table: Table) {
        self.push_block(Block::Table(table));
    }

    // w:sectPr must stay the last child of w:body
    fn push_block(&mut self, block: Block) {
        let at = match self.blocks.last() {
            Some(Block::Other(XmlNode::Element(e))) if e.is(W_SECTPR) => self.blocks.len() - 1,
            _ => self.blocks.len(),
        };
        self.blocks.insert(at, block);
    }

    /// Splices `paragraph` into the body immediately after block `index`.
    pub fn insert_paragraph_after(&mut self, index: usize, paragraph: Paragraph) {
        let at = (index + 1).min(self.blocks.len());
        self.blocks.insert(at, Block::Paragraph(paragraph));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::fixtures;

    #[test]
    fn test_paragraph_text_joins_runs_tabs_and_breaks() {
        let doc = Document::from_bytes(&fixtures::docx_with_body(
            r#"<w:p><w:r><w:t>가</w:t><w:tab/><w:t>나</w:t></w:r><w:r><w:br/><w:t>다</w:t></w:r><w:hyperlink><w:r><w:t>라</w:t></w:r></w:hyperlink></w:p>"#,
        ))
        .unwrap();
        let p = doc.paragraphs().next().unwrap();
        assert_eq!(p.text(), "가\t나\n다라");
    }

    #[test]
    fn test_set_text_keeps_paragraph_and_first_run_properties() {
        let mut doc = Document::from_bytes(&fixtures::docx_with_body(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>고소인</w:t></w:r><w:r><w:t> 성명</w:t></w:r></w:p>"#,
        ))
        .unwrap();
        let Block::Paragraph(p) = &mut doc.blocks[0] else {
            panic!("expected paragraph");
        };
        p.set_text("홍길동");
        assert_eq!(p.text(), "홍길동");
        assert_eq!(p.run_count(), 1);

        let element = p.to_element();
        assert!(element.find_child("w:pPr").is_some());
        let run = element.find_child("w:r").unwrap();
        assert!(run.find_child("w:rPr").unwrap().find_child("w:b").is_some());
    }

    #[test]
    fn test_add_run_appends_without_touching_label() {
        let mut p = Paragraph::new("사실이 ");
        p.add_run("없음");
        assert_eq!(p.text(), "사실이 없음");
        assert_eq!(p.run_count(), 2);
    }

    #[test]
    fn test_leading_spaces_are_preserved_in_run() {
        let p = Paragraph::new("\n     2024년 1월 20일");
        assert_eq!(p.text(), "\n     2024년 1월 20일");
        let element = p.to_element();
        let run = element.find_child("w:r").unwrap();
        assert!(run.find_child("w:br").is_some());
        let t = run.find_child("w:t").unwrap();
        assert_eq!(t.attribute("xml:space"), Some("preserve"));
    }

    #[test]
    fn test_tables_and_cells_are_typed() {
        let doc = Document::from_bytes(&fixtures::template_docx()).unwrap();
        assert_eq!(doc.tables().count(), 3);
        let requester = doc.table(0).unwrap();
        assert_eq!(requester.cell_text(0, 0).as_deref(), Some("성명"));
        assert_eq!(requester.cell_text(0, 1).as_deref(), Some("고소인 성명"));
        assert!(doc.table(3).is_none());
    }

    #[test]
    fn test_round_trip_keeps_untouched_markup() {
        let bytes = fixtures::template_docx();
        let doc = Document::from_bytes(&bytes).unwrap();
        let again = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(doc.blocks(), again.blocks());
        assert_eq!(doc.body_attributes, again.body_attributes);
        let names: Vec<_> = again.package.part_names().map(String::from).collect();
        assert!(names.contains(&"[Content_Types].xml".to_string()));
        assert!(names.contains(&"word/styles.xml".to_string()));
    }

    #[test]
    fn test_insert_paragraph_after_splices_in_order() {
        let mut doc = Document::from_bytes(&fixtures::docx_with_body(
            "<w:p><w:r><w:t>A</w:t></w:r></w:p><w:p><w:r><w:t>C</w:t></w:r></w:p>",
        ))
        .unwrap();
        let at = doc.find_paragraph(|p| p.text() == "A").unwrap();
        doc.insert_paragraph_after(at, Paragraph::new("B"));
        let texts: Vec<_> = doc.paragraphs().map(Paragraph::text).collect();
        assert_eq!(texts, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_missing_document_part_is_reported() {
        let err = Document::from_bytes(&fixtures::zip_with(&[("word/other.xml", "<x/>")]))
            .unwrap_err();
        assert!(matches!(err, DocxError::MissingPart(_)));
    }

    #[test]
    fn test_wrong_root_is_reported() {
        let err = Document::from_bytes(&fixtures::zip_with(&[(DOCUMENT_PART, "<html/>")]))
            .unwrap_err();
        assert!(matches!(err, DocxError::UnexpectedRoot(name) if name == "html"));
    }

    #[test]
    fn test_blank_document_keeps_section_properties_last() {
        let mut doc = Document::blank().unwrap();
        assert_eq!(doc.paragraphs().count(), 0);

        doc.push_paragraph(Paragraph::bold("진술 조서").centered());
        doc.push_table(Table::bordered(
            &[3000, 6000],
            vec![
                Row::new(vec![
                    Cell::new(vec![Paragraph::new("구분")], 3000, 1),
                    Cell::new(vec![], 6000, 1),
                ]),
                Row::new(vec![Cell::new(vec![Paragraph::new("확인")], 9000, 2)]),
            ],
        ));
        doc.push_paragraph(Paragraph::new("끝"));

        let reloaded = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert!(matches!(
            reloaded.blocks().last(),
            Some(Block::Other(XmlNode::Element(e))) if e.is(W_SECTPR)
        ));
        let texts: Vec<_> = reloaded.paragraphs().map(Paragraph::text).collect();
        assert_eq!(texts, vec!["진술 조서", "끝"]);

        let table = reloaded.table(0).unwrap();
        assert_eq!(table.cell_text(0, 0).as_deref(), Some("구분"));
        assert_eq!(table.cell_text(0, 1).as_deref(), Some(""));
        let merged: Vec<_> = table.rows().nth(1).unwrap().cells().collect();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].grid_span(), 2);
        assert_eq!(table.rows().next().unwrap().cells().next().unwrap().grid_span(), 1);
    }

    #[test]
    fn test_bold_and_centered_paragraph_markup() {
        let element = Paragraph::bold("제목").centered().to_element();
        let ppr = element.find_child("w:pPr").unwrap();
        assert_eq!(ppr.find_child("w:jc").unwrap().attribute("w:val"), Some("center"));
        let run = element.find_child("w:r").unwrap();
        assert!(run.find_child("w:rPr").unwrap().find_child("w:b").is_some());
        assert!(matches!(&element.children[0], XmlNode::Element(e) if e.is("w:pPr")));
    }

    #[test]
    fn test_save_writes_file_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.docx");
        let doc = Document::from_bytes(&fixtures::template_docx()).unwrap();
        doc.save(&path).unwrap();
        let reloaded = Document::from_bytes(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(reloaded.tables().count(), 3);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
