use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{info, warn};

use crate::complaint::bindings::{anchor_text, resolve, Binding, TEMPLATE_BINDINGS};
use crate::complaint::fields::{ComplaintFields, FieldMap};
use crate::complaint::AssemblyError;
use crate::docx::{Document, DocxError};
use crate::template::substitution::{fill_cells, insert_after_anchor, CellEdit};
use crate::template::{TemplateError, TemplateLoader};

/// A complaint written to the output directory.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    /// File stem; the key for downloads and the complaint record.
    pub file_id: String,
    pub file_name: String,
    pub path: PathBuf,
    pub requester_name: String,
    pub category: String,
    /// Field keys whose template anchor was not found. The document is still
    /// complete otherwise.
    pub missing_sections: Vec<String>,
}

/// Fills the complaint template from a field map and saves the result.
#[derive(Debug, Clone)]
pub struct ComplaintAssembler {
    loader: TemplateLoader,
    output_dir: PathBuf,
    file_prefix: String,
}

impl ComplaintAssembler {
    pub fn new(
        loader: TemplateLoader,
        output_dir: impl Into<PathBuf>,
        file_prefix: impl Into<String>,
    ) -> Self {
        Self {
            loader,
            output_dir: output_dir.into(),
            file_prefix: file_prefix.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn assemble(&self, fields: &FieldMap) -> Result<GeneratedDocument, AssemblyError> {
        self.assemble_at(fields, Local::now().naive_local())
    }

    /// Same as [`assemble`](Self::assemble) with an explicit clock; `now`
    /// only feeds the HHMMSS part of the file name.
    pub fn assemble_at(
        &self,
        fields: &FieldMap,
        now: NaiveDateTime,
    ) -> Result<GeneratedDocument, AssemblyError> {
        // Nothing is read or written until the field map is known to be usable.
        let fields = ComplaintFields::validate(fields.clone())?;

        let mut document = self.loader.load()?;
        let missing_sections = self.render(&mut document, &fields)?;

        let file_id = file_id(&self.file_prefix, &fields, now);
        let file_name = format!("{file_id}.docx");

        std::fs::create_dir_all(&self.output_dir).map_err(|e| AssemblyError::Save {
            path: self.output_dir.clone(),
            source: DocxError::Io(e),
        })?;
        let path = self.output_dir.join(&file_name);
        document
            .save(&path)
            .map_err(|source| AssemblyError::Save {
                path: path.clone(),
                source,
            })?;

        info!(
            "Assembled complaint {} ({} missing sections)",
            path.display(),
            missing_sections.len()
        );

        Ok(GeneratedDocument {
            file_id,
            file_name,
            path,
            requester_name: fields.requester_name().to_string(),
            category: fields.category().to_string(),
            missing_sections,
        })
    }

    /// Applies every binding to `document` in order. Returns the keys whose
    /// anchor was absent.
    ///
    /// Consecutive cell bindings of one table are filled in a single pass, so
    /// a value that happens to equal another label is not overwritten again.
    pub fn render(
        &self,
        document: &mut Document,
        fields: &ComplaintFields,
    ) -> Result<Vec<String>, AssemblyError> {
        let mut missing = Vec::new();
        let mut pending: Vec<(&Binding, CellEdit<'_>)> = Vec::new();
        let mut pending_table = None;

        for binding in TEMPLATE_BINDINGS {
            let value = resolve(fields, binding.key());
            match *binding {
                Binding::Cell {
                    table, label, mode, ..
                } => {
                    if pending_table.is_some_and(|t| t != table) {
                        self.fill_table(document, pending_table, &mut pending)?;
                    }
                    pending_table = Some(table);
                    pending.push((binding, CellEdit { label, value, mode }));
                }
                Binding::Anchor {
                    anchor,
                    key,
                    lead,
                    indent,
                } => {
                    self.fill_table(document, pending_table.take(), &mut pending)?;
                    if !insert_after_anchor(document, anchor, &anchor_text(lead, indent, value)) {
                        missing.push(key.to_string());
                    }
                }
            }
        }
        self.fill_table(document, pending_table, &mut pending)?;

        Ok(missing)
    }

    fn fill_table(
        &self,
        document: &mut Document,
        table: Option<usize>,
        pending: &mut Vec<(&Binding, CellEdit<'_>)>,
    ) -> Result<(), AssemblyError> {
        let Some(table) = table else {
            return Ok(());
        };
        let table_ref = document
            .table_mut(table)
            .ok_or_else(|| TemplateError::Corrupt {
                path: self.loader.path().to_path_buf(),
                reason: format!("table {table} is missing"),
            })?;

        let edits: Vec<CellEdit<'_>> = pending.iter().map(|(_, edit)| *edit).collect();
        let hits = fill_cells(table_ref, &edits);
        for ((binding, edit), hits) in pending.drain(..).zip(hits) {
            if hits == 0 {
                warn!(
                    "Label {:?} not found in table {table}; '{}' not written",
                    edit.label,
                    binding.key()
                );
            }
        }
        Ok(())
    }
}

/// "<prefix> <requester>_<category>_<HHMMSS>"
fn file_id(prefix: &str, fields: &ComplaintFields, now: NaiveDateTime) -> String {
    let stem = format!(
        "{}_{}_{}",
        sanitize_component(fields.requester_name()),
        sanitize_component(fields.category()),
        now.format("%H%M%S")
    );
    let prefix = sanitize_component(prefix);
    if prefix.is_empty() {
        stem
    } else {
        format!("{prefix} {stem}")
    }
}

/// Drops characters that would escape the output directory or break the
/// file name on common filesystems.
pub fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control())
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect::<String>()
        .replace("..", "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::complaint::bindings::{DATE_INDENT, SUBMIT_INDENT};
    use crate::complaint::fields::keys;
    use crate::complaint::fields::tests::sample_field_map;
    use crate::docx::fixtures::{self, CHECK_DUPLICATE, CHECK_RELATED};
    use crate::docx::Paragraph;

    fn at_153045() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 20)
            .unwrap()
            .and_hms_opt(15, 30, 45)
            .unwrap()
    }

    fn assembler(dir: &Path) -> ComplaintAssembler {
        let template = fixtures::write_template(dir);
        ComplaintAssembler::new(TemplateLoader::new(template), dir.join("out"), "AI 고소장")
    }

    fn reopen(doc: &GeneratedDocument) -> Document {
        Document::from_bytes(&std::fs::read(&doc.path).unwrap()).unwrap()
    }

    fn body_texts(doc: &Document) -> Vec<String> {
        doc.paragraphs().map(Paragraph::text).collect()
    }

    fn after(texts: &[String], anchor: &str) -> String {
        let i = texts.iter().position(|t| t.contains(anchor)).unwrap();
        texts[i + 1].clone()
    }

    #[test]
    fn test_full_assembly_writes_every_section() {
        let dir = tempfile::tempdir().unwrap();
        let generated = assembler(dir.path())
            .assemble_at(&sample_field_map(), at_153045())
            .unwrap();

        assert_eq!(generated.file_id, "AI 고소장 홍길동_사기_153045");
        assert_eq!(generated.file_name, "AI 고소장 홍길동_사기_153045.docx");
        assert!(generated.path.exists());
        assert!(generated.missing_sections.is_empty());

        let doc = reopen(&generated);

        let requester = doc.table(0).unwrap();
        assert_eq!(requester.cell_text(0, 0).as_deref(), Some("성명"));
        assert_eq!(requester.cell_text(0, 1).as_deref(), Some("홍길동"));
        assert_eq!(requester.cell_text(4, 1).as_deref(), Some("010-1234-5678"));

        let respondent = doc.table(1).unwrap();
        assert_eq!(respondent.cell_text(0, 1).as_deref(), Some("김철수"));
        // absent optional field becomes an empty cell
        assert_eq!(respondent.cell_text(5, 1).as_deref(), Some(""));
        assert_eq!(
            respondent.cell_text(6, 1).as_deref(),
            Some("고소인의 대학 동기이며 키 175cm 가량의 남성입니다.")
        );

        let checklist = doc.table(2).unwrap();
        assert_eq!(
            checklist.cell_text(0, 1),
            Some(format!("{CHECK_DUPLICATE}없음"))
        );
        assert_eq!(checklist.cell_text(1, 1), Some(format!("{CHECK_RELATED}있음")));

        let texts = body_texts(&doc);
        assert_eq!(
            after(&texts, "4. 범죄사실*"),
            "\n피고소인은 2024. 1. 5. 14:00경 고소인에게 돈을 빌렸습니다."
        );
        assert_eq!(after(&texts, "6. 증거자료"), "\n차용증 사본");
        assert_eq!(after(&texts, "8. 기타"), "\n");
        assert_eq!(
            after(&texts, "무고죄로 처벌받을 것임을 서약합니다."),
            format!("\n{}2024년 1월 20일", " ".repeat(DATE_INDENT))
        );
        assert_eq!(
            after(&texts, "고소대리의 경우에는"),
            format!("\n\n{}서울종로경찰서 귀중", " ".repeat(SUBMIT_INDENT))
        );
    }

    #[test]
    fn test_value_equal_to_a_later_label_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = sample_field_map();
        map.insert(keys::REQUESTER_JOB, "고소인 전화");

        let generated = assembler(dir.path()).assemble_at(&map, at_153045()).unwrap();

        let requester = reopen(&generated).table(0).cloned().unwrap();
        assert_eq!(requester.cell_text(3, 1).as_deref(), Some("고소인 전화"));
        assert_eq!(requester.cell_text(4, 1).as_deref(), Some("010-1234-5678"));
    }

    #[test]
    fn test_missing_required_field_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let asm = assembler(dir.path());
        let mut map = sample_field_map();
        map.remove(keys::FACTS);

        let err = asm.assemble_at(&map, at_153045()).unwrap_err();

        assert!(matches!(err, AssemblyError::MissingField(ref k) if k == "범죄 사실"));
        assert!(err.is_validation());
        assert!(!asm.output_dir().exists());
    }

    #[test]
    fn test_invalid_checklist_value_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let asm = assembler(dir.path());
        let mut map = sample_field_map();
        map.insert(keys::DUPLICATE_FILING, "잘 모르겠음");

        let err = asm.assemble_at(&map, at_153045()).unwrap_err();

        assert!(matches!(err, AssemblyError::InvalidEnumValue { .. }));
        assert!(!asm.output_dir().exists());
    }

    #[test]
    fn test_validation_runs_before_template_load() {
        let dir = tempfile::tempdir().unwrap();
        let asm = ComplaintAssembler::new(
            TemplateLoader::new(dir.path().join("missing.docx")),
            dir.path().join("out"),
            "AI 고소장",
        );
        let mut map = sample_field_map();
        map.remove(keys::REQUESTER_NAME);

        assert!(matches!(
            asm.assemble_at(&map, at_153045()),
            Err(AssemblyError::MissingField(_))
        ));
        assert!(matches!(
            asm.assemble_at(&sample_field_map(), at_153045()),
            Err(AssemblyError::Template(TemplateError::NotFound(_)))
        ));
    }

    #[test]
    fn test_missing_anchor_still_assembles() {
        let dir = tempfile::tempdir().unwrap();
        let body = fixtures::template_body().replace("8. 기타", "8. 비고");
        let template = dir.path().join("variant.docx");
        std::fs::write(&template, fixtures::docx_with_body(&body)).unwrap();
        let asm = ComplaintAssembler::new(TemplateLoader::new(&template), dir.path(), "AI 고소장");

        let generated = asm.assemble_at(&sample_field_map(), at_153045()).unwrap();

        assert_eq!(generated.missing_sections, vec![keys::MISC.to_string()]);
        let texts = body_texts(&reopen(&generated));
        assert!(texts.iter().any(|t| t == "\n차용증 사본"));
        // nothing was inserted under the renamed heading
        assert!(after(&texts, "8. 비고").contains("무고죄로 처벌받을 것임을 서약합니다."));
    }

    #[test]
    fn test_template_without_checklist_table_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let body = [fixtures::p("1. 고소인*"), fixtures::table(&[&["성명", "고소인 성명"]])].concat();
        let template = dir.path().join("short.docx");
        std::fs::write(&template, fixtures::docx_with_body(&body)).unwrap();
        let asm = ComplaintAssembler::new(TemplateLoader::new(&template), dir.path().join("out"), "");

        let err = asm.assemble_at(&sample_field_map(), at_153045()).unwrap_err();

        assert!(matches!(err, AssemblyError::Template(TemplateError::Corrupt { .. })));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_template_file_is_never_modified() {
        let dir = tempfile::tempdir().unwrap();
        let asm = assembler(dir.path());
        let before = std::fs::read(dir.path().join("complaint_template.docx")).unwrap();

        asm.assemble_at(&sample_field_map(), at_153045()).unwrap();

        let after = std::fs::read(dir.path().join("complaint_template.docx")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_file_name_components_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = sample_field_map();
        map.insert(keys::REQUESTER_NAME, "../홍/길동");
        map.insert(keys::CATEGORY, "사기\n횡령");

        let generated = assembler(dir.path()).assemble_at(&map, at_153045()).unwrap();

        assert_eq!(generated.file_id, "AI 고소장 홍길동_사기횡령_153045");
        assert_eq!(generated.path.parent(), Some(dir.path().join("out").as_path()));
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component(" 홍길동 "), "홍길동");
        assert_eq!(sanitize_component("a/b\\c"), "abc");
        assert_eq!(sanitize_component("..\u{0}x"), "x");
    }
}
