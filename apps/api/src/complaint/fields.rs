//! The complaint field map: the closed set of labels the LLM fills in and the
//! template consumes, plus validation of a map before any document is touched.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::complaint::AssemblyError;

/// Field keys. Cell labels in the template use the same strings.
pub mod keys {
    pub const CATEGORY: &str = "고소 죄명";

    pub const REQUESTER_NAME: &str = "고소인 성명";
    pub const REQUESTER_RRN: &str = "고소인 주민등록번호";
    pub const REQUESTER_ADDRESS: &str = "고소인 주소";
    pub const REQUESTER_JOB: &str = "고소인 직업";
    pub const REQUESTER_PHONE: &str = "고소인 전화";
    pub const REQUESTER_EMAIL: &str = "고소인 이메일";

    pub const RESPONDENT_NAME: &str = "피고소인 성명";
    pub const RESPONDENT_RRN: &str = "피고소인 주민등록번호";
    pub const RESPONDENT_ADDRESS: &str = "피고소인 주소";
    pub const RESPONDENT_JOB: &str = "피고소인 직업";
    pub const RESPONDENT_PHONE: &str = "피고소인 전화";
    pub const RESPONDENT_EMAIL: &str = "피고소인 이메일";
    pub const RESPONDENT_DETAILS: &str = "피고소인 기타사항";

    pub const PURPOSE: &str = "고소 취지";
    pub const FACTS: &str = "범죄 사실";
    pub const REASONS: &str = "고소 이유";
    pub const EVIDENCE: &str = "증거 자료";
    pub const MISC: &str = "기타";

    pub const DUPLICATE_FILING: &str = "중복 고소 여부";
    pub const RELATED_INVESTIGATION: &str = "관련 형사사건 수사 유무";

    pub const FILING_DATE: &str = "고소일";
    pub const SUBMIT_TO: &str = "제출 경찰서";
}

/// Keys that must be present (and non-blank) before assembly starts.
pub const REQUIRED_FIELDS: &[&str] = &[
    keys::CATEGORY,
    keys::REQUESTER_NAME,
    keys::RESPONDENT_DETAILS,
    keys::PURPOSE,
    keys::FACTS,
    keys::REASONS,
    keys::DUPLICATE_FILING,
    keys::RELATED_INVESTIGATION,
    keys::FILING_DATE,
    keys::SUBMIT_TO,
];

/// Every key the template knows about, required or not.
pub const ALL_FIELDS: &[&str] = &[
    keys::CATEGORY,
    keys::REQUESTER_NAME,
    keys::REQUESTER_RRN,
    keys::REQUESTER_ADDRESS,
    keys::REQUESTER_JOB,
    keys::REQUESTER_PHONE,
    keys::REQUESTER_EMAIL,
    keys::RESPONDENT_NAME,
    keys::RESPONDENT_RRN,
    keys::RESPONDENT_ADDRESS,
    keys::RESPONDENT_JOB,
    keys::RESPONDENT_PHONE,
    keys::RESPONDENT_EMAIL,
    keys::RESPONDENT_DETAILS,
    keys::PURPOSE,
    keys::FACTS,
    keys::REASONS,
    keys::EVIDENCE,
    keys::DUPLICATE_FILING,
    keys::RELATED_INVESTIGATION,
    keys::MISC,
    keys::FILING_DATE,
    keys::SUBMIT_TO,
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];
const SUBMIT_SUFFIX: &str = "귀중";

// ────────────────────────────────────────────────────────────────────────────
// Field map
// ────────────────────────────────────────────────────────────────────────────

/// Label → value, as produced by the LLM.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builds a map from loosely-typed JSON. Strings are taken as-is, numbers
    /// and booleans stringified, arrays of scalars joined by newlines, `null`
    /// dropped. Nested objects are kept as compact JSON text.
    pub fn from_json(value: &Value) -> Result<Self, AssemblyError> {
        let object = value.as_object().ok_or_else(|| {
            AssemblyError::InvalidFieldMap("expected a JSON object of label/value pairs".into())
        })?;

        let mut map = FieldMap::new();
        for (key, value) in object {
            if let Some(text) = json_to_text(value) {
                map.insert(key.trim(), text);
            }
        }
        Ok(map)
    }
}

impl FromIterator<(String, String)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn json_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(json_to_text)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Closed vocabulary
// ────────────────────────────────────────────────────────────────────────────

/// Answer to the two checklist questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    #[serde(rename = "있음")]
    Present,
    #[serde(rename = "없음")]
    Absent,
}

impl YesNo {
    pub const VALUES: [&'static str; 2] = ["있음", "없음"];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "있음" => Some(YesNo::Present),
            "없음" => Some(YesNo::Absent),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            YesNo::Present => "있음",
            YesNo::Absent => "없음",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Validated fields
// ────────────────────────────────────────────────────────────────────────────

/// A field map that passed validation. Holding one means assembly can run
/// start to finish without a field-level failure.
#[derive(Debug, Clone)]
pub struct ComplaintFields {
    map: FieldMap,
    pub duplicate_filing: YesNo,
    pub related_investigation: YesNo,
    /// "YYYY년 M월 D일" when the input parsed as a date, otherwise verbatim.
    pub filing_date: String,
    /// Station line ending in "귀중".
    pub submit_to: String,
}

impl ComplaintFields {
    pub fn validate(map: FieldMap) -> Result<Self, AssemblyError> {
        for &key in REQUIRED_FIELDS {
            match map.get(key) {
                Some(value) if !value.trim().is_empty() => {}
                _ => return Err(AssemblyError::MissingField(key.to_string())),
            }
        }

        let duplicate_filing = parse_yes_no(&map, keys::DUPLICATE_FILING)?;
        let related_investigation = parse_yes_no(&map, keys::RELATED_INVESTIGATION)?;
        let filing_date = format_korean_date(map.get(keys::FILING_DATE).unwrap_or_default());
        let submit_to = submission_line(map.get(keys::SUBMIT_TO).unwrap_or_default());

        Ok(Self {
            map,
            duplicate_filing,
            related_investigation,
            filing_date,
            submit_to,
        })
    }

    /// Value for `key`, or an empty string for absent optional fields.
    pub fn value(&self, key: &str) -> &str {
        self.map.get(key).unwrap_or_default()
    }

    pub fn requester_name(&self) -> &str {
        self.value(keys::REQUESTER_NAME).trim()
    }

    pub fn category(&self) -> &str {
        self.value(keys::CATEGORY).trim()
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.map
    }
}

fn parse_yes_no(map: &FieldMap, key: &str) -> Result<YesNo, AssemblyError> {
    let raw = map.get(key).unwrap_or_default();
    YesNo::parse(raw).ok_or_else(|| AssemblyError::InvalidEnumValue {
        field: key.to_string(),
        value: raw.to_string(),
    })
}

/// "2024-01-20", "2024/1/20" or "2024.01.20" → "2024년 1월 20일".
/// Anything else (including an already-Korean date) is returned trimmed.
pub fn format_korean_date(input: &str) -> String {
    let input = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .map(|d| format!("{}년 {}월 {}일", d.year(), d.month(), d.day()))
        .unwrap_or_else(|| input.to_string())
}

/// "서울강남경찰서" → "서울강남경찰서 귀중"; values already ending in 귀중 are kept.
pub fn submission_line(station: &str) -> String {
    let station = station.trim();
    if station.ends_with(SUBMIT_SUFFIX) {
        station.to_string()
    } else {
        format!("{station} {SUBMIT_SUFFIX}")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Raw form input
// ────────────────────────────────────────────────────────────────────────────

/// Flattens the sectioned form payload (`{section: {label: value}}`) into one
/// object. String values are collapsed onto a single line because the prompt
/// embeds them inline.
pub fn flatten_form_sections(combined: &Value) -> Map<String, Value> {
    let mut flat = Map::new();
    let Some(sections) = combined.as_object() else {
        return flat;
    };

    for section in sections.values() {
        let Some(fields) = section.as_object() else {
            continue;
        };
        for (key, value) in fields {
            let value = match value {
                Value::String(s) => Value::String(single_line(s)),
                other => other.clone(),
            };
            flat.insert(key.clone(), value);
        }
    }
    flat
}

fn single_line(text: &str) -> String {
    text.replace(['\t', '\r', '\n'], " ")
}
