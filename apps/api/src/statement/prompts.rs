// LLM prompt constants for the statement record (진술 조서).
// The model rewrites the complaint's narrative fields as the question and
// answer pairs an investigator would record, through a forced function call.

use serde_json::{json, Map, Value};

use crate::complaint::fields::{keys, FieldMap};

pub const STATEMENT_FUNCTION_NAME: &str = "record_statement";

pub const STATEMENT_SYSTEM: &str =
    "너는 진술 조서 작성 보조 시스템이다. 반드시 함수 호출 형식으로만 응답해야 한다.";

/// Complaint fields the questions are drawn from. Personal details of the
/// requester go into the record header instead.
pub const STATEMENT_SOURCE_FIELDS: &[&str] = &[
    keys::CATEGORY,
    keys::RESPONDENT_NAME,
    keys::RESPONDENT_DETAILS,
    keys::PURPOSE,
    keys::FACTS,
    keys::REASONS,
    keys::EVIDENCE,
    keys::DUPLICATE_FILING,
    keys::RELATED_INVESTIGATION,
    keys::MISC,
];

pub fn statement_function_schema() -> Value {
    json!({
        "name": STATEMENT_FUNCTION_NAME,
        "description": "진술 조서의 문답을 기록한다",
        "parameters": {
            "type": "object",
            "properties": {
                "relationship": {
                    "type": "string",
                    "description": "피의자(피고소인)와 진술인의 관계를 존댓말 한두 문장으로 기술한다."
                },
                "questions": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "question": {
                                "type": "string",
                                "description": "'문: '으로 시작하는 존댓말 질문"
                            },
                            "answer": {
                                "type": "string",
                                "description": "'답: '으로 시작하는 존댓말 답변"
                            }
                        },
                        "required": ["question", "answer"]
                    }
                }
            },
            "required": ["relationship", "questions"]
        }
    })
}

/// Builds the user message from the stored complaint fields.
pub fn build_statement_prompt(fields: &FieldMap) -> String {
    let mut source = Map::new();
    for &key in STATEMENT_SOURCE_FIELDS {
        if let Some(value) = fields.get(key).map(str::trim).filter(|v| !v.is_empty()) {
            source.insert(key.to_string(), Value::String(value.to_string()));
        }
    }
    let source_json = serde_json::to_string(&source).unwrap_or_else(|_| "{}".to_string());

    format!(
        "다음 '고소 내용'을 바탕으로 고소인 진술 조서의 문답을 작성하라. \
         진술 조서와 관련 없는 말(인사, 면책 문구 등)은 넣지 않는다.\n\n\
         고소 내용:\n{source_json}\n\n\
         작성 지침:\n\
         - 각 항목을 수사관이 묻는 존댓말 질문으로 바꾸고 '문: '으로 시작한다. \
         (예: 고소 죄명 → '문: 어떤 죄명으로 고소하셨습니까?')\n\
         - 답변은 고소인이 말하는 존댓말로, '답: '으로 시작한다. \
         '있음'은 '있습니다', '없음'은 '없습니다'처럼 자연스럽게 바꾼다.\n\
         - 내용이 없는 항목은 문답을 만들지 않는다.\n\
         - relationship에는 피의자와 고소인의 관계만 적는다.\n\n\
         {STATEMENT_FUNCTION_NAME} 함수를 호출해 답하라."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complaint::fields::tests::sample_field_map;

    #[test]
    fn test_schema_requires_relationship_and_questions() {
        let schema = statement_function_schema();
        assert_eq!(schema["name"], json!("record_statement"));
        assert_eq!(
            schema["parameters"]["required"],
            json!(["relationship", "questions"])
        );
        assert_eq!(
            schema["parameters"]["properties"]["questions"]["items"]["required"],
            json!(["question", "answer"])
        );
    }

    #[test]
    fn test_prompt_leaves_out_requester_details() {
        let prompt = build_statement_prompt(&sample_field_map());
        assert!(prompt.contains("김철수"));
        assert!(prompt.contains("차용증 사본"));
        assert!(!prompt.contains("900101-1234567"));
        assert!(!prompt.contains("010-1234-5678"));
        assert!(prompt.contains("record_statement"));
    }

    #[test]
    fn test_prompt_skips_blank_fields() {
        let mut map = sample_field_map();
        map.insert(keys::MISC, "   ");
        let prompt = build_statement_prompt(&map);
        assert!(!prompt.contains("\"기타\""));
    }
}
