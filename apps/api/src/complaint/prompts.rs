// LLM prompt constants for complaint drafting.
// The model answers through a forced function call whose arguments are the
// field map, so the schema below doubles as the output contract.

use serde_json::{json, Map, Value};

use crate::complaint::fields::{keys, YesNo, ALL_FIELDS, REQUIRED_FIELDS};

pub const COMPLAINT_FUNCTION_NAME: &str = "generate_complaint";

pub const COMPLAINT_SYSTEM: &str =
    "너는 고소장 자동 작성 시스템이다. 반드시 함수 호출 형식으로만 응답해야 한다.";

/// Per-field drafting instructions, shown to the model next to the schema.
pub const FIELD_GUIDANCE: &[(&str, &str)] = &[
    (keys::CATEGORY, "고소하려는 죄명을 입력한다. (예: 사기)"),
    (keys::REQUESTER_NAME, "고소인의 이름을 입력한다."),
    (keys::REQUESTER_RRN, "고소인의 주민등록번호를 입력한다."),
    (keys::REQUESTER_ADDRESS, "고소인의 주소를 입력한다."),
    (keys::REQUESTER_JOB, "고소인의 직업을 입력한다."),
    (keys::REQUESTER_PHONE, "고소인의 전화번호를 입력한다."),
    (keys::REQUESTER_EMAIL, "고소인의 이메일을 입력한다."),
    (keys::RESPONDENT_NAME, "피고소인의 이름. 모르면 빈 문자열."),
    (keys::RESPONDENT_RRN, "피고소인의 주민등록번호. 모르면 빈 문자열."),
    (keys::RESPONDENT_ADDRESS, "피고소인의 주소. 모르면 빈 문자열."),
    (keys::RESPONDENT_JOB, "피고소인의 직업. 모르면 빈 문자열."),
    (keys::RESPONDENT_PHONE, "피고소인의 전화번호. 모르면 빈 문자열."),
    (keys::RESPONDENT_EMAIL, "피고소인의 이메일. 모르면 빈 문자열."),
    (
        keys::RESPONDENT_DETAILS,
        "고소인과의 관계, 그리고 인적사항을 정확히 알 수 없을 경우 성별, 특징적 외모, 인상착의 등 \
         피고소인을 특정할 수 있는 내용을 입력한다.",
    ),
    (
        keys::PURPOSE,
        "죄명과 처벌 의사를 포함한다. 형식: '고소인은 피고소인을 ~~죄로 고소하오니 처벌하여 주시기 바랍니다.'",
    ),
    (
        keys::FACTS,
        "형법 등 처벌법규에 해당하는 사실을 일시(날짜와 시간 모두), 장소, 범행방법, 결과 등으로 구체적으로 \
         특정하여 기재한다. 경어체로 끝맺고 자신은 '고소인'으로 지칭한다. \
         (예: 피고소인은 2021. 0. 0. 00:00경 ○○구 ○○로에 있는 고소인의 집에서, 고소인에게 \
         \"10,000,000원만 빌려 주면 월 3%의 이자를 지급하고, 2개월 후에 틀림없이 갚겠다\"고 거짓말하였습니다. \
         피고소인은 이와 같이 고소인을 기망하여 이에 속은 고소인으로부터 즉석에서 차용금 명목으로 \
         10,000,000원을 교부받았습니다.)",
    ),
    (
        keys::REASONS,
        "범행 경위 및 정황, 고소 동기와 사유를 간략히 기재한다. 합의 여부와 처벌 의사에 따라 \
         '피고소인과는 합의하지 않았으며/합의하였으며, 피고소인의 처벌을 원합니다/원하지 않습니다' 문장을 포함한다.",
    ),
    (keys::EVIDENCE, "증거자료 목록. 없으면 빈 문자열."),
    (keys::DUPLICATE_FILING, "같은 내용으로 다른 곳에 고소한 적이 있으면 있음, 없으면 없음."),
    (keys::RELATED_INVESTIGATION, "관련 사건이 수사 중이면 있음, 아니면 없음."),
    (keys::MISC, "위에서 다루지 못한 내용. 없으면 빈 문자열."),
    (
        keys::FILING_DATE,
        "'YYYY년 M월 D일' 형식. 월과 일에 앞자리 0을 붙이지 않는다. (예: 2024년 1월 20일)",
    ),
    (keys::SUBMIT_TO, "'~~경찰서 귀중' 형식."),
];

/// The `functions` entry for the chat completion request.
pub fn complaint_function_schema() -> Value {
    let mut properties = Map::new();
    for &key in ALL_FIELDS {
        let property = match key {
            keys::DUPLICATE_FILING | keys::RELATED_INVESTIGATION => {
                json!({ "type": "string", "enum": YesNo::VALUES })
            }
            _ => json!({ "type": "string" }),
        };
        properties.insert(key.to_string(), property);
    }

    json!({
        "name": COMPLAINT_FUNCTION_NAME,
        "description": "고소장 정보를 생성한다",
        "parameters": {
            "type": "object",
            "properties": properties,
            "required": REQUIRED_FIELDS,
        }
    })
}

/// Builds the user message from the flattened form answers.
pub fn build_complaint_prompt(form: &Map<String, Value>) -> String {
    let form_json = serde_json::to_string(form).unwrap_or_else(|_| "{}".to_string());

    let guidance: String = FIELD_GUIDANCE
        .iter()
        .map(|(key, hint)| format!("- {key}: {hint}\n"))
        .collect();

    format!(
        "다음 '고소 내용'을 바탕으로 고소장을 작성하라. 고소장과 관련 없는 말(인사, 면책 문구 등)은 넣지 않는다.\n\n\
         고소 내용:\n{form_json}\n\n\
         각 항목 작성 지침:\n{guidance}\n\
         {COMPLAINT_FUNCTION_NAME} 함수를 호출해 모든 항목을 채워라."
    )
}
