use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// A row of `complaint_documents`, numbered within its creation year.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ComplaintRecordRow {
    pub file_id: String,
    pub requester_name: String,
    pub respondent_name: Option<String>,
    pub category: String,
    pub filing_date: Option<String>,
    pub field_map: Value,
    pub docx_key: String,
    pub pdf_key: Option<String>,
    pub missing_sections: Vec<String>,
    /// File id of the latest statement (진술 조서) generated from this complaint.
    pub statement_file_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// UTC calendar year of `created_at`; the numbering partition.
    pub registration_year: i32,
    /// 1-based position among the year's complaints, oldest first.
    pub seq: i64,
}

impl ComplaintRecordRow {
    /// "2024-000001"
    pub fn registration_number(&self) -> String {
        registration_number(self.registration_year, self.seq)
    }
}

/// Values written by an upsert; timestamps and numbering come from the database.
#[derive(Debug, Clone)]
pub struct NewComplaintRecord<'a> {
    pub file_id: &'a str,
    pub requester_name: &'a str,
    pub respondent_name: Option<&'a str>,
    pub category: &'a str,
    pub filing_date: Option<&'a str>,
    pub field_map: &'a Value,
    pub docx_key: &'a str,
    pub pdf_key: Option<&'a str>,
    pub missing_sections: &'a [String],
}

pub fn registration_number(year: i32, seq: i64) -> String {
    format!("{year}-{seq:06}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_registration_number_is_zero_padded() {
        assert_eq!(registration_number(2024, 1), "2024-000001");
        assert_eq!(registration_number(2025, 123456), "2025-123456");
    }

    fn row_created_at(created: DateTime<Utc>, registration_year: i32, seq: i64) -> ComplaintRecordRow {
        ComplaintRecordRow {
            file_id: "AI 고소장 홍길동_사기_090000".into(),
            requester_name: "홍길동".into(),
            respondent_name: Some("김철수".into()),
            category: "사기".into(),
            filing_date: Some("2025년 3월 1일".into()),
            field_map: json!({"고소 죄명": "사기"}),
            docx_key: "complaints/AI 고소장 홍길동_사기_090000.docx".into(),
            pdf_key: None,
            missing_sections: vec![],
            statement_file_id: None,
            created_at: created,
            updated_at: created,
            registration_year,
            seq,
        }
    }

    #[test]
    fn test_row_uses_partition_year() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        assert_eq!(row_created_at(created, 2025, 42).registration_number(), "2025-000042");
    }

    #[test]
    fn test_new_year_in_kst_keeps_utc_year() {
        // 2025-01-01 08:30 KST is still 2024 in UTC; the number must follow the
        // partition the database used, not the wall clock of either side.
        let created = Utc.with_ymd_and_hms(2024, 12, 31, 23, 30, 0).unwrap();
        let row = row_created_at(created, 2024, 731);
        assert_eq!(row.registration_number(), "2024-000731");
    }
}
