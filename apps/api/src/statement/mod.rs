//! Statement record (진술 조서) for a complaint that was already published.
//!
//! Flow: stored field map → LLM question/answer draft → document built in
//! code (.docx) → PDF → object storage, linked back to the complaint record.

pub mod builder;
pub mod generator;
pub mod handlers;
pub mod prompts;
