use std::io::Read;

use serde::{Deserialize, Deserializer};

use super::QuestionDraft;
use crate::workflows::interview::domain::Difficulty;

#[derive(Debug, thiserror::Error)]
pub enum QuestionImportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("row {row}: unknown difficulty '{value}' (expected easy, medium or hard)")]
    UnknownDifficulty { row: usize, value: String },
    #[error("row {row}: missing {field}")]
    MissingField { row: usize, field: &'static str },
}

/// Parse a `Question,Answer,Difficulty,Domain` export into catalog drafts.
///
/// Rows are numbered from 1, not counting the header.
pub fn parse_questions<R: Read>(reader: R) -> Result<Vec<QuestionDraft>, QuestionImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut drafts = Vec::new();

    for (index, record) in csv_reader.deserialize::<QuestionRow>().enumerate() {
        let row = index + 1;
        let parsed = record?;

        let prompt = parsed
            .question
            .ok_or(QuestionImportError::MissingField {
                row,
                field: "question",
            })?;
        let domain = parsed
            .domain
            .as_deref()
            .map(collapse_whitespace)
            .filter(|domain| !domain.is_empty())
            .ok_or(QuestionImportError::MissingField {
                row,
                field: "domain",
            })?;
        let raw_difficulty = parsed
            .difficulty
            .ok_or(QuestionImportError::MissingField {
                row,
                field: "difficulty",
            })?;
        let difficulty = Difficulty::parse(&raw_difficulty).ok_or_else(|| {
            QuestionImportError::UnknownDifficulty {
                row,
                value: raw_difficulty.clone(),
            }
        })?;

        drafts.push(QuestionDraft {
            prompt,
            answer: parsed.answer.unwrap_or_default(),
            domain,
            difficulty: Some(difficulty),
        });
    }

    Ok(drafts)
}

#[derive(Debug, Deserialize)]
struct QuestionRow {
    #[serde(rename = "Question", default, deserialize_with = "empty_string_as_none")]
    question: Option<String>,
    #[serde(rename = "Answer", default, deserialize_with = "empty_string_as_none")]
    answer: Option<String>,
    #[serde(
        rename = "Difficulty",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    difficulty: Option<String>,
    #[serde(rename = "Domain", default, deserialize_with = "empty_string_as_none")]
    domain: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Strip invisible characters and collapse runs of whitespace; case is preserved
/// because domain labels match case-sensitively.
pub(crate) fn collapse_whitespace(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
