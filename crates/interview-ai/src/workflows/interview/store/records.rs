use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Collection, Fields, Record, StoreError};
use crate::workflows::interview::domain::{
    Candidate, Difficulty, Interview, InterviewerId, QaEntry, Question, RecordId,
};

pub(crate) const INTERVIEW_ID_FIELD: &str = "interview_id";
pub(crate) const CONFIGURATION_KEY_FIELD: &str = "key";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CandidateRecord {
    pub(crate) email: String,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) current_role: String,
    #[serde(default)]
    pub(crate) years_of_experience: u32,
    #[serde(default)]
    pub(crate) should_hire: bool,
}

impl From<&Candidate> for CandidateRecord {
    fn from(candidate: &Candidate) -> Self {
        Self {
            email: candidate.email.clone(),
            name: candidate.name.clone(),
            current_role: candidate.current_role.clone(),
            years_of_experience: candidate.years_of_experience,
            should_hire: candidate.should_hire,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct InterviewRecord {
    #[serde(default)]
    pub(crate) date_of_interview: Option<NaiveDate>,
    pub(crate) interviewer_id: InterviewerId,
    pub(crate) candidate_id: RecordId,
    #[serde(default)]
    pub(crate) score: Option<f64>,
    #[serde(default)]
    pub(crate) review: String,
}

impl InterviewRecord {
    pub(crate) fn new(
        interview: &Interview,
        candidate_id: RecordId,
        interviewer_id: InterviewerId,
    ) -> Self {
        Self {
            date_of_interview: interview.date,
            interviewer_id,
            candidate_id,
            score: interview.overall_score,
            review: interview.review.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct QaLinkRecord {
    pub(crate) interview_id: RecordId,
    pub(crate) question_id: RecordId,
    #[serde(default)]
    pub(crate) answer: String,
    #[serde(default)]
    pub(crate) score: u8,
}

impl QaLinkRecord {
    pub(crate) fn new(entry: &QaEntry, interview_id: RecordId) -> Self {
        Self {
            interview_id,
            question_id: entry.question().id,
            answer: entry.answer.clone(),
            score: entry.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct QuestionRecord {
    pub(crate) prompt: String,
    #[serde(default)]
    pub(crate) answer: String,
    pub(crate) difficulty: Difficulty,
    pub(crate) domain: String,
}

impl QuestionRecord {
    pub(crate) fn into_question(self, id: RecordId) -> Question {
        Question {
            id,
            prompt: self.prompt,
            reference_answer: self.answer,
            difficulty: self.difficulty,
            domain: self.domain,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ConfigurationRecord {
    pub(crate) key: String,
    #[serde(default)]
    pub(crate) value: String,
}

pub(crate) fn encode<T: Serialize>(collection: Collection, value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(StoreError::Malformed {
            collection,
            detail: format!("expected an object, encoded {other}"),
        }),
        Err(err) => Err(StoreError::Malformed {
            collection,
            detail: err.to_string(),
        }),
    }
}

pub(crate) fn decode<T: DeserializeOwned>(
    collection: Collection,
    record: &Record,
) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(record.fields.clone())).map_err(|err| {
        StoreError::Malformed {
            collection,
            detail: format!("record {}: {err}", record.id),
        }
    })
}

pub(crate) fn decode_question(record: &Record) -> Result<Question, StoreError> {
    let stored: QuestionRecord = decode(Collection::Questions, record)?;
    Ok(stored.into_question(record.id))
}
