//! Record-store boundary.
//!
//! The engine never persists anything itself: every read and write goes through
//! [`RecordStore`], which a host backs with whatever list/table service it uses.
//! Records are flat field maps so the trait stays independent of entity types; the
//! typed encodings live in [`records`].

mod memory;
pub(crate) mod records;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::RecordId;

pub use memory::{MemoryRecordStore, WriteOp};

/// Collections the engine reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Candidates,
    Interviews,
    Questions,
    QuestionAnswerLinks,
    Configuration,
}

impl Collection {
    pub const fn all() -> [Self; 5] {
        [
            Self::Candidates,
            Self::Interviews,
            Self::Questions,
            Self::QuestionAnswerLinks,
            Self::Configuration,
        ]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Candidates => "candidates",
            Self::Interviews => "interviews",
            Self::Questions => "questions",
            Self::QuestionAnswerLinks => "interview_question_links",
            Self::Configuration => "configuration",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type Fields = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub fields: Fields,
}

/// Predicate understood by every store: a single field equality.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFilter {
    pub field: String,
    pub value: Value,
}

impl RecordFilter {
    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        fields.get(&self.field) == Some(&self.value)
    }
}

/// Persistent collection store backing candidates, interviews, questions,
/// question-answer links and configuration values.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn has_collection(&self, collection: Collection) -> Result<bool, StoreError>;

    async fn list(&self, collection: Collection) -> Result<Vec<Record>, StoreError>;

    async fn get_by_id(&self, collection: Collection, id: RecordId) -> Result<Record, StoreError>;

    async fn filter(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> Result<Vec<Record>, StoreError>;

    /// Create a record and return the identifier the store assigned.
    async fn create(&self, collection: Collection, fields: Fields) -> Result<RecordId, StoreError>;

    async fn update(
        &self,
        collection: Collection,
        id: RecordId,
        fields: Fields,
    ) -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: RecordId) -> Result<(), StoreError>;
}

/// Error enumeration for record-store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("collection '{0}' does not exist")]
    MissingCollection(Collection),
    #[error("record {id} not found in '{collection}'")]
    NotFound { collection: Collection, id: RecordId },
    #[error("malformed record in '{collection}': {detail}")]
    Malformed {
        collection: Collection,
        detail: String,
    },
    #[error("record store rejected the write: {0}")]
    Rejected(String),
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Transient failures are the only ones a retry policy may repeat.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
