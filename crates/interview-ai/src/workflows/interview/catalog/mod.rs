//! Question catalog maintenance: the editable side of the question bank.

mod import;

pub use import::{parse_questions, QuestionImportError};

use std::io::Read;
use std::sync::Arc;

use tracing::info;

use super::domain::{Difficulty, Question, RecordId};
use super::rating::{suggest_answer, OracleError, RatingOracle};
use super::store::records::{decode_question, encode, QuestionRecord};
use super::store::{Collection, RecordStore, StoreError};

/// One typed change to a question being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionEdit {
    Prompt(String),
    Answer(String),
    Domain(String),
    Difficulty(Difficulty),
}

/// Editable question form; validated when written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub prompt: String,
    pub answer: String,
    pub domain: String,
    pub difficulty: Option<Difficulty>,
}

impl QuestionDraft {
    pub fn apply(mut self, edit: QuestionEdit) -> Self {
        match edit {
            QuestionEdit::Prompt(prompt) => self.prompt = prompt,
            QuestionEdit::Answer(answer) => self.answer = answer,
            QuestionEdit::Domain(domain) => self.domain = import::collapse_whitespace(&domain),
            QuestionEdit::Difficulty(difficulty) => self.difficulty = Some(difficulty),
        }
        self
    }

    fn to_record(&self) -> Result<QuestionRecord, CatalogError> {
        if self.prompt.trim().is_empty() {
            return Err(CatalogError::MissingField("prompt"));
        }
        if self.domain.trim().is_empty() {
            return Err(CatalogError::MissingField("domain"));
        }
        let difficulty = self
            .difficulty
            .ok_or(CatalogError::MissingField("difficulty"))?;

        Ok(QuestionRecord {
            prompt: self.prompt.clone(),
            answer: self.answer.clone(),
            difficulty,
            domain: self.domain.clone(),
        })
    }
}

impl From<&Question> for QuestionDraft {
    fn from(question: &Question) -> Self {
        Self {
            prompt: question.prompt.clone(),
            answer: question.reference_answer.clone(),
            domain: question.domain.clone(),
            difficulty: Some(question.difficulty),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("question {0} is required")]
    MissingField(&'static str),
    #[error("answer suggestions need a configured rating oracle")]
    OracleUnavailable,
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Import(#[from] QuestionImportError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create, update, and remove questions in the `questions` collection.
pub struct QuestionCatalog<S: ?Sized> {
    store: Arc<S>,
    oracle: Option<Arc<dyn RatingOracle>>,
    max_tokens: u32,
}

impl<S> QuestionCatalog<S>
where
    S: RecordStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            oracle: None,
            max_tokens: 2000,
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn RatingOracle>, max_tokens: u32) -> Self {
        self.oracle = Some(oracle);
        self.max_tokens = max_tokens;
        self
    }

    pub async fn list(&self) -> Result<Vec<Question>, CatalogError> {
        let records = self.store.list(Collection::Questions).await?;
        Ok(records
            .iter()
            .map(decode_question)
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn create(&self, draft: &QuestionDraft) -> Result<Question, CatalogError> {
        let record = draft.to_record()?;
        let fields = encode(Collection::Questions, &record)?;
        let id = self.store.create(Collection::Questions, fields).await?;
        info!(question = %id, domain = %record.domain, "question created");
        Ok(record.into_question(id))
    }

    pub async fn update(&self, id: RecordId, draft: &QuestionDraft) -> Result<Question, CatalogError> {
        let record = draft.to_record()?;
        let fields = encode(Collection::Questions, &record)?;
        self.store.update(Collection::Questions, id, fields).await?;
        info!(question = %id, "question updated");
        Ok(record.into_question(id))
    }

    pub async fn remove(&self, id: RecordId) -> Result<(), CatalogError> {
        self.store.delete(Collection::Questions, id).await?;
        info!(question = %id, "question removed");
        Ok(())
    }

    /// Load an existing question into an editable draft.
    pub async fn edit(&self, id: RecordId) -> Result<QuestionDraft, CatalogError> {
        let record = self.store.get_by_id(Collection::Questions, id).await?;
        Ok(QuestionDraft::from(&decode_question(&record)?))
    }

    /// Fill the draft's reference answer with an oracle suggestion for its prompt.
    pub async fn suggest_answer(&self, draft: QuestionDraft) -> Result<QuestionDraft, CatalogError> {
        let oracle = self.oracle.as_ref().ok_or(CatalogError::OracleUnavailable)?;
        if draft.prompt.trim().is_empty() {
            return Err(CatalogError::MissingField("prompt"));
        }
        let answer = suggest_answer(oracle.as_ref(), &draft.prompt, self.max_tokens).await?;
        Ok(draft.apply(QuestionEdit::Answer(answer)))
    }

    /// Create every question found in a CSV export, in file order.
    pub async fn import<R: Read>(&self, reader: R) -> Result<Vec<Question>, CatalogError> {
        let drafts = parse_questions(reader)?;
        let mut created = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            created.push(self.create(draft).await?);
        }
        info!(count = created.len(), "questions imported");
        Ok(created)
    }
}
