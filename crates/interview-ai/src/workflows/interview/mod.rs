//! Interview lifecycle: question bank, selection, scoring, persistence and the screen
//! state machine that ties them together.

pub mod bank;
pub mod catalog;
pub mod collaborators;
pub mod domain;
pub mod draft;
mod history;
pub mod rating;
pub mod scoring;
pub mod selection;
pub mod store;
pub mod sync;
mod workflow;

#[cfg(test)]
mod tests;

pub use bank::QuestionBank;
pub use catalog::{CatalogError, QuestionCatalog, QuestionDraft, QuestionEdit};
pub use collaborators::{
    ConfigurationProvider, IdentityError, IdentityResolver, OracleFactory, StoreConfiguration,
    ORACLE_KEY_SETTING,
};
pub use domain::{
    Candidate, Difficulty, DomainChoice, Interview, InterviewSummary, Interviewer,
    InterviewerId, Persistence, QaEntry, Question, RecordId, Screen,
};
pub use draft::{DraftEdit, EditError};
pub use history::{load_interview, load_interviews, HistoryError};
pub use rating::{
    AnimationEnd, AssistedRatingController, OracleError, RatingAnimation, RatingError,
    RatingOracle, RatingSettings,
};
pub use selection::SelectionEngine;
pub use store::{Collection, MemoryRecordStore, RecordStore, StoreError};
pub use sync::{
    PersistenceSynchronizer, RetryPolicy, SyncError, SyncFailure, SyncReport, WriteOutcome,
};
pub use workflow::{ErrorKind, InterviewWorkflow, ValidationError, WorkflowError, WorkflowSettings};
