use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::domain::{Interview, Persistence, RecordId};
use super::store::records::{encode, CandidateRecord, InterviewRecord, QaLinkRecord};
use super::store::{Collection, Fields, RecordStore, StoreError};

/// Bounded retry for transient store failures. One attempt means no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// What a save did to one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created(RecordId),
    Updated(RecordId),
    NotWritten,
}

impl WriteOutcome {
    pub const fn is_written(self) -> bool {
        !matches!(self, Self::NotWritten)
    }
}

/// Per-entity account of one save, in write order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub candidate: WriteOutcome,
    pub interview: WriteOutcome,
    pub qa_entries: Vec<WriteOutcome>,
}

impl SyncReport {
    fn pending(entries: usize) -> Self {
        Self {
            candidate: WriteOutcome::NotWritten,
            interview: WriteOutcome::NotWritten,
            qa_entries: vec![WriteOutcome::NotWritten; entries],
        }
    }

    fn outcomes(&self) -> impl Iterator<Item = WriteOutcome> + '_ {
        [self.candidate, self.interview]
            .into_iter()
            .chain(self.qa_entries.iter().copied())
    }

    pub fn created(&self) -> usize {
        self.outcomes()
            .filter(|outcome| matches!(outcome, WriteOutcome::Created(_)))
            .count()
    }

    pub fn updated(&self) -> usize {
        self.outcomes()
            .filter(|outcome| matches!(outcome, WriteOutcome::Updated(_)))
            .count()
    }

    pub fn not_written(&self) -> usize {
        self.outcomes()
            .filter(|outcome| !outcome.is_written())
            .count()
    }
}

/// Entity being written when a save stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Candidate,
    Interview,
    QaEntry(usize),
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStage::Candidate => f.write_str("candidate"),
            SyncStage::Interview => f.write_str("interview"),
            SyncStage::QaEntry(position) => write!(f, "question-answer entry {position}"),
        }
    }
}

/// Why a save stopped.
#[derive(Debug, thiserror::Error)]
pub enum SyncFailure {
    #[error("an interviewer must be chosen before the interview can be saved")]
    MissingInterviewer,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncFailure {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_transient())
    }
}

/// Partial save. `partial` keeps every identifier bound before the failure, so saving
/// it again resumes with updates instead of duplicating what already landed.
#[derive(Debug, thiserror::Error)]
#[error(
    "failed to persist {stage} ({} created, {} updated, {} not written): {source}",
    .report.created(),
    .report.updated(),
    .report.not_written()
)]
pub struct SyncError {
    pub stage: SyncStage,
    pub report: SyncReport,
    pub partial: Box<Interview>,
    #[source]
    pub source: SyncFailure,
}

#[derive(Debug, Clone)]
pub struct SavedInterview {
    pub interview: Interview,
    pub report: SyncReport,
}

/// Flushes a draft to the record store: candidate, then interview, then each QA entry.
pub struct PersistenceSynchronizer<S: ?Sized> {
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<S> PersistenceSynchronizer<S>
where
    S: RecordStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn save(&self, draft: &Interview) -> Result<SavedInterview, SyncError> {
        let mut interview = draft.clone();
        let mut report = SyncReport::pending(interview.qa_set.len());

        let candidate_fields = encode(
            Collection::Candidates,
            &CandidateRecord::from(&interview.candidate),
        );
        let candidate_id = match self
            .write(Collection::Candidates, interview.candidate.persistence, candidate_fields)
            .await
        {
            Ok((id, outcome)) => {
                interview.candidate.persistence = Persistence::Persisted(id);
                report.candidate = outcome;
                id
            }
            Err(source) => {
                return Err(failure(SyncStage::Candidate, report, interview, source.into()))
            }
        };

        let Some(interviewer_id) = interview.interviewer.as_ref().map(|interviewer| interviewer.id)
        else {
            return Err(failure(
                SyncStage::Interview,
                report,
                interview,
                SyncFailure::MissingInterviewer,
            ));
        };
        let interview_fields = encode(
            Collection::Interviews,
            &InterviewRecord::new(&interview, candidate_id, interviewer_id),
        );
        let interview_id = match self
            .write(Collection::Interviews, interview.persistence, interview_fields)
            .await
        {
            Ok((id, outcome)) => {
                interview.persistence = Persistence::Persisted(id);
                report.interview = outcome;
                id
            }
            Err(source) => {
                return Err(failure(SyncStage::Interview, report, interview, source.into()))
            }
        };

        for position in 0..interview.qa_set.len() {
            let entry = &interview.qa_set[position];
            let fields = encode(
                Collection::QuestionAnswerLinks,
                &QaLinkRecord::new(entry, interview_id),
            );
            match self
                .write(Collection::QuestionAnswerLinks, entry.persistence, fields)
                .await
            {
                Ok((id, outcome)) => {
                    interview.qa_set[position].persistence = Persistence::Persisted(id);
                    report.qa_entries[position] = outcome;
                }
                Err(source) => {
                    return Err(failure(
                        SyncStage::QaEntry(position),
                        report,
                        interview,
                        source.into(),
                    ))
                }
            }
        }

        info!(
            interview = %interview_id,
            created = report.created(),
            updated = report.updated(),
            "interview synchronized"
        );
        Ok(SavedInterview { interview, report })
    }

    async fn write(
        &self,
        collection: Collection,
        persistence: Persistence,
        fields: Result<Fields, StoreError>,
    ) -> Result<(RecordId, WriteOutcome), StoreError> {
        let fields = fields?;
        let mut attempt = 1;

        loop {
            let result = match persistence {
                Persistence::Transient => self
                    .store
                    .create(collection, fields.clone())
                    .await
                    .map(|id| (id, WriteOutcome::Created(id))),
                Persistence::Persisted(id) => self
                    .store
                    .update(collection, id, fields.clone())
                    .await
                    .map(|()| (id, WriteOutcome::Updated(id))),
            };

            match result {
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    warn!(%collection, attempt, error = %err, "store write failed, retrying");
                    tokio::time::sleep(self.retry.backoff).await;
                    attempt += 1;
                }
                Ok((id, outcome)) => {
                    debug!(%collection, %id, ?outcome, "record written");
                    return Ok((id, outcome));
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn failure(
    stage: SyncStage,
    report: SyncReport,
    partial: Interview,
    source: SyncFailure,
) -> SyncError {
    warn!(%stage, error = %source, "interview save stopped partway");
    SyncError {
        stage,
        report,
        partial: Box::new(partial),
        source,
    }
}
