use tracing::{debug, warn};

use super::bank::QuestionBank;
use super::collaborators::{IdentityError, IdentityResolver};
use super::domain::{
    Candidate, Interview, InterviewSummary, Persistence, QaEntry, Question, RecordId,
};
use super::store::records::{
    decode, decode_question, CandidateRecord, InterviewRecord, QaLinkRecord, INTERVIEW_ID_FIELD,
};
use super::store::{Collection, Record, RecordFilter, RecordStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Summaries of every persisted interview, in store order.
///
/// An interviewer the directory no longer knows is shown as unassigned.
pub async fn load_interviews<S>(
    store: &S,
    identity: &dyn IdentityResolver,
) -> Result<Vec<InterviewSummary>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let records = store.list(Collection::Interviews).await?;
    let mut summaries = Vec::with_capacity(records.len());

    for record in &records {
        let stored: InterviewRecord = decode(Collection::Interviews, record)?;
        let candidate = load_candidate(store, stored.candidate_id).await?;
        let interviewer = match identity.lookup(stored.interviewer_id).await {
            Ok(interviewer) => Some(interviewer),
            Err(err) => {
                warn!(interview = %record.id, error = %err, "interviewer lookup failed");
                None
            }
        };

        summaries.push(InterviewSummary {
            id: record.id,
            date: stored.date_of_interview,
            candidate_name: candidate.name,
            candidate_role: candidate.current_role,
            interviewer,
            overall_score: stored.score,
        });
    }

    debug!(count = summaries.len(), "interview list loaded");
    Ok(summaries)
}

/// Rebuild a persisted interview, including its QA set, as an editable draft.
pub async fn load_interview<S>(
    store: &S,
    identity: &dyn IdentityResolver,
    bank: &QuestionBank,
    id: RecordId,
) -> Result<Interview, HistoryError>
where
    S: RecordStore + ?Sized,
{
    let record = store.get_by_id(Collection::Interviews, id).await?;
    let stored: InterviewRecord = decode(Collection::Interviews, &record)?;
    let candidate = load_candidate(store, stored.candidate_id).await?;
    let interviewer = identity.lookup(stored.interviewer_id).await?;

    let links = store
        .filter(
            Collection::QuestionAnswerLinks,
            &RecordFilter::field_equals(INTERVIEW_ID_FIELD, id.0),
        )
        .await?;
    let mut qa_set = Vec::with_capacity(links.len());
    for link in &links {
        let stored_link: QaLinkRecord = decode(Collection::QuestionAnswerLinks, link)?;
        let question = load_question(store, bank, stored_link.question_id).await?;
        qa_set.push(QaEntry::restore(
            link.id,
            question,
            stored_link.answer,
            stored_link.score,
        ));
    }

    debug!(interview = %id, entries = qa_set.len(), "interview reopened");
    Ok(Interview {
        persistence: Persistence::Persisted(record.id),
        date: stored.date_of_interview,
        interviewer: Some(interviewer),
        candidate,
        qa_set,
        overall_score: stored.score,
        review: stored.review,
    })
}

async fn load_candidate<S>(store: &S, id: RecordId) -> Result<Candidate, StoreError>
where
    S: RecordStore + ?Sized,
{
    let record: Record = store.get_by_id(Collection::Candidates, id).await?;
    let stored: CandidateRecord = decode(Collection::Candidates, &record)?;
    Ok(Candidate {
        persistence: Persistence::Persisted(record.id),
        name: stored.name,
        email: stored.email,
        current_role: stored.current_role,
        years_of_experience: stored.years_of_experience,
        should_hire: stored.should_hire,
    })
}

/// Prefer the loaded bank; fall back to the store for questions added since.
async fn load_question<S>(store: &S, bank: &QuestionBank, id: RecordId) -> Result<Question, StoreError>
where
    S: RecordStore + ?Sized,
{
    if let Some(question) = bank.get(id) {
        return Ok(question.clone());
    }
    let record = store.get_by_id(Collection::Questions, id).await?;
    decode_question(&record)
}
