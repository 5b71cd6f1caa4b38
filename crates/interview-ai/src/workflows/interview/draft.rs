use chrono::NaiveDate;

use super::domain::{Interview, Interviewer, QaEntry};
use super::scoring::{recompute_overall, MAX_SCORE};

/// A single typed change to the draft interview.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEdit {
    CandidateName(String),
    CandidateEmail(String),
    CandidateCurrentRole(String),
    CandidateYearsOfExperience(u32),
    ShouldHire(bool),
    InterviewDate(NaiveDate),
    Interviewer(Interviewer),
    Answer { position: usize, text: String },
    Score { position: usize, score: u8 },
    Review(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("no question at position {0} in the QA set")]
    UnknownEntry(usize),
    #[error("score {0} is outside 0..={MAX_SCORE}")]
    ScoreOutOfRange(u8),
    #[error("interviewer {0} is already assigned to this interview")]
    InterviewerLocked(String),
}

impl Interview {
    /// Return a new draft with `edit` applied; `self` is left untouched.
    ///
    /// Score edits recompute the overall score.
    pub fn apply(&self, edit: DraftEdit) -> Result<Interview, EditError> {
        let mut next = self.clone();

        match edit {
            DraftEdit::CandidateName(name) => next.candidate.name = name,
            DraftEdit::CandidateEmail(email) => next.candidate.email = email,
            DraftEdit::CandidateCurrentRole(role) => next.candidate.current_role = role,
            DraftEdit::CandidateYearsOfExperience(years) => {
                next.candidate.years_of_experience = years
            }
            DraftEdit::ShouldHire(should_hire) => next.candidate.should_hire = should_hire,
            DraftEdit::InterviewDate(date) => next.date = Some(date),
            DraftEdit::Interviewer(interviewer) => match &next.interviewer {
                Some(current) if current.id != interviewer.id => {
                    return Err(EditError::InterviewerLocked(current.name.clone()));
                }
                _ => next.interviewer = Some(interviewer),
            },
            DraftEdit::Answer { position, text } => {
                entry_mut(&mut next, position)?.answer = text;
            }
            DraftEdit::Score { position, score } => {
                if score > MAX_SCORE {
                    return Err(EditError::ScoreOutOfRange(score));
                }
                entry_mut(&mut next, position)?.score = score;
                return Ok(recompute_overall(next));
            }
            DraftEdit::Review(review) => next.review = review,
        }

        Ok(next)
    }

    /// Replace the QA set; only used when questions are generated.
    pub(crate) fn with_qa_set(&self, qa_set: Vec<QaEntry>) -> Interview {
        Interview {
            qa_set,
            ..self.clone()
        }
    }
}

fn entry_mut(interview: &mut Interview, position: usize) -> Result<&mut QaEntry, EditError> {
    interview
        .qa_set
        .get_mut(position)
        .ok_or(EditError::UnknownEntry(position))
}
