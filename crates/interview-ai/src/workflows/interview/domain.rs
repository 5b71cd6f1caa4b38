use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the record store on first write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier owned by the identity directory, not by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterviewerId(pub u64);

impl fmt::Display for InterviewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user-{}", self.0)
    }
}

/// Whether an entity has ever been written to the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persistence {
    #[default]
    Transient,
    Persisted(RecordId),
}

impl Persistence {
    pub const fn id(self) -> Option<RecordId> {
        match self {
            Self::Transient => None,
            Self::Persisted(id) => Some(id),
        }
    }

    pub const fn is_persisted(self) -> bool {
        matches!(self, Self::Persisted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const fn ordered() -> [Self; 3] {
        [Self::Easy, Self::Medium, Self::Hard]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: RecordId,
    pub prompt: String,
    pub reference_answer: String,
    pub difficulty: Difficulty,
    /// Free-text label, matched case-sensitively.
    pub domain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub persistence: Persistence,
    pub name: String,
    pub email: String,
    pub current_role: String,
    pub years_of_experience: u32,
    pub should_hire: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interviewer {
    pub id: InterviewerId,
    pub name: String,
    pub email: String,
}

/// One member of an interview's QA set.
///
/// The question is fixed at generation time; only the answer text and the score change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaEntry {
    pub persistence: Persistence,
    question: Question,
    pub answer: String,
    pub score: u8,
}

impl QaEntry {
    pub fn new(question: Question) -> Self {
        Self {
            persistence: Persistence::Transient,
            question,
            answer: String::new(),
            score: 0,
        }
    }

    pub(crate) fn restore(id: RecordId, question: Question, answer: String, score: u8) -> Self {
        Self {
            persistence: Persistence::Persisted(id),
            question,
            answer,
            score,
        }
    }

    pub fn question(&self) -> &Question {
        &self.question
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub persistence: Persistence,
    pub date: Option<NaiveDate>,
    pub interviewer: Option<Interviewer>,
    pub candidate: Candidate,
    pub qa_set: Vec<QaEntry>,
    /// Mean of the QA scores; unset until the first score is recorded on a non-empty set.
    pub overall_score: Option<f64>,
    pub review: String,
}

impl Interview {
    /// Fresh transient draft with every field empty.
    pub fn draft() -> Self {
        Self::default()
    }

    pub fn entry(&self, position: usize) -> Option<&QaEntry> {
        self.qa_set.get(position)
    }

    /// Domains of the QA set in first-appearance order.
    pub fn qa_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = Vec::new();
        for entry in &self.qa_set {
            let domain = &entry.question().domain;
            if !domains.iter().any(|known| known == domain) {
                domains.push(domain.clone());
            }
        }
        domains
    }
}

/// Checkbox state for one domain during the domain-choice stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainChoice {
    pub name: String,
    pub selected: bool,
}

/// Row shown on the interview list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewSummary {
    pub id: RecordId,
    pub date: Option<NaiveDate>,
    pub candidate_name: String,
    pub candidate_role: String,
    pub interviewer: Option<Interviewer>,
    pub overall_score: Option<f64>,
}

impl InterviewSummary {
    pub(crate) fn from_interview(id: RecordId, interview: &Interview) -> Self {
        Self {
            id,
            date: interview.date,
            candidate_name: interview.candidate.name.clone(),
            candidate_role: interview.candidate.current_role.clone(),
            interviewer: interview.interviewer.clone(),
            overall_score: interview.overall_score,
        }
    }
}

/// Screens of the interview workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    List,
    MainInfo,
    Domains,
    Questions,
    Closing,
    NeedConfig,
}

impl Screen {
    pub const fn label(self) -> &'static str {
        match self {
            Self::List => "Interview list",
            Self::MainInfo => "Main info",
            Self::Domains => "Domains",
            Self::Questions => "Questions",
            Self::Closing => "Closing",
            Self::NeedConfig => "Configuration required",
        }
    }

    /// Screens that operate on an open draft.
    pub const fn edits_draft(self) -> bool {
        matches!(
            self,
            Self::MainInfo | Self::Domains | Self::Questions | Self::Closing
        )
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
