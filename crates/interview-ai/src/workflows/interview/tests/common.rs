use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

use crate::workflows::interview::collaborators::{
    IdentityError, IdentityResolver, OracleFactory, ORACLE_KEY_SETTING,
};
use crate::workflows::interview::domain::{
    Difficulty, Interview, Interviewer, InterviewerId, QaEntry, Question, RecordId,
};
use crate::workflows::interview::rating::{OracleError, RatingOracle, RatingSettings};
use crate::workflows::interview::store::{
    Collection, Fields, MemoryRecordStore, Record, RecordFilter, RecordStore, StoreError,
};
use crate::workflows::interview::sync::RetryPolicy;
use crate::workflows::interview::{InterviewWorkflow, WorkflowSettings};

pub(super) const STEP: Duration = Duration::from_millis(750);

pub(super) fn question(id: u64, domain: &str, difficulty: Difficulty) -> Question {
    Question {
        id: RecordId(id),
        prompt: format!("{domain} question {id}"),
        reference_answer: format!("reference answer {id}"),
        difficulty,
        domain: domain.to_string(),
    }
}

pub(super) fn fields(value: serde_json::Value) -> Fields {
    value.as_object().cloned().expect("object literal")
}

pub(super) fn interviewer() -> Interviewer {
    Interviewer {
        id: InterviewerId(42),
        name: "Grace Hopper".to_string(),
        email: "grace@example.com".to_string(),
    }
}

/// Transient draft with a named candidate, an interviewer and `count` unscored entries.
pub(super) fn draft_with_entries(count: u64) -> Interview {
    let mut interview = Interview::draft();
    interview.candidate.name = "Ada Lovelace".to_string();
    interview.candidate.email = "ada@example.com".to_string();
    interview.interviewer = Some(interviewer());
    interview.qa_set = (1..=count)
        .map(|id| QaEntry::new(question(id, "Backend", Difficulty::Medium)))
        .collect();
    interview
}

/// Seed `questions` collection rows; returns the assigned ids in order.
pub(super) async fn seed_questions(
    store: &MemoryRecordStore,
    rows: &[(&str, Difficulty)],
) -> Vec<RecordId> {
    let mut ids = Vec::with_capacity(rows.len());
    for (index, (domain, difficulty)) in rows.iter().enumerate() {
        let id = store
            .create(
                Collection::Questions,
                fields(json!({
                    "prompt": format!("{domain} question {index}"),
                    "answer": format!("reference answer {index}"),
                    "difficulty": difficulty.label(),
                    "domain": domain,
                })),
            )
            .await
            .expect("seed question");
        ids.push(id);
    }
    ids
}

pub(super) async fn seed_oracle_key(store: &MemoryRecordStore, value: &str) {
    store
        .create(
            Collection::Configuration,
            fields(json!({ "key": ORACLE_KEY_SETTING, "value": value })),
        )
        .await
        .expect("seed oracle key");
}

/// Provisioned store holding eight easy/medium Backend questions and three Frontend ones.
pub(super) async fn stocked_store() -> Arc<MemoryRecordStore> {
    let store = Arc::new(MemoryRecordStore::provisioned());
    seed_questions(
        &store,
        &[
            ("Backend", Difficulty::Easy),
            ("Backend", Difficulty::Medium),
            ("Frontend", Difficulty::Easy),
            ("Backend", Difficulty::Easy),
            ("Backend", Difficulty::Medium),
            ("Frontend", Difficulty::Medium),
            ("Backend", Difficulty::Easy),
            ("Backend", Difficulty::Medium),
            ("Frontend", Difficulty::Hard),
            ("Backend", Difficulty::Easy),
            ("Backend", Difficulty::Medium),
        ],
    )
    .await;
    store.clear_journal();
    store
}

pub(super) fn settings() -> WorkflowSettings {
    WorkflowSettings {
        question_limit: 5,
        rating: RatingSettings {
            step_interval: STEP,
            max_tokens: 2000,
        },
        retry: RetryPolicy::none(),
    }
}

pub(super) fn workflow(store: Arc<MemoryRecordStore>) -> InterviewWorkflow<MemoryRecordStore> {
    InterviewWorkflow::new(store, Arc::new(Directory::with_staff()), settings())
        .with_rng(StdRng::seed_from_u64(7))
}

pub(super) fn oracle_factory(oracle: Arc<ScriptedOracle>) -> OracleFactory {
    Arc::new(move |_key: &str| -> Arc<dyn RatingOracle> { oracle.clone() })
}

/// Identity directory keyed by username.
#[derive(Default)]
pub(super) struct Directory {
    users: HashMap<String, Interviewer>,
}

impl Directory {
    pub(super) fn with_staff() -> Self {
        let mut users = HashMap::new();
        users.insert("ghopper".to_string(), interviewer());
        users.insert(
            "aturing".to_string(),
            Interviewer {
                id: InterviewerId(7),
                name: "Alan Turing".to_string(),
                email: "alan@example.com".to_string(),
            },
        );
        Self { users }
    }
}

#[async_trait]
impl IdentityResolver for Directory {
    async fn resolve(&self, username: &str) -> Result<Interviewer, IdentityError> {
        self.users
            .get(username)
            .cloned()
            .ok_or_else(|| IdentityError::UnknownUser(username.to_string()))
    }

    async fn lookup(&self, id: InterviewerId) -> Result<Interviewer, IdentityError> {
        self.users
            .values()
            .find(|user| user.id == id)
            .cloned()
            .ok_or(IdentityError::UnknownId(id))
    }
}

/// Oracle replaying canned completions in order.
#[derive(Default)]
pub(super) struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String, OracleError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub(super) fn replying(replies: Vec<Result<String, OracleError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("oracle mutex poisoned").clone()
    }
}

#[async_trait]
impl RatingOracle for ScriptedOracle {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, OracleError> {
        self.prompts
            .lock()
            .expect("oracle mutex poisoned")
            .push(prompt.to_string());
        self.replies
            .lock()
            .expect("oracle mutex poisoned")
            .pop_front()
            .unwrap_or(Err(OracleError::Empty))
    }
}

/// Memory store whose writes to chosen collections fail a set number of times.
#[derive(Default)]
pub(super) struct FailingStore {
    pub(super) inner: MemoryRecordStore,
    failures: Mutex<HashMap<Collection, (u32, bool)>>,
    attempts: Mutex<Vec<Collection>>,
}

impl FailingStore {
    pub(super) fn new(inner: MemoryRecordStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Fail the next `times` writes to `collection`; transient failures are retryable.
    pub(super) fn fail_writes(&self, collection: Collection, times: u32, transient: bool) {
        self.failures
            .lock()
            .expect("failure mutex poisoned")
            .insert(collection, (times, transient));
    }

    pub(super) fn attempts(&self, collection: Collection) -> usize {
        self.attempts
            .lock()
            .expect("attempt mutex poisoned")
            .iter()
            .filter(|attempted| **attempted == collection)
            .count()
    }

    fn check(&self, collection: Collection) -> Result<(), StoreError> {
        self.attempts
            .lock()
            .expect("attempt mutex poisoned")
            .push(collection);
        let mut failures = self.failures.lock().expect("failure mutex poisoned");
        match failures.get_mut(&collection) {
            Some((remaining, transient)) if *remaining > 0 => {
                *remaining -= 1;
                if *transient {
                    Err(StoreError::Unavailable("list service timed out".to_string()))
                } else {
                    Err(StoreError::Rejected("field validation failed".to_string()))
                }
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn has_collection(&self, collection: Collection) -> Result<bool, StoreError> {
        self.inner.has_collection(collection).await
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Record>, StoreError> {
        self.inner.list(collection).await
    }

    async fn get_by_id(&self, collection: Collection, id: RecordId) -> Result<Record, StoreError> {
        self.inner.get_by_id(collection, id).await
    }

    async fn filter(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> Result<Vec<Record>, StoreError> {
        self.inner.filter(collection, filter).await
    }

    async fn create(&self, collection: Collection, fields: Fields) -> Result<RecordId, StoreError> {
        self.check(collection)?;
        self.inner.create(collection, fields).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: RecordId,
        fields: Fields,
    ) -> Result<(), StoreError> {
        self.check(collection)?;
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: Collection, id: RecordId) -> Result<(), StoreError> {
        self.check(collection)?;
        self.inner.delete(collection, id).await
    }
}
