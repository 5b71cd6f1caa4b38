use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use interview_ai::error::AppError;
use interview_ai::workflows::interview::{
    Collection, IdentityError, IdentityResolver, Interviewer, InterviewerId, MemoryRecordStore,
    OracleError, OracleFactory, QuestionCatalog, RatingOracle, RecordStore, WorkflowError,
    ORACLE_KEY_SETTING,
};
use regex::Regex;
use serde_json::json;
use tracing::info;

const SAMPLE_QUESTIONS: &str = include_str!("../data/sample_questions.csv");
/// Credential stored for the offline oracle; it only has to look like a real key.
pub(crate) const OFFLINE_ORACLE_KEY: &str = "sk-offlinedemo";

/// Provisioned store seeded from a question export, or the bundled sample when none is given.
pub(crate) async fn seeded_store(
    questions_csv: Option<&Path>,
) -> Result<Arc<MemoryRecordStore>, AppError> {
    let store = Arc::new(MemoryRecordStore::provisioned());
    let catalog = QuestionCatalog::new(store.clone());

    let imported = match questions_csv {
        Some(path) => catalog.import(File::open(path)?).await?,
        None => catalog.import(SAMPLE_QUESTIONS.as_bytes()).await?,
    };
    info!(count = imported.len(), "question bank seeded");
    Ok(store)
}

pub(crate) async fn store_oracle_key(store: &MemoryRecordStore) -> Result<(), AppError> {
    let setting = json!({ "key": ORACLE_KEY_SETTING, "value": OFFLINE_ORACLE_KEY });
    let fields = setting.as_object().cloned().unwrap_or_default();
    store
        .create(Collection::Configuration, fields)
        .await
        .map_err(WorkflowError::from)?;
    Ok(())
}

/// Fixed staff directory standing in for the organisation's user service.
pub(crate) struct StaffDirectory {
    users: HashMap<String, Interviewer>,
}

impl StaffDirectory {
    pub(crate) fn new() -> Self {
        let staff = [
            ("ghopper", 1, "Grace Hopper", "grace.hopper@example.com"),
            ("mhamilton", 2, "Margaret Hamilton", "margaret.hamilton@example.com"),
            ("kthompson", 3, "Ken Thompson", "ken.thompson@example.com"),
        ];
        let users = staff
            .into_iter()
            .map(|(username, id, name, email)| {
                (
                    username.to_string(),
                    Interviewer {
                        id: InterviewerId(id),
                        name: name.to_string(),
                        email: email.to_string(),
                    },
                )
            })
            .collect();
        Self { users }
    }
}

#[async_trait]
impl IdentityResolver for StaffDirectory {
    async fn resolve(&self, username: &str) -> Result<Interviewer, IdentityError> {
        self.users
            .get(username.trim())
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

/// Offline oracle: rates an answer by how many reference-answer words it repeats.
pub(crate) struct OverlapOracle;

#[async_trait]
impl RatingOracle for OverlapOracle {
    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, OracleError> {
        static RATING_PROMPT: OnceLock<Option<Regex>> = OnceLock::new();
        let pattern = RATING_PROMPT
            .get_or_init(|| {
                Regex::new(r"(?s)this answer '(.*)' corresponds to the actual answer '(.*)', how much")
                    .ok()
            })
            .as_ref()
            .ok_or_else(|| OracleError::Transport("rating prompt pattern unavailable".to_string()))?;

        let captures = pattern.captures(prompt).ok_or_else(|| {
            OracleError::Transport("offline oracle only rates answers".to_string())
        })?;
        let answer = captures.get(1).map_or("", |m| m.as_str());
        let reference = captures.get(2).map_or("", |m| m.as_str());
        Ok(overlap_score(answer, reference).to_string())
    }
}

pub(crate) fn offline_oracle_factory() -> OracleFactory {
    Arc::new(|_key: &str| -> Arc<dyn RatingOracle> { Arc::new(OverlapOracle) })
}

/// Share of distinct reference words present in the answer, scaled to 0..=10.
pub(crate) fn overlap_score(answer: &str, reference: &str) -> u8 {
    let reference_words = words(reference);
    if reference_words.is_empty() {
        return 0;
    }
    let answer_words = words(answer);
    let shared = reference_words.intersection(&answer_words).count();
    let ratio = shared as f64 / reference_words.len() as f64;
    (ratio * 10.0).round().clamp(0.0, 10.0) as u8
}

fn words(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

pub(crate) fn parse_domain(raw: &str) -> Result<String, String> {
    let domain = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if domain.is_empty() {
        Err("domain must not be blank".to_string())
    } else {
        Ok(domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_ai::workflows::interview::rating::rating_prompt;

    #[test]
    fn overlap_score_scales_shared_reference_words() {
        assert_eq!(overlap_score("", "Each value has one owner"), 0);
        assert_eq!(overlap_score("each VALUE has one owner!", "Each value has one owner"), 10);
        assert_eq!(overlap_score("one owner", "Each value has one owner"), 4);
        assert_eq!(overlap_score("anything", ""), 0);
    }

    #[tokio::test]
    async fn overlap_oracle_reads_the_rating_prompt() {
        let prompt = rating_prompt("a value has one owner", "Each value has one owner");
        let reply = OverlapOracle.complete(&prompt, 16).await.expect("rated");
        assert_eq!(reply, "8");

        assert!(matches!(
            OverlapOracle.complete("Describe a mutex", 16).await,
            Err(OracleError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn staff_directory_resolves_usernames_and_ids() {
        let directory = StaffDirectory::new();
        let grace = directory.resolve("ghopper").await.expect("known user");
        assert_eq!(
            directory.lookup(grace.id).await.expect("known id").name,
            "Grace Hopper"
        );
        assert!(matches!(
            directory.resolve("nobody").await,
            Err(IdentityError::UnknownUser(_))
        ));
    }

    #[tokio::test]
    async fn bundled_sample_seeds_the_question_collection() {
        let store = seeded_store(None).await.expect("sample imports");
        assert!(store.count(Collection::Questions) >= 12);
    }

    #[test]
    fn parse_domain_collapses_whitespace() {
        assert_eq!(parse_domain("  Dev   Ops "), Ok("Dev Ops".to_string()));
        assert!(parse_domain("   ").is_err());
    }
}
