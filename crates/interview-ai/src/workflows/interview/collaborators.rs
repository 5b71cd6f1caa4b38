use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;

use super::domain::{Interviewer, InterviewerId};
use super::rating::RatingOracle;
use super::store::records::{decode, ConfigurationRecord, CONFIGURATION_KEY_FIELD};
use super::store::{Collection, RecordFilter, RecordStore, StoreError};

/// Configuration key holding the rating oracle credential.
pub const ORACLE_KEY_SETTING: &str = "oracle_api_key";

/// Directory lookup for interviewers.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, username: &str) -> Result<Interviewer, IdentityError>;

    async fn lookup(&self, id: InterviewerId) -> Result<Interviewer, IdentityError>;
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("no directory user named '{0}'")]
    UnknownUser(String),
    #[error("no directory user with id {0}")]
    UnknownId(InterviewerId),
    #[error("identity directory unavailable: {0}")]
    Unavailable(String),
}

/// Key/value settings source.
#[async_trait]
pub trait ConfigurationProvider: Send + Sync {
    /// Value stored under `key`; blank values count as absent.
    async fn value(&self, key: &str) -> Result<Option<String>, StoreError>;
}

/// Reads settings from the `configuration` collection of a record store.
pub struct StoreConfiguration<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> StoreConfiguration<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S> ConfigurationProvider for StoreConfiguration<S>
where
    S: RecordStore + ?Sized,
{
    async fn value(&self, key: &str) -> Result<Option<String>, StoreError> {
        let records = self
            .store
            .filter(
                Collection::Configuration,
                &RecordFilter::field_equals(CONFIGURATION_KEY_FIELD, key),
            )
            .await?;

        match records.first() {
            Some(record) => {
                let setting: ConfigurationRecord = decode(Collection::Configuration, record)?;
                let value = setting.value.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            None => Ok(None),
        }
    }
}

/// Builds the oracle client once the credential has been read from configuration.
pub type OracleFactory = Arc<dyn Fn(&str) -> Arc<dyn RatingOracle> + Send + Sync>;

/// Whether a credential has the `sk-` prefixed alphanumeric shape the oracle expects.
pub fn is_valid_oracle_key(key: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^sk-[A-Za-z0-9]+$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(key))
}
