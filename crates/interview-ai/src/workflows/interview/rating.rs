use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::domain::QaEntry;
use super::scoring::MAX_SCORE;

/// External text-completion service used to judge answers.
#[async_trait]
pub trait RatingOracle: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, OracleError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("rating oracle transport failed: {0}")]
    Transport(String),
    #[error("rating oracle returned no completion")]
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("rating oracle answered '{0}', which is not a whole number")]
    NotNumeric(String),
    #[error("rating oracle answered {0}, outside 0..={MAX_SCORE}")]
    OutOfRange(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingSettings {
    /// Delay between consecutive score increments.
    pub step_interval: Duration,
    pub max_tokens: u32,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            step_interval: Duration::from_millis(750),
            max_tokens: 2000,
        }
    }
}

pub fn rating_prompt(answer: &str, reference_answer: &str) -> String {
    format!(
        "if you had to rate how much this answer '{answer}' corresponds to the actual answer \
         '{reference_answer}', how much would you give if you gave a number between 0 and \
         {MAX_SCORE}? Answer with the number only and judge harshly"
    )
}

/// Parse the oracle's completion as a whole-number score in 0..=10.
pub fn parse_rating(raw: &str) -> Result<u8, RatingError> {
    let trimmed = raw.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|_| RatingError::NotNumeric(trimmed.to_string()))?;

    match u8::try_from(value) {
        Ok(score) if score <= MAX_SCORE => Ok(score),
        _ => Err(RatingError::OutOfRange(value)),
    }
}

/// How an animation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEnd {
    Completed,
    Cancelled,
}

/// Score counter running on its own timer task.
///
/// Emits 0 immediately, then one increment per interval up to the target. The cancel
/// token is checked before every increment.
#[derive(Debug)]
pub struct RatingAnimation {
    target: u8,
    scores: mpsc::UnboundedReceiver<u8>,
    cancel: CancellationToken,
    task: JoinHandle<AnimationEnd>,
}

impl RatingAnimation {
    pub fn start(target: u8, interval: Duration, cancel: CancellationToken) -> Self {
        let (sender, scores) = mpsc::unbounded_channel();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            if sender.send(0).is_err() {
                return AnimationEnd::Cancelled;
            }

            for score in 1..=target {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(score, target, "rating animation cancelled");
                        return AnimationEnd::Cancelled;
                    }
                    _ = tokio::time::sleep(interval) => {}
                }

                if token.is_cancelled() || sender.send(score).is_err() {
                    return AnimationEnd::Cancelled;
                }
            }

            AnimationEnd::Completed
        });

        Self {
            target,
            scores,
            cancel,
            task,
        }
    }

    pub fn target(&self) -> u8 {
        self.target
    }

    /// Next displayed score, or `None` once the animation has stopped.
    pub async fn next_score(&mut self) -> Option<u8> {
        self.scores.recv().await
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn finish(self) -> AnimationEnd {
        self.task.await.unwrap_or(AnimationEnd::Cancelled)
    }
}

/// Asks the oracle for a judgment and animates the entry's score toward it.
pub struct AssistedRatingController {
    oracle: Arc<dyn RatingOracle>,
    settings: RatingSettings,
}

impl AssistedRatingController {
    pub fn new(oracle: Arc<dyn RatingOracle>, settings: RatingSettings) -> Self {
        Self { oracle, settings }
    }

    pub fn settings(&self) -> RatingSettings {
        self.settings
    }

    /// Ask the oracle how well the entry's answer matches its reference answer.
    pub async fn judge(&self, entry: &QaEntry) -> Result<u8, RatingError> {
        let prompt = rating_prompt(&entry.answer, &entry.question().reference_answer);
        let completion = self
            .oracle
            .complete(&prompt, self.settings.max_tokens)
            .await
            .inspect_err(|err| warn!(question = %entry.question().id, error = %err, "rating oracle failed"))?;

        let target = parse_rating(&completion).inspect_err(
            |err| warn!(question = %entry.question().id, error = %err, "unusable oracle rating"),
        )?;
        info!(question = %entry.question().id, target, "oracle rating received");
        Ok(target)
    }

    /// Judge the entry, then start the counting animation toward the judged score.
    ///
    /// Nothing is emitted when the oracle fails, so the entry keeps its current score.
    pub async fn rate(
        &self,
        entry: &QaEntry,
        cancel: CancellationToken,
    ) -> Result<RatingAnimation, RatingError> {
        let target = self.judge(entry).await?;
        Ok(RatingAnimation::start(
            target,
            self.settings.step_interval,
            cancel,
        ))
    }

    /// Ask the oracle to draft a reference answer for a question prompt.
    pub async fn suggest_answer(&self, prompt: &str) -> Result<String, OracleError> {
        suggest_answer(self.oracle.as_ref(), prompt, self.settings.max_tokens).await
    }
}

pub(crate) async fn suggest_answer(
    oracle: &dyn RatingOracle,
    prompt: &str,
    max_tokens: u32,
) -> Result<String, OracleError> {
    let completion = oracle.complete(prompt, max_tokens).await?;
    let answer = completion.trim_start_matches(['\n', '\r']).trim_end();
    if answer.is_empty() {
        return Err(OracleError::Empty);
    }
    Ok(answer.to_string())
}
