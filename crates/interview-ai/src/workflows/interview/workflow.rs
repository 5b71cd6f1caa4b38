use std::collections::BTreeSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::bank::QuestionBank;
use super::collaborators::{
    is_valid_oracle_key, ConfigurationProvider, IdentityError, IdentityResolver, OracleFactory,
    StoreConfiguration, ORACLE_KEY_SETTING,
};
use super::domain::{DomainChoice, Interview, InterviewSummary, RecordId, Screen};
use super::draft::{DraftEdit, EditError};
use super::history::{load_interview, load_interviews, HistoryError};
use super::rating::{
    AnimationEnd, AssistedRatingController, RatingAnimation, RatingError, RatingSettings,
};
use super::selection::{into_entries, SelectionEngine, DEFAULT_QUESTION_LIMIT};
use super::store::{Collection, RecordStore, StoreError};
use super::sync::{PersistenceSynchronizer, RetryPolicy, SyncError, SyncFailure, SyncReport};
use crate::config::InterviewConfig;

/// Tunables the workflow hands to its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub question_limit: usize,
    pub rating: RatingSettings,
    pub retry: RetryPolicy,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            question_limit: DEFAULT_QUESTION_LIMIT,
            rating: RatingSettings::default(),
            retry: RetryPolicy::none(),
        }
    }
}

impl From<&InterviewConfig> for WorkflowSettings {
    fn from(config: &InterviewConfig) -> Self {
        Self {
            question_limit: config.max_questions,
            rating: RatingSettings {
                step_interval: config.rating_step,
                max_tokens: config.rating_max_tokens,
            },
            retry: RetryPolicy {
                max_attempts: config.save_attempts,
                backoff: config.save_backoff,
            },
        }
    }
}

/// Required fields left empty at a gated transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Please fill in the required fields: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

/// Coarse classification used by hosts to decide how to surface a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Blocking: the store is not provisioned.
    ConfigurationMissing,
    Validation,
    ExternalService,
    Persistence,
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("record store is missing the '{0}' collection")]
    ConfigurationMissing(Collection),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("cannot {action} from the {from} screen")]
    InvalidTransition { from: Screen, action: &'static str },
    #[error("domains are locked once questions have been generated")]
    DomainsLocked,
    #[error("unknown domain '{0}'")]
    UnknownDomain(String),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("assisted rating is not configured")]
    RatingUnavailable,
    #[error(transparent)]
    Rating(#[from] RatingError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::ConfigurationMissing(_) => ErrorKind::ConfigurationMissing,
            WorkflowError::Sync(err) if matches!(err.source, SyncFailure::MissingInterviewer) => {
                ErrorKind::Validation
            }
            WorkflowError::Validation(_)
            | WorkflowError::InvalidTransition { .. }
            | WorkflowError::DomainsLocked
            | WorkflowError::UnknownDomain(_)
            | WorkflowError::Edit(_) => ErrorKind::Validation,
            WorkflowError::RatingUnavailable
            | WorkflowError::Rating(_)
            | WorkflowError::Identity(_) => ErrorKind::ExternalService,
            WorkflowError::Sync(_) | WorkflowError::Store(_) => ErrorKind::Persistence,
        }
    }
}

impl From<HistoryError> for WorkflowError {
    fn from(value: HistoryError) -> Self {
        match value {
            HistoryError::Store(err) => Self::Store(err),
            HistoryError::Identity(err) => Self::Identity(err),
        }
    }
}

/// Top-level orchestrator for one interview session.
///
/// Owns the draft, sequences the screens, and gates forward transitions. Every draft
/// change goes through [`Interview::apply`], so the draft itself is only ever replaced.
pub struct InterviewWorkflow<S: ?Sized> {
    store: Arc<S>,
    identity: Arc<dyn IdentityResolver>,
    configuration: Arc<dyn ConfigurationProvider>,
    oracle_factory: Option<OracleFactory>,
    synchronizer: PersistenceSynchronizer<S>,
    selection: SelectionEngine,
    rating_settings: RatingSettings,
    rating: Option<Arc<AssistedRatingController>>,
    rng: StdRng,
    screen: Screen,
    bank: QuestionBank,
    domains: Vec<DomainChoice>,
    interviews: Vec<InterviewSummary>,
    draft: Interview,
    message: Option<String>,
    saved: bool,
    session: CancellationToken,
}

impl<S> InterviewWorkflow<S>
where
    S: RecordStore + ?Sized + 'static,
{
    pub fn new(
        store: Arc<S>,
        identity: Arc<dyn IdentityResolver>,
        settings: WorkflowSettings,
    ) -> Self {
        let configuration: Arc<dyn ConfigurationProvider> =
            Arc::new(StoreConfiguration::new(store.clone()));
        let synchronizer = PersistenceSynchronizer::new(store.clone()).with_retry(settings.retry);

        Self {
            store,
            identity,
            configuration,
            oracle_factory: None,
            synchronizer,
            selection: SelectionEngine::new(settings.question_limit),
            rating_settings: settings.rating,
            rating: None,
            rng: StdRng::from_entropy(),
            screen: Screen::List,
            bank: QuestionBank::default(),
            domains: Vec::new(),
            interviews: Vec::new(),
            draft: Interview::draft(),
            message: None,
            saved: false,
            session: CancellationToken::new(),
        }
    }

    pub fn with_configuration(mut self, configuration: Arc<dyn ConfigurationProvider>) -> Self {
        self.configuration = configuration;
        self
    }

    /// Assisted rating is enabled at [`load`](Self::load) when this factory is set and
    /// the oracle credential is configured.
    pub fn with_oracle_factory(mut self, factory: OracleFactory) -> Self {
        self.oracle_factory = Some(factory);
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Verify the store, then load the question bank, the interview list and the
    /// rating configuration. A missing collection parks the workflow on `NeedConfig`.
    ///
    /// An open draft is discarded the same way [`close`](Self::close) discards it.
    pub async fn load(&mut self) -> Result<(), WorkflowError> {
        if self.screen.edits_draft() {
            debug!(screen = %self.screen, "reload discards the open draft");
            self.discard_draft();
        }
        for collection in Collection::all() {
            if !self.store.has_collection(collection).await? {
                warn!(%collection, "record store is not provisioned");
                self.screen = Screen::NeedConfig;
                self.message = Some(format!(
                    "We could not find the '{collection}' collection; provision the record store first"
                ));
                return Err(WorkflowError::ConfigurationMissing(collection));
            }
        }

        self.bank = QuestionBank::load(self.store.as_ref()).await?;
        self.domains = domain_choices(&self.bank, &[]);
        self.interviews = load_interviews(self.store.as_ref(), self.identity.as_ref()).await?;
        self.rating = self.configure_rating().await;
        self.screen = Screen::List;

        info!(
            questions = self.bank.len(),
            interviews = self.interviews.len(),
            assisted_rating = self.rating.is_some(),
            "interview workflow loaded"
        );
        Ok(())
    }

    async fn configure_rating(&self) -> Option<Arc<AssistedRatingController>> {
        let factory = self.oracle_factory.as_ref()?;

        match self.configuration.value(ORACLE_KEY_SETTING).await {
            Ok(Some(key)) => {
                if !is_valid_oracle_key(&key) {
                    warn!("rating oracle key has an unexpected format");
                }
                Some(Arc::new(AssistedRatingController::new(
                    factory(key.as_str()),
                    self.rating_settings,
                )))
            }
            Ok(None) => {
                info!("no rating oracle key configured; assisted rating disabled");
                None
            }
            Err(err) => {
                warn!(error = %err, "configuration unavailable; assisted rating disabled");
                None
            }
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn draft(&self) -> &Interview {
        &self.draft
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn domains(&self) -> &[DomainChoice] {
        &self.domains
    }

    pub fn selected_domains(&self) -> BTreeSet<String> {
        self.domains
            .iter()
            .filter(|choice| choice.selected)
            .map(|choice| choice.name.clone())
            .collect()
    }

    pub fn interviews(&self) -> &[InterviewSummary] {
        &self.interviews
    }

    /// Latest validation or failure message for the host to display.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn dismiss_message(&mut self) {
        self.message = None;
    }

    /// Whether the draft matches what was last written to the store.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn rating_available(&self) -> bool {
        self.rating.is_some()
    }

    /// Child token that is cancelled when the current draft is closed.
    pub fn rating_token(&self) -> CancellationToken {
        self.session.child_token()
    }

    pub fn start_new(&mut self) -> Result<(), WorkflowError> {
        self.require_screen(Screen::List, "start a new interview")?;
        self.open_draft(Interview::draft(), false);
        Ok(())
    }

    /// Reopen a persisted interview on the main-info screen.
    pub async fn reopen(&mut self, id: RecordId) -> Result<(), WorkflowError> {
        self.require_screen(Screen::List, "open an interview")?;
        let interview =
            load_interview(self.store.as_ref(), self.identity.as_ref(), &self.bank, id).await?;
        self.open_draft(interview, true);
        Ok(())
    }

    fn open_draft(&mut self, draft: Interview, saved: bool) {
        self.domains = domain_choices(&self.bank, &draft.qa_domains());
        self.draft = draft;
        self.saved = saved;
        self.message = None;
        self.session = CancellationToken::new();
        self.transition(Screen::MainInfo);
    }

    pub fn next(&mut self) -> Result<Screen, WorkflowError> {
        let target = match self.screen {
            Screen::MainInfo => {
                self.validate_main_info()?;
                Screen::Domains
            }
            Screen::Domains => Screen::Questions,
            Screen::Questions => Screen::Closing,
            from => {
                return Err(WorkflowError::InvalidTransition {
                    from,
                    action: "advance",
                })
            }
        };
        self.transition(target);
        Ok(target)
    }

    pub fn previous(&mut self) -> Result<Screen, WorkflowError> {
        let target = match self.screen {
            Screen::Closing => Screen::Questions,
            Screen::Questions => Screen::Domains,
            Screen::Domains => Screen::MainInfo,
            from => {
                return Err(WorkflowError::InvalidTransition {
                    from,
                    action: "go back",
                })
            }
        };
        self.transition(target);
        Ok(target)
    }

    /// Discard the in-memory draft without saving and return to the list.
    ///
    /// Running rating animations are cancelled; an in-flight save is not.
    pub fn close(&mut self) -> Result<(), WorkflowError> {
        self.require_draft("close")?;
        self.discard_draft();
        self.domains = domain_choices(&self.bank, &[]);
        self.message = None;
        self.transition(Screen::List);
        Ok(())
    }

    fn discard_draft(&mut self) {
        self.session.cancel();
        self.session = CancellationToken::new();
        self.draft = Interview::draft();
        self.saved = false;
    }

    pub fn edit(&mut self, edit: DraftEdit) -> Result<(), WorkflowError> {
        self.require_draft("edit the interview")?;
        self.draft = self.draft.apply(edit)?;
        self.saved = false;
        Ok(())
    }

    pub async fn choose_interviewer(&mut self, username: &str) -> Result<(), WorkflowError> {
        self.require_draft("choose an interviewer")?;
        let interviewer = self.identity.resolve(username).await?;
        self.edit(DraftEdit::Interviewer(interviewer))
    }

    pub fn select_domain(&mut self, name: &str, selected: bool) -> Result<(), WorkflowError> {
        self.require_screen(Screen::Domains, "choose domains")?;
        if !self.draft.qa_set.is_empty() {
            return Err(WorkflowError::DomainsLocked);
        }
        let choice = self
            .domains
            .iter_mut()
            .find(|choice| choice.name == name)
            .ok_or_else(|| WorkflowError::UnknownDomain(name.to_string()))?;
        choice.selected = selected;
        self.saved = false;
        Ok(())
    }

    /// Draw the QA set for the selected domains, then save the draft immediately.
    pub async fn generate_questions(&mut self) -> Result<SyncReport, WorkflowError> {
        self.require_screen(Screen::Domains, "generate questions")?;
        if !self.draft.qa_set.is_empty() {
            return Err(WorkflowError::DomainsLocked);
        }

        let questions = self.selection.select(
            &self.bank,
            &self.selected_domains(),
            self.draft.candidate.years_of_experience,
            &mut self.rng,
        );
        info!(count = questions.len(), "questions generated");
        self.draft = self.draft.with_qa_set(into_entries(questions));
        self.saved = false;

        self.save().await
    }

    pub async fn save(&mut self) -> Result<SyncReport, WorkflowError> {
        self.require_draft("save")?;

        match self.synchronizer.save(&self.draft).await {
            Ok(saved) => {
                self.draft = saved.interview;
                self.saved = true;
                self.remember_summary();
                Ok(saved.report)
            }
            Err(err) => {
                self.draft = err.partial.as_ref().clone();
                self.saved = false;
                self.message = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Ask the oracle to judge one entry and return the running score animation.
    ///
    /// The host feeds each emitted score back through [`apply_rating_step`](Self::apply_rating_step).
    pub async fn start_rating(&mut self, position: usize) -> Result<RatingAnimation, WorkflowError> {
        self.require_screen(Screen::Questions, "rate an answer")?;
        let controller = self.rating.clone().ok_or(WorkflowError::RatingUnavailable)?;
        let entry = self
            .draft
            .entry(position)
            .cloned()
            .ok_or(EditError::UnknownEntry(position))?;

        match controller.rate(&entry, self.rating_token()).await {
            Ok(animation) => Ok(animation),
            Err(err) => {
                self.message = Some(format!("Something went wrong while rating: {err}"));
                Err(err.into())
            }
        }
    }

    pub fn apply_rating_step(&mut self, position: usize, score: u8) -> Result<(), WorkflowError> {
        self.edit(DraftEdit::Score { position, score })
    }

    /// Rate one entry and apply every animation step until it completes or is cancelled.
    pub async fn rate_entry(&mut self, position: usize) -> Result<AnimationEnd, WorkflowError> {
        let mut animation = self.start_rating(position).await?;
        while let Some(score) = animation.next_score().await {
            self.apply_rating_step(position, score)?;
        }
        Ok(animation.finish().await)
    }

    fn validate_main_info(&mut self) -> Result<(), ValidationError> {
        let candidate = &self.draft.candidate;
        let mut missing = Vec::new();
        if candidate.name.trim().is_empty() {
            missing.push("candidate name");
        }
        if candidate.email.trim().is_empty() {
            missing.push("candidate email");
        }

        if missing.is_empty() {
            self.message = None;
            return Ok(());
        }

        let err = ValidationError { missing };
        self.message = Some(err.to_string());
        Err(err)
    }

    fn remember_summary(&mut self) {
        let Some(id) = self.draft.persistence.id() else {
            return;
        };
        let summary = InterviewSummary::from_interview(id, &self.draft);
        match self.interviews.iter_mut().find(|known| known.id == id) {
            Some(existing) => *existing = summary,
            None => self.interviews.push(summary),
        }
    }

    fn require_screen(&self, screen: Screen, action: &'static str) -> Result<(), WorkflowError> {
        if self.screen == screen {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                from: self.screen,
                action,
            })
        }
    }

    fn require_draft(&self, action: &'static str) -> Result<(), WorkflowError> {
        if self.screen.edits_draft() {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                from: self.screen,
                action,
            })
        }
    }

    fn transition(&mut self, target: Screen) {
        debug!(from = %self.screen, to = %target, "screen transition");
        self.screen = target;
    }
}

/// Bank domains with `selected` marking exactly the given names. Selected names missing
/// from the bank are appended so the selection never loses a QA-set domain.
fn domain_choices(bank: &QuestionBank, selected: &[String]) -> Vec<DomainChoice> {
    let mut choices: Vec<DomainChoice> = bank
        .domains()
        .into_iter()
        .map(|name| DomainChoice {
            selected: selected.contains(&name),
            name,
        })
        .collect();

    for name in selected {
        if !choices.iter().any(|choice| &choice.name == name) {
            choices.push(DomainChoice {
                name: name.clone(),
                selected: true,
            });
        }
    }
    choices
}
