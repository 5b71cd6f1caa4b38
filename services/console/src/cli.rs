use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::demo::{run_demo, DemoArgs};
use crate::infra::{parse_domain, seeded_store};
use clap::{Args, Parser, Subcommand};
use interview_ai::config::AppConfig;
use interview_ai::error::AppError;
use interview_ai::telemetry;
use interview_ai::workflows::interview::{Difficulty, QuestionBank, SelectionEngine, WorkflowError};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser, Debug)]
#[command(
    name = "Interview Workflow Engine",
    about = "Drive the interview workflow engine from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scripted interview session end to end (default command)
    Demo(DemoArgs),
    /// Inspect a question bank and preview question selection
    Questions {
        #[command(subcommand)]
        command: QuestionsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum QuestionsCommand {
    /// List the domains of the question bank with per-difficulty counts
    Domains(BankArgs),
    /// Draw a question set the way the workflow would
    Select(SelectArgs),
}

#[derive(Args, Debug)]
pub(crate) struct BankArgs {
    /// Question CSV export (Question,Answer,Difficulty,Domain). Defaults to the bundled sample.
    #[arg(long)]
    pub(crate) questions_csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct SelectArgs {
    #[command(flatten)]
    pub(crate) bank: BankArgs,
    /// Domain to draw from; repeat for several
    #[arg(long = "domain", required = true, value_parser = parse_domain)]
    pub(crate) domains: Vec<String>,
    /// Candidate years of experience
    #[arg(long, default_value_t = 0)]
    pub(crate) years: u32,
    /// Maximum number of questions (defaults to INTERVIEW_MAX_QUESTIONS)
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Seed for a reproducible draw
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let command = cli
        .command
        .unwrap_or_else(|| Command::Demo(DemoArgs::default()));

    match command {
        Command::Demo(args) => run_demo(&config, args).await,
        Command::Questions {
            command: QuestionsCommand::Domains(args),
        } => list_domains(args).await,
        Command::Questions {
            command: QuestionsCommand::Select(args),
        } => preview_selection(&config, args).await,
    }
}

async fn load_bank(args: &BankArgs) -> Result<QuestionBank, AppError> {
    let store = seeded_store(args.questions_csv.as_deref()).await?;
    let bank = QuestionBank::load(store.as_ref())
        .await
        .map_err(WorkflowError::from)?;
    Ok(bank)
}

async fn list_domains(args: BankArgs) -> Result<(), AppError> {
    let bank = load_bank(&args).await?;

    println!("{} questions", bank.len());
    for domain in bank.domains() {
        let in_domain: Vec<_> = bank
            .all_questions()
            .iter()
            .filter(|question| question.domain == domain)
            .collect();
        let counts: Vec<String> = Difficulty::ordered()
            .into_iter()
            .map(|difficulty| {
                let count = in_domain
                    .iter()
                    .filter(|question| question.difficulty == difficulty)
                    .count();
                format!("{difficulty} {count}")
            })
            .collect();
        println!("- {domain}: {} ({})", in_domain.len(), counts.join(", "));
    }
    Ok(())
}

async fn preview_selection(config: &AppConfig, args: SelectArgs) -> Result<(), AppError> {
    let bank = load_bank(&args.bank).await?;
    let engine = SelectionEngine::new(args.limit.unwrap_or(config.interview.max_questions));
    let domains: BTreeSet<String> = args.domains.into_iter().collect();
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let questions = engine.select(&bank, &domains, args.years, &mut rng);
    println!(
        "Selected {} of up to {} questions for {} years of experience",
        questions.len(),
        engine.limit(),
        args.years
    );
    for (index, question) in questions.iter().enumerate() {
        println!(
            "{:>2}. [{} / {}] {}",
            index + 1,
            question.domain,
            question.difficulty,
            question.prompt
        );
    }
    Ok(())
}
