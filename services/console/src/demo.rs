use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::infra::{
    offline_oracle_factory, overlap_score, parse_domain, seeded_store, store_oracle_key,
    StaffDirectory,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use interview_ai::config::AppConfig;
use interview_ai::error::AppError;
use interview_ai::workflows::interview::{
    DraftEdit, InterviewSummary, InterviewWorkflow, MemoryRecordStore, QaEntry, SyncReport,
    WorkflowSettings,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Question CSV export (Question,Answer,Difficulty,Domain). Defaults to the bundled sample.
    #[arg(long)]
    pub(crate) questions_csv: Option<PathBuf>,
    /// Candidate name. Defaults to "Ada Lovelace".
    #[arg(long)]
    pub(crate) candidate: Option<String>,
    /// Candidate email. Defaults to an address derived from the name.
    #[arg(long)]
    pub(crate) email: Option<String>,
    /// Candidate years of experience. Defaults to 4.
    #[arg(long)]
    pub(crate) years: Option<u32>,
    /// Domain to interview on; repeat for several. Defaults to the first two bank domains.
    #[arg(long = "domain", value_parser = parse_domain)]
    pub(crate) domains: Vec<String>,
    /// Interviewer username in the staff directory.
    #[arg(long, default_value = "ghopper")]
    pub(crate) interviewer: String,
    /// Interview date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Seed for a reproducible question draw.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Override the rating animation step (milliseconds).
    #[arg(long)]
    pub(crate) step_ms: Option<u64>,
    /// Leave the oracle credential unset so answers are scored manually.
    #[arg(long)]
    pub(crate) manual_scoring: bool,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) async fn run_demo(config: &AppConfig, args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        questions_csv,
        candidate,
        email,
        years,
        domains,
        interviewer,
        date,
        seed,
        step_ms,
        manual_scoring,
    } = args;

    let store = seeded_store(questions_csv.as_deref()).await?;
    if !manual_scoring {
        store_oracle_key(&store).await?;
    }

    let mut settings = WorkflowSettings::from(&config.interview);
    if let Some(step_ms) = step_ms {
        settings.rating.step_interval = Duration::from_millis(step_ms);
    }
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut workflow = InterviewWorkflow::new(store, Arc::new(StaffDirectory::new()), settings)
        .with_oracle_factory(offline_oracle_factory())
        .with_rng(rng);

    println!("Interview workflow demo");
    workflow.load().await?;
    println!(
        "Question bank: {} questions across {}",
        workflow.bank().len(),
        workflow.bank().domains().join(", ")
    );
    println!(
        "Assisted rating: {}",
        if workflow.rating_available() {
            "offline oracle"
        } else {
            "disabled, scoring manually"
        }
    );

    let name = candidate.unwrap_or_else(|| "Ada Lovelace".to_string());
    let email = email.unwrap_or_else(|| derive_email(&name));
    workflow.start_new()?;
    for edit in [
        DraftEdit::CandidateName(name),
        DraftEdit::CandidateEmail(email),
        DraftEdit::CandidateCurrentRole("Software engineer".to_string()),
        DraftEdit::CandidateYearsOfExperience(years.unwrap_or(4)),
        DraftEdit::InterviewDate(date.unwrap_or_else(|| Local::now().date_naive())),
    ] {
        workflow.edit(edit)?;
    }
    workflow.choose_interviewer(&interviewer).await?;
    print_screen(&workflow);
    workflow.next()?;

    let domains = if domains.is_empty() {
        workflow.bank().domains().into_iter().take(2).collect()
    } else {
        domains
    };
    for domain in &domains {
        workflow.select_domain(domain, true)?;
    }
    print_screen(&workflow);
    println!("  Domains: {}", domains.join(", "));
    let report = workflow.generate_questions().await?;
    print_report("Draft saved", &report);
    workflow.next()?;

    print_screen(&workflow);
    let entries: Vec<QaEntry> = workflow.draft().qa_set.clone();
    for (position, entry) in entries.iter().enumerate() {
        let question = entry.question();
        let answer = scripted_answer(&question.reference_answer, position);
        println!(
            "  {}. [{} / {}] {}",
            position + 1,
            question.domain,
            question.difficulty,
            question.prompt
        );
        println!("     answer: {answer}");
        workflow.edit(DraftEdit::Answer {
            position,
            text: answer.clone(),
        })?;

        if workflow.rating_available() {
            let mut animation = workflow.start_rating(position).await?;
            let mut shown = Vec::new();
            while let Some(score) = animation.next_score().await {
                workflow.apply_rating_step(position, score)?;
                shown.push(score.to_string());
            }
            let end = animation.finish().await;
            println!("     rating: {} ({end:?})", shown.join(" "));
        } else {
            let score = overlap_score(&answer, &question.reference_answer);
            workflow.edit(DraftEdit::Score { position, score })?;
            println!("     rating: {score} (manual)");
        }
    }
    if let Some(overall) = workflow.draft().overall_score {
        println!("  Overall score: {overall:.1}/10");
    }
    workflow.next()?;

    print_screen(&workflow);
    let hire = workflow
        .draft()
        .overall_score
        .is_some_and(|overall| overall >= 6.0);
    workflow.edit(DraftEdit::ShouldHire(hire))?;
    workflow.edit(DraftEdit::Review(if hire {
        "Clear explanations grounded in practice.".to_string()
    } else {
        "Gaps in fundamentals; revisit in six months.".to_string()
    }))?;
    let report = workflow.save().await?;
    print_report("Interview saved", &report);
    println!("  Should hire: {}", if hire { "yes" } else { "no" });
    workflow.close()?;

    print_screen(&workflow);
    for summary in workflow.interviews() {
        println!("  {}", summary_line(summary));
    }
    Ok(())
}

fn print_screen(workflow: &InterviewWorkflow<MemoryRecordStore>) {
    println!("\n== {} ==", workflow.screen());
}

fn print_report(label: &str, report: &SyncReport) {
    println!(
        "  {label}: {} created, {} updated",
        report.created(),
        report.updated()
    );
}

fn summary_line(summary: &InterviewSummary) -> String {
    let date = summary
        .date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "undated".to_string());
    let interviewer = summary
        .interviewer
        .as_ref()
        .map_or("unassigned", |interviewer| interviewer.name.as_str());
    let score = summary
        .overall_score
        .map(|score| format!("{score:.1}"))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} {date} | {} ({}) | interviewer {interviewer} | score {score}",
        summary.id, summary.candidate_name, summary.candidate_role
    )
}

fn derive_email(name: &str) -> String {
    let local = name
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(".");
    format!("{local}@example.com")
}

/// Candidate answers of varying completeness: every third answer is off-topic.
fn scripted_answer(reference: &str, position: usize) -> String {
    let words: Vec<&str> = reference.split_whitespace().collect();
    match position % 3 {
        0 => reference.to_string(),
        1 => words[..words.len().div_ceil(2)].join(" "),
        _ => "I would look that up in the documentation".to_string(),
    }
}
