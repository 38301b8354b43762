use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;

mod catalog;
mod config;
mod delay;
mod export;
mod issues;
mod literacy;
mod models;
mod report;
mod sample;
mod session;

use catalog::{FieldKind, LITERACY_ITEMS_TABLE};
use config::StudyConfig;
use session::{FinalizedRecord, Session};

#[derive(Parser)]
#[command(name = "tb-intake")]
#[command(about = "Data entry, delay calculation and literacy scoring for the TB care-delay study", long_about = None)]
struct Cli {
    /// Study configuration (TOML). Falls back to TB_INTAKE_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new participant ID
    NewId,
    /// List the form fields, their labels and allowed values
    Fields,
    /// Compute delays and the literacy score for one respondent
    Compute {
        #[arg(long)]
        onset: Option<String>,
        #[arg(long)]
        first_visit: Option<String>,
        #[arg(long)]
        diagnosis: Option<String>,
        #[arg(long)]
        treatment_start: Option<String>,
        /// Comma-separated answers in item order; leave an entry empty to skip it
        #[arg(long, value_delimiter = ',')]
        answers: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Finalize raw records (CSV or JSON) and export them as CSV
    Finalize {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "tb_study_export.csv")]
        out: PathBuf,
        /// Append the fabricated demonstration cohort after the real records
        #[arg(long)]
        with_samples: bool,
        /// Export records that are missing essential fields
        #[arg(long)]
        allow_incomplete: bool,
    },
    /// Write the fabricated demonstration cohort as CSV
    Sample {
        #[arg(long, default_value = "tb_study_sample.csv")]
        out: PathBuf,
        #[arg(long)]
        count: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Generate a markdown analytics report
    Report {
        /// Exported or raw records; the demonstration cohort when omitted
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Serialize)]
struct ComputeOutput<'a> {
    timeline: &'a delay::ValidationResult,
    delays: &'a models::DelayMetrics,
    delay_category: Option<models::DelayCategory>,
    literacy: &'a literacy::LiteracyReport,
    issues: &'a [issues::Issue],
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn finalize_all(sessions: &[Session], config: &StudyConfig) -> Vec<FinalizedRecord> {
    sessions.iter().map(|s| s.finalize(config)).collect()
}

fn days(value: Option<i64>) -> String {
    value.map_or("unknown".to_string(), |d| format!("{d} days"))
}

fn print_fields() {
    let mut current = None;
    for spec in catalog::FIELDS {
        if current != Some(spec.section) {
            current = Some(spec.section);
            println!("\n## {}", spec.section.title());
        }
        let label = match spec.label.ta {
            Some(ta) => format!("{} / {}", spec.label.en, ta),
            None => spec.label.en.to_string(),
        };
        let accepts = match spec.kind {
            FieldKind::Text => "text".to_string(),
            FieldKind::Integer { min, max } => format!("whole number {min}-{max}"),
            FieldKind::Date => "date (YYYY-MM-DD)".to_string(),
            FieldKind::Choice(options) => format!("one of: {}", options.join(" | ")),
            FieldKind::MultiChoice(options) => format!("any of: {}", options.join(" | ")),
            FieldKind::Bool => "yes/no".to_string(),
            FieldKind::LiteracyItem(index) => {
                let item = &LITERACY_ITEMS_TABLE[index];
                let reverse = if item.reverse_scored { ", reverse-scored" } else { "" };
                format!("{} | {} or 1-5{}", item.options[0], item.options[1], reverse)
            }
        };
        println!("- {}: {} [{}]", spec.key, label, accepts);
    }
    println!(
        "\nEssential before export: {}",
        catalog::ESSENTIAL_FIELDS.join(", ")
    );
}

fn print_computed(finalized: &FinalizedRecord) {
    let delays = &finalized.delays;
    println!("Patient delay: {}", days(delays.patient_delay_days));
    println!("Healthcare provider delay: {}", days(delays.provider_delay_days));
    println!("Treatment delay: {}", days(delays.treatment_delay_days));
    println!("Total delay: {}", days(delays.total_delay_days));
    match delays.no_delay {
        Some(no_delay) => println!("No delay: {no_delay}"),
        None => println!("No delay: unknown"),
    }
    if let Some(category) = delays.category() {
        println!("Delay category: {category}");
    }

    let literacy = &finalized.literacy;
    match &literacy.result {
        Some(result) => println!(
            "Literacy ({}): {}/{} over {} items, {}",
            literacy.instrument,
            result.total,
            literacy.instrument.max_total(),
            result.answered,
            result.level
        ),
        None => println!("Literacy ({}): not scored", literacy.instrument),
    }

    if finalized.issues.is_empty() {
        println!("No issues.");
    } else {
        println!("Issues:");
        for issue in &finalized.issues {
            println!("- {issue}");
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = StudyConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::NewId => {
            println!("{}", session::generate_participant_id());
        }
        Commands::Fields => print_fields(),
        Commands::Compute {
            onset,
            first_visit,
            diagnosis,
            treatment_start,
            answers,
            json,
        } => {
            if answers.len() > LITERACY_ITEMS_TABLE.len() {
                bail!(
                    "expected at most {} answers, got {}",
                    LITERACY_ITEMS_TABLE.len(),
                    answers.len()
                );
            }

            let mut session = Session::new(today());
            let dates = [
                ("Date_Symptom_Onset", onset),
                ("Date_First_Visit", first_visit),
                ("Date_Diagnosis", diagnosis),
                ("Date_Treatment_Start", treatment_start),
            ];
            let fields = dates
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key, v)))
                .chain(
                    LITERACY_ITEMS_TABLE
                        .iter()
                        .map(|item| item.key)
                        .zip(answers),
                );
            // Rejected fields stay on the session and surface as issues.
            session.apply(fields);

            let finalized = session.finalize(&config);
            if json {
                let output = ComputeOutput {
                    timeline: &finalized.timeline,
                    delays: &finalized.delays,
                    delay_category: finalized.delays.category(),
                    literacy: &finalized.literacy,
                    issues: &finalized.issues,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_computed(&finalized);
            }
        }
        Commands::Finalize {
            input,
            out,
            with_samples,
            allow_incomplete,
        } => {
            let sessions = export::load_sessions(&input, today())?;
            let mut records = finalize_all(&sessions, &config);

            let incomplete: Vec<String> = records
                .iter()
                .enumerate()
                .filter_map(|(index, r)| {
                    let missing = r.missing_essentials();
                    (!missing.is_empty())
                        .then(|| format!("row {} ({})", index + 1, missing.join(", ")))
                })
                .collect();
            if !incomplete.is_empty() && !allow_incomplete {
                bail!(
                    "{} records are missing essential fields: {}",
                    incomplete.len(),
                    incomplete.join("; ")
                );
            }

            let blocking: usize = records.iter().map(|r| r.blocking_issues().count()).sum();
            if blocking > 0 {
                tracing::warn!(fields = blocking, "some field values were rejected and left blank");
            }

            let real = records.len();
            if with_samples {
                let samples = sample::generate(config.sample.count, config.sample.seed, today());
                records.extend(finalize_all(&samples, &config));
            }

            export::write_csv_file(&out, &records)
                .with_context(|| format!("failed to export to {}", out.display()))?;
            println!(
                "Exported {} records ({} entered, {} sample) to {}.",
                records.len(),
                real,
                records.len() - real,
                out.display()
            );
        }
        Commands::Sample { out, count, seed } => {
            let count = count.unwrap_or(config.sample.count);
            let seed = seed.unwrap_or(config.sample.seed);
            let sessions = sample::generate(count, seed, today());
            let records = finalize_all(&sessions, &config);
            export::write_csv_file(&out, &records)?;
            println!("Sample cohort of {} written to {}.", records.len(), out.display());
        }
        Commands::Report { input, out } => {
            let (label, sessions) = match &input {
                Some(path) => (
                    path.display().to_string(),
                    export::load_sessions(path, today())?,
                ),
                None => (
                    "fabricated demonstration cohort".to_string(),
                    sample::generate(config.sample.count, config.sample.seed, today()),
                ),
            };
            let records = finalize_all(&sessions, &config);
            let report = report::build_report(&label, &records);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
