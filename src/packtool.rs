use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;

use prepdeck::libprep::content::ContentPack;
use prepdeck::libprep::error::Error;
use prepdeck::libprep::question::{Question, QuestionEntry};

#[derive(Parser, Debug)]
#[command(name = "PrepDeck packtool")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check every question in a content pack
    Validate { json: PathBuf },
    /// Write the built-in content pack to a file
    Export { json: PathBuf },
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level.as_str())).init();

    match args.command {
        Commands::Validate { json } => {
            info!("{}", format!("Validating {:?}", json).cyan());
            let pack = match ContentPack::load(&json) {
                Ok(pack) => pack,
                Err(err) => {
                    error!("{}", format!("Malformed JSON: {:?}!", err).red());
                    return Err(err);
                }
            };

            let mut bad = 0;
            for exam in &pack.exams {
                info!(
                    "{}",
                    format!("├ Exam: {} ({} Questions)", exam.name, exam.questions.len()).blue()
                );
                bad += check_questions(&exam.questions);
                for subject in pack.subjects_of(&exam.id) {
                    info!(
                        "{}",
                        format!(
                            "│ ├ Subject: {} ({} Questions)",
                            subject.name,
                            subject.questions.len()
                        )
                        .blue()
                    );
                    bad += check_questions(&subject.questions);
                }
            }
            for article in &pack.articles {
                info!(
                    "{}",
                    format!(
                        "├ Article: {} ({} Questions)",
                        article.title,
                        article.questions.len()
                    )
                    .blue()
                );
                bad += check_questions(&article.questions);
            }
            info!(
                "{}",
                format!("├ Battle ({} Questions)", pack.battle.len()).blue()
            );
            bad += check_questions(&pack.battle);

            if bad > 0 {
                error!("{}", format!("{} malformed questions", bad).red());
            }
            let summary = pack.validate()?;
            info!(
                "{}",
                format!(
                    "{} exams, {} subjects, {} articles, {} questions, {} tasks",
                    summary.exams, summary.subjects, summary.articles, summary.questions, summary.tasks
                )
                .green()
            );
        }
        Commands::Export { json } => {
            let pack = ContentPack::builtin()?;
            std::fs::write(&json, pack.to_json()?)?;
            info!("{}", format!("Exported built-in pack to {:?}", json).green());
        }
    }

    Ok(())
}

/// Logs each question and returns how many are malformed.
fn check_questions(entries: &[QuestionEntry]) -> usize {
    let mut bad = 0;
    for entry in entries {
        match Question::try_from(entry.clone()) {
            Ok(question) => info!(
                "{} {}",
                "│ │".blue(),
                format!("├ Question: {:?}", question.prompt).green()
            ),
            Err(err) => {
                bad += 1;
                error!(
                    "{} {}",
                    "│ │".blue(),
                    format!("├ ✘ {}", err).red().strikethrough()
                );
            }
        }
    }
    bad
}
