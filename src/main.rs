use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;
use log::{debug, info, warn};
use rusqlite::Connection;
use std::path::PathBuf;

use prepdeck::libprep::battle::{self, PassPlan, Room};
use prepdeck::libprep::content::{Cadence, ContentPack};
use prepdeck::libprep::db::{self, BattlePass, CompletedTask, Invite};
use prepdeck::libprep::error::Error;
use prepdeck::libprep::mode::SessionConfig;
use prepdeck::libprep::results::{Destination, Results};
use prepdeck::libprep::runner::{Outcome, Runner};
use prepdeck::libprep::session::{Session, Toast};
use prepdeck::libprep::wallet::Wallet;
use prepdeck::libprep::{rewards, validate};

mod cli;

use crate::cli::{print_toast, Terminal};

const SUBJECT_CELEBRATION: f64 = 0.7;

#[derive(Parser, Debug)]
#[command(name = "PrepDeck")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, value_name = "FILE", default_value = "wallet.db")]
    wallet: PathBuf,
    /// Keep the wallet in memory only
    #[arg(long)]
    ephemeral: bool,
    /// JSON content pack to use instead of the built-in one
    #[arg(short, long, value_name = "FILE")]
    pack: Option<PathBuf>,
    /// Show options in a random order
    #[arg(long)]
    shuffle: bool,
    #[arg(short, long, default_value = "error")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Full mock exam
    Exam { exam_id: String },
    /// Timed quiz on one subject of an exam
    Subject { exam_id: String, subject_id: String },
    /// Quiz on a current affairs article
    Affairs { article_id: String },
    /// Quiz battle against other players
    Battle {
        #[command(subcommand)]
        action: BattleAction,
    },
    /// Show a results route, e.g. "/exams/upsc-prelims/results?score=4&total=5"
    Results { route: String },
    /// Daily and weekly tasks
    Tasks,
    /// Claim a completed task
    Task { task_id: String },
    /// Invite a friend by email
    Invite { email: String },
    /// Show the token balance
    Tokens,
    /// List exams, subjects and articles
    List,
}

#[derive(Subcommand, Debug)]
enum BattleAction {
    Create,
    Join {
        code: String,
    },
    /// Buy battle passes with tokens: basic, standard or premium
    Purchase {
        plan: String,
        #[arg(default_value = "1")]
        quantity: u32,
    },
    /// List the battle pass plans
    Passes,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    //INIT START
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level.as_str())).init();

    let conn = if args.ephemeral {
        db::open_in_memory()?
    } else {
        db::create_or_open(&args.wallet)?
    };
    debug!("[DB] Database Connection Successful!");

    let pack = match &args.pack {
        Some(path) => ContentPack::load(path)?,
        None => ContentPack::builtin()?,
    };
    let mut wallet = Wallet::load(&conn)?;
    debug!("[Setup] {} tokens, {} exams", wallet.balance(), pack.exams.len());
    // INIT DONE

    let result = run_command(&conn, &pack, &mut wallet, args.command, args.shuffle).await;
    finish(conn, &wallet, report(result))
}

async fn run_command(
    conn: &Connection,
    pack: &ContentPack,
    wallet: &mut Wallet,
    command: Commands,
    shuffle: bool,
) -> Result<(), Error> {
    match command {
        Commands::Exam { exam_id } => {
            let exam = pack.exam(&exam_id)?;
            let questions = pack.exam_questions(&exam.id)?;
            banner(&exam.name, questions.len());
            let session = Session::new(SessionConfig::full_exam(), questions)?;
            if let (Outcome::Completed(results), _) = play(session, wallet, None, shuffle).await {
                if results.worth_celebrating() {
                    celebrate("Excellent Performance!");
                }
                show_results(
                    &Destination::ExamResults {
                        exam_id: exam.id.clone(),
                    },
                    &results,
                );
            }
        }
        Commands::Subject {
            exam_id,
            subject_id,
        } => {
            let exam = pack.exam(&exam_id)?;
            let questions = pack.subject_questions(&exam.id, &subject_id)?;
            let name = pack
                .subjects_of(&exam.id)
                .find(|s| s.id == subject_id)
                .map(|s| s.name.as_str())
                .unwrap_or(exam.name.as_str());
            banner(name, questions.len());
            let session = Session::new(SessionConfig::subject_quiz(), questions)?;
            if let (Outcome::Completed(results), _) = play(session, wallet, None, shuffle).await {
                if results.total > 0
                    && results.score as f64 / results.total as f64 >= SUBJECT_CELEBRATION
                {
                    celebrate("Great Job!");
                }
                show_results(
                    &Destination::ExamResults {
                        exam_id: exam.id.clone(),
                    },
                    &results,
                );
            }
        }
        Commands::Affairs { article_id } => {
            let article = pack.article(&article_id)?;
            if !rewards::is_readable(conn, article)? {
                rewards::unlock_article(conn, wallet, article)?;
                print_toast(&Toast::info(
                    &format!("{} Tokens Spent", article.token_cost),
                    "You've unlocked premium content",
                ));
            }
            let questions = pack.article_questions(&article.id)?;
            if questions.is_empty() {
                println!("{}", "There is no quiz for this article yet.".yellow());
                return Ok(());
            }
            banner(&article.title, questions.len());
            let config = SessionConfig::current_affairs();
            let reward = config.correct_reward;
            let session = Session::new(config, questions)?;
            if let (Outcome::Completed(results), _) = play(session, wallet, None, shuffle).await {
                print_toast(&Toast::info(
                    "Quiz Completed!",
                    &format!(
                        "You scored {} out of {} and earned {} tokens!",
                        results.score,
                        results.total,
                        results.score * reward
                    ),
                ));
                println!("{}", Destination::Feed.route(&results).dimmed());
            }
        }
        Commands::Battle { action } => {
            let mut rng = rand::rng();
            let room = match action {
                BattleAction::Create => {
                    let room = Room::create(&mut rng);
                    print_toast(&Toast::info(
                        "Battle Room Created!",
                        &format!(
                            "Your room ID is {}. Share it with your friends to start the battle.",
                            room.id
                        ),
                    ));
                    room
                }
                BattleAction::Join { code } => {
                    let room = Room::join(&code, &mut rng)?;
                    print_toast(&Toast::info(
                        "Joining Battle Room",
                        &format!("Connecting to room {}...", room.id),
                    ));
                    room
                }
                BattleAction::Purchase { plan, quantity } => {
                    let plan: PassPlan = plan.parse()?;
                    let total = battle::purchase_pass(conn, wallet, plan, quantity)?;
                    print_toast(&Toast::info(
                        "Purchase Successful!",
                        &format!(
                            "You've purchased {} {}{}!",
                            quantity,
                            plan.name(),
                            if quantity > 1 { "es" } else { "" }
                        ),
                    ));
                    println!("{} tokens spent", total.to_string().bold());
                    return Ok(());
                }
                BattleAction::Passes => {
                    passes(conn)?;
                    return Ok(());
                }
            };
            for participant in &room.participants {
                println!(
                    "  {}{}",
                    participant.name.bold(),
                    if participant.host { " (host)" } else { "" }
                );
            }
            let questions = pack.battle_questions()?;
            let session = Session::new(SessionConfig::battle(), questions)?;
            let (outcome, room) = play(session, wallet, Some(room), shuffle).await;
            if let (Outcome::Completed(results), Some(room)) = (outcome, room) {
                finish_battle(&room, &results, wallet);
            }
        }
        Commands::Results { route } => {
            let (path, results) = Results::from_route(&route);
            debug!("[Results] {} -> {:?}", path, results);
            if results.worth_celebrating() {
                celebrate("Excellent Performance!");
            }
            println!("{}", format!("{}%", results.percentage()).bold());
            println!("You scored {} out of {}", results.score, results.total);
        }
        Commands::Tasks => {
            println!(
                "{} tasks completed",
                CompletedTask::get_all(conn)?.len().to_string().bold()
            );
            for (heading, cadence) in [("Daily", Cadence::Daily), ("Weekly", Cadence::Weekly)] {
                println!(
                    "{}",
                    format!(
                        "==========> {} tasks ({}%) <==========",
                        heading,
                        rewards::progress(conn, pack, cadence)?
                    )
                    .cyan()
                );
                for task in pack.tasks_with(cadence) {
                    let mark = if rewards::is_completed(conn, task)? {
                        "[x]".green()
                    } else {
                        "[ ]".normal()
                    };
                    println!(
                        "{} {} (+{}) {}",
                        mark,
                        task.title,
                        task.reward,
                        task.id.dimmed()
                    );
                }
            }
        }
        Commands::Task { task_id } => {
            let task = rewards::complete_task(conn, pack, wallet, &task_id)?;
            print_toast(&Toast::info(
                "Task Completed!",
                &format!("You earned {} tokens.", task.reward),
            ));
        }
        Commands::Invite { email } => {
            validate::invite_friend(conn, &email)?;
            print_toast(&Toast::info(
                "Invitation Sent!",
                "Your friend will receive an invitation email shortly.",
            ));
            let invited = Invite::get_all(conn)?;
            println!("{}", format!("{} friends invited:", invited.len()).cyan());
            for invite in invited {
                println!("  {}", invite.email.dimmed());
            }
        }
        Commands::Tokens => {
            println!("{} tokens", wallet.balance().to_string().bold());
        }
        Commands::List => list(conn, pack)?,
    }
    Ok(())
}

async fn play(
    session: Session,
    wallet: &mut Wallet,
    room: Option<Room>,
    shuffle: bool,
) -> (Outcome, Option<Room>) {
    let mut runner = Runner::new(session, wallet);
    if let Some(room) = room {
        runner = runner.with_room(room);
    }
    let mut terminal = Terminal::new(shuffle);
    cli::spawn_input(
        runner.sender(),
        terminal.display_order(),
        terminal.input_gate(),
    );

    let outcome = runner.run(&mut terminal).await;
    if outcome == Outcome::Abandoned {
        println!();
        println!("{}", "Quitting Early!".cyan());
    }
    (outcome, runner.room().cloned())
}

fn finish_battle(room: &Room, results: &Results, wallet: &mut Wallet) {
    println!("{}", "==========> Final Standings <==========".cyan());
    for standing in room.standings() {
        let line = format!("{}. {} ({})", standing.rank, standing.name, standing.score);
        if standing.name == battle::PLAYER_NAME {
            println!("{}", line.bright_green().bold());
        } else {
            println!("{}", line);
        }
    }
    let rank = room.player_rank();
    let tokens = battle::payout(rank, results);
    wallet.credit(tokens);
    info!("[Battle] Rank {} pays {} tokens", rank, tokens);
    if results.worth_celebrating() {
        celebrate("Battle Won!");
    }
    print_toast(&Toast::info(
        "Battle Complete",
        &format!("You finished #{} and earned {} tokens!", rank, tokens),
    ));
    show_results(
        &Destination::BattleResults {
            room_id: room.id.clone(),
        },
        results,
    );
}

fn list(conn: &Connection, pack: &ContentPack) -> Result<(), Error> {
    println!("{}", "==========> Exams <==========".cyan());
    for exam in &pack.exams {
        println!(
            "{} {} ({} questions)",
            exam.id.bold(),
            exam.name,
            exam.questions.len()
        );
        for subject in pack.subjects_of(&exam.id) {
            println!("    {} {}", subject.id.dimmed(), subject.name);
        }
    }
    println!("{}", "==========> Current Affairs <==========".cyan());
    for article in &pack.articles {
        let lock = if rewards::is_readable(conn, article)? {
            String::new()
        } else {
            format!(" [premium, {} tokens]", article.token_cost)
        };
        println!("{} {}{}", article.id.bold(), article.title, lock.yellow());
    }
    Ok(())
}

fn passes(conn: &Connection) -> Result<(), Error> {
    println!("{}", "==========> Battle Passes <==========".cyan());
    for plan in PassPlan::ALL {
        println!(
            "{} {} ({} tokens)",
            plan.id().bold(),
            plan.name(),
            plan.price()
        );
        for feature in plan.features() {
            println!("    {}", feature.dimmed());
        }
    }
    let owned: u32 = BattlePass::get_all(conn)?
        .iter()
        .map(|pass| pass.quantity)
        .sum();
    println!("{} passes owned", owned.to_string().bold());
    Ok(())
}

fn banner(name: &str, questions: usize) {
    println!(
        "{}",
        format!("==========> {} ({} questions) <==========", name, questions).cyan()
    );
}

fn celebrate(message: &str) {
    println!("{}", format!("*** {} ***", message).bright_green().bold());
}

fn show_results(destination: &Destination, results: &Results) {
    println!(
        "{} {}",
        "Results:".cyan(),
        format!("{}", results).bold()
    );
    println!("{}", destination.route(results).dimmed());
}

/// Guard failures become toasts; everything else ends the program.
fn report(result: Result<(), Error>) -> Result<(), Error> {
    match result {
        Err(err) if err.is_recoverable() => {
            warn!("[Setup] {}", err);
            print_toast(&Toast::from(&err));
            Ok(())
        }
        other => other,
    }
}

fn finish(conn: Connection, wallet: &Wallet, to_error: Result<(), Error>) -> Result<(), Error> {
    wallet.save(&conn)?;
    db::close_db(conn)?;
    to_error
}
