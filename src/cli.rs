use colored::Colorize;
use log::debug;
use prepdeck::libprep::gesture::{DragTracker, Swipe};
use prepdeck::libprep::runner::{Signal, Surface};
use prepdeck::libprep::session::{Answer, Event, Session, State, Toast};
use rand::rngs::ThreadRng;
use std::io::{self, Write};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;
use text_io::try_read;
use tokio::sync::mpsc::UnboundedSender;

const CELEBRATION: Duration = Duration::from_millis(800);
const GATE_POLL: Duration = Duration::from_millis(200);

/// Maps the option numbers on screen back to option indices.
pub type DisplayOrder = Arc<Mutex<Vec<usize>>>;

#[derive(Debug, PartialEq)]
pub enum Choice {
    Option(usize),
    Skip,
    /// `d <from> <to>`: a vertical drag between two screen rows, in pixels.
    Drag(f32, f32),
    Quit,
    Unknown,
}

impl Choice {
    pub fn from_str(input: &str) -> Choice {
        match input.trim() {
            "q" => Choice::Quit,
            "s" => Choice::Skip,
            input if input.starts_with("d ") => {
                let points: Vec<f32> = input[2..]
                    .split_whitespace()
                    .filter_map(|p| p.parse().ok())
                    .collect();
                match points[..] {
                    [from, to] => Choice::Drag(from, to),
                    _ => Choice::Unknown,
                }
            }
            input => match input.parse::<usize>() {
                Ok(num) if num > 0 => Choice::Option(num - 1),
                _ => Choice::Unknown,
            },
        }
    }
}

pub fn print_toast(toast: &Toast) {
    let title = if toast.destructive {
        toast.title.bright_red().bold()
    } else {
        toast.title.bright_cyan().bold()
    };
    if toast.description.is_empty() {
        println!("{}", title);
    } else {
        println!("{} {}", title, toast.description);
    }
}

/// Holds typed answers until a question is waiting for one.
#[derive(Debug, Clone, Default)]
pub struct InputGate(Arc<(Mutex<bool>, Condvar)>);

impl InputGate {
    pub fn open(&self) {
        let (open, ready) = &*self.0;
        if let Ok(mut open) = open.lock() {
            *open = true;
            ready.notify_all();
        }
    }

    pub fn close(&self) {
        let (open, _) = &*self.0;
        if let Ok(mut open) = open.lock() {
            *open = false;
        }
    }

    /// Waits for the gate to open and closes it behind the caller. Returns
    /// `false` without passing once `alive` says nobody is listening.
    pub fn pass(&self, alive: impl Fn() -> bool) -> bool {
        let (open, ready) = &*self.0;
        let Ok(mut guard) = open.lock() else {
            return false;
        };
        while !*guard {
            if !alive() {
                return false;
            }
            guard = match ready.wait_timeout(guard, GATE_POLL) {
                Ok((guard, _)) => guard,
                Err(_) => return false,
            };
        }
        *guard = false;
        true
    }
}

/// Turns an option number as shown on screen into a selection of the
/// underlying option.
pub fn shown_to_event(order: &DisplayOrder, shown: usize) -> Event {
    let index = order
        .lock()
        .ok()
        .and_then(|order| order.get(shown).copied())
        .unwrap_or(shown);
    Event::Select(index)
}

/// Reads answers from stdin on its own thread and forwards them to the
/// running session, one per question shown. Quitting is never held back.
pub fn spawn_input(
    tx: UnboundedSender<Signal>,
    order: DisplayOrder,
    gate: InputGate,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut tracker = DragTracker::new();
        let alive = || !tx.is_closed();
        loop {
            let line: String = match try_read!("{}\n") {
                Ok(line) => line,
                Err(err) => {
                    debug!("[Input] stdin closed: {:?}", err);
                    break;
                }
            };
            let choice = Choice::from_str(&line);
            debug!("[Input] choice: {:?}", choice);

            let event = match choice {
                Choice::Option(shown) => {
                    if !gate.pass(alive) {
                        break;
                    }
                    shown_to_event(&order, shown)
                }
                Choice::Skip => {
                    if !gate.pass(alive) {
                        break;
                    }
                    Event::Skip
                }
                Choice::Drag(from, to) => {
                    tracker.begin(from);
                    let swipe = tracker.moved(to);
                    tracker.end();
                    match swipe.and_then(Swipe::event) {
                        Some(event) => {
                            if !gate.pass(alive) {
                                break;
                            }
                            event
                        }
                        None => continue,
                    }
                }
                Choice::Quit => Event::Quit,
                Choice::Unknown => {
                    println!("{}", "Type an option number, s to skip or q to quit.".yellow());
                    continue;
                }
            };
            if tx.send(Signal::Session(event)).is_err() {
                break;
            }
        }
    })
}

pub struct Terminal {
    shuffle: bool,
    order: DisplayOrder,
    gate: InputGate,
    rng: ThreadRng,
}

impl Terminal {
    pub fn new(shuffle: bool) -> Terminal {
        Terminal {
            shuffle,
            order: Arc::new(Mutex::new(vec![])),
            gate: InputGate::default(),
            rng: rand::rng(),
        }
    }

    pub fn display_order(&self) -> DisplayOrder {
        self.order.clone()
    }

    pub fn input_gate(&self) -> InputGate {
        self.gate.clone()
    }
}

impl Surface for Terminal {
    fn show_question(&mut self, session: &Session) {
        let question = session.current_question();
        let leading = format!("{}/{}. ", session.cursor() + 1, session.total());
        println!();
        println!(
            "{}{}",
            leading.cyan(),
            question.prompt.black().bold().on_white()
        );

        let options: Vec<(usize, &str)> = if self.shuffle {
            question.get_options_randomize(&mut self.rng).0
        } else {
            question
                .options
                .iter()
                .enumerate()
                .map(|(i, o)| (i, o.as_str()))
                .collect()
        };
        if let Ok(mut order) = self.order.lock() {
            *order = options.iter().map(|(i, _)| *i).collect();
        }

        let indent = " ".repeat(leading.len());
        if let Some(image) = &question.image {
            println!("{}{}", indent, format!("[image: {}]", image).dimmed());
        }
        for (i, (_, option)) in options.iter().enumerate() {
            println!("{}{}. {}", indent, format!("{}", i + 1).bold(), option);
        }
        print!(
            "{} ",
            format!(
                "Answer (1-{}, s to skip, q to quit) [{}s]:",
                options.len(),
                session.remaining()
            )
            .cyan()
        );
        let _ = io::stdout().flush();
        self.gate.open();
    }

    fn show_countdown(&mut self, remaining: u32) {
        if remaining <= 5 || remaining % 10 == 0 {
            println!("{}", format!("{}s left", remaining).yellow());
        }
    }

    fn show_answer(&mut self, session: &Session) {
        self.gate.close();
        let question = session.current_question();
        match session.state() {
            State::Answered { correct: true, .. } => println!(
                "{}",
                format!("Correct!: {}/{}", session.score(), session.answered()).bright_green()
            ),
            State::Answered {
                answer: Answer::Skipped,
                ..
            } => println!("{}", "Skipped.".yellow()),
            State::Answered { .. } => {
                println!(
                    "{}",
                    format!("Incorrect!: {}/{}", session.score(), session.answered()).bright_red()
                );
                println!(
                    "{}",
                    format!("The correct choice was {:?}.", question.correct_option()).green()
                )
            }
            _ => {}
        }
    }

    fn notify(&mut self, toast: &Toast) {
        print_toast(toast);
    }

    fn show_refusal(&mut self, toast: &Toast) {
        print_toast(toast);
        self.gate.open();
    }

    async fn celebrate(&mut self, points: u32, message: &str) {
        println!(
            "{}",
            format!("*** {} +{} ***", message, points).bright_green().bold()
        );
        tokio::time::sleep(CELEBRATION).await;
    }
}
