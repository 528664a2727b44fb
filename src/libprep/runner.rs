use crate::libprep::battle::Room;
use crate::libprep::results::Results;
use crate::libprep::session::{Effect, Event, Session, State, Toast};
use crate::libprep::timer::{TimerKind, Timers};
use crate::libprep::wallet::Wallet;
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

const TICK: Duration = Duration::from_secs(1);

/// Everything that can wake the runner up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Session(Event),
    /// A simulated opponent is due to answer.
    Opponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed(Results),
    Abandoned,
}

/// Where a running session is displayed. Input arrives separately, through
/// [`Runner::sender`].
pub trait Surface {
    fn show_question(&mut self, session: &Session);
    fn show_countdown(&mut self, remaining: u32);
    fn show_answer(&mut self, session: &Session);
    fn notify(&mut self, toast: &Toast);
    /// An input was refused and the session is still waiting on the same
    /// question.
    fn show_refusal(&mut self, toast: &Toast) {
        self.notify(toast);
    }
    /// Resolves once the celebration is over.
    fn celebrate(&mut self, points: u32, message: &str) -> impl Future<Output = ()>;
}

pub struct Runner<'w> {
    session: Session,
    wallet: &'w mut Wallet,
    room: Option<Room>,
    timers: Timers<Signal>,
    tx: UnboundedSender<Signal>,
    rx: UnboundedReceiver<Signal>,
}

impl<'w> Runner<'w> {
    pub fn new(session: Session, wallet: &'w mut Wallet) -> Runner<'w> {
        let (tx, rx) = unbounded_channel();
        Runner {
            session,
            wallet,
            room: None,
            timers: Timers::new(tx.clone()),
            tx,
            rx,
        }
    }

    pub fn with_room(mut self, room: Room) -> Self {
        self.room = Some(room);
        self
    }

    /// Feeds player input into the running session.
    pub fn sender(&self) -> UnboundedSender<Signal> {
        self.tx.clone()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn room(&self) -> Option<&Room> {
        self.room.as_ref()
    }

    pub fn wallet(&self) -> &Wallet {
        &*self.wallet
    }

    /// Drives the session until it completes or the player quits.
    pub async fn run<S: Surface>(&mut self, surface: &mut S) -> Outcome {
        info!(
            "[Runner] Starting {:?} with {} questions",
            self.session.config().mode,
            self.session.total()
        );
        let effects = self.session.begin();
        match self.session.state() {
            State::Starting { remaining } => surface.show_countdown(remaining),
            _ => surface.show_question(&self.session),
        }
        if let Some(outcome) = self.execute(effects, surface).await {
            return outcome;
        }

        while let Some(signal) = self.rx.recv().await {
            let event = match signal {
                Signal::Opponent => {
                    self.opponent_turn(surface);
                    continue;
                }
                Signal::Session(event) => event,
            };

            let cursor = self.session.cursor();
            let state = self.session.state();
            let effects = match self.session.apply(event, self.wallet) {
                Ok(effects) => effects,
                Err(err) => {
                    warn!("[Runner] {:?} refused: {}", event, err);
                    surface.show_refusal(&Toast::from(&err));
                    continue;
                }
            };
            if let Some(room) = self.room.as_mut() {
                room.set_player_score(self.session.score());
            }
            self.render(cursor, state, surface);
            if let Some(outcome) = self.execute(effects, surface).await {
                return outcome;
            }
        }

        warn!("[Runner] Event channel closed");
        self.timers.cancel_all();
        Outcome::Abandoned
    }

    fn render<S: Surface>(&self, cursor: usize, before: State, surface: &mut S) {
        match self.session.state() {
            State::Starting { remaining } => surface.show_countdown(remaining),
            State::AwaitingAnswer if before != State::AwaitingAnswer || cursor != self.session.cursor() => {
                surface.show_question(&self.session)
            }
            State::AwaitingAnswer => surface.show_countdown(self.session.remaining()),
            State::Answered { .. } if !matches!(before, State::Answered { .. }) => {
                surface.show_answer(&self.session)
            }
            _ => {}
        }
    }

    async fn execute<S: Surface>(&mut self, effects: Vec<Effect>, surface: &mut S) -> Option<Outcome> {
        for effect in effects {
            match effect {
                Effect::StartCountdown { generation } => {
                    self.timers.every(TimerKind::Countdown, TICK, move || {
                        Signal::Session(Event::Tick { generation })
                    })
                }
                Effect::CancelCountdown => self.timers.cancel(TimerKind::Countdown),
                Effect::Notify(toast) => surface.notify(&toast),
                Effect::Celebrate { points, message } => surface.celebrate(points, &message).await,
                Effect::ScheduleAdvance(delay) => {
                    let cursor = self.session.cursor();
                    self.timers.after(
                        TimerKind::Advance,
                        delay,
                        Signal::Session(Event::Advance { cursor }),
                    )
                }
                Effect::OpponentTurn(delay) => {
                    self.timers.after(TimerKind::Opponent, delay, Signal::Opponent)
                }
                Effect::Complete(results) => {
                    self.timers.cancel_all();
                    info!("[Runner] Finished with {}", results);
                    return Some(Outcome::Completed(results));
                }
                Effect::Cancelled => {
                    self.timers.cancel_all();
                    info!("[Runner] Session abandoned");
                    return Some(Outcome::Abandoned);
                }
            }
        }
        None
    }

    fn opponent_turn<S: Surface>(&mut self, surface: &mut S) {
        let Some(room) = self.room.as_mut() else {
            debug!("[Runner] Opponent turn without a room");
            return;
        };
        if let Some(name) = room.simulate_opponent(&mut rand::rng()) {
            surface.notify(&Toast::info(&format!("{} answered correctly!", name), ""));
        }
    }
}
