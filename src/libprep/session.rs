//! The quiz session state machine shared by every quiz screen.
//!
//! A [`Session`] is driven by [`Event`]s and answers each one with a list of
//! [`Effect`]s for the caller to carry out. The reducer never sleeps and never
//! touches a clock; timers live in [`crate::libprep::timer`] and feed their
//! expiries back in as events.

use crate::libprep::error::Error;
use crate::libprep::mode::{SessionConfig, SkipPolicy, TimerScope};
use crate::libprep::question::Question;
use crate::libprep::results::Results;
use crate::libprep::wallet::Wallet;
use log::debug;
use std::time::Duration;

const OPPONENT_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Option(usize),
    TimedOut,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Pre-battle countdown; no question is shown yet.
    Starting { remaining: u32 },
    AwaitingAnswer,
    Answered { answer: Answer, correct: bool },
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// One second elapsed on the countdown started with the same generation.
    Tick { generation: u64 },
    Select(usize),
    Skip,
    /// The pause after answering question `cursor` is over.
    Advance { cursor: usize },
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub destructive: bool,
}

impl Toast {
    pub fn info(title: &str, description: &str) -> Toast {
        Toast {
            title: title.to_string(),
            description: description.to_string(),
            destructive: false,
        }
    }

    pub fn error(title: &str, description: &str) -> Toast {
        Toast {
            destructive: true,
            ..Toast::info(title, description)
        }
    }
}

impl From<&Error> for Toast {
    fn from(err: &Error) -> Self {
        Toast::error(err.title(), &err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// (Re)start the 1 s countdown ticker, tagging ticks with `generation`.
    StartCountdown { generation: u64 },
    CancelCountdown,
    Notify(Toast),
    /// Show the celebration and wait for it to finish before anything after
    /// it in the same batch.
    Celebrate { points: u32, message: String },
    ScheduleAdvance(Duration),
    OpponentTurn(Duration),
    Complete(Results),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    questions: Vec<Question>,
    cursor: usize,
    state: State,
    score: u32,
    answered: u32,
    remaining: u32,
    generation: u64,
}

impl Session {
    pub fn new(config: SessionConfig, questions: Vec<Question>) -> Result<Session, Error> {
        if questions.is_empty() {
            return Err(Error::EmptyQuestionSet);
        }
        let state = match config.start_countdown {
            Some(secs) if secs > 0 => State::Starting { remaining: secs },
            _ => State::AwaitingAnswer,
        };
        Ok(Session {
            remaining: config.duration_secs,
            config,
            questions,
            cursor: 0,
            state,
            score: 0,
            answered: 0,
            generation: 0,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
    pub fn state(&self) -> State {
        self.state
    }
    pub fn cursor(&self) -> usize {
        self.cursor
    }
    pub fn score(&self) -> u32 {
        self.score
    }
    pub fn answered(&self) -> u32 {
        self.answered
    }
    pub fn total(&self) -> u32 {
        self.questions.len() as u32
    }
    /// Seconds left on the running countdown.
    pub fn remaining(&self) -> u32 {
        match self.state {
            State::Starting { remaining } => remaining,
            _ => self.remaining,
        }
    }
    pub fn current_question(&self) -> &Question {
        &self.questions[self.cursor]
    }
    pub fn is_last(&self) -> bool {
        self.cursor + 1 == self.questions.len()
    }
    /// Tag carried by ticks of the countdown that is currently running.
    pub fn generation(&self) -> u64 {
        self.generation
    }
    pub fn is_over(&self) -> bool {
        matches!(self.state, State::Completed | State::Abandoned)
    }

    /// Effects to run once when the session is first shown.
    pub fn begin(&mut self) -> Vec<Effect> {
        vec![self.restart_countdown()]
    }

    /// Applies one event. A rejected event returns `Err` and leaves the
    /// session untouched.
    pub fn apply(&mut self, event: Event, wallet: &mut Wallet) -> Result<Vec<Effect>, Error> {
        debug!("[Session] {:?} in {:?}", event, self.state);
        match (event, self.state) {
            (_, State::Completed | State::Abandoned) => Ok(vec![]),

            (Event::Quit, _) => {
                self.state = State::Abandoned;
                Ok(vec![Effect::CancelCountdown, Effect::Cancelled])
            }

            (Event::Tick { generation }, _) if generation != self.generation => {
                debug!("[Session] Dropping stale tick {}", generation);
                Ok(vec![])
            }
            (Event::Tick { .. }, State::Starting { remaining }) => Ok(self.start_tick(remaining)),
            (Event::Tick { .. }, State::AwaitingAnswer) => Ok(self.countdown_tick(wallet)),
            (Event::Tick { .. }, State::Answered { .. }) => {
                if self.config.timer_scope == TimerScope::Paper {
                    Ok(self.countdown_tick(wallet))
                } else {
                    Ok(vec![])
                }
            }

            (Event::Select(option), State::AwaitingAnswer) => {
                let available = self.current_question().options.len();
                if option >= available {
                    return Err(Error::OptionOutOfRange { available });
                }
                Ok(self.answer(Answer::Option(option), wallet))
            }
            (Event::Select(_), _) => Ok(vec![]),

            (Event::Skip, State::AwaitingAnswer) => self.skip(wallet),
            (Event::Skip, _) => Ok(vec![]),

            (Event::Advance { cursor }, State::Answered { .. }) if cursor == self.cursor => {
                Ok(self.advance())
            }
            (Event::Advance { .. }, _) => Ok(vec![]),
        }
    }

    fn restart_countdown(&mut self) -> Effect {
        self.generation += 1;
        Effect::StartCountdown {
            generation: self.generation,
        }
    }

    fn countdown_effect(&self) -> Option<Effect> {
        match self.config.timer_scope {
            TimerScope::PerQuestion => Some(Effect::CancelCountdown),
            TimerScope::Paper => None,
        }
    }

    fn start_tick(&mut self, remaining: u32) -> Vec<Effect> {
        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            self.state = State::Starting { remaining };
            return vec![];
        }
        self.state = State::AwaitingAnswer;
        self.remaining = self.config.duration_secs;
        vec![
            Effect::Notify(Toast::info("Battle Started!", "Good luck!")),
            self.restart_countdown(),
        ]
    }

    fn countdown_tick(&mut self, wallet: &mut Wallet) -> Vec<Effect> {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return vec![];
        }
        match self.config.timer_scope {
            TimerScope::PerQuestion => self.answer(Answer::TimedOut, wallet),
            TimerScope::Paper => {
                debug!("[Session] Paper time is up");
                self.finish()
            }
        }
    }

    fn answer(&mut self, answer: Answer, wallet: &mut Wallet) -> Vec<Effect> {
        let question = &self.questions[self.cursor];
        let correct = match answer {
            Answer::Option(option) => question.is_correct(option),
            Answer::TimedOut | Answer::Skipped => false,
        };
        let explanation = question
            .explanation
            .clone()
            .unwrap_or_else(|| format!("The correct answer was {:?}.", question.correct_option()));

        self.state = State::Answered { answer, correct };
        self.answered += 1;

        let mut effects: Vec<Effect> = self.countdown_effect().into_iter().collect();
        if correct {
            self.score += 1;
            if self.config.correct_reward > 0 {
                wallet.credit(self.config.correct_reward);
            }
            if self.config.celebrate_correct {
                effects.push(Effect::Celebrate {
                    points: self.config.correct_reward.max(1),
                    message: "Correct Answer!".to_string(),
                });
            }
            if self.config.simulate_opponents {
                effects.push(Effect::OpponentTurn(OPPONENT_DELAY));
            }
            effects.push(Effect::ScheduleAdvance(self.config.correct_pause));
        } else {
            let title = match answer {
                Answer::TimedOut => "Time's Up",
                _ => "Wrong Answer",
            };
            effects.push(Effect::Notify(Toast::error(title, &explanation)));
            effects.push(Effect::ScheduleAdvance(self.config.incorrect_pause));
        }
        effects
    }

    fn skip(&mut self, wallet: &mut Wallet) -> Result<Vec<Effect>, Error> {
        if self.config.skip == SkipPolicy::Disabled || (self.is_last() && !self.config.skip_on_last) {
            return Err(Error::SkipUnavailable);
        }
        let toast = match self.config.skip {
            SkipPolicy::Paid(cost) => {
                wallet.debit(cost)?;
                Toast::info(
                    "Question Skipped",
                    &format!("You spent {} tokens to skip this question.", cost),
                )
            }
            _ => Toast::info("Question Skipped", "You forfeited this question."),
        };

        self.state = State::Answered {
            answer: Answer::Skipped,
            correct: false,
        };
        self.answered += 1;

        let mut effects: Vec<Effect> = self.countdown_effect().into_iter().collect();
        effects.push(Effect::Notify(toast));
        effects.push(Effect::ScheduleAdvance(self.config.skip_pause));
        Ok(effects)
    }

    fn advance(&mut self) -> Vec<Effect> {
        if self.is_last() {
            return self.finish();
        }
        self.cursor += 1;
        self.state = State::AwaitingAnswer;
        match self.config.timer_scope {
            TimerScope::PerQuestion => {
                self.remaining = self.config.duration_secs;
                vec![self.restart_countdown()]
            }
            TimerScope::Paper => vec![],
        }
    }

    fn finish(&mut self) -> Vec<Effect> {
        self.state = State::Completed;
        debug!("[Session] Completed with {}/{}", self.score, self.total());
        vec![
            Effect::CancelCountdown,
            Effect::Complete(Results::new(self.score, self.total())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(count: usize) -> Vec<Question> {
        (0..count)
            .map(|i| {
                Question::new(&format!("Question {}", i + 1), &["a", "b", "c", "d"], i % 4)
                    .unwrap()
                    .with_explanation("because")
            })
            .collect()
    }

    fn correct(session: &Session) -> Event {
        Event::Select(session.current_question().correct_index())
    }

    fn wrong(session: &Session) -> Event {
        Event::Select((session.current_question().correct_index() + 1) % 4)
    }

    fn advance(session: &mut Session, wallet: &mut Wallet) -> Vec<Effect> {
        let cursor = session.cursor();
        session.apply(Event::Advance { cursor }, wallet).unwrap()
    }

    fn tick(session: &mut Session, wallet: &mut Wallet) -> Vec<Effect> {
        let generation = session.generation;
        session.apply(Event::Tick { generation }, wallet).unwrap()
    }

    #[test]
    fn all_correct_completes_with_full_score_and_rewards() {
        let mut wallet = Wallet::new(50);
        let mut session = Session::new(SessionConfig::full_exam(), questions(5)).unwrap();
        session.begin();

        let mut last = vec![];
        for _ in 0..5 {
            let event = correct(&session);
            let effects = session.apply(event, &mut wallet).unwrap();
            assert!(effects.iter().any(|e| matches!(e, Effect::Celebrate { .. })));
            last = advance(&mut session, &mut wallet);
        }

        assert_eq!(session.state(), State::Completed);
        assert_eq!(session.score(), 5);
        assert_eq!(wallet.balance(), 55);
        assert!(last.contains(&Effect::Complete(Results::new(5, 5))));
    }

    #[test]
    fn current_affairs_pays_two_per_correct_answer() {
        let mut wallet = Wallet::new(0);
        let mut session = Session::new(SessionConfig::current_affairs(), questions(3)).unwrap();
        for _ in 0..3 {
            let event = correct(&session);
            session.apply(event, &mut wallet).unwrap();
            advance(&mut session, &mut wallet);
        }
        assert_eq!(wallet.balance(), 6);
    }

    #[test]
    fn timeout_counts_as_incorrect_and_still_advances() {
        let mut wallet = Wallet::new(50);
        let mut session = Session::new(SessionConfig::full_exam(), questions(5)).unwrap();
        session.begin();
        for _ in 0..2 {
            let event = correct(&session);
            session.apply(event, &mut wallet).unwrap();
            advance(&mut session, &mut wallet);
        }
        assert_eq!(session.cursor(), 2);

        for _ in 0..9 {
            assert!(tick(&mut session, &mut wallet).is_empty());
        }
        let effects = tick(&mut session, &mut wallet);
        assert_eq!(
            session.state(),
            State::Answered {
                answer: Answer::TimedOut,
                correct: false
            }
        );
        assert_eq!(effects[0], Effect::CancelCountdown);
        assert!(effects.contains(&Effect::ScheduleAdvance(Duration::from_millis(2000))));
        assert_eq!(session.score(), 2);

        let effects = advance(&mut session, &mut wallet);
        assert_eq!(session.cursor(), 3);
        assert_eq!(session.remaining(), 10);
        assert!(matches!(effects[0], Effect::StartCountdown { .. }));
    }

    #[test]
    fn paid_skip_spends_tokens_and_moves_on() {
        let mut wallet = Wallet::new(10);
        let mut session = Session::new(SessionConfig::full_exam(), questions(5)).unwrap();
        let event = correct(&session);
        session.apply(event, &mut wallet).unwrap();
        advance(&mut session, &mut wallet);
        let score = session.score();
        let balance = wallet.balance();

        session.apply(Event::Skip, &mut wallet).unwrap();
        advance(&mut session, &mut wallet);

        assert_eq!(wallet.balance(), balance - 2);
        assert_eq!(session.cursor(), 2);
        assert_eq!(session.score(), score);
    }

    #[test]
    fn skip_from_ten_tokens_leaves_eight() {
        let mut wallet = Wallet::new(10);
        let mut session = Session::new(SessionConfig::full_exam(), questions(5)).unwrap();
        let event = wrong(&session);
        session.apply(event, &mut wallet).unwrap();
        advance(&mut session, &mut wallet);

        session.apply(Event::Skip, &mut wallet).unwrap();
        advance(&mut session, &mut wallet);
        assert_eq!(wallet.balance(), 8);
        assert_eq!(session.cursor(), 2);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn skip_without_enough_tokens_is_refused() {
        let mut wallet = Wallet::new(1);
        let mut session = Session::new(SessionConfig::full_exam(), questions(5)).unwrap();
        let err = session.apply(Event::Skip, &mut wallet).unwrap_err();
        assert!(matches!(err, Error::InsufficientTokens { needed: 2, balance: 1 }));
        assert_eq!(session.state(), State::AwaitingAnswer);
        assert_eq!(session.cursor(), 0);
        assert_eq!(wallet.balance(), 1);
    }

    #[test]
    fn skip_rules_follow_the_mode() {
        let mut wallet = Wallet::new(50);
        let mut affairs = Session::new(SessionConfig::current_affairs(), questions(2)).unwrap();
        assert!(matches!(
            affairs.apply(Event::Skip, &mut wallet),
            Err(Error::SkipUnavailable)
        ));

        let mut exam = Session::new(SessionConfig::full_exam(), questions(1)).unwrap();
        assert!(matches!(
            exam.apply(Event::Skip, &mut wallet),
            Err(Error::SkipUnavailable)
        ));

        let mut subject = Session::new(SessionConfig::subject_quiz(), questions(1)).unwrap();
        subject.apply(Event::Skip, &mut wallet).unwrap();
        let effects = advance(&mut subject, &mut wallet);
        assert_eq!(subject.state(), State::Completed);
        assert!(effects.contains(&Effect::Complete(Results::new(0, 1))));
        assert_eq!(wallet.balance(), 50);
    }

    #[test]
    fn answer_is_locked_once_given() {
        let mut wallet = Wallet::new(50);
        let mut session = Session::new(SessionConfig::full_exam(), questions(3)).unwrap();
        let event = wrong(&session);
        session.apply(event, &mut wallet).unwrap();
        let locked = session.state();

        let event = correct(&session);
        assert!(session.apply(event, &mut wallet).unwrap().is_empty());
        assert!(session.apply(Event::Skip, &mut wallet).unwrap().is_empty());
        assert!(tick(&mut session, &mut wallet).is_empty());
        assert_eq!(session.state(), locked);
        assert_eq!(session.score(), 0);
        assert_eq!(wallet.balance(), 50);
    }

    #[test]
    fn last_correct_answer_completes_instead_of_waiting() {
        let mut wallet = Wallet::new(0);
        let mut session = Session::new(SessionConfig::full_exam(), questions(1)).unwrap();
        let event = correct(&session);
        session.apply(event, &mut wallet).unwrap();
        let effects = advance(&mut session, &mut wallet);
        assert_eq!(session.state(), State::Completed);
        assert_eq!(
            effects,
            vec![Effect::CancelCountdown, Effect::Complete(Results::new(1, 1))]
        );
    }

    #[test]
    fn stale_events_are_ignored() {
        let mut wallet = Wallet::new(50);
        let mut session = Session::new(SessionConfig::full_exam(), questions(3)).unwrap();
        session.begin();
        let old_generation = session.generation;
        let event = correct(&session);
        session.apply(event, &mut wallet).unwrap();
        advance(&mut session, &mut wallet);

        let remaining = session.remaining();
        session
            .apply(Event::Tick { generation: old_generation }, &mut wallet)
            .unwrap();
        assert_eq!(session.remaining(), remaining);

        let event = correct(&session);
        session.apply(event, &mut wallet).unwrap();
        session
            .apply(Event::Advance { cursor: 0 }, &mut wallet)
            .unwrap();
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let mut wallet = Wallet::new(50);
        let mut session = Session::new(SessionConfig::full_exam(), questions(2)).unwrap();
        assert!(matches!(
            session.apply(Event::Select(4), &mut wallet),
            Err(Error::OptionOutOfRange { available: 4 })
        ));
        assert_eq!(session.state(), State::AwaitingAnswer);
    }

    #[test]
    fn battle_waits_for_the_start_countdown() {
        let mut wallet = Wallet::new(50);
        let mut session = Session::new(SessionConfig::battle(), questions(3)).unwrap();
        session.begin();
        assert_eq!(session.state(), State::Starting { remaining: 5 });

        let event = correct(&session);
        assert!(session.apply(event, &mut wallet).unwrap().is_empty());

        for _ in 0..4 {
            tick(&mut session, &mut wallet);
        }
        assert_eq!(session.state(), State::Starting { remaining: 1 });
        let effects = tick(&mut session, &mut wallet);
        assert_eq!(session.state(), State::AwaitingAnswer);
        assert_eq!(session.remaining(), 10);
        assert!(matches!(effects[1], Effect::StartCountdown { .. }));

        let event = correct(&session);
        let effects = session.apply(event, &mut wallet).unwrap();
        assert!(effects.contains(&Effect::OpponentTurn(OPPONENT_DELAY)));
        assert_eq!(wallet.balance(), 50);
    }

    #[test]
    fn paper_timer_keeps_running_and_ends_the_session() {
        let mut wallet = Wallet::new(50);
        let mut config = SessionConfig::subject_quiz();
        config.duration_secs = 3;
        let mut session = Session::new(config, questions(5)).unwrap();
        session.begin();

        let event = correct(&session);
        let effects = session.apply(event, &mut wallet).unwrap();
        assert!(!effects.contains(&Effect::CancelCountdown));
        tick(&mut session, &mut wallet);
        assert!(advance(&mut session, &mut wallet).is_empty());
        assert_eq!(session.remaining(), 2);

        tick(&mut session, &mut wallet);
        let effects = tick(&mut session, &mut wallet);
        assert_eq!(session.state(), State::Completed);
        assert!(effects.contains(&Effect::Complete(Results::new(1, 5))));
    }

    #[test]
    fn quit_cancels_and_ignores_everything_after() {
        let mut wallet = Wallet::new(50);
        let mut session = Session::new(SessionConfig::full_exam(), questions(2)).unwrap();
        let effects = session.apply(Event::Quit, &mut wallet).unwrap();
        assert_eq!(effects, vec![Effect::CancelCountdown, Effect::Cancelled]);
        assert!(session.is_over());
        let event = correct(&session);
        assert!(session.apply(event, &mut wallet).unwrap().is_empty());
    }

    #[test]
    fn empty_question_list_is_rejected() {
        assert!(matches!(
            Session::new(SessionConfig::battle(), vec![]),
            Err(Error::EmptyQuestionSet)
        ));
    }
}
