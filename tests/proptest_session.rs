//! Property-based tests for the quiz session reducer.
//!
//! Drives sessions of every mode with random event sequences and checks the
//! invariants that must hold after every single event.

use prepdeck::libprep::mode::{Mode, SessionConfig};
use prepdeck::libprep::question::Question;
use prepdeck::libprep::session::{Effect, Event, Session, State};
use prepdeck::libprep::wallet::Wallet;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Tick,
    StaleTick,
    Select(usize),
    Skip,
    Advance,
    StaleAdvance,
    Quit,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        8 => Just(Op::Tick),
        1 => Just(Op::StaleTick),
        4 => (0usize..6).prop_map(Op::Select),
        2 => Just(Op::Skip),
        4 => Just(Op::Advance),
        1 => Just(Op::StaleAdvance),
        1 => Just(Op::Quit),
    ]
}

fn mode() -> impl Strategy<Value = Mode> {
    prop_oneof![
        Just(Mode::FullExam),
        Just(Mode::SubjectQuiz),
        Just(Mode::CurrentAffairs),
        Just(Mode::Battle),
    ]
}

fn questions(count: usize) -> Vec<Question> {
    (0..count)
        .map(|i| Question::new(&format!("Question {}", i + 1), &["a", "b", "c", "d"], i % 4).unwrap())
        .collect()
}

fn to_event(op: Op, session: &Session) -> Event {
    match op {
        Op::Tick => Event::Tick {
            generation: session.generation(),
        },
        Op::StaleTick => Event::Tick {
            generation: session.generation().wrapping_sub(1),
        },
        Op::Select(option) => Event::Select(option),
        Op::Skip => Event::Skip,
        Op::Advance => Event::Advance {
            cursor: session.cursor(),
        },
        Op::StaleAdvance => Event::Advance {
            cursor: session.cursor().wrapping_sub(1),
        },
        Op::Quit => Event::Quit,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn invariants_hold_after_every_event(
        mode in mode(),
        count in 1usize..8,
        balance in 0u32..20,
        ops in prop::collection::vec(op(), 0..300),
    ) {
        let mut wallet = Wallet::new(balance);
        let mut session = Session::new(SessionConfig::for_mode(mode), questions(count)).unwrap();
        session.begin();

        for op in ops {
            let event = to_event(op, &session);
            let before = session.clone();
            let before_balance = wallet.balance();

            match session.apply(event, &mut wallet) {
                Ok(effects) => {
                    for effect in &effects {
                        if let Effect::Complete(results) = effect {
                            prop_assert!(results.score <= results.total);
                            prop_assert_eq!(results.score, session.score());
                            prop_assert_eq!(results.total, count as u32);
                        }
                    }
                }
                Err(_) => {
                    prop_assert_eq!(session.state(), before.state());
                    prop_assert_eq!(session.cursor(), before.cursor());
                    prop_assert_eq!(wallet.balance(), before_balance);
                }
            }

            if session.state() != State::Completed {
                prop_assert!(session.cursor() < count);
            }
            prop_assert!(session.score() >= before.score());
            prop_assert!(session.score() <= session.answered());
            prop_assert!(session.answered() as usize <= session.cursor() + 1);

            if matches!(before.state(), State::Answered { .. }) {
                if let Event::Select(_) = event {
                    prop_assert_eq!(session.state(), before.state());
                    prop_assert_eq!(session.score(), before.score());
                }
            }
            if before.is_over() {
                prop_assert_eq!(session.state(), before.state());
            }
        }
    }

    #[test]
    fn waiting_out_the_clock_never_scores(
        mode in mode(),
        count in 1usize..6,
        steps in 0usize..2000,
    ) {
        let mut wallet = Wallet::new(0);
        let mut session = Session::new(SessionConfig::for_mode(mode), questions(count)).unwrap();
        session.begin();

        for step in 0..steps {
            let event = if step % 3 == 0 {
                Event::Advance { cursor: session.cursor() }
            } else {
                Event::Tick { generation: session.generation() }
            };
            session.apply(event, &mut wallet).unwrap();
        }
        prop_assert_eq!(session.score(), 0);
        prop_assert_eq!(wallet.balance(), 0);
    }
}
