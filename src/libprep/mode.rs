use std::time::Duration;

/// Which quiz screen a session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    FullExam,
    SubjectQuiz,
    CurrentAffairs,
    Battle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerScope {
    /// Countdown restarts on every question; expiry times the question out.
    PerQuestion,
    /// One countdown for the whole paper; expiry ends the session.
    Paper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipPolicy {
    Disabled,
    /// Skipping counts as an incorrect answer.
    Forfeit,
    /// Skipping costs a fixed number of tokens.
    Paid(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub mode: Mode,
    pub duration_secs: u32,
    pub timer_scope: TimerScope,
    pub correct_reward: u32,
    pub skip: SkipPolicy,
    pub skip_on_last: bool,
    pub celebrate_correct: bool,
    pub correct_pause: Duration,
    pub incorrect_pause: Duration,
    pub skip_pause: Duration,
    pub start_countdown: Option<u32>,
    pub simulate_opponents: bool,
}

impl SessionConfig {
    pub fn for_mode(mode: Mode) -> SessionConfig {
        match mode {
            Mode::FullExam => Self::full_exam(),
            Mode::SubjectQuiz => Self::subject_quiz(),
            Mode::CurrentAffairs => Self::current_affairs(),
            Mode::Battle => Self::battle(),
        }
    }

    pub fn full_exam() -> SessionConfig {
        SessionConfig {
            mode: Mode::FullExam,
            duration_secs: 10,
            timer_scope: TimerScope::PerQuestion,
            correct_reward: 1,
            skip: SkipPolicy::Paid(2),
            skip_on_last: false,
            celebrate_correct: true,
            correct_pause: Duration::ZERO,
            incorrect_pause: Duration::from_millis(2000),
            skip_pause: Duration::ZERO,
            start_countdown: None,
            simulate_opponents: false,
        }
    }

    pub fn subject_quiz() -> SessionConfig {
        SessionConfig {
            mode: Mode::SubjectQuiz,
            duration_secs: 600,
            timer_scope: TimerScope::Paper,
            correct_reward: 0,
            skip: SkipPolicy::Forfeit,
            skip_on_last: true,
            celebrate_correct: false,
            correct_pause: Duration::from_millis(1500),
            incorrect_pause: Duration::from_millis(1500),
            skip_pause: Duration::from_millis(500),
            start_countdown: None,
            simulate_opponents: false,
        }
    }

    pub fn current_affairs() -> SessionConfig {
        SessionConfig {
            mode: Mode::CurrentAffairs,
            duration_secs: 15,
            timer_scope: TimerScope::PerQuestion,
            correct_reward: 2,
            skip: SkipPolicy::Disabled,
            skip_on_last: false,
            celebrate_correct: true,
            correct_pause: Duration::ZERO,
            incorrect_pause: Duration::from_millis(2000),
            skip_pause: Duration::ZERO,
            start_countdown: None,
            simulate_opponents: false,
        }
    }

    pub fn battle() -> SessionConfig {
        SessionConfig {
            mode: Mode::Battle,
            duration_secs: 10,
            timer_scope: TimerScope::PerQuestion,
            correct_reward: 0,
            skip: SkipPolicy::Forfeit,
            skip_on_last: false,
            celebrate_correct: true,
            correct_pause: Duration::from_millis(1000),
            incorrect_pause: Duration::from_millis(2000),
            skip_pause: Duration::ZERO,
            start_countdown: Some(5),
            simulate_opponents: true,
        }
    }
}
