use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("please enter an invite ID")]
    EmptyInviteCode,
    #[error("please enter your friend's email address")]
    MissingEmail,
    #[error("please enter a valid email address")]
    InvalidEmail,
    #[error("you've already invited this friend")]
    AlreadyInvited,

    #[error("you need {needed} tokens but only have {balance}")]
    InsufficientTokens { needed: u32, balance: u32 },

    #[error("no battle pass plan called {0:?}")]
    UnknownPlan(String),
    #[error("buy at least one battle pass")]
    InvalidQuantity,

    #[error("there are only {available} options available")]
    OptionOutOfRange { available: usize },
    #[error("this question cannot be skipped")]
    SkipUnavailable,

    #[error("you've already completed this task")]
    TaskAlreadyCompleted,
    #[error("no task called {0:?}")]
    UnknownTask(String),

    #[error("question {prompt:?} does not list its correct answer {correct:?} as an option")]
    MalformedQuestion { prompt: String, correct: String },
    #[error("no questions to ask")]
    EmptyQuestionSet,
    #[error("malformed content pack")]
    MalformedPack(#[from] serde_json::Error),

    #[error("database error")]
    Db(#[from] rusqlite::Error),
    #[error("cannot read or write file")]
    Io(#[from] io::Error),
}

impl Error {
    /// Guard failures are shown to the player and never end the program.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Error::MalformedPack(_) | Error::Db(_) | Error::Io(_) | Error::EmptyQuestionSet
        )
    }

    /// Short heading used when the error is shown as a toast.
    pub fn title(&self) -> &'static str {
        match self {
            Error::EmptyInviteCode => "Error",
            Error::MissingEmail => "Email Required",
            Error::InvalidEmail => "Invalid Email",
            Error::AlreadyInvited => "Already Invited",
            Error::InsufficientTokens { .. } => "Not Enough Tokens",
            Error::OptionOutOfRange { .. } => "Invalid Choice",
            Error::SkipUnavailable => "Cannot Skip",
            Error::TaskAlreadyCompleted => "Task Already Completed",
            Error::UnknownTask(_) => "Unknown Task",
            Error::UnknownPlan(_) => "Unknown Plan",
            Error::InvalidQuantity => "Purchase Failed",
            _ => "Error",
        }
    }
}
