pub mod battle;
pub mod content;
pub mod db;
pub mod error;
pub mod gesture;
pub mod mode;
pub mod question;
pub mod results;
pub mod rewards;
pub mod runner;
pub mod session;
pub mod timer;
pub mod validate;
pub mod wallet;
