// Library surface for headless/integration tests and the validator binary.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod bank;
pub mod config;
pub mod input;
pub mod logging;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod timer;

pub use bank::{BankError, Difficulty, LoadOptions, Question, QuestionBank, SizeRule};
pub use scoring::{PointsTable, ScoringMode};
pub use session::{
    AnswerState, Feedback, QuizSession, Resolution, SessionError, SessionEvent, SessionPhase,
    SessionSettings,
};
