//! Question oracle adapter for QuizBattle.
//!
//! Requests a batch of questions for a topic/difficulty from a pluggable
//! remote [`QuestionProvider`], retrying up to three times, validating each
//! item's shape, and padding out any shortfall from a built-in fallback pool
//! so a room can always be dealt a full deck.

pub mod error;
pub mod fallback;
pub mod provider;

pub use error::OracleError;
pub use provider::{fetch, FallbackQuestionProvider, HttpQuestionProvider, QuestionProvider, RawQuestion};
