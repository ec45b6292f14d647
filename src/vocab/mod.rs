//! Vocabulary taught during a session and the topic categories it is drawn from

pub mod category;
pub mod words;

pub use category::Category;
pub use words::{LearnedWord, LearnedWords};
