//! Vocabulary quiz over the learned words
//!
//! The engine is a plain state machine; it produces the texts to show and
//! leaves timing (the pause between feedback and the next question) to the
//! caller.

pub mod question;

pub use question::{Direction, Question, Score};

use crate::vocab::LearnedWords;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizState {
    Idle,
    Active { current: Option<Question> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Quiz is running and this is the first question
    Started(Question),
    /// Not enough words yet; the quiz stays idle
    NeedMoreWords { guidance: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub correct: bool,
    pub text: String,
}

pub struct QuizEngine {
    min_words: usize,
    rng: StdRng,
    state: QuizState,
    score: Score,
    last_index: Option<usize>,
}

impl QuizEngine {
    pub fn new(min_words: usize) -> Self {
        Self::with_rng(min_words, StdRng::from_entropy())
    }

    /// Use a seeded generator for reproducible question order
    pub fn with_rng(min_words: usize, rng: StdRng) -> Self {
        Self {
            min_words,
            rng,
            state: QuizState::Idle,
            score: Score::default(),
            last_index: None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, QuizState::Active { .. })
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn current(&self) -> Option<&Question> {
        match &self.state {
            QuizState::Active { current } => current.as_ref(),
            QuizState::Idle => None,
        }
    }

    /// Enter quiz mode and ask the first question
    pub fn start(&mut self, words: &LearnedWords) -> StartOutcome {
        if words.len() < self.min_words {
            let guidance = format!(
                "You need to learn at least {} words before starting a quiz. \
                 You know {} so far. Ask me to teach you a new word!",
                self.min_words,
                words.len()
            );
            return StartOutcome::NeedMoreWords { guidance };
        }

        self.score = Score::default();
        self.last_index = None;
        self.state = QuizState::Active { current: None };
        debug!(words = words.len(), "Quiz started");

        match self.ask_next(words) {
            Some(question) => StartOutcome::Started(question),
            // Unreachable with min_words > 0, kept total for min_words == 0
            None => StartOutcome::NeedMoreWords {
                guidance: "There are no words to quiz you on yet.".to_string(),
            },
        }
    }

    /// Pick the next question. Ends the quiz and returns None when no words remain.
    pub fn ask_next(&mut self, words: &LearnedWords) -> Option<Question> {
        if !self.is_active() {
            return None;
        }
        if words.is_empty() {
            self.end(false);
            return None;
        }

        let index = self.pick_index(words.len());
        let word = words.get(index)?.clone();
        let question = Question::new(word, Direction::random(&mut self.rng));

        self.last_index = Some(index);
        self.score.asked += 1;
        self.state = QuizState::Active {
            current: Some(question.clone()),
        };
        Some(question)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        match self.last_index {
            Some(last) if len > 1 && last < len => {
                // Draw from the other len - 1 slots so every other word stays equally likely
                let offset = self.rng.gen_range(1..len);
                (last + offset) % len
            }
            _ => self.rng.gen_range(0..len),
        }
    }

    /// Grade `text` against the current question. None when nothing is being asked.
    pub fn answer(&mut self, text: &str) -> Option<Feedback> {
        let question = match &mut self.state {
            QuizState::Active { current } => current.take()?,
            QuizState::Idle => return None,
        };

        let correct = question.accepts(text);
        if correct {
            self.score.correct += 1;
        }
        debug!(correct, score = %self.score, "Quiz answer graded");

        let text = if correct {
            format!("Correct! 🎉 Score: {}", self.score)
        } else {
            format!(
                "Not quite. The answer is **{}**. Score: {}",
                question.expected(),
                self.score
            )
        };
        Some(Feedback { correct, text })
    }

    /// Leave quiz mode; returns the summary when asked for one
    pub fn end(&mut self, show_score: bool) -> Option<String> {
        if !self.is_active() {
            return None;
        }
        let score = self.score;
        self.state = QuizState::Idle;
        self.score = Score::default();
        self.last_index = None;
        debug!(%score, "Quiz ended");

        show_score.then(|| {
            format!(
                "Quiz finished! You answered {} out of {} correctly.",
                score.correct, score.asked
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::LearnedWord;

    fn words(pairs: &[(&str, &str)]) -> LearnedWords {
        LearnedWords::from_words(pairs.iter().map(|(s, t)| LearnedWord::new(*s, *t)))
    }

    fn three_words() -> LearnedWords {
        words(&[("cat", "kyanwa"), ("dog", "kare"), ("sun", "rana")])
    }

    fn engine() -> QuizEngine {
        QuizEngine::with_rng(3, StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_start_needs_three_words() {
        let mut quiz = engine();
        let outcome = quiz.start(&words(&[("cat", "kyanwa"), ("dog", "kare")]));

        assert!(matches!(outcome, StartOutcome::NeedMoreWords { .. }));
        assert!(!quiz.is_active());
        assert_eq!(quiz.score(), Score::default());
        assert!(quiz.current().is_none());
    }

    #[test]
    fn test_quiz_scenario() {
        let vocab = three_words();
        let mut quiz = engine();

        let question = match quiz.start(&vocab) {
            StartOutcome::Started(q) => q,
            other => panic!("expected a question, got {other:?}"),
        };
        assert!(quiz.is_active());
        assert!(vocab.contains(&question.word.source_term));
        assert_eq!(quiz.score(), Score { correct: 0, asked: 1 });

        let answer = format!("  {}  ", question.expected().to_uppercase());
        let feedback = quiz.answer(&answer).unwrap();
        assert!(feedback.correct);
        assert_eq!(quiz.score(), Score { correct: 1, asked: 1 });

        // No question is open until the next one is asked
        assert!(quiz.answer("anything").is_none());

        quiz.ask_next(&vocab).unwrap();
        let feedback = quiz.answer("definitely wrong").unwrap();
        assert!(!feedback.correct);
        assert_eq!(quiz.score(), Score { correct: 1, asked: 2 });
    }

    #[test]
    fn test_no_immediate_repeat() {
        let vocab = three_words();
        let mut quiz = engine();
        let StartOutcome::Started(mut previous) = quiz.start(&vocab) else {
            panic!("quiz should start");
        };

        for _ in 0..200 {
            let next = quiz.ask_next(&vocab).unwrap();
            assert_ne!(next.word, previous.word);
            previous = next;
        }
    }

    #[test]
    fn test_words_and_directions_are_all_used() {
        let vocab = three_words();
        let mut quiz = engine();
        quiz.start(&vocab);

        let mut seen_words = std::collections::HashSet::new();
        let mut seen_directions = std::collections::HashSet::new();
        for _ in 0..200 {
            let q = quiz.ask_next(&vocab).unwrap();
            seen_words.insert(q.word.source_term.clone());
            seen_directions.insert(format!("{:?}", q.direction));
        }
        assert_eq!(seen_words.len(), 3);
        assert_eq!(seen_directions.len(), 2);
    }

    #[test]
    fn test_end_reports_and_resets_score() {
        let vocab = three_words();
        let mut quiz = engine();
        quiz.start(&vocab);
        let expected = quiz.current().unwrap().expected().to_string();
        quiz.answer(&expected);

        let summary = quiz.end(true).unwrap();
        assert!(summary.contains("1 out of 1"));
        assert!(!quiz.is_active());
        assert_eq!(quiz.score(), Score::default());
        assert_eq!(quiz.end(true), None);
    }

    #[test]
    fn test_end_without_score() {
        let mut quiz = engine();
        quiz.start(&three_words());
        assert_eq!(quiz.end(false), None);
        assert!(!quiz.is_active());
    }

    #[test]
    fn test_empty_word_list_ends_quiz() {
        let mut quiz = engine();
        quiz.start(&three_words());
        assert!(quiz.ask_next(&LearnedWords::default()).is_none());
        assert!(!quiz.is_active());
    }
}
