use crate::vocab::LearnedWord;
use rand::Rng;

/// Which side of the pair the learner has to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Show the English term, expect the Hausa translation
    SourceToTarget,
    /// Show the Hausa translation, expect the English term
    TargetToSource,
}

impl Direction {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Direction::SourceToTarget
        } else {
            Direction::TargetToSource
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub word: LearnedWord,
    pub direction: Direction,
}

impl Question {
    pub fn new(word: LearnedWord, direction: Direction) -> Self {
        Self { word, direction }
    }

    /// The side shown to the learner
    pub fn shown(&self) -> &str {
        match self.direction {
            Direction::SourceToTarget => &self.word.source_term,
            Direction::TargetToSource => &self.word.target_translation,
        }
    }

    pub fn expected(&self) -> &str {
        match self.direction {
            Direction::SourceToTarget => &self.word.target_translation,
            Direction::TargetToSource => &self.word.source_term,
        }
    }

    pub fn prompt(&self) -> String {
        match self.direction {
            Direction::SourceToTarget => {
                format!("What is the Hausa translation of **{}**?", self.shown())
            }
            Direction::TargetToSource => {
                format!("What is the English word for **{}**?", self.shown())
            }
        }
    }

    /// Trimmed, case-insensitive comparison with the expected side
    pub fn accepts(&self, answer: &str) -> bool {
        answer.trim().to_lowercase() == self.expected().trim().to_lowercase()
    }
}

/// Running tally of one quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub correct: u32,
    pub asked: u32,
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.correct, self.asked)
    }
}
