use crate::AhmadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Topic the tutor draws new words from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    General,
    FoodAndDining,
    Travel,
    Technology,
    AtHome,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::General,
        Category::FoodAndDining,
        Category::Travel,
        Category::Technology,
        Category::AtHome,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::General => "General",
            Category::FoodAndDining => "Food & Dining",
            Category::Travel => "Travel",
            Category::Technology => "Technology",
            Category::AtHome => "At Home",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = AhmadError;

    /// Accepts the display label or a loose spelling ("food", "at-home", "tech")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "general" => Ok(Category::General),
            "fooddining" | "food" | "dining" => Ok(Category::FoodAndDining),
            "travel" => Ok(Category::Travel),
            "technology" | "tech" => Ok(Category::Technology),
            "athome" | "home" => Ok(Category::AtHome),
            _ => Err(AhmadError::ConfigError(format!("unknown category: {s}"))),
        }
    }
}
