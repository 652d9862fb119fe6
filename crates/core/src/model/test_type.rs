use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown test type: {0}")]
pub struct TestTypeError(pub String);

/// The question range a session covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestType {
    /// Questions 1-45.
    #[serde(rename = "1-45")]
    FirstHalf,
    /// Questions 46-90.
    #[serde(rename = "46-90")]
    SecondHalf,
    /// All 90 questions.
    #[serde(rename = "full")]
    Full,
}

impl TestType {
    pub const ALL: [TestType; 3] = [TestType::FirstHalf, TestType::SecondHalf, TestType::Full];

    /// Wire / route representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TestType::FirstHalf => "1-45",
            TestType::SecondHalf => "46-90",
            TestType::Full => "full",
        }
    }

    #[must_use]
    pub fn is_half(self) -> bool {
        !matches!(self, TestType::Full)
    }

    /// Button label on the selection screen.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TestType::FirstHalf => "Questions 1-45",
            TestType::SecondHalf => "Questions 46-90",
            TestType::Full => "Full Practice",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            TestType::FirstHalf => "First half of the test",
            TestType::SecondHalf => "Second half of the test",
            TestType::Full => "All 90 questions",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = TestTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1-45" => Ok(TestType::FirstHalf),
            "46-90" => Ok(TestType::SecondHalf),
            "full" => Ok(TestType::Full),
            other => Err(TestTypeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_route_segments() {
        for ty in TestType::ALL {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.as_str()));
            assert_eq!(ty.as_str().parse::<TestType>().unwrap(), ty);
        }
    }

    #[test]
    fn unknown_range_is_rejected() {
        assert_eq!(
            "1-90".parse::<TestType>(),
            Err(TestTypeError("1-90".to_string()))
        );
    }
}
