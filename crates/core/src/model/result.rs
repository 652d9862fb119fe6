use serde::{Deserialize, Serialize};

/// Outcome returned by the grading collaborator.
///
/// Legacy completions only describe participation, so every field defaults
/// to zero when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestResult {
    pub total: u32,
    pub correct: u32,
    pub wrong: u32,
    /// Percentage in `0.0..=100.0`.
    pub score: f64,
    pub time_spent: u64,
}

/// Qualitative bucket for a percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Excellent,
    Great,
    Good,
    Fair,
    KeepPracticing,
}

impl ScoreBand {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Excellent
        } else if score >= 80.0 {
            Self::Great
        } else if score >= 70.0 {
            Self::Good
        } else if score >= 60.0 {
            Self::Fair
        } else {
            Self::KeepPracticing
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent! Outstanding performance!",
            Self::Great => "Great job! Very good performance!",
            Self::Good => "Good work! Keep practicing!",
            Self::Fair => "Fair performance. Room for improvement.",
            Self::KeepPracticing => "Keep practicing! You can do better!",
        }
    }
}

/// Colour tier used when rendering a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    High,
    Medium,
    Low,
}

impl ScoreTier {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::High
        } else if score >= 60.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl TestResult {
    #[must_use]
    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }

    #[must_use]
    pub fn tier(&self) -> ScoreTier {
        ScoreTier::from_score(self.score)
    }

    /// `1h 2m 3s`, `2m 3s` or `3s`.
    #[must_use]
    pub fn time_spent_label(&self) -> String {
        format_duration_label(self.time_spent)
    }
}

#[must_use]
pub fn format_duration_label(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participation_only_result_deserializes() {
        let result: TestResult = serde_json::from_str(r#"{"timeSpent": 600}"#).unwrap();
        assert_eq!(result.total, 0);
        assert_eq!(result.time_spent, 600);
    }

    #[test]
    fn duration_labels() {
        assert_eq!(format_duration_label(42), "42s");
        assert_eq!(format_duration_label(125), "2m 5s");
        assert_eq!(format_duration_label(5400), "1h 30m 0s");
    }

    #[test]
    fn bands_and_tiers_follow_thresholds() {
        assert_eq!(ScoreBand::from_score(90.0), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(79.9), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(10.0), ScoreBand::KeepPracticing);
        assert_eq!(ScoreTier::from_score(80.0), ScoreTier::High);
        assert_eq!(ScoreTier::from_score(60.0), ScoreTier::Medium);
        assert_eq!(ScoreTier::from_score(59.0), ScoreTier::Low);
    }
}
