//! Externally hosted exam content shown in a sandboxed frame.
//!
//! Only level 1 half ranges are served this way. The content grades itself;
//! the session reports elapsed time and nothing else.

use url::Url;

use proctor_core::model::{LegacyCompletion, Level, TestType};

/// Frame sandbox tokens. Nothing beyond scripts, same-origin and forms.
pub const SANDBOX: &str = "allow-scripts allow-same-origin allow-forms";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyContent {
    /// Site-relative path of the content entry page.
    pub path: &'static str,
    pub title: &'static str,
    pub label: &'static str,
}

const FIRST_HALF: LegacyContent = LegacyContent {
    path: "/lvl-1-1/index.html",
    title: "Level 1 Part 1",
    label: "Questions 1\u{2013}45",
};

const SECOND_HALF: LegacyContent = LegacyContent {
    path: "/lvl-1-2/index.html",
    title: "Level 1 Part 2",
    label: "Questions 46\u{2013}90",
};

/// `Some` when `(level, test_type)` is served by external content.
#[must_use]
pub fn legacy_content_for(level: Level, test_type: TestType) -> Option<LegacyContent> {
    if level.value() != 1 {
        return None;
    }
    match test_type {
        TestType::FirstHalf => Some(FIRST_HALF),
        TestType::SecondHalf => Some(SECOND_HALF),
        TestType::Full => None,
    }
}

impl LegacyContent {
    /// Absolute URL of the content against the site origin.
    ///
    /// # Errors
    ///
    /// Propagates `url::ParseError` if `origin` cannot be joined.
    pub fn resolve(&self, origin: &Url) -> Result<Url, url::ParseError> {
        origin.join(self.path)
    }

    /// The participation-only payload for the completion endpoint.
    #[must_use]
    pub fn completion(level: Level, test_type: TestType, time_spent: u64) -> LegacyCompletion {
        LegacyCompletion {
            level,
            test_type,
            time_spent,
        }
    }
}
