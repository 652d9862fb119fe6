use serde::{Deserialize, Serialize};

use crate::model::{Level, UserId};

/// Placeholder printed when no document number is on file.
pub const MISSING_DOCUMENT: &str = "N/A";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelAccess {
    pub level1: bool,
    pub level2: bool,
    pub level3: bool,
}

/// The authenticated test-taker, as reported by the identity collaborator.
///
/// Read-only from the session's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub level_access: LevelAccess,
    #[serde(default)]
    pub passport_full_name: Option<String>,
    #[serde(default)]
    pub passport_number: Option<String>,
}

impl Identity {
    /// Levels above 3 are never granted.
    #[must_use]
    pub fn can_access(&self, level: Level) -> bool {
        match level.value() {
            1 => self.level_access.level1,
            2 => self.level_access.level2,
            3 => self.level_access.level3,
            _ => false,
        }
    }

    /// Full name when known, else the account name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.passport_full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }

    #[must_use]
    pub fn document_number(&self) -> &str {
        self.passport_number
            .as_deref()
            .filter(|number| !number.trim().is_empty())
            .unwrap_or(MISSING_DOCUMENT)
    }

    /// Text repeated across the watermark overlay.
    #[must_use]
    pub fn watermark_text(&self) -> String {
        format!("{} · {}", self.display_name(), self.document_number())
    }
}
