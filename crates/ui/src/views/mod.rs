mod components;
mod exam;
mod scope;

pub use components::{
    AbortedPanel, LegacyFrame, QuestionCard, ResultPanel, SessionHeader, TypeSelection,
    WarningBanner, WatermarkOverlay,
};
pub use exam::{ExamScreen, ExamView};
pub use scope::{SessionScope, use_snapshot};

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;
