use std::sync::Arc;

use proctor_core::model::Level;
use services::ExamServices;
use url::Url;

pub trait UiApp: Send + Sync {
    fn services(&self) -> ExamServices;
    /// Level the test-taker opened from the dashboard.
    fn level(&self) -> Level;
    /// Origin that serves externally hosted exam content.
    fn content_origin(&self) -> Url;
}

#[derive(Clone)]
pub struct AppContext {
    services: ExamServices,
    level: Level,
    content_origin: Url,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            services: app.services(),
            level: app.level(),
            content_origin: app.content_origin(),
        }
    }

    #[must_use]
    pub fn services(&self) -> &ExamServices {
        &self.services
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn content_origin(&self) -> &Url {
        &self.content_origin
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
