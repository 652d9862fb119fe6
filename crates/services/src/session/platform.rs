use super::lockdown::EventHost;
use crate::error::FullscreenDenied;

/// The page the session runs in: the shared document-level event target plus
/// the fullscreen capability.
pub trait Platform: EventHost + Send {
    /// Ask for fullscreen. Denial is reported, never fatal.
    ///
    /// # Errors
    ///
    /// `FullscreenDenied` when the platform refuses or has no fullscreen.
    fn request_fullscreen(&mut self) -> Result<(), FullscreenDenied>;
}
