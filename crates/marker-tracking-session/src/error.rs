use marker_tracking_core::SettingsError;

use crate::controller::SessionState;

/// Errors returned by the session controller.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    InvalidSettings(#[from] SettingsError),
    #[error("session is {actual}, expected {expected}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },
}
