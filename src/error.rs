//! Application-level error carrying a process exit code.
//!
//! Exit codes:
//! - 2: invalid input, configuration, or file I/O
//! - 3: a file that could not be decoded as a misfit ensemble
//! - 4: internal/runtime failure

use crate::series::StepRangeError;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<StepRangeError> for AppError {
    fn from(err: StepRangeError) -> Self {
        AppError::new(2, format!("Invalid report-step window: {err}"))
    }
}
