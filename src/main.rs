//! CLI entry point for the imagery downloader.

use std::process::ExitCode;

mod app;
mod app_config;
mod cli;
mod commands;

/// Process outcome, mapped to the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Batch finished (per-record failures within threshold) or dry run done.
    Success,
    /// Invoked without the coordinates file.
    Usage,
    /// Failure rate exceeded `max_failure_rate`.
    FailureThreshold,
}

impl ProcessExit {
    fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Usage => 1,
            Self::FailureThreshold => 3,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match app::runtime::run_downloader().await {
        Ok(exit) => exit.into(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
