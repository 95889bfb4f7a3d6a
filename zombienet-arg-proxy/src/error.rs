use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("unknown flag: {0}")]
    UnknownFlag(String),
    #[error("argument is not valid UTF-8: {0}")]
    NonUtf8Argument(String),
    #[error("missing `--` separator before the command")]
    MissingSeparator,
    #[error("missing command after `--`")]
    MissingCommand,
    #[error("missing required relay argument {0}")]
    MissingArgument(&'static str),
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to register signal handlers: {0}")]
    Signals(#[source] io::Error),
    #[error("failed to wait for child process: {0}")]
    Wait(#[source] io::Error),
}

impl ProxyError {
    /// Errors caused by a malformed command line, reported together with the usage banner.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            ProxyError::UnknownFlag(_)
                | ProxyError::NonUtf8Argument(_)
                | ProxyError::MissingSeparator
                | ProxyError::MissingCommand
        )
    }
}
