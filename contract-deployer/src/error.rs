use thiserror::Error;

/// Failure of one stage of the deployment pipeline. Every variant is terminal.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("missing configuration: {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),

    #[error("invalid configuration value for {name}: {reason}")]
    InvalidConfig { name: &'static str, reason: String },

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("send error: {0}")]
    Send(String),

    #[error("receipt wait error: {0}")]
    ReceiptWait(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeployError>;
