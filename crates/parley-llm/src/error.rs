use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("Unknown model purpose: {0}")]
    UnknownPurpose(String),

    #[error("Invalid provider: {0}")]
    UnknownProvider(String),

    #[error("Missing API key for {provider}: set {env_var}")]
    MissingApiKey { provider: String, env_var: String },
}

pub type Result<T> = std::result::Result<T, LlmError>;
