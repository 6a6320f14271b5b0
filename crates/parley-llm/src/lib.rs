pub mod config;
pub mod error;
pub mod model;
pub mod registry;

pub use config::{LlmConfig, ModelSettings, Provider, Purpose};
pub use error::LlmError;
pub use model::ChatModel;
pub use registry::LlmRegistry;
