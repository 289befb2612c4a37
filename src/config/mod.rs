//! Configuration and settings management.
//!
//! Settings are plain serde structs handed to component constructors at
//! startup. They are stored as JSON in the user's config directory.

mod settings;

pub use settings::{
    AiSettings, BackendKind, CategorizerSettings, ChatSettings, CloudSettings, ConfigError,
    LocalModelSettings, PipelineSettings, Settings, SummarySettings,
};
