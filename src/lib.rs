pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{json_store::JsonFileStore, toml_config::TomlConfig};
pub use core::compatibility::{score, Breakdown};
pub use core::directory::{MatchQuery, SkillDirectory};
pub use core::lifecycle::{Completion, RequestDraft};
pub use domain::model::{Badge, Document, Proficiency, SwapRequest, SwapStatus, UserProfile};
pub use utils::error::{Result, SwapError};
