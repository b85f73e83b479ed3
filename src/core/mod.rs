pub mod compatibility;
pub mod demo;
pub mod directory;
pub mod lifecycle;
pub mod progression;

pub use crate::domain::model::{Document, SwapRequest, SwapStatus, UserProfile};
pub use crate::domain::ports::{DocumentStore, MatchSettings};
pub use crate::utils::error::Result;
