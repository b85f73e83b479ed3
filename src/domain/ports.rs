use crate::domain::model::Document;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Whole-document persistence. Every mutation is a full read-modify-write;
/// there is no locking, so two processes writing the same document race.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self) -> Result<Document>;
    async fn save(&self, document: &Document) -> Result<()>;
}

pub trait MatchSettings: Send + Sync {
    fn min_score(&self) -> f64;
    fn match_limit(&self) -> Option<usize>;
}
