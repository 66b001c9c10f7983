pub mod in_memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::common::error::Result;
use crate::domain::{CanonicalEvent, Source};

pub use in_memory::InMemoryStorage;

/// Namespace a record is de-duplicated within
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupScope {
    /// The shared event catalogue
    Global,
    /// One user's saved favourites
    User(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    pub row_id: Uuid,
    pub scope: DedupScope,
    pub event: CanonicalEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Uuid),
    /// The store's own uniqueness constraint fired
    AlreadyExists(Uuid),
}

/// Persistence port used by the de-duplication gate
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find_by_url(&self, scope: &DedupScope, url: &str) -> Result<Option<StoredEvent>>;

    /// `source: None` matches any source
    async fn find_by_title_date(
        &self,
        scope: &DedupScope,
        title: &str,
        date: Option<NaiveDate>,
        source: Option<Source>,
    ) -> Result<Option<StoredEvent>>;

    async fn insert(&self, scope: &DedupScope, event: &CanonicalEvent) -> Result<InsertOutcome>;

    async fn list(&self, scope: &DedupScope) -> Result<Vec<CanonicalEvent>>;
}
