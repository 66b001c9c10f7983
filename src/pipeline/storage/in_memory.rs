use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use super::{DedupScope, EventStore, InsertOutcome, StoredEvent};
use crate::common::error::{Result, ScraperError};
use crate::domain::{CanonicalEvent, Source};

/// In-memory event store for the CLI and tests.
///
/// Enforces the same uniqueness a database would: per scope, one row per
/// non-empty URL and one row per (title, date, source).
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    events: Arc<Mutex<Vec<StoredEvent>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<StoredEvent>>> {
        self.events.lock().map_err(|e| ScraperError::Storage {
            message: format!("event store lock poisoned: {}", e),
        })
    }
}

fn non_empty(url: Option<&str>) -> Option<&str> {
    url.map(str::trim).filter(|u| !u.is_empty())
}

fn same_title_date(
    stored: &CanonicalEvent,
    title: &str,
    date: Option<NaiveDate>,
    source: Option<Source>,
) -> bool {
    stored.title == title && stored.date == date && source.map_or(true, |s| stored.source == s)
}

#[async_trait]
impl EventStore for InMemoryStorage {
    async fn find_by_url(&self, scope: &DedupScope, url: &str) -> Result<Option<StoredEvent>> {
        let url = url.trim();
        let events = self.lock()?;
        Ok(events
            .iter()
            .find(|row| &row.scope == scope && non_empty(row.event.url.as_deref()) == Some(url))
            .cloned())
    }

    async fn find_by_title_date(
        &self,
        scope: &DedupScope,
        title: &str,
        date: Option<NaiveDate>,
        source: Option<Source>,
    ) -> Result<Option<StoredEvent>> {
        let events = self.lock()?;
        Ok(events
            .iter()
            .find(|row| &row.scope == scope && same_title_date(&row.event, title, date, source))
            .cloned())
    }

    async fn insert(&self, scope: &DedupScope, event: &CanonicalEvent) -> Result<InsertOutcome> {
        let mut events = self.lock()?;

        let url = non_empty(event.url.as_deref());
        let conflict = events.iter().find(|row| {
            &row.scope == scope
                && ((url.is_some() && non_empty(row.event.url.as_deref()) == url)
                    || same_title_date(&row.event, &event.title, event.date, Some(event.source)))
        });
        if let Some(existing) = conflict {
            debug!(
                "Insert of '{}' hit uniqueness constraint (existing row {})",
                event.title, existing.row_id
            );
            return Ok(InsertOutcome::AlreadyExists(existing.row_id));
        }

        let row_id = Uuid::new_v4();
        events.push(StoredEvent {
            row_id,
            scope: scope.clone(),
            event: event.clone(),
        });
        debug!("Stored event: {} with id {}", event.title, row_id);
        Ok(InsertOutcome::Inserted(row_id))
    }

    async fn list(&self, scope: &DedupScope) -> Result<Vec<CanonicalEvent>> {
        let events = self.lock()?;
        Ok(events
            .iter()
            .filter(|row| &row.scope == scope)
            .map(|row| row.event.clone())
            .collect())
    }
}
