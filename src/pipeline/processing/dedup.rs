//! De-duplication gate run before a record is persisted.
//!
//! Rules, in order, within one scope:
//! 1. a non-empty URL equal to a stored URL is a duplicate;
//! 2. otherwise equal title and date (and source, when the policy says so)
//!    is a duplicate;
//! 3. anything else is unique and gets inserted.
//!
//! An absent date only matches another absent date.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::common::error::Result;
use crate::config::DedupConfig;
use crate::domain::{CanonicalEvent, DedupKey};
use crate::observability::metrics;
use crate::pipeline::storage::{DedupScope, EventStore, InsertOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupPolicy {
    /// Compare source as well as title and date in rule 2
    pub match_source: bool,
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self { match_source: true }
    }
}

impl From<&DedupConfig> for DedupPolicy {
    fn from(config: &DedupConfig) -> Self {
        Self {
            match_source: config.match_source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchRule {
    Url,
    TitleDate,
    /// Passed the check but lost to a concurrent insert
    StoreConstraint,
}

impl MatchRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchRule::Url => "url",
            MatchRule::TitleDate => "title_date",
            MatchRule::StoreConstraint => "store_constraint",
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    Duplicate { rule: MatchRule, existing: Uuid },
    Unique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Inserted(Uuid),
    /// Skipped; not an error
    Duplicate(MatchRule),
}

pub struct DedupGate {
    store: Arc<dyn EventStore>,
    policy: DedupPolicy,
}

impl DedupGate {
    pub fn new(store: Arc<dyn EventStore>, policy: DedupPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    /// Decide without writing anything
    pub async fn check(&self, scope: &DedupScope, event: &CanonicalEvent) -> Result<DedupDecision> {
        if let DedupKey::Url(url) = event.dedup_key() {
            if let Some(existing) = self.store.find_by_url(scope, &url).await? {
                return Ok(DedupDecision::Duplicate {
                    rule: MatchRule::Url,
                    existing: existing.row_id,
                });
            }
        }

        let source = self.policy.match_source.then_some(event.source);
        if let Some(existing) = self
            .store
            .find_by_title_date(scope, &event.title, event.date, source)
            .await?
        {
            return Ok(DedupDecision::Duplicate {
                rule: MatchRule::TitleDate,
                existing: existing.row_id,
            });
        }

        Ok(DedupDecision::Unique)
    }

    /// Check, then insert if unique.
    ///
    /// The check and the insert are separate store calls; a record that slips
    /// between them is caught by the store's uniqueness constraint and
    /// reported as [`MatchRule::StoreConstraint`].
    pub async fn admit(&self, scope: &DedupScope, event: &CanonicalEvent) -> Result<Admission> {
        let admission = match self.check(scope, event).await? {
            DedupDecision::Duplicate { rule, existing } => {
                debug!(
                    "Skipping duplicate '{}' ({} match with {})",
                    event.title, rule, existing
                );
                Admission::Duplicate(rule)
            }
            DedupDecision::Unique => match self.store.insert(scope, event).await? {
                InsertOutcome::Inserted(row_id) => Admission::Inserted(row_id),
                InsertOutcome::AlreadyExists(existing) => {
                    debug!(
                        "Insert of '{}' rejected by store, existing row {}",
                        event.title, existing
                    );
                    Admission::Duplicate(MatchRule::StoreConstraint)
                }
            },
        };

        match admission {
            Admission::Inserted(_) => metrics::dedup::inserted(),
            Admission::Duplicate(rule) => metrics::dedup::duplicate(rule.as_str()),
        }
        Ok(admission)
    }
}
