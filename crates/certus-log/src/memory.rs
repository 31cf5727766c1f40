//! In-memory implementation of `EventStore`.
//!
//! `InMemoryEventStore` is the reference store. Each scope's chain sits
//! behind its own `RwLock`, so commits on different scopes never contend,
//! and readers always see a scope either before or after a commit.
//!
//! Lock order is scope map, then a single scope chain, then the ID index.
//! Readers that start from the index release it before touching a chain.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use tracing::debug;

use certus_contracts::{
    error::{CertusError, CertusResult},
    event::{ChainHead, Event, EventId, ScopeId},
    timestamp::{QualifiedTimestamp, TimestampStatus},
};
use certus_core::traits::EventStore;

type ScopeChain = Arc<RwLock<Vec<Event>>>;

fn poisoned(what: &str) -> CertusError {
    CertusError::StorageFailure {
        reason: format!("{} lock poisoned", what),
    }
}

/// An in-memory, append-only event store with per-scope compare-and-swap.
#[derive(Default)]
pub struct InMemoryEventStore {
    scopes: RwLock<HashMap<ScopeId, ScopeChain>>,
    index: RwLock<HashMap<EventId, (ScopeId, u64)>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn chain(&self, scope_id: &ScopeId) -> CertusResult<Option<ScopeChain>> {
        let scopes = self.scopes.read().map_err(|_| poisoned("scope map"))?;
        Ok(scopes.get(scope_id).cloned())
    }

    fn chain_or_create(&self, scope_id: &ScopeId) -> CertusResult<ScopeChain> {
        if let Some(chain) = self.chain(scope_id)? {
            return Ok(chain);
        }
        let mut scopes = self.scopes.write().map_err(|_| poisoned("scope map"))?;
        Ok(Arc::clone(scopes.entry(scope_id.clone()).or_default()))
    }

    fn locate(&self, event_id: &EventId) -> CertusResult<Option<(ScopeId, u64)>> {
        let index = self.index.read().map_err(|_| poisoned("event index"))?;
        Ok(index.get(event_id).cloned())
    }

    /// Number of scopes with at least one committed event.
    pub fn scope_count(&self) -> usize {
        let Ok(scopes) = self.scopes.read() else {
            return 0;
        };
        scopes
            .values()
            .filter(|chain| chain.read().map(|events| !events.is_empty()).unwrap_or(false))
            .count()
    }

    /// Load previously persisted rows as-is, e.g. from a backup.
    ///
    /// No linkage or hash checks are made: a restored scope must pass
    /// `verify_chain` before it is trusted. Rows are appended to their
    /// scope in the order given. Returns the number of rows loaded.
    pub fn restore(&self, events: Vec<Event>) -> CertusResult<usize> {
        let loaded = events.len();
        for event in events {
            let chain = self.chain_or_create(&event.scope_id)?;
            let mut rows = chain.write().map_err(|_| poisoned("scope chain"))?;
            let position = rows.len() as u64;
            let mut index = self.index.write().map_err(|_| poisoned("event index"))?;
            index.insert(event.id, (event.scope_id.clone(), position));
            rows.push(event);
        }
        debug!(loaded, "rows restored without verification");
        Ok(loaded)
    }

    /// Rewrite a stored event in place, bypassing every check.
    ///
    /// Stands in for out-of-band edits at the storage layer in tests.
    #[cfg(test)]
    pub(crate) fn tamper<F: FnOnce(&mut Vec<Event>)>(&self, scope_id: &ScopeId, f: F) {
        let chain = self.chain(scope_id).unwrap().expect("scope exists");
        let mut events = chain.write().unwrap();
        f(&mut events);
    }

    /// Poison the ID index by panicking while its write lock is held.
    #[cfg(test)]
    pub(crate) fn poison_index(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _held = self.index.write().unwrap();
            panic!("index writer crashed");
        }));
    }
}

impl EventStore for InMemoryEventStore {
    fn head(&self, scope_id: &ScopeId) -> CertusResult<Option<ChainHead>> {
        match self.chain(scope_id)? {
            None => Ok(None),
            Some(chain) => {
                let events = chain.read().map_err(|_| poisoned("scope chain"))?;
                Ok(events.last().map(Event::as_head))
            }
        }
    }

    fn commit(&self, expected_head: Option<&ChainHead>, event: &Event) -> CertusResult<()> {
        let chain = self.chain_or_create(&event.scope_id)?;
        let mut events = chain.write().map_err(|_| poisoned("scope chain"))?;

        let current = events.last().map(Event::as_head);
        if current.as_ref() != expected_head {
            debug!(
                scope_id = %event.scope_id,
                attempted_sequence = event.sequence_number,
                head_sequence = ?current.as_ref().map(|h| h.sequence_number),
                "rejecting commit against stale head"
            );
            return Err(CertusError::ChainHeadConflict {
                scope_id: event.scope_id.to_string(),
                expected_sequence: event.sequence_number,
                found_sequence: current.map(|h| h.sequence_number),
            });
        }

        // Index first: once the row is pushed the commit must not fail.
        let mut index = self.index.write().map_err(|_| poisoned("event index"))?;
        let position = events.len() as u64;
        index.insert(event.id, (event.scope_id.clone(), position));
        events.push(event.clone());
        Ok(())
    }

    fn get(&self, event_id: &EventId) -> CertusResult<Option<Event>> {
        let Some((scope_id, sequence)) = self.locate(event_id)? else {
            return Ok(None);
        };
        let Some(chain) = self.chain(&scope_id)? else {
            return Ok(None);
        };
        let events = chain.read().map_err(|_| poisoned("scope chain"))?;
        Ok(events
            .get(sequence as usize)
            .filter(|e| &e.id == event_id)
            .cloned())
    }

    fn scope_events(&self, scope_id: &ScopeId) -> CertusResult<Vec<Event>> {
        match self.chain(scope_id)? {
            None => Ok(Vec::new()),
            Some(chain) => {
                let events = chain.read().map_err(|_| poisoned("scope chain"))?;
                Ok(events.clone())
            }
        }
    }

    fn attach_timestamp(
        &self,
        event_id: &EventId,
        timestamp: &QualifiedTimestamp,
    ) -> CertusResult<bool> {
        let not_found = || CertusError::EventNotFound {
            event_id: event_id.to_string(),
        };
        let (scope_id, sequence) = self.locate(event_id)?.ok_or_else(not_found)?;
        let chain = self.chain(&scope_id)?.ok_or_else(not_found)?;
        let mut events = chain.write().map_err(|_| poisoned("scope chain"))?;

        let event = events
            .get_mut(sequence as usize)
            .filter(|e| &e.id == event_id)
            .ok_or_else(not_found)?;

        if event.timestamp_status != TimestampStatus::Pending {
            return Ok(false);
        }
        event.qualified_timestamp = Some(timestamp.clone());
        event.timestamp_status = TimestampStatus::Attached;
        Ok(true)
    }
}
