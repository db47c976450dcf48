// src/registry.rs
//! Owned set of configured sources and their retention state, shared by
//! the scheduler and the status surface.
//!
//! Only the scheduler writes a slot: it snapshots the state at the start of
//! a source's tick and commits the successor at the end. Readers never
//! observe a half-updated source.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::config::SourceConfig;
use crate::retention::SourceState;

#[derive(Debug)]
pub struct SourceSlot {
    config: SourceConfig,
    state: RwLock<SourceState>,
}

impl SourceSlot {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            state: RwLock::new(SourceState::Unpolled),
        }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SourceState {
        self.state.read().clone()
    }

    pub fn commit(&self, next: SourceState) {
        *self.state.write() = next;
    }

    /// Run `f` against the current state without cloning it.
    pub fn inspect<R>(&self, f: impl FnOnce(&SourceState) -> R) -> R {
        f(&self.state.read())
    }
}

#[derive(Debug)]
pub struct Registry {
    slots: Vec<SourceSlot>,
    started_at: DateTime<Utc>,
}

impl Registry {
    pub fn new(sources: Vec<SourceConfig>, started_at: DateTime<Utc>) -> Self {
        Self {
            slots: sources.into_iter().map(SourceSlot::new).collect(),
            started_at,
        }
    }

    pub fn slots(&self) -> &[SourceSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
