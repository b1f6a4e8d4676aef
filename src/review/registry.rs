//! Single source of truth for per-project review state.
//!
//! Holds two maps addressed by [`ProjectId`]:
//! - the displayed [`ReviewState`] of every key ever touched
//! - the in-flight entry (ticket + cancellation token) of keys with an active review
//!
//! Every write coming from an asynchronous continuation carries the
//! [`ReviewTicket`] it was started with. A write whose ticket is no longer the
//! registered one is refused, which is how late results for a cancelled or
//! superseded review are discarded.

use std::collections::{BTreeMap, HashMap};

use tokio_util::sync::CancellationToken;

use super::state::{ProjectId, ReviewState};

/// Identity of one registered review. Never reused within a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReviewTicket(u64);

impl ReviewTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct ActiveReview {
    ticket: ReviewTicket,
    cancel: CancellationToken,
    /// Set once the real result has been merged; simulated ticks are refused after that.
    merged: bool,
}

#[derive(Debug, Default)]
pub struct ReviewRegistry {
    states: HashMap<ProjectId, ReviewState>,
    active: HashMap<ProjectId, ActiveReview>,
    next_ticket: u64,
    /// Number of published state changes.
    revision: u64,
}

impl ReviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, project_id: ProjectId) -> bool {
        self.active.contains_key(&project_id)
    }

    pub fn is_current(&self, project_id: ProjectId, ticket: ReviewTicket) -> bool {
        self.active
            .get(&project_id)
            .is_some_and(|active| active.ticket == ticket)
    }

    /// Current state of `project_id`, idle if it was never touched.
    pub fn state(&self, project_id: ProjectId) -> ReviewState {
        self.states.get(&project_id).cloned().unwrap_or_default()
    }

    pub fn snapshot(&self) -> BTreeMap<ProjectId, ReviewState> {
        self.states
            .iter()
            .map(|(id, state)| (*id, state.clone()))
            .collect()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    pub fn active_keys(&self) -> Vec<ProjectId> {
        let mut keys: Vec<ProjectId> = self.active.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Register an in-flight review and reset the displayed state to
    /// `running` at 0%.
    ///
    /// Returns `None` when the key already has an active review or its state
    /// is still running; the existing review is left untouched.
    pub fn register(
        &mut self,
        project_id: ProjectId,
        cancel: CancellationToken,
    ) -> Option<ReviewTicket> {
        if self.is_active(project_id) || self.state(project_id).is_running() {
            return None;
        }
        self.next_ticket += 1;
        let ticket = ReviewTicket(self.next_ticket);
        self.active.insert(
            project_id,
            ActiveReview {
                ticket,
                cancel,
                merged: false,
            },
        );
        self.states.insert(project_id, ReviewState::running(0));
        Some(ticket)
    }

    /// Drop the in-flight entry for `project_id` if `ticket` still owns it.
    pub fn unregister(&mut self, project_id: ProjectId, ticket: ReviewTicket) -> bool {
        if self.is_current(project_id, ticket) {
            self.active.remove(&project_id);
            true
        } else {
            false
        }
    }

    /// Abort the active review of `project_id`: cancel its token (which also
    /// stops its simulator), remove the entry, and publish the cancelled
    /// state. Returns `false` and changes nothing when no review is active.
    pub fn cancel(&mut self, project_id: ProjectId) -> bool {
        match self.active.remove(&project_id) {
            Some(active) => {
                active.cancel.cancel();
                self.states.insert(project_id, ReviewState::cancelled());
                true
            }
            None => false,
        }
    }

    /// Apply a simulated step. Refused once the ticket is stale or the real
    /// result has been merged.
    pub fn apply_tick(
        &mut self,
        project_id: ProjectId,
        ticket: ReviewTicket,
        advance: impl FnOnce(u8) -> u8,
    ) -> Option<ReviewState> {
        let active = self.active.get(&project_id)?;
        if active.ticket != ticket || active.merged {
            return None;
        }
        let state = self.states.get_mut(&project_id)?;
        if !state.is_running() {
            return None;
        }
        let next = advance(state.progress());
        state.raise_progress(next);
        Some(state.clone())
    }

    /// Merge the real percentage into the running state: the displayed value
    /// becomes `max(last simulated, real)` and further ticks are refused.
    pub fn merge_real(
        &mut self,
        project_id: ProjectId,
        ticket: ReviewTicket,
        percent: u8,
    ) -> Option<ReviewState> {
        let active = self.active.get_mut(&project_id)?;
        if active.ticket != ticket {
            return None;
        }
        active.merged = true;
        let state = self.states.get_mut(&project_id)?;
        state.raise_progress(percent);
        Some(state.clone())
    }

    /// Write a terminal state and drop the in-flight entry, if `ticket` is
    /// still the registered one.
    pub fn commit(
        &mut self,
        project_id: ProjectId,
        ticket: ReviewTicket,
        state: ReviewState,
    ) -> bool {
        if !self.unregister(project_id, ticket) {
            return false;
        }
        self.states.insert(project_id, state);
        true
    }
}
