//! Notifications emitted by the governance engine.

use serde::{Deserialize, Serialize};
use tally_types::{Address, ProposalId, Timestamp, TokenAmount};

use crate::proposal::ProposalStatus;

/// Governance events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceEvent {
    /// A proposal was accepted into the registry.
    ProposalCreated {
        proposal_id: ProposalId,
        creator: Address,
        deadline: Timestamp,
    },
    /// Emitted exactly once per successful vote.
    VoteCast {
        voter: Address,
        proposal_id: ProposalId,
        support: bool,
        weight: TokenAmount,
    },
    /// Emitted on every successful finalize call, including repeats.
    VoteEnded {
        proposal_id: ProposalId,
        total_votes_yes: u64,
        total_weight_yes: TokenAmount,
        total_votes_no: u64,
        total_weight_no: TokenAmount,
        status: ProposalStatus,
    },
}

impl GovernanceEvent {
    pub fn proposal_id(&self) -> ProposalId {
        match self {
            Self::ProposalCreated { proposal_id, .. }
            | Self::VoteCast { proposal_id, .. }
            | Self::VoteEnded { proposal_id, .. } => *proposal_id,
        }
    }
}

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline on the emitting thread, after the operation's
/// effects are in place.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&GovernanceEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&GovernanceEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &GovernanceEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn vote_cast() -> GovernanceEvent {
        GovernanceEvent::VoteCast {
            voter: Address::new("bob"),
            proposal_id: ProposalId::new(3),
            support: true,
            weight: TokenAmount::new(10),
        }
    }

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));

        let c2 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        }));

        bus.emit(&vote_cast());
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn emit_with_no_listeners_is_noop() {
        let bus = EventBus::new();
        bus.emit(&vote_cast());
    }

    #[test]
    fn listener_receives_event_payload() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        let sink = Arc::clone(&seen);
        bus.subscribe(Box::new(move |event| {
            sink.lock().unwrap().push(event.clone());
        }));

        bus.emit(&vote_cast());
        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[vote_cast()]);
        assert_eq!(seen[0].proposal_id(), ProposalId::new(3));
    }
}
