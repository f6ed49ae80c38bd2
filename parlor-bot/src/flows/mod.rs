use std::collections::HashMap;
use std::sync::Mutex;

pub mod checkout;
pub mod contest;
pub mod engine;
pub mod profile;
pub mod santa;

use engine::FlowState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    Profile,
    Contest,
    Checkout,
    Santa,
}

/// Typed working state of whichever guided flow the user has open.
pub enum ActiveFlow {
    Profile(FlowState<profile::ProfileDraft>),
    Contest(FlowState<contest::ContestDraft>),
    Checkout(FlowState<checkout::CheckoutDraft>),
    Santa(FlowState<santa::SantaDraft>),
}

impl ActiveFlow {
    pub fn kind(&self) -> FlowKind {
        match self {
            Self::Profile(_) => FlowKind::Profile,
            Self::Contest(_) => FlowKind::Contest,
            Self::Checkout(_) => FlowKind::Checkout,
            Self::Santa(_) => FlowKind::Santa,
        }
    }
}

/// Process-scoped drafts, one active flow per user. Starting a new flow
/// replaces any abandoned one; drafts do not survive a restart.
#[derive(Default)]
pub struct FlowRegistry {
    active: Mutex<HashMap<i64, ActiveFlow>>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, user_id: i64, flow: ActiveFlow) {
        self.active.lock().unwrap().insert(user_id, flow);
    }

    /// Removes the flow for handling; the caller re-inserts it when the
    /// flow is still in progress.
    pub fn take(&self, user_id: i64) -> Option<ActiveFlow> {
        self.active.lock().unwrap().remove(&user_id)
    }

    /// Explicit cancel: the draft is discarded with nothing persisted.
    pub fn clear(&self, user_id: i64) -> bool {
        self.active.lock().unwrap().remove(&user_id).is_some()
    }

    pub fn active_kind(&self, user_id: i64) -> Option<FlowKind> {
        self.active.lock().unwrap().get(&user_id).map(ActiveFlow::kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::engine::FlowEvent;

    #[test]
    fn cancel_discards_the_draft_mid_flow() {
        let registry = FlowRegistry::new();
        let (mut flow, _) = profile::ENGINE.start(profile::ProfileDraft::default());
        profile::ENGINE
            .handle(&mut flow, &FlowEvent::Text("30".into()))
            .unwrap();
        registry.put(7, ActiveFlow::Profile(flow));
        assert_eq!(registry.active_kind(7), Some(FlowKind::Profile));

        assert!(registry.clear(7));
        assert_eq!(registry.active_kind(7), None);
        assert!(registry.take(7).is_none());
        // Cancel is also idempotent.
        assert!(!registry.clear(7));
    }

    #[test]
    fn starting_a_new_flow_replaces_the_abandoned_one() {
        let registry = FlowRegistry::new();
        let (flow, _) = profile::ENGINE.start(profile::ProfileDraft::default());
        registry.put(7, ActiveFlow::Profile(flow));
        let (flow, _) = contest::ENGINE.start(contest::ContestDraft::default());
        registry.put(7, ActiveFlow::Contest(flow));
        assert_eq!(registry.active_kind(7), Some(FlowKind::Contest));
    }
}
