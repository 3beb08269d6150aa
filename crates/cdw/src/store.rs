//! Shared flow state store
//!
//! The store owns the [`FlowState`] and an epoch counter. Actions that invalidate in-flight
//! work (reset, disconnect) bump the epoch; async continuations capture the epoch before
//! suspending and commit through [`StateStore::dispatch_if_current`], which drops the write
//! if the epoch moved on in the meantime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::action::{apply_action, Action};
use crate::state::{FlowState, FlowStep};

/// Flow state store
#[derive(Debug, Clone)]
pub struct StateStore {
    state: Arc<watch::Sender<FlowState>>,
    epoch: Arc<AtomicU64>,
}

impl StateStore {
    /// Create a new [`StateStore`]
    pub fn new(state: FlowState) -> Self {
        let (state, _) = watch::channel(state);
        Self {
            state: Arc::new(state),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current state
    pub fn snapshot(&self) -> FlowState {
        self.state.borrow().clone()
    }

    /// Read from the current state without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&FlowState) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Current step
    pub fn current_step(&self) -> FlowStep {
        self.read(|state| state.current_step)
    }

    /// Current epoch
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<FlowState> {
        self.state.subscribe()
    }

    /// Apply an action
    pub fn dispatch(&self, action: Action) -> FlowStep {
        let mut step = FlowStep::default();
        self.state.send_if_modified(|state| {
            step = self.apply(state, action);
            true
        });
        step
    }

    /// Inspect the state and apply the action `f` returns, as one update
    ///
    /// No other dispatch can run between the check and the write. Returns the value paired
    /// with the action and the epoch the action was applied at, or `None` if `f` declined.
    ///
    /// `f` runs while the state is locked and must not call back into the store.
    pub fn dispatch_with<R>(
        &self,
        f: impl FnOnce(&FlowState) -> Option<(R, Action)>,
    ) -> Option<(R, u64)> {
        let mut committed = None;
        self.state.send_if_modified(|state| {
            let Some((value, action)) = f(state) else {
                return false;
            };
            self.apply(state, action);
            committed = Some((value, self.epoch.load(Ordering::SeqCst)));
            true
        });
        committed
    }

    /// Apply an action only if `pred` holds, checked in the same update
    pub fn try_dispatch(&self, pred: impl FnOnce(&FlowState) -> bool, action: Action) -> bool {
        self.dispatch_with(|state| pred(state).then_some(((), action)))
            .is_some()
    }

    /// Apply an action only if no invalidating action happened since `epoch` was read
    ///
    /// Returns false if the action was dropped.
    pub fn dispatch_if_current(&self, epoch: u64, action: Action) -> bool {
        self.dispatch_if(epoch, |_| true, action)
    }

    /// Apply an action only if the epoch is still `epoch` and `pred` holds
    pub fn dispatch_if(
        &self,
        epoch: u64,
        pred: impl FnOnce(&FlowState) -> bool,
        action: Action,
    ) -> bool {
        let name = action.name();
        self.dispatch_with(|state| {
            let current = self.epoch.load(Ordering::SeqCst);
            if current != epoch {
                tracing::debug!(
                    "Dropping {} from epoch {}, store is at epoch {}",
                    name,
                    epoch,
                    current
                );
                return None;
            }
            pred(state).then_some(((), action))
        })
        .is_some()
    }

    fn apply(&self, state: &mut FlowState, action: Action) -> FlowStep {
        let name = action.name();
        let previous = state.current_step;

        if action.invalidates_continuations() {
            self.epoch.fetch_add(1, Ordering::SeqCst);
        }

        *state = apply_action(std::mem::take(state), action);

        if previous != state.current_step {
            tracing::debug!("{}: step {} -> {}", name, previous, state.current_step);
        } else {
            tracing::trace!("{}: step {}", name, state.current_step);
        }

        state.current_step
    }
}
