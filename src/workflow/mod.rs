//! The idea hardening workflow.
//!
//! A session's progress lives in a [`SessionState`]. Actions are applied by
//! the [`Dispatcher`], which clears stale downstream keys through the
//! [`registry`] and never stores the current step: [`derive_step`] recomputes
//! it from the keys present.

mod actions;
pub mod context;
mod dispatcher;
mod keys;
pub mod parse;
pub mod registry;
mod state;
mod step;

pub use actions::{
    update_summary_fields, Action, ActionKind, ClarificationForm, StructuredInput,
    DEFAULT_ABSTRACTION_LEVEL, MAX_ABSTRACTION_LEVEL, MAX_ROUND_3_FRAMEWORKS,
};
pub use context::{fold, FoldFormat, FoldOutcome, FALLBACK_ACKNOWLEDGEMENT};
pub use dispatcher::{Dispatcher, Outcome};
pub use keys::{StateKey, StateValue};
pub use registry::{downstream_keys, invalidate, owned_keys, PIPELINE};
pub use state::SessionState;
pub use step::{derive_step, Step};
