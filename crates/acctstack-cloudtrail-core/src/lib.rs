//! CloudTrail event selector reconciliation for AcctStack.
//!
//! Implements the `Custom::CloudTrailEventSelector` resource: a declarative,
//! partial description of a trail's event selectors that is merged into the
//! trail's existing configuration rather than replacing it.
//!
//! # Architecture
//!
//! ```text
//! EventSelectorResourceHandler (custom resource protocol)
//!        |
//!        v
//! EventSelectorReconciler (fetch, diff, write)
//!        |
//!        v
//!   EventSelectorSet (normalized set algebra)
//!        |
//!        v
//!   TrailSelectorStore (GetEventSelectors / PutEventSelectors)
//! ```
//!
//! # Concurrency
//!
//! CloudTrail only offers a whole-document `PutEventSelectors`, so a
//! reconciliation is a non-atomic fetch-modify-write. A change made to the
//! trail's selectors by anyone else between the fetch and the write is
//! silently overwritten. Attach at most one event selector resource to a
//! trail, and never reconcile the same trail concurrently.

pub mod handler;
pub mod reconciler;
pub mod selector_set;
pub mod store;

pub use handler::EventSelectorResourceHandler;
pub use reconciler::{EventSelectorReconciler, reconcile_selectors};
pub use selector_set::{EventSelectorSet, Selector};
pub use store::{InMemoryTrailStore, TrailSelectorStore, TrailStoreError};
