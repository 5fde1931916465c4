//! gwwatch-core: debounced gateway status-change detection.
//! Pure decision logic plus the source/store seams it is driven through.
//! No runtime, no HTTP, no database: adapters live in sibling crates.

pub mod cycle;
pub mod debounce;
pub mod error;
pub mod normalize;
pub mod source;
pub mod store;
pub mod types;

pub use cycle::run_cycle;
pub use debounce::decide;
pub use error::{CycleError, ParseStatusError, SourceError, StoreError};
pub use normalize::normalize;
pub use source::StatusSource;
pub use store::{EntityStateStore, MemoryStateStore};
pub use types::{
    Action, CanonicalStatus, EntityStateRecord, GatewayStatus, Observation, ObservationReason,
    StatusEvent,
};
