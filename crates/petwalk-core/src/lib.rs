// petwalk-core: Domain model and facade between petwalk-api and consumers (CLI).

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod status;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::PetWalk;
pub use config::{ClientConfig, CloudConfig};
pub use error::CoreError;
pub use model::{Direction, Event, EventType, ModelError, Pet};
pub use status::reconcile_pet_status;

// Transport types callers need to drive the facade.
pub use petwalk_api::{ApiField, DeviceCommand};
