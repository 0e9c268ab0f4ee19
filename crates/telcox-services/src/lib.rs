//! Business logic services for TelcoX
//!
//! This crate contains the consumption-state update engine and the services
//! built on it.
//!
//! # Architecture
//!
//! Services are written against the repository traits from `telcox-core`:
//! - Each service holds the repository handles it needs from `Repositories`
//! - Time and randomness are injected (`Clock`, `IncrementSource`)
//! - All operations are instrumented with tracing
//! - Errors are reported as `AppError`
//!
//! # Services
//!
//! - `usage_engine` - Pure increment arithmetic and increment policies
//! - `UsageService` - Simulate usage and reset consumption on request
//! - `AutoUpdater` - Background job applying periodic increments
//! - `RealtimeService` - Customer dashboard snapshot

pub mod auto_updater;
pub mod realtime;
pub mod simulator;
pub mod usage_engine;

pub use auto_updater::{AutoUpdater, AutoUpdaterHandle, PassReport};
pub use realtime::{RealtimeService, RealtimeSnapshot};
pub use simulator::UsageService;
pub use usage_engine::{
    apply_increment, IncrementPolicy, IncrementSource, RandomSource, ScriptedSource, BURST,
    TRICKLE,
};
