//! Time handling for tsviz: timestamp precision and range resolution.
//!
//! This module reconciles the heterogeneous time representations that flow
//! through the engine:
//!
//! - [`unit`] - timestamp precision (seconds through nanoseconds), magnitude
//!   classification, and epoch/instant conversion
//! - [`range`] - resolution of relative, absolute, and query-style time range
//!   descriptors into concrete instant pairs

pub mod range;
pub mod unit;

pub use range::{resolve, ResolvedRange, TimeBound, TimeRangeDescriptor};
pub use unit::{classify_magnitude, from_instant, to_epoch_ms, to_instant, TimeUnit};
