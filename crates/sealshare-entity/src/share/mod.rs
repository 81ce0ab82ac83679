//! Share domain entities.

pub mod geofence;
pub mod model;
pub mod payload;
pub mod usage;

pub use geofence::{CallerLocation, GeoPoint, Geofence};
pub use model::{ShareRecord, ShareSummary};
pub use payload::{AccessPayload, SealedPayload};
pub use usage::{ConsumeDenial, ConsumeResult, UsageSnapshot};
