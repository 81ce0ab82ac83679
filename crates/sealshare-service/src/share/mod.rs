//! Share access control and the sharing workflow.

pub mod access;
pub mod device;
pub mod geofence;
pub mod link;
pub mod outcome;
pub mod payload;
pub mod service;
pub mod usage;

pub use access::ShareAccessController;
pub use device::DeviceGate;
pub use geofence::{GateVerdict, GeofenceEvaluator, haversine_km};
pub use link::LinkService;
pub use outcome::{AccessCredentials, AccessDenial, AccessGrant, AccessOutcome, ResponseClass};
pub use payload::PayloadKeyring;
pub use service::{CreateShareRequest, ShareService, ShareStats};
pub use usage::UsageAccount;
