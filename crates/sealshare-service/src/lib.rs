//! # sealshare-service
//!
//! Share access control and the sharing workflow. Services take their
//! collaborators at construction time as `Arc` references.

pub mod context;
pub mod events;
pub mod services;
pub mod share;

pub use context::{PrincipalRole, RequestContext};
pub use events::EventBus;
pub use services::ShareServices;
pub use share::{
    AccessCredentials, AccessDenial, AccessGrant, AccessOutcome, CreateShareRequest, DeviceGate,
    GeofenceEvaluator, LinkService, PayloadKeyring, ResponseClass, ShareAccessController,
    ShareService, ShareStats, UsageAccount,
};
