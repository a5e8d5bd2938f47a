//! Domain layer: identifiers, records, the status workflow and events.
//!
//! Everything here is pure policy. The transition
//! table lives in [`investment_status`], role gating of transitions in
//! [`actions`], and attachment gating in [`file_policy`].

pub mod actions;
pub mod file_policy;
pub mod ids;
pub mod investment;
pub mod investment_event;
pub mod investment_status;
pub mod role;

pub use actions::{ActionDenied, InvestmentAction, visible_actions};
pub use file_policy::{FileCapabilities, UploadPolicy};
pub use ids::{FileId, InvestmentId, OfferId, UserId};
pub use investment::{Investment, InvestmentFile, Offer, UserProfile};
pub use investment_event::InvestmentEvent;
pub use investment_status::{BadgeVariant, InvestmentStatus, StatusBadge, status_badge};
pub use role::{Caller, Role};
