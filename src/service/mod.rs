//! Service layer: business logic orchestration.
//!
//! [`InvestmentService`] loads records, enforces ownership and workflow
//! policy, performs a single store mutation and records an event through
//! an [`EventSink`]. [`event_log`] persists those events.

pub mod event_log;
pub mod investment_service;

pub use event_log::{EventSink, spawn_event_log};
pub use investment_service::{InvestmentDetail, InvestmentService, NewUpload};
