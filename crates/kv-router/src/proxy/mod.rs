//! Outbound forwarding to the resolved backend and request correlation.

pub mod correlation;
pub mod forward;
