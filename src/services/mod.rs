//! Client-side control flows
//!
//! Each service drives one user-facing flow against a `DeviceClient` and
//! stays independent of how the results are presented.

pub mod config;
pub mod device;
pub mod firmware;
pub mod status;
