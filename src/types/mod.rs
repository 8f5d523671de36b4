//! Domain-based type organization
//!
//! - form: raw field values as the operator entered them
//! - payload: request bodies sent to the device
//! - status: status snapshots and the views they are merged into
//! - upload: firmware/filesystem upload types

pub mod form;
pub mod payload;
pub mod status;
pub mod upload;

pub use form::*;
pub use payload::*;
pub use status::*;
pub use upload::*;
