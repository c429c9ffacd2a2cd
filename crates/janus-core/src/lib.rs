//! Store- and transport-independent pieces of the Janus gateway.

pub mod assertion;
pub mod error;
pub mod identity;
pub mod models;
pub mod records;
pub mod secret;
pub mod tenant;

pub use error::ErrorKind;
