//! roomcast protocol - request surface of the broadcast hub
//!
//! This crate turns raw query/form values into validated requests for
//! the daemon, and defines how validation failures map onto HTTP status
//! codes.

pub mod request;
pub mod stream;

pub use request::{
    AttachParams, AttachRequest, PublishParams, PublishRequest, ValidationError, PUBLISH_METHOD,
};
pub use stream::welcome_line;
