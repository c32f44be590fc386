//! Mail transports

pub mod debug;
pub mod smtp;
