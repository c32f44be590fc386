//! Cache adapters

pub mod redis;
