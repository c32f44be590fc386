//! Infrastructure adapters for the mail domain

pub mod cache;
pub mod db;
pub mod email;
pub mod html;
pub mod render;
pub mod settings;
