//! Template renderers

pub mod handlebars;
