//! HTML post-processing

pub mod css_inline;
