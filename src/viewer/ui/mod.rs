//! UI rendering module

mod alerts;
mod endpoints;
mod layout;

pub use layout::render;
