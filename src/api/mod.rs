//! HTTP handlers.

pub mod ask;
