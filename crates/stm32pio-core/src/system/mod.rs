//! # System Module
//!
//! The stage catalog.
//!
//! Stages are plain data: which stage a project is in is decided elsewhere
//! (see [`crate::state`]), this module only fixes their order and labels.

mod stage;

pub use stage::*;
