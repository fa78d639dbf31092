//! Core types and call-flow logic for the IVR webhook.
//!
//! This crate is deliberately free of HTTP and filesystem dependencies. The
//! menu state machine is a pure function over a [`session::SessionRecord`];
//! persistence sits behind the [`store::SessionStore`] trait.

pub mod error;
pub mod menu;
pub mod prompt;
pub mod session;
pub mod store;

pub use error::{Error, Result};
