//! visit-pricing core
//!
//! Composes location, urgency, time-slot and package modifiers onto a base
//! service price, with the I/O collaborators kept behind narrow traits.

pub mod error;
pub mod config;
pub mod traits;
pub mod location;
pub mod urgency;
pub mod load;
pub mod slot;
pub mod package;
pub mod request;
pub mod composer;
pub mod sheets;
pub mod distance;
pub mod calendar;
pub mod server;
