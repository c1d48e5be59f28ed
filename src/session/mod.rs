//! Session control modules.
//!
//! Covers the idle countdown timer, its reset signal, the timer event
//! consumer, and the controller that ties them to the vault session.

pub mod controller;
pub mod expiry;
pub mod idle_timer;
pub mod reset;
