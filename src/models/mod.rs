//! Domain model module declarations.

pub mod countdown;
pub mod session;
