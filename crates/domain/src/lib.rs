//! `pl-domain`: types shared by every Paralegal SDK crate: the error
//! enum, client configuration, and structured trace events.

pub mod config;
pub mod error;
pub mod trace;
