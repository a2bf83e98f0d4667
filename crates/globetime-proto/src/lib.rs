//! Shared contracts for globetime: configuration types and the weather port.

pub mod config;
pub mod ports;
