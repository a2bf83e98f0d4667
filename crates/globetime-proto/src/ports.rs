//! Core port definitions for globetime adapters.
//!
//! This module exposes the weather port contract used by higher level crates
//! to query current conditions without linking directly against an HTTP
//! client.

pub mod weather;
