//! Outbound adapters implementing the domain's ports.

pub mod identity;
pub mod persistence;
pub mod storage;
pub mod weather;
