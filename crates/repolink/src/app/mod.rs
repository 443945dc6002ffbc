//! Application layer orchestrating domain logic and infrastructure.

pub mod command;
pub mod link;
