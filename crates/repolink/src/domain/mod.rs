//! Domain types shared by the link builder and its adapters.

pub mod errors;
pub mod model;
