//! Route handlers

pub mod health;
pub mod model;
pub mod prometheus;
pub mod transactions;
