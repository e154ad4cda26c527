//! The behaviour contract a storage backend must fulfil to drive the order lifecycle.
mod order_flow_database;

pub use order_flow_database::{OrderFlowDatabase, OrderFlowError};
