//! Ganado Order Engine
//!
//! The order lifecycle core of the Ganado livestock marketplace. This library owns the state machine that
//! governs a buyer/seller transaction from creation to completion or cancellation, the stock coordinator
//! that keeps a product's sellable quantity consistent under concurrent orders, and the receipt and rating
//! side effects that fire on terminal transitions.
//!
//! The library is divided into three main sections:
//! 1. The pure transition planner ([`mod@transitions`]) and receipt builder ([`mod@receipts`]). These have
//!    no database dependency: a transition is planned from an immutable order value and a caller-supplied
//!    clock reading, and the plan lists the side effects (stock delta, receipt write, rating recompute)
//!    the backend must execute atomically.
//! 2. Database management and control ([`SqliteDatabase`] behind the [`OrderFlowDatabase`] trait).
//!    SQLite is the supported backend; a `postgres` feature slot is reserved. You should never need to
//!    access the database directly. The data types live in [`mod@db_types`] and are public.
//! 3. The public API ([`OrderFlowApi`]), which wires the five order operations to the backend, injects
//!    the clock, fires event hooks, and isolates the best-effort rating recompute from the transition's
//!    transactional boundary.
pub mod api;
pub mod clock;
pub mod db_types;
pub mod events;
pub mod receipts;
pub mod traits;
pub mod transitions;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

pub use api::{order_flow_api::OrderFlowApi, order_objects, order_objects::OrderQueryFilter};
pub use traits::{OrderFlowDatabase, OrderFlowError};
