//! The order state machine, expressed as a pure planning step.
//!
//! Legal transitions:
//!
//! ```text
//! Pending --accept--> Accepted --deliver--> Delivered --complete--> Completed   (terminal)
//! Pending --reject--> Rejected                                                  (terminal)
//! {Pending|Accepted|Delivered} --cancel--> Cancelled                            (terminal)
//! ```
//!
//! [`plan`] validates an action against an immutable order value and returns the list of side-effect
//! intents the backend must execute inside one atomic unit of work. Nothing here touches storage, so the
//! whole transition table is testable with a fixed clock and no database.
use chrono::{DateTime, Utc};

use crate::{
    db_types::{Order, OrderStatusType},
    traits::OrderFlowError,
};

//--------------------------------------      OrderAction      -------------------------------------------------------
/// A state-machine edge requested by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderAction {
    Accept,
    Reject { reason: Option<String> },
    MarkDelivered,
    Complete,
    Cancel { reason: Option<String> },
}

impl OrderAction {
    pub fn name(&self) -> &'static str {
        match self {
            OrderAction::Accept => "accept",
            OrderAction::Reject { .. } => "reject",
            OrderAction::MarkDelivered => "mark_delivered",
            OrderAction::Complete => "complete",
            OrderAction::Cancel { .. } => "cancel",
        }
    }
}

//--------------------------------------      StockIntent      -------------------------------------------------------
/// A quantity mutation the backend must apply to the order's product, under an exclusive stock lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockIntent {
    /// Subtract the amount from the sellable quantity. Fails the transition if the product does not have
    /// that much stock left.
    Reserve(i64),
    /// Add the amount back to the sellable quantity.
    Release(i64),
}

//--------------------------------------    TransitionPlan     -------------------------------------------------------
/// The fully validated outcome of a transition request. Every field is an instruction to the backend;
/// executing the whole plan atomically is the backend's contract.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub new_status: OrderStatusType,
    /// The instant stamped into the transition's timestamp column (and `actual_pickup_date` on delivery).
    pub now: DateTime<Utc>,
    /// Text appended to the seller notes, never overwriting existing notes.
    pub seller_note: Option<String>,
    /// Text appended to the buyer notes, never overwriting existing notes.
    pub buyer_note: Option<String>,
    pub stock: Option<StockIntent>,
    /// Whether the receipt snapshot must be assembled and attached (accept only).
    pub build_receipt: bool,
    /// Whether the product and ranch ratings must be recomputed after the plan commits (complete only).
    pub recompute_ratings: bool,
}

/// Validates `action` against the order's current state and returns the side-effect plan.
///
/// Terminal states (`Rejected`, `Completed`, `Cancelled`) never transition; any action against them is an
/// [`OrderFlowError::InvalidTransition`], as is any edge not in the table above.
pub fn plan(order: &Order, action: &OrderAction, now: DateTime<Utc>) -> Result<TransitionPlan, OrderFlowError> {
    use OrderStatusType::*;
    let invalid = || OrderFlowError::InvalidTransition { from: order.status, action: action.name() };
    let base = TransitionPlan {
        new_status: order.status,
        now,
        seller_note: None,
        buyer_note: None,
        stock: None,
        build_receipt: false,
        recompute_ratings: false,
    };
    let plan = match (order.status, action) {
        (Pending, OrderAction::Accept) => TransitionPlan {
            new_status: Accepted,
            stock: Some(StockIntent::Reserve(order.quantity)),
            build_receipt: true,
            ..base
        },
        (Pending, OrderAction::Reject { reason }) => {
            TransitionPlan { new_status: Rejected, seller_note: reason.clone(), ..base }
        },
        (Accepted, OrderAction::MarkDelivered) => TransitionPlan { new_status: Delivered, ..base },
        (Delivered, OrderAction::Complete) => {
            TransitionPlan { new_status: Completed, recompute_ratings: true, ..base }
        },
        (Pending, OrderAction::Cancel { reason }) => {
            // Nothing was reserved yet, so cancellation from Pending must not touch stock.
            TransitionPlan { new_status: Cancelled, buyer_note: reason.clone(), ..base }
        },
        (Accepted | Delivered, OrderAction::Cancel { reason }) => TransitionPlan {
            new_status: Cancelled,
            buyer_note: reason.clone(),
            stock: Some(StockIntent::Release(order.quantity)),
            ..base
        },
        _ => return Err(invalid()),
    };
    Ok(plan)
}

/// The timestamp column stamped by a transition into the given status.
pub fn timestamp_column(status: OrderStatusType) -> Option<&'static str> {
    match status {
        OrderStatusType::Pending => None,
        OrderStatusType::Accepted => Some("accepted_at"),
        OrderStatusType::Rejected => Some("rejected_at"),
        OrderStatusType::Delivered => Some("delivered_at"),
        OrderStatusType::Completed => Some("completed_at"),
        OrderStatusType::Cancelled => Some("cancelled_at"),
    }
}
