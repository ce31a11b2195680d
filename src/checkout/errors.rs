//! Checkout Errors

use super::{models::Step, wizard::ValidationErrors};
use crate::ports::PersistenceError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckoutError {
    /// A step is missing a required selection
    #[error("checkout is incomplete: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("orders can only be placed from the confirmation step (current step {})", .step.number())]
    NotReady { step: Step },

    #[error("cart is empty")]
    EmptyCart,

    /// An order for this session is already being submitted
    #[error("an order submission is already in progress")]
    AlreadySubmitting,

    /// The order write was rejected; nothing was changed locally
    #[error("order could not be saved: {0}")]
    Persistence(#[source] PersistenceError),
}
