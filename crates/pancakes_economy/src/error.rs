//! # Economy Error Types
//!
//! All errors that can occur in the study economy.
//!
//! Every variant is recoverable: rejected purchases and cooks leave the
//! state untouched, and a malformed snapshot makes the tracker start from
//! defaults.

use thiserror::Error;

use crate::pantry::Ingredient;

/// Errors that can occur in the study economy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomyError {
    /// A purchase cost more than the current balance.
    #[error("not enough coins for {quantity} {ingredient}: costs {cost}, have {available}")]
    InsufficientFunds {
        /// The ingredient being bought.
        ingredient: Ingredient,
        /// Quantity requested.
        quantity: u32,
        /// Total cost of the purchase.
        cost: u64,
        /// Coins available.
        available: u64,
    },

    /// The pantry cannot cover a recipe requirement.
    #[error("need more {ingredient}: need {required}, have {available}")]
    InsufficientIngredients {
        /// The first ingredient that fell short.
        ingredient: Ingredient,
        /// The amount required.
        required: u64,
        /// The amount available.
        available: u32,
    },

    /// Quantities must be positive.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// An ingredient name did not match any known ingredient.
    #[error("unknown ingredient: {0}")]
    UnknownIngredient(String),

    /// The persisted snapshot could not be decoded.
    #[error("malformed persisted state: {0}")]
    MalformedPersistedState(String),

    /// Reading or writing the persisted snapshot failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Arithmetic overflow in a balance or count.
    #[error("arithmetic overflow in economic calculation")]
    ArithmeticOverflow,

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EconomyError {
    /// Returns true for rejections that leave state unchanged and only need
    /// to be shown to the user.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFunds { .. }
                | Self::InsufficientIngredients { .. }
                | Self::InvalidQuantity
        )
    }
}

/// Result type for economy operations.
pub type EconomyResult<T> = Result<T, EconomyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        assert!(EconomyError::InvalidQuantity.is_rejection());
        assert!(EconomyError::InsufficientIngredients {
            ingredient: Ingredient::Milk,
            required: 1,
            available: 0,
        }
        .is_rejection());
        assert!(!EconomyError::Storage("disk full".to_string()).is_rejection());
        assert!(!EconomyError::MalformedPersistedState("bad".to_string()).is_rejection());
    }

    #[test]
    fn test_messages_name_the_ingredient() {
        let err = EconomyError::InsufficientIngredients {
            ingredient: Ingredient::Flour,
            required: 2,
            available: 1,
        };
        assert_eq!(err.to_string(), "need more flour: need 2, have 1");
    }
}
