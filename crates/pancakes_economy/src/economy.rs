//! # Economy Engine
//!
//! **Transactional Shop and Kitchen**
//!
//! 1. **No Debt**: a purchase either fits the balance or changes nothing
//! 2. **Transactional**: cooking consumes every ingredient of every batch OR nothing happens
//! 3. **No Duplication**: pancakes only come out of consumed ingredients
//!
//! ## Cook Max
//!
//! ```text
//! batches = min(flour/2, egg/1, milk/1, sugar/1, butter/1)
//! pantry  -= recipe * batches
//! ```
//!
//! After a cook-max no further batch is possible, and no count goes negative.

use tracing::debug;

use crate::error::{EconomyError, EconomyResult};
use crate::pantry::Ingredient;
use crate::recipe::Recipe;
use crate::shop::PriceTable;
use crate::state::StudyState;

/// Result of a successful purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Purchase {
    /// Ingredient bought.
    pub ingredient: Ingredient,
    /// Units bought.
    pub quantity: u32,
    /// Coins spent.
    pub cost: u64,
}

/// Result of a successful cook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookReport {
    /// Batches cooked.
    pub batches: u64,
    /// Pancakes produced (one per batch).
    pub pancakes: u64,
    /// Ingredients consumed.
    pub consumed: Vec<(Ingredient, u64)>,
}

/// Shop and kitchen rules over the shared state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EconomyEngine {
    prices: PriceTable,
    recipe: Recipe,
}

impl EconomyEngine {
    /// Creates an engine with the standard prices and the pancake recipe.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            prices: PriceTable::STANDARD,
            recipe: Recipe::PANCAKE,
        }
    }

    /// Creates an engine with custom tables.
    #[must_use]
    pub const fn with_tables(prices: PriceTable, recipe: Recipe) -> Self {
        Self { prices, recipe }
    }

    /// The price table.
    #[must_use]
    pub const fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// The recipe.
    #[must_use]
    pub const fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    /// Buys `quantity` units of `ingredient`.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if `quantity` is zero
    /// - `InsufficientFunds` if the cost exceeds the balance
    /// - `ArithmeticOverflow` if the cost or the pantry count overflows
    ///
    /// The state is unchanged on every error.
    pub fn buy(
        &self,
        state: &mut StudyState,
        ingredient: Ingredient,
        quantity: u32,
    ) -> EconomyResult<Purchase> {
        if quantity == 0 {
            return Err(EconomyError::InvalidQuantity);
        }

        let cost = self
            .prices
            .cost(ingredient, quantity)
            .ok_or(EconomyError::ArithmeticOverflow)?;

        if state.coins < cost {
            return Err(EconomyError::InsufficientFunds {
                ingredient,
                quantity,
                cost,
                available: state.coins,
            });
        }

        // Pantry first: it is the only step that can still fail.
        state.inventory.add(ingredient, quantity)?;
        state.coins -= cost;

        debug!(%ingredient, quantity, cost, balance = state.coins, "purchase");

        Ok(Purchase {
            ingredient,
            quantity,
            cost,
        })
    }

    /// Number of batches the current pantry supports.
    #[must_use]
    pub fn max_batches(&self, state: &StudyState) -> u64 {
        self.recipe.max_batches(&state.inventory)
    }

    /// Checks whether `batches` batches can be cooked.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientIngredients` naming the first missing ingredient.
    pub fn can_cook(&self, state: &StudyState, batches: u64) -> EconomyResult<()> {
        match self.recipe.shortfall(&state.inventory, batches) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Cooks a single batch.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientIngredients` if any requirement is unmet; no
    /// ingredient is consumed in that case.
    pub fn cook_one(&self, state: &mut StudyState) -> EconomyResult<CookReport> {
        self.cook(state, 1)
    }

    /// Cooks as many batches as the pantry allows.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientIngredients` if not even one batch is possible.
    pub fn cook_max(&self, state: &mut StudyState) -> EconomyResult<CookReport> {
        let batches = self.max_batches(state);
        if batches == 0 {
            self.can_cook(state, 1)?;
        }
        self.cook(state, batches)
    }

    /// Performs a transactional cook of `batches` batches.
    ///
    /// **ATOMIC**: either every ingredient is consumed and the counters move,
    /// or nothing happens. Uses a pantry snapshot for rollback.
    fn cook(&self, state: &mut StudyState, batches: u64) -> EconomyResult<CookReport> {
        self.can_cook(state, batches)?;

        let pancakes_cooked = state
            .pancakes_cooked
            .checked_add(batches)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        let batches_cooked = state
            .batches_cooked
            .checked_add(batches)
            .ok_or(EconomyError::ArithmeticOverflow)?;

        let snapshot = state.inventory.snapshot();
        let mut consumed = Vec::with_capacity(self.recipe.items().count());

        for item in self.recipe.items() {
            let amount = u64::from(item.quantity) * batches;
            if let Err(e) = state.inventory.remove(item.ingredient, amount) {
                // Rollback on failure
                state.inventory.restore(&snapshot);
                return Err(e);
            }
            consumed.push((item.ingredient, amount));
        }

        state.pancakes_cooked = pancakes_cooked;
        state.batches_cooked = batches_cooked;

        debug!(batches, total = state.pancakes_cooked, "cooked pancakes");

        Ok(CookReport {
            batches,
            pancakes: batches,
            consumed,
        })
    }

    /// Clears coins, pantry and cook counters. Part of the full reset.
    pub fn reset_economy(&self, state: &mut StudyState) {
        state.coins = 0;
        state.inventory.clear();
        state.pancakes_cooked = 0;
        state.batches_cooked = 0;
    }
}
