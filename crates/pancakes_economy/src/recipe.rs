//! # Recipe
//!
//! Ingredient quantities consumed by one batch (one pancake).
//!
//! ```text
//! PANCAKE = flour:2  egg:1  milk:1  sugar:1  butter:1
//! ```
//!
//! The batch count a pantry supports is
//! `min over required ingredients of floor(count / required)`,
//! which can never drive any count below zero.

use crate::error::{EconomyError, EconomyResult};
use crate::pantry::{Ingredient, Pantry, INGREDIENT_COUNT};

/// A required ingredient and its quantity per batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecipeItem {
    /// The ingredient.
    pub ingredient: Ingredient,
    /// Quantity per batch.
    pub quantity: u32,
}

/// Per-batch ingredient requirements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Recipe {
    required: [u32; INGREDIENT_COUNT],
}

impl Recipe {
    /// The pancake recipe.
    pub const PANCAKE: Self = Self {
        required: [2, 1, 1, 1, 1],
    };

    /// Creates a recipe from explicit requirements.
    ///
    /// # Errors
    ///
    /// Returns error if no ingredient has a positive quantity.
    pub fn new(items: &[RecipeItem]) -> EconomyResult<Self> {
        let mut required = [0; INGREDIENT_COUNT];
        for item in items {
            required[item.ingredient.index()] = item.quantity;
        }
        if required.iter().all(|&q| q == 0) {
            return Err(EconomyError::InvalidConfig(
                "Recipe must have at least one input".to_string(),
            ));
        }
        Ok(Self { required })
    }

    /// Quantity of `ingredient` per batch.
    #[inline]
    #[must_use]
    pub const fn required(&self, ingredient: Ingredient) -> u32 {
        self.required[ingredient.index()]
    }

    /// Iterates the required ingredients in shop order.
    pub fn items(&self) -> impl Iterator<Item = RecipeItem> + '_ {
        Ingredient::ALL
            .into_iter()
            .map(|ingredient| RecipeItem {
                ingredient,
                quantity: self.required(ingredient),
            })
            .filter(|item| item.quantity > 0)
    }

    /// Largest number of whole batches the pantry can supply.
    #[must_use]
    pub fn max_batches(&self, pantry: &Pantry) -> u64 {
        self.items()
            .map(|item| u64::from(pantry.count(item.ingredient) / item.quantity))
            .min()
            .unwrap_or(0)
    }

    /// First ingredient that cannot cover `batches` batches, if any.
    #[must_use]
    pub fn shortfall(&self, pantry: &Pantry, batches: u64) -> Option<EconomyError> {
        self.items().find_map(|item| {
            let required = u64::from(item.quantity).saturating_mul(batches);
            let available = pantry.count(item.ingredient);
            (u64::from(available) < required).then_some(EconomyError::InsufficientIngredients {
                ingredient: item.ingredient,
                required,
                available,
            })
        })
    }
}

impl Default for Recipe {
    fn default() -> Self {
        Self::PANCAKE
    }
}
