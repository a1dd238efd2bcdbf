//! # Price Table
//!
//! Unit cost of every ingredient, in coins.

use crate::pantry::{Ingredient, INGREDIENT_COUNT};

/// Unit prices indexed by ingredient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceTable {
    prices: [u64; INGREDIENT_COUNT],
}

impl PriceTable {
    /// flour:20 egg:15 milk:15 sugar:10 butter:25
    pub const STANDARD: Self = Self {
        prices: [20, 15, 15, 10, 25],
    };

    /// Unit price of `ingredient`.
    #[inline]
    #[must_use]
    pub const fn price(&self, ingredient: Ingredient) -> u64 {
        self.prices[ingredient.index()]
    }

    /// Total cost of `quantity` units, `None` on overflow.
    #[inline]
    #[must_use]
    pub fn cost(&self, ingredient: Ingredient, quantity: u32) -> Option<u64> {
        self.price(ingredient).checked_mul(u64::from(quantity))
    }

    /// Iterates `(ingredient, price)` in shop order.
    pub fn iter(&self) -> impl Iterator<Item = (Ingredient, u64)> + '_ {
        Ingredient::ALL.into_iter().map(|i| (i, self.price(i)))
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_prices() {
        let table = PriceTable::STANDARD;
        let listed: Vec<_> = table.iter().collect();
        assert_eq!(
            listed,
            vec![
                (Ingredient::Flour, 20),
                (Ingredient::Egg, 15),
                (Ingredient::Milk, 15),
                (Ingredient::Sugar, 10),
                (Ingredient::Butter, 25),
            ]
        );
    }

    #[test]
    fn test_cost() {
        assert_eq!(PriceTable::STANDARD.cost(Ingredient::Flour, 3), Some(60));
        assert_eq!(PriceTable::STANDARD.cost(Ingredient::Butter, 0), Some(0));
    }
}
