//! # Pantry
//!
//! Fixed-slot ingredient inventory.
//! The key set never changes, so counts live in an array indexed by
//! [`Ingredient`] and no allocation happens on add/remove.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EconomyError, EconomyResult};

/// Number of ingredient kinds.
pub const INGREDIENT_COUNT: usize = 5;

/// Ingredients sold in the shop and consumed by the kitchen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ingredient {
    /// Flour.
    Flour,
    /// Egg.
    Egg,
    /// Milk.
    Milk,
    /// Sugar.
    Sugar,
    /// Butter.
    Butter,
}

impl Ingredient {
    /// Every ingredient, in shop order.
    pub const ALL: [Self; INGREDIENT_COUNT] =
        [Self::Flour, Self::Egg, Self::Milk, Self::Sugar, Self::Butter];

    /// Slot index in the pantry array.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name, as used in the persisted record.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Flour => "flour",
            Self::Egg => "egg",
            Self::Milk => "milk",
            Self::Sugar => "sugar",
            Self::Butter => "butter",
        }
    }

    /// Capitalised display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Flour => "Flour",
            Self::Egg => "Egg",
            Self::Milk => "Milk",
            Self::Sugar => "Sugar",
            Self::Butter => "Butter",
        }
    }

    /// Shop icon.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Flour => "🌾",
            Self::Egg => "🥚",
            Self::Milk => "🥛",
            Self::Sugar => "🧂",
            Self::Butter => "🧈",
        }
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Ingredient {
    type Err = EconomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|i| i.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| EconomyError::UnknownIngredient(wanted.to_string()))
    }
}

/// Per-ingredient counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PantryRecord", into = "PantryRecord")]
pub struct Pantry {
    counts: [u32; INGREDIENT_COUNT],
}

impl Pantry {
    /// Creates an empty pantry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counts: [0; INGREDIENT_COUNT],
        }
    }

    /// Builds a pantry from explicit counts.
    #[must_use]
    pub fn with_counts(counts: &[(Ingredient, u32)]) -> Self {
        let mut pantry = Self::new();
        for &(ingredient, count) in counts {
            pantry.counts[ingredient.index()] = count;
        }
        pantry
    }

    /// Count of one ingredient.
    #[inline]
    #[must_use]
    pub const fn count(&self, ingredient: Ingredient) -> u32 {
        self.counts[ingredient.index()]
    }

    /// Iterates `(ingredient, count)` in shop order.
    pub fn iter(&self) -> impl Iterator<Item = (Ingredient, u32)> + '_ {
        Ingredient::ALL.into_iter().map(|i| (i, self.count(i)))
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Adds to an ingredient.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::ArithmeticOverflow` if the count would overflow.
    pub fn add(&mut self, ingredient: Ingredient, amount: u32) -> EconomyResult<()> {
        let slot = &mut self.counts[ingredient.index()];
        *slot = slot
            .checked_add(amount)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Removes from an ingredient.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InsufficientIngredients` if not enough is
    /// stored; the pantry is left unchanged.
    pub fn remove(&mut self, ingredient: Ingredient, amount: u64) -> EconomyResult<()> {
        let available = self.count(ingredient);
        let remaining = u64::from(available)
            .checked_sub(amount)
            .ok_or(EconomyError::InsufficientIngredients {
                ingredient,
                required: amount,
                available,
            })?;
        // remaining <= available, so it fits in u32
        self.counts[ingredient.index()] = remaining as u32;
        Ok(())
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        self.counts = [0; INGREDIENT_COUNT];
    }

    /// Creates a snapshot of the pantry for rollback.
    #[must_use]
    pub const fn snapshot(&self) -> PantrySnapshot {
        PantrySnapshot {
            counts: self.counts,
        }
    }

    /// Restores the pantry from a snapshot (rollback).
    pub fn restore(&mut self, snapshot: &PantrySnapshot) {
        self.counts = snapshot.counts;
    }
}

/// Snapshot of pantry state for transactional rollback.
#[derive(Clone, Copy, Debug)]
pub struct PantrySnapshot {
    counts: [u32; INGREDIENT_COUNT],
}

/// Persisted shape: `{"flour": 0, "egg": 0, ...}`. Missing keys are zero.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct PantryRecord {
    flour: u32,
    egg: u32,
    milk: u32,
    sugar: u32,
    butter: u32,
}

impl From<PantryRecord> for Pantry {
    fn from(r: PantryRecord) -> Self {
        Self {
            counts: [r.flour, r.egg, r.milk, r.sugar, r.butter],
        }
    }
}

impl From<Pantry> for PantryRecord {
    fn from(p: Pantry) -> Self {
        let [flour, egg, milk, sugar, butter] = p.counts;
        Self {
            flour,
            egg,
            milk,
            sugar,
            butter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_items() {
        let mut pantry = Pantry::new();
        pantry.add(Ingredient::Flour, 10).unwrap();
        assert_eq!(pantry.count(Ingredient::Flour), 10);
        assert_eq!(pantry.total(), 10);
    }

    #[test]
    fn test_add_overflow() {
        let mut pantry = Pantry::with_counts(&[(Ingredient::Egg, u32::MAX)]);
        assert_eq!(
            pantry.add(Ingredient::Egg, 1),
            Err(EconomyError::ArithmeticOverflow)
        );
        assert_eq!(pantry.count(Ingredient::Egg), u32::MAX);
    }

    #[test]
    fn test_remove_items() {
        let mut pantry = Pantry::with_counts(&[(Ingredient::Milk, 7)]);
        pantry.remove(Ingredient::Milk, 3).unwrap();
        assert_eq!(pantry.count(Ingredient::Milk), 4);
    }

    #[test]
    fn test_remove_insufficient() {
        let mut pantry = Pantry::with_counts(&[(Ingredient::Sugar, 1)]);
        let result = pantry.remove(Ingredient::Sugar, 2);
        assert!(matches!(
            result,
            Err(EconomyError::InsufficientIngredients {
                ingredient: Ingredient::Sugar,
                required: 2,
                available: 1,
            })
        ));
        assert_eq!(pantry.count(Ingredient::Sugar), 1);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut pantry = Pantry::with_counts(&[(Ingredient::Flour, 5)]);
        let snapshot = pantry.snapshot();

        pantry.add(Ingredient::Butter, 3).unwrap();
        pantry.remove(Ingredient::Flour, 5).unwrap();

        pantry.restore(&snapshot);
        assert_eq!(pantry.count(Ingredient::Flour), 5);
        assert_eq!(pantry.count(Ingredient::Butter), 0);
    }

    #[test]
    fn test_parse_ingredient() {
        assert_eq!("Butter".parse::<Ingredient>().unwrap(), Ingredient::Butter);
        assert_eq!(" egg ".parse::<Ingredient>().unwrap(), Ingredient::Egg);
        assert!(matches!(
            "syrup".parse::<Ingredient>(),
            Err(EconomyError::UnknownIngredient(name)) if name == "syrup"
        ));
    }

    #[test]
    fn test_serialized_as_named_map() {
        let pantry = Pantry::with_counts(&[(Ingredient::Flour, 2), (Ingredient::Butter, 1)]);
        let json = serde_json::to_string(&pantry).unwrap();
        assert_eq!(json, r#"{"flour":2,"egg":0,"milk":0,"sugar":0,"butter":1}"#);

        let partial: Pantry = serde_json::from_str(r#"{"egg":4}"#).unwrap();
        assert_eq!(partial.count(Ingredient::Egg), 4);
        assert_eq!(partial.count(Ingredient::Flour), 0);
    }
}
