//! Text rendering of the dashboard.

use std::fmt;

use chrono::{DateTime, Local, Utc};
use pancakes_economy::{EconomyEngine, Ingredient, Note, StudyState};

/// Everything the `status` command prints.
pub struct Dashboard<'a> {
    /// State to render.
    pub state: &'a StudyState,
    /// Prices and recipe.
    pub economy: &'a EconomyEngine,
    /// Coins per credited minute.
    pub rate_per_min: u64,
    /// How many recent notes to list.
    pub notes_shown: usize,
    /// Host hidden flag.
    pub suspended: bool,
}

impl fmt::Display for Dashboard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state;
        let status = match (state.running, self.suspended) {
            (true, true) => "running, hidden",
            (true, false) => "running",
            (false, _) => "paused",
        };

        writeln!(
            f,
            "⏱  Session {}   Total {}   [{status}]",
            state.session_seconds,
            state.combined_time()
        )?;
        writeln!(
            f,
            "🪙 {} coins   (+{} per minute, next in {})",
            state.coins,
            self.rate_per_min,
            state.until_next_credit()
        )?;

        f.write_str("🧺 Pantry:")?;
        for (ingredient, count) in state.inventory.iter() {
            write!(f, "  {} {} x {count}", ingredient.icon(), ingredient.label())?;
        }
        writeln!(f)?;

        f.write_str("🛒 Shop:  ")?;
        for (ingredient, price) in self.economy.prices().iter() {
            write!(f, "  {} {} {price}", ingredient.icon(), ingredient.label())?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "🥞 Pancakes {}   Batches {}   Ready to cook {}",
            state.pancakes_cooked,
            state.batches_cooked,
            self.economy.max_batches(state)
        )?;

        let notes = state.recent_notes(self.notes_shown);
        if notes.is_empty() {
            write!(f, "📝 No notes yet.")
        } else {
            write!(f, "📝 Notes ({} of {}):", notes.len(), state.notes.len())?;
            for note in notes {
                write!(f, "\n   {}", NoteLine(note))?;
            }
            Ok(())
        }
    }
}

/// One note as `HH:MM:SS text`, in local time.
pub struct NoteLine<'a>(pub &'a Note);

impl fmt::Display for NoteLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = i64::try_from(self.0.timestamp_ms)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|utc| utc.with_timezone(&Local));
        match time {
            Some(time) => write!(f, "{} {}", time.format("%H:%M:%S"), self.0.text),
            None => write!(f, "--:--:-- {}", self.0.text),
        }
    }
}

/// Shop listing for `help`.
#[must_use]
pub fn price_list(economy: &EconomyEngine) -> String {
    Ingredient::ALL
        .iter()
        .map(|&i| format!("{} {} {}", i.icon(), i.name(), economy.prices().price(i)))
        .collect::<Vec<_>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pancakes_economy::{Pantry, StudyTime, RATE_PER_MIN};

    fn dashboard(state: &StudyState, economy: &EconomyEngine) -> String {
        Dashboard {
            state,
            economy,
            rate_per_min: RATE_PER_MIN,
            notes_shown: 2,
            suspended: false,
        }
        .to_string()
    }

    #[test]
    fn test_dashboard_lines() {
        let economy = EconomyEngine::new();
        let state = StudyState {
            running: true,
            session_seconds: StudyTime::from_secs(125),
            total_seconds: StudyTime::from_secs(3_600),
            coins: 610,
            credited_minutes: 62,
            inventory: Pantry::with_counts(&[
                (Ingredient::Flour, 4),
                (Ingredient::Egg, 2),
                (Ingredient::Milk, 2),
                (Ingredient::Sugar, 2),
                (Ingredient::Butter, 1),
            ]),
            ..StudyState::default()
        };

        let text = dashboard(&state, &economy);
        assert!(text.contains("Session 00:02:05   Total 01:02:05   [running]"));
        assert!(text.contains("610 coins   (+10 per minute, next in 00:00:55)"));
        assert!(text.contains("🌾 Flour x 4"));
        assert!(text.contains("🧈 Butter 25"));
        assert!(text.contains("Ready to cook 1"));
        assert!(text.ends_with("No notes yet."));
    }

    #[test]
    fn test_only_recent_notes_listed() {
        let economy = EconomyEngine::new();
        let mut state = StudyState::default();
        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            state.notes.push(Note {
                timestamp_ms: 1_700_000_000_000 + i as u64,
                text: (*text).to_string(),
            });
        }

        let text = dashboard(&state, &economy);
        assert!(text.contains("Notes (2 of 3)"));
        assert!(!text.contains(" one"));
        assert!(text.contains(" two"));
        assert!(text.ends_with(" three"));
    }

    #[test]
    fn test_price_list() {
        assert_eq!(
            price_list(&EconomyEngine::new()),
            "🌾 flour 20  🥚 egg 15  🥛 milk 15  🧂 sugar 10  🧈 butter 25"
        );
    }
}
