//! # Study Event Feed
//!
//! Every user-visible outcome of a tracker operation is published here so a
//! view layer can show it in its log panel.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │   Tracker   │─────>│   Event     │─────>│   Host      │
//! │ (operations)│      │   Channel   │      │ (log panel) │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! The channel is bounded. A full channel drops events rather than stall
//! the tick loop.

use std::fmt;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::pantry::Ingredient;
use crate::study_time::StudyTime;

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Outcomes published by the tracker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StudyEvent {
    /// The timer started.
    TimerStarted,
    /// The timer paused and the session was committed.
    TimerPaused {
        /// Lifetime time after the commit.
        total: StudyTime,
    },
    /// Whole minutes were converted into coins.
    CoinsCredited {
        /// Minutes credited.
        minutes: u64,
        /// Coins added.
        coins: u64,
    },
    /// Ingredients were bought.
    Purchased {
        /// Ingredient bought.
        ingredient: Ingredient,
        /// Units bought.
        quantity: u32,
        /// Coins spent.
        cost: u64,
    },
    /// A purchase was rejected.
    PurchaseRejected {
        /// Ingredient requested.
        ingredient: Ingredient,
        /// Units requested.
        quantity: u32,
    },
    /// Pancakes were cooked.
    Cooked {
        /// Pancakes produced.
        pancakes: u64,
    },
    /// A cook was rejected.
    CookRejected {
        /// Ingredient that fell short.
        missing: Ingredient,
    },
    /// A note was appended.
    NoteAdded,
    /// The session was discarded; lifetime time kept.
    SessionCleared,
    /// Progress was written to the store.
    Saved,
    /// Writing progress failed.
    SaveFailed {
        /// Reason reported by the store.
        reason: String,
    },
    /// The stored snapshot was unreadable; the tracker started fresh.
    LoadFallback {
        /// Reason the snapshot was rejected.
        reason: String,
    },
    /// The host stopped ticking (window hidden) while the timer ran.
    Suspended,
    /// The host resumed ticking.
    Resumed,
    /// Everything was wiped.
    Reset,
}

impl fmt::Display for StudyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimerStarted => f.write_str("Timer started."),
            Self::TimerPaused { total } => write!(f, "Timer paused. Total {total}."),
            Self::CoinsCredited { minutes, coins } => {
                write!(f, "+{coins} coins for {minutes} min of study.")
            }
            Self::Purchased {
                ingredient,
                quantity,
                ..
            } => write!(f, "Bought {quantity} × {}.", ingredient.label()),
            Self::PurchaseRejected {
                ingredient,
                quantity,
            } => write!(f, "Not enough coins for {quantity} {ingredient}."),
            Self::Cooked { pancakes: 1 } => f.write_str("Cooked 1 pancake 🥞!"),
            Self::Cooked { pancakes } => write!(f, "Cooked {pancakes} pancakes 🥞!"),
            Self::CookRejected { missing } => write!(f, "Need more {missing}."),
            Self::NoteAdded => f.write_str("Note added."),
            Self::SessionCleared => f.write_str("Session cleared (total time kept)."),
            Self::Saved => f.write_str("Progress saved."),
            Self::SaveFailed { reason } => write!(f, "Could not save progress: {reason}"),
            Self::LoadFallback { reason } => {
                write!(f, "Saved progress was unreadable, starting fresh ({reason}).")
            }
            Self::Suspended => f.write_str("Window hidden → timer paused."),
            Self::Resumed => f.write_str("Window visible → timer resumed."),
            Self::Reset => f.write_str("All progress reset."),
        }
    }
}

/// A bounded event channel.
pub struct EventBus {
    sender: Sender<StudyEvent>,
    receiver: Receiver<StudyEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum events in flight before new ones are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: Some(self.sender.clone()),
        }
    }

    /// Creates a receiver handle.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Creates a connected sender/receiver pair.
    #[must_use]
    pub fn create_pair(capacity: usize) -> (EventSender, EventReceiver) {
        let bus = Self::new(capacity);
        (bus.sender(), bus.receiver())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Handle for publishing events.
#[derive(Clone, Default)]
pub struct EventSender {
    sender: Option<Sender<StudyEvent>>,
}

impl EventSender {
    /// A sender that discards everything.
    #[must_use]
    pub const fn disconnected() -> Self {
        Self { sender: None }
    }

    /// Publishes an event (non-blocking).
    ///
    /// Returns `false` if the event was dropped.
    #[inline]
    pub fn send(&self, event: StudyEvent) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };
        match sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                tracing::trace!(?dropped, "event channel full");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for consuming events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<StudyEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking).
    pub fn drain(&self) -> Vec<StudyEvent> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event (non-blocking).
    pub fn try_recv(&self) -> Option<StudyEvent> {
        self.receiver.try_recv().ok()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_send_receive() {
        let (sender, receiver) = EventBus::create_pair(8);

        assert!(sender.send(StudyEvent::TimerStarted));
        assert!(receiver.has_events());
        assert_eq!(receiver.try_recv(), Some(StudyEvent::TimerStarted));
        assert!(!receiver.has_events());
    }

    #[test]
    fn test_full_channel_drops() {
        let (sender, receiver) = EventBus::create_pair(2);
        assert!(sender.send(StudyEvent::Saved));
        assert!(sender.send(StudyEvent::Saved));
        assert!(!sender.send(StudyEvent::Saved));
        assert_eq!(receiver.drain().len(), 2);
    }

    #[test]
    fn test_disconnected_sender() {
        assert!(!EventSender::disconnected().send(StudyEvent::Reset));
    }

    #[test]
    fn test_log_lines() {
        assert_eq!(
            StudyEvent::Purchased {
                ingredient: Ingredient::Flour,
                quantity: 3,
                cost: 60
            }
            .to_string(),
            "Bought 3 × Flour."
        );
        assert_eq!(StudyEvent::Cooked { pancakes: 1 }.to_string(), "Cooked 1 pancake 🥞!");
        assert_eq!(StudyEvent::Cooked { pancakes: 4 }.to_string(), "Cooked 4 pancakes 🥞!");
        assert_eq!(
            StudyEvent::CookRejected {
                missing: Ingredient::Milk
            }
            .to_string(),
            "Need more milk."
        );
    }
}
