//! # Study Tracker
//!
//! Connects the engines to the persistence port and the event feed.
//!
//! ## The Operation Pipeline
//!
//! ```text
//! Host calls buy()/cook_max()/... ->
//!   1. Engine validates and mutates the state (or rejects, state untouched)
//!   2. Publish the outcome to the event feed
//!   3. Save the whole state through the store
//! ```
//!
//! `start`, `tick` and `reset_session` do not save; `pause`, `buy`,
//! `cook_one`, `cook_max`, `add_note` and `save` do. A failed implicit save
//! keeps the in-memory mutation and is reported as
//! [`StudyEvent::SaveFailed`].
//!
//! All calls must come from one thread at a time; a multi-threaded host
//! keeps the tracker behind a single owner.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::accrual::{Accrual, AccrualEngine};
use crate::economy::{CookReport, EconomyEngine, Purchase};
use crate::error::{EconomyError, EconomyResult};
use crate::events::{EventSender, StudyEvent};
use crate::pantry::Ingredient;
use crate::state::{Note, StudyState};
use crate::store::StateStore;

/// Source of wall-clock timestamps (epoch milliseconds).
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Reads the system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading `start_ms`.
    #[must_use]
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Proof that the user confirmed a full reset.
///
/// The tracker cannot ask; the host must obtain the confirmation and build
/// this token before calling [`StudyTracker::hard_reset`].
#[derive(Debug)]
pub struct ResetConfirmation(());

impl ResetConfirmation {
    /// The user answered yes.
    #[must_use]
    pub const fn confirmed_by_user() -> Self {
        Self(())
    }
}

/// The tracker: owns the state and routes every operation.
pub struct StudyTracker<S: StateStore> {
    /// The aggregate shared by both engines.
    state: StudyState,
    /// Time bookkeeping.
    accrual: AccrualEngine,
    /// Shop and kitchen.
    economy: EconomyEngine,
    /// Persistence port.
    store: S,
    /// Timestamp source for starts and notes.
    clock: Box<dyn Clock>,
    /// Log feed.
    events: EventSender,
}

impl<S: StateStore> StudyTracker<S> {
    /// Opens a tracker, loading the stored state once.
    ///
    /// A malformed snapshot is reported through the event feed and the
    /// tracker starts from defaults.
    ///
    /// # Errors
    ///
    /// Any other load failure (an I/O error reading the store) is returned,
    /// so the stored snapshot is never overwritten by a fresh state.
    pub fn open(
        store: S,
        clock: impl Clock + 'static,
        events: EventSender,
    ) -> EconomyResult<Self> {
        let state = match store.load() {
            Ok(Some(state)) => {
                info!(
                    coins = state.coins,
                    credited_minutes = state.credited_minutes,
                    notes = state.notes.len(),
                    "restored study state"
                );
                state
            }
            Ok(None) => {
                info!("no saved study state, starting fresh");
                StudyState::default()
            }
            Err(e @ EconomyError::MalformedPersistedState(_)) => {
                warn!(error = %e, "saved study state unusable, starting fresh");
                events.send(StudyEvent::LoadFallback {
                    reason: e.to_string(),
                });
                StudyState::default()
            }
            Err(e) => {
                warn!(error = %e, "could not read saved study state");
                return Err(e);
            }
        };

        Ok(Self {
            state,
            accrual: AccrualEngine::new(),
            economy: EconomyEngine::new(),
            store,
            clock: Box::new(clock),
            events,
        })
    }

    /// Read access for the view layer.
    #[inline]
    #[must_use]
    pub fn state(&self) -> &StudyState {
        &self.state
    }

    /// The accrual engine (for its rate).
    #[must_use]
    pub fn accrual(&self) -> &AccrualEngine {
        &self.accrual
    }

    /// The economy engine (for its price table and recipe).
    #[must_use]
    pub fn economy(&self) -> &EconomyEngine {
        &self.economy
    }

    /// The persistence port.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The event feed.
    #[must_use]
    pub fn events(&self) -> &EventSender {
        &self.events
    }

    /// True while accrual is active.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.running
    }

    // =========================================================================
    // Timer
    // =========================================================================

    /// Starts the timer. Returns `false` if it was already running.
    pub fn start(&mut self) -> bool {
        let started = self.accrual.start(&mut self.state, self.clock.now_ms());
        if started {
            info!("timer started");
            self.events.send(StudyEvent::TimerStarted);
        }
        started
    }

    /// Pauses the timer and saves. Returns `false` if it was not running.
    pub fn pause(&mut self) -> bool {
        let paused = self.accrual.pause(&mut self.state);
        if paused {
            info!(total = %self.state.total_seconds, "timer paused");
            self.events.send(StudyEvent::TimerPaused {
                total: self.state.total_seconds,
            });
            self.persist();
        }
        paused
    }

    /// Pauses if running, otherwise starts. Returns the new running flag.
    pub fn toggle(&mut self) -> bool {
        if self.state.running {
            self.pause();
        } else {
            self.start();
        }
        self.state.running
    }

    /// Feeds elapsed real time into the accrual engine.
    ///
    /// Does nothing while paused.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the balance cannot hold the credit.
    pub fn tick(&mut self, elapsed_secs: f64) -> EconomyResult<Accrual> {
        if !self.state.running {
            return Ok(Accrual::default());
        }
        let accrual = self.accrual.tick(&mut self.state, elapsed_secs)?;
        self.announce(accrual);
        Ok(accrual)
    }

    /// [`Self::tick`] for a `Duration`.
    ///
    /// # Errors
    ///
    /// See [`Self::tick`].
    pub fn tick_duration(&mut self, elapsed: Duration) -> EconomyResult<Accrual> {
        if !self.state.running {
            return Ok(Accrual::default());
        }
        let accrual = self.accrual.tick_duration(&mut self.state, elapsed)?;
        self.announce(accrual);
        Ok(accrual)
    }

    fn announce(&self, accrual: Accrual) {
        if accrual.credited() {
            self.events.send(StudyEvent::CoinsCredited {
                minutes: accrual.minutes,
                coins: accrual.coins,
            });
        }
    }

    /// Discards the current session; lifetime time and coins are kept.
    pub fn reset_session(&mut self) {
        self.accrual.reset_session(&mut self.state);
        self.events.send(StudyEvent::SessionCleared);
    }

    /// Wipes everything: clears the store first, then resets every field.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the store cannot be cleared; the state is left
    /// untouched in that case.
    pub fn hard_reset(&mut self, _confirmation: ResetConfirmation) -> EconomyResult<()> {
        self.store.clear()?;

        self.accrual.hard_reset_time(&mut self.state);
        self.economy.reset_economy(&mut self.state);
        self.state.notes.clear();
        debug_assert_eq!(self.state, StudyState::default());

        warn!("all study progress reset");
        self.events.send(StudyEvent::Reset);
        Ok(())
    }

    // =========================================================================
    // Shop + Kitchen
    // =========================================================================

    /// Buys ingredients and saves.
    ///
    /// # Errors
    ///
    /// See [`EconomyEngine::buy`]. Rejections are also published.
    pub fn buy(&mut self, ingredient: Ingredient, quantity: u32) -> EconomyResult<Purchase> {
        match self.economy.buy(&mut self.state, ingredient, quantity) {
            Ok(purchase) => {
                self.events.send(StudyEvent::Purchased {
                    ingredient,
                    quantity,
                    cost: purchase.cost,
                });
                self.persist();
                Ok(purchase)
            }
            Err(e) => {
                if matches!(e, EconomyError::InsufficientFunds { .. }) {
                    self.events.send(StudyEvent::PurchaseRejected {
                        ingredient,
                        quantity,
                    });
                }
                Err(e)
            }
        }
    }

    /// Cooks one pancake and saves.
    ///
    /// # Errors
    ///
    /// See [`EconomyEngine::cook_one`]. Rejections are also published.
    pub fn cook_one(&mut self) -> EconomyResult<CookReport> {
        let result = self.economy.cook_one(&mut self.state);
        self.after_cook(result)
    }

    /// Cooks as many pancakes as possible and saves.
    ///
    /// # Errors
    ///
    /// See [`EconomyEngine::cook_max`]. Rejections are also published.
    pub fn cook_max(&mut self) -> EconomyResult<CookReport> {
        let result = self.economy.cook_max(&mut self.state);
        self.after_cook(result)
    }

    fn after_cook(&mut self, result: EconomyResult<CookReport>) -> EconomyResult<CookReport> {
        match &result {
            Ok(report) => {
                self.events.send(StudyEvent::Cooked {
                    pancakes: report.pancakes,
                });
                self.persist();
            }
            Err(EconomyError::InsufficientIngredients { ingredient, .. }) => {
                self.events.send(StudyEvent::CookRejected {
                    missing: *ingredient,
                });
            }
            Err(_) => {}
        }
        result
    }

    // =========================================================================
    // Notes + Persistence
    // =========================================================================

    /// Appends a note and saves. Blank text is ignored.
    pub fn add_note(&mut self, text: &str) -> Option<&Note> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.state.notes.push(Note {
            timestamp_ms: self.clock.now_ms(),
            text: text.to_string(),
        });
        self.events.send(StudyEvent::NoteAdded);
        self.persist();
        self.state.notes.last()
    }

    /// Saves explicitly.
    ///
    /// # Errors
    ///
    /// Returns the store's error; it is also published as `SaveFailed`.
    pub fn save(&mut self) -> EconomyResult<()> {
        match self.store.save(&self.state) {
            Ok(()) => {
                self.events.send(StudyEvent::Saved);
                Ok(())
            }
            Err(e) => {
                self.report_save_failure(&e);
                Err(e)
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.state) {
            self.report_save_failure(&e);
        }
    }

    fn report_save_failure(&self, e: &EconomyError) {
        warn!(error = %e, "failed to save study state");
        self.events.send(StudyEvent::SaveFailed {
            reason: e.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventBus, EventReceiver};
    use crate::pantry::Pantry;
    use crate::store::MemoryStore;
    use crate::study_time::StudyTime;
    use std::cell::Cell;

    /// Counts saves and optionally fails them.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        saves: Cell<u32>,
        clears: Cell<u32>,
        fail: Cell<bool>,
        unreadable: Cell<bool>,
    }

    impl StateStore for CountingStore {
        fn save(&self, state: &StudyState) -> EconomyResult<()> {
            if self.fail.get() {
                return Err(EconomyError::Storage("disk full".to_string()));
            }
            self.saves.set(self.saves.get() + 1);
            self.inner.save(state)
        }

        fn load(&self) -> EconomyResult<Option<StudyState>> {
            if self.unreadable.get() {
                return Err(EconomyError::Storage("permission denied".to_string()));
            }
            self.inner.load()
        }

        fn clear(&self) -> EconomyResult<()> {
            if self.fail.get() {
                return Err(EconomyError::Storage("read-only".to_string()));
            }
            self.clears.set(self.clears.get() + 1);
            self.inner.clear()
        }
    }

    fn tracker() -> (StudyTracker<CountingStore>, EventReceiver) {
        let bus = EventBus::new(64);
        let tracker = StudyTracker::open(
            CountingStore::default(),
            ManualClock::new(1_000),
            bus.sender(),
        )
        .unwrap();
        (tracker, bus.receiver())
    }

    fn stocked(tracker: &mut StudyTracker<CountingStore>, coins: u64, pantry: Pantry) {
        tracker.state.coins = coins;
        tracker.state.inventory = pantry;
    }

    #[test]
    fn test_start_does_not_save() {
        let (mut tracker, events) = tracker();
        assert!(tracker.start());
        assert!(!tracker.start());
        assert_eq!(tracker.store().saves.get(), 0);
        assert_eq!(tracker.state().started_at, Some(1_000));
        assert_eq!(events.drain(), vec![StudyEvent::TimerStarted]);
    }

    #[test]
    fn test_pause_saves() {
        let (mut tracker, _events) = tracker();
        tracker.start();
        tracker.tick(30.0).unwrap();
        assert!(tracker.pause());
        assert_eq!(tracker.store().saves.get(), 1);

        let stored = tracker.store().load().unwrap().unwrap();
        assert_eq!(stored.total_seconds, StudyTime::from_secs(30));
        assert!(!stored.running);
    }

    #[test]
    fn test_toggle() {
        let (mut tracker, _events) = tracker();
        assert!(tracker.toggle());
        assert!(!tracker.toggle());
        assert_eq!(tracker.store().saves.get(), 1);
    }

    #[test]
    fn test_tick_ignored_while_paused() {
        let (mut tracker, _events) = tracker();
        assert_eq!(tracker.tick(120.0).unwrap(), Accrual::default());
        assert_eq!(tracker.state().session_seconds, StudyTime::ZERO);
    }

    #[test]
    fn test_tick_publishes_credit() {
        let (mut tracker, events) = tracker();
        tracker.start();
        tracker.tick_duration(Duration::from_secs(125)).unwrap();
        let drained = events.drain();
        assert_eq!(
            drained.last(),
            Some(&StudyEvent::CoinsCredited { minutes: 2, coins: 20 })
        );
        assert_eq!(tracker.state().coins, 20);
    }

    #[test]
    fn test_buy_saves_and_rejection_does_not() {
        let (mut tracker, events) = tracker();
        stocked(&mut tracker, 100, Pantry::new());

        tracker.buy(Ingredient::Flour, 3).unwrap();
        assert_eq!(tracker.state().coins, 40);
        assert_eq!(tracker.store().saves.get(), 1);

        let err = tracker.buy(Ingredient::Butter, 10).unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(tracker.store().saves.get(), 1);
        assert_eq!(
            events.drain(),
            vec![
                StudyEvent::Purchased {
                    ingredient: Ingredient::Flour,
                    quantity: 3,
                    cost: 60
                },
                StudyEvent::PurchaseRejected {
                    ingredient: Ingredient::Butter,
                    quantity: 10
                },
            ]
        );
    }

    #[test]
    fn test_cook_saves_and_publishes() {
        let (mut tracker, events) = tracker();
        stocked(
            &mut tracker,
            0,
            Pantry::with_counts(&[
                (Ingredient::Flour, 4),
                (Ingredient::Egg, 2),
                (Ingredient::Milk, 2),
                (Ingredient::Sugar, 2),
                (Ingredient::Butter, 2),
            ]),
        );

        tracker.cook_one().unwrap();
        let report = tracker.cook_max().unwrap();
        assert_eq!(report.batches, 1);
        assert!(tracker.cook_one().is_err());

        assert_eq!(tracker.state().pancakes_cooked, 2);
        assert_eq!(tracker.store().saves.get(), 2);
        assert_eq!(
            events.drain(),
            vec![
                StudyEvent::Cooked { pancakes: 1 },
                StudyEvent::Cooked { pancakes: 1 },
                StudyEvent::CookRejected {
                    missing: Ingredient::Flour
                },
            ]
        );
    }

    #[test]
    fn test_notes_trimmed_and_blank_ignored() {
        let (mut tracker, _events) = tracker();
        assert!(tracker.add_note("   ").is_none());
        assert_eq!(tracker.store().saves.get(), 0);

        let note = tracker.add_note("  finished chapter 3 \n").unwrap();
        assert_eq!(note.text, "finished chapter 3");
        assert_eq!(note.timestamp_ms, 1_000);
        assert_eq!(tracker.store().saves.get(), 1);
    }

    #[test]
    fn test_reset_session_does_not_save() {
        let (mut tracker, _events) = tracker();
        tracker.start();
        tracker.tick(70.0).unwrap();
        tracker.reset_session();
        assert_eq!(tracker.state().session_seconds, StudyTime::ZERO);
        assert_eq!(tracker.state().coins, 10);
        assert_eq!(tracker.store().saves.get(), 0);
    }

    #[test]
    fn test_hard_reset_clears_store_first() {
        let (mut tracker, events) = tracker();
        tracker.start();
        tracker.tick(600.0).unwrap();
        tracker.add_note("note");
        tracker.save().unwrap();

        tracker
            .hard_reset(ResetConfirmation::confirmed_by_user())
            .unwrap();
        assert_eq!(tracker.store().clears.get(), 1);
        assert_eq!(tracker.store().load().unwrap(), None);
        assert_eq!(tracker.state(), &StudyState::default());
        assert_eq!(events.drain().last(), Some(&StudyEvent::Reset));
    }

    #[test]
    fn test_hard_reset_aborts_when_clear_fails() {
        let (mut tracker, _events) = tracker();
        tracker.start();
        tracker.tick(60.0).unwrap();
        tracker.store().fail.set(true);

        assert!(tracker
            .hard_reset(ResetConfirmation::confirmed_by_user())
            .is_err());
        assert_eq!(tracker.state().coins, 10);
    }

    #[test]
    fn test_save_failure_keeps_mutation() {
        let (mut tracker, events) = tracker();
        stocked(&mut tracker, 100, Pantry::new());
        tracker.store().fail.set(true);

        tracker.buy(Ingredient::Egg, 1).unwrap();
        assert_eq!(tracker.state().coins, 85);
        assert!(matches!(
            events.drain().last(),
            Some(StudyEvent::SaveFailed { .. })
        ));
        assert!(tracker.save().is_err());
    }

    #[test]
    fn test_open_restores_saved_state() {
        let store = MemoryStore::new();
        let saved = StudyState {
            coins: 77,
            credited_minutes: 9,
            total_seconds: StudyTime::from_secs(545),
            ..StudyState::default()
        };
        store.save(&saved).unwrap();

        let tracker =
            StudyTracker::open(store, SystemClock, EventSender::disconnected()).unwrap();
        assert_eq!(tracker.state(), &saved);
    }

    #[test]
    fn test_open_falls_back_on_malformed_state() {
        let bus = EventBus::new(4);
        let store = MemoryStore::with_bytes(b"SPCK garbage".to_vec());
        let tracker = StudyTracker::open(store, SystemClock, bus.sender()).unwrap();

        assert_eq!(tracker.state(), &StudyState::default());
        assert!(matches!(
            bus.receiver().try_recv(),
            Some(StudyEvent::LoadFallback { .. })
        ));
    }

    #[test]
    fn test_open_refuses_unreadable_store() {
        let bus = EventBus::new(4);
        let saved = StudyState {
            coins: 500,
            ..StudyState::default()
        };
        let store = CountingStore::default();
        store.inner.save(&saved).unwrap();
        store.unreadable.set(true);

        let result = StudyTracker::open(store, SystemClock, bus.sender());
        assert!(matches!(result, Err(EconomyError::Storage(_))));
        assert!(bus.receiver().try_recv().is_none());
    }
}
