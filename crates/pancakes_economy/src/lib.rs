//! # Pancakes Economy
//!
//! Study time in, pancakes out.
//!
//! ## Design Principles
//!
//! 1. **Exact time** - Study time is whole microseconds, never an accumulating float
//! 2. **Watermarked crediting** - Every study minute pays out exactly once
//! 3. **Transactional cooking** - All-or-nothing ingredient consumption
//! 4. **Save after mutation** - Every user-visible change goes through the store
//!
//! ## Layout
//!
//! ```text
//! StudyTracker ──┬── AccrualEngine   (time -> coins)
//!                ├── EconomyEngine   (coins -> ingredients -> pancakes)
//!                ├── StateStore      (framed JSON snapshot)
//!                └── EventSender     (log feed for the host)
//! ```
//!
//! ## Threading
//!
//! The tracker is single-writer. Hosts that read input on another thread
//! forward commands over a channel to the thread that owns the tracker.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pancakes_economy::{EventBus, Ingredient, MemoryStore, StudyTracker, SystemClock};
//!
//! let bus = EventBus::default();
//! let mut tracker = StudyTracker::open(MemoryStore::new(), SystemClock, bus.sender())?;
//! tracker.start();
//! tracker.tick(125.0)?;
//! tracker.buy(Ingredient::Flour, 1)?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod accrual;
pub mod economy;
pub mod error;
pub mod events;
pub mod pantry;
pub mod recipe;
pub mod shop;
pub mod state;
pub mod store;
pub mod study_time;
pub mod tracker;

pub use accrual::{Accrual, AccrualEngine, RATE_PER_MIN};
pub use economy::{CookReport, EconomyEngine, Purchase};
pub use error::{EconomyError, EconomyResult};
pub use events::{EventBus, EventReceiver, EventSender, StudyEvent, DEFAULT_EVENT_CAPACITY};
pub use pantry::{Ingredient, Pantry, PantrySnapshot};
pub use recipe::{Recipe, RecipeItem};
pub use shop::PriceTable;
pub use state::{Note, StudyState};
pub use store::{decode_snapshot, encode_snapshot, FileStore, MemoryStore, StateStore};
pub use study_time::{format_hms, StudyTime};
pub use tracker::{Clock, ManualClock, ResetConfirmation, StudyTracker, SystemClock};
