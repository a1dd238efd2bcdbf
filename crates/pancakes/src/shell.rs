//! # Command Dispatch
//!
//! Applies parsed commands to the tracker on the owning thread.
//!
//! `wipe` only arms a question; the next line must be `yes` for the full
//! reset to run. Any other line cancels it, including one that does not
//! parse.

use std::ops::{Deref, DerefMut};
use std::time::Instant;

use pancakes_economy::{ResetConfirmation, StateStore, StudyTracker};
use tracing::warn;

use crate::commands::{Command, HELP};
use crate::config::TrackerConfig;
use crate::driver::FrameDriver;
use crate::view::{price_list, Dashboard};

/// What the host should do after a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    /// Keep going, optionally printing a message.
    Continue(Option<String>),
    /// Leave the loop.
    Quit,
}

impl Reply {
    fn say(text: impl Into<String>) -> Self {
        Self::Continue(Some(text.into()))
    }

    fn silent() -> Self {
        Self::Continue(None)
    }
}

/// Interactive session state that is not part of the study state.
#[derive(Debug)]
pub struct Shell {
    /// Host settings.
    config: TrackerConfig,
    /// A `wipe` is waiting for `yes`.
    wipe_pending: bool,
}

impl Shell {
    /// Creates a shell.
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            wipe_pending: false,
        }
    }

    /// Host settings.
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// True while a wipe awaits confirmation.
    #[must_use]
    pub fn wipe_pending(&self) -> bool {
        self.wipe_pending
    }

    /// Parses and runs one input line.
    ///
    /// A line that does not parse still counts as the answer to a pending
    /// wipe, so the wipe is cancelled.
    pub fn handle_line<S: StateStore>(
        &mut self,
        line: &str,
        now: Instant,
        tracker: &mut StudyTracker<S>,
        driver: &mut FrameDriver,
    ) -> Reply {
        match Command::parse(line, self.config.bulk) {
            Ok(command) => self.handle(command, now, tracker, driver),
            Err(e) => {
                if std::mem::take(&mut self.wipe_pending) {
                    Reply::say(format!("Reset cancelled. {e}"))
                } else {
                    Reply::say(e.to_string())
                }
            }
        }
    }

    /// Runs one command.
    ///
    /// Rejected operations are already on the event feed, so they produce
    /// no extra message here.
    pub fn handle<S: StateStore>(
        &mut self,
        command: Command,
        now: Instant,
        tracker: &mut StudyTracker<S>,
        driver: &mut FrameDriver,
    ) -> Reply {
        if std::mem::take(&mut self.wipe_pending) {
            if command.is_confirmation() {
                return match tracker.hard_reset(ResetConfirmation::confirmed_by_user()) {
                    Ok(()) => Reply::silent(),
                    Err(e) => {
                        warn!(error = %e, "reset failed");
                        Reply::say(format!("Reset failed: {e}"))
                    }
                };
            }
            if !matches!(command, Command::Wipe) {
                return Reply::say("Reset cancelled.");
            }
        }

        match command {
            Command::Start => {
                if !tracker.start() {
                    return Reply::say("Timer is already running.");
                }
            }
            Command::Pause => {
                if !tracker.pause() {
                    return Reply::say("Timer is not running.");
                }
            }
            Command::Toggle => {
                tracker.toggle();
            }
            Command::ResetSession => tracker.reset_session(),
            Command::Wipe => {
                self.wipe_pending = true;
                return Reply::say("Reset ALL progress? Type 'yes' to confirm.");
            }
            Command::Confirm => return Reply::say("Nothing to confirm."),
            Command::Buy {
                ingredient,
                quantity,
            } => {
                // Rejections are published as events.
                let _ = tracker.buy(ingredient, quantity);
            }
            Command::Cook => {
                let _ = tracker.cook_one();
            }
            Command::CookMax => {
                let _ = tracker.cook_max();
            }
            Command::Note(text) => {
                tracker.add_note(&text);
            }
            Command::Save => {
                let _ = tracker.save();
            }
            Command::Status => {
                return Reply::say(
                    Dashboard {
                        state: tracker.state(),
                        economy: tracker.economy(),
                        rate_per_min: tracker.accrual().rate_per_min(),
                        notes_shown: self.config.notes_shown,
                        suspended: driver.is_suspended(),
                    }
                    .to_string(),
                );
            }
            Command::Hide => {
                driver.set_suspended(true, now, tracker);
            }
            Command::Show => {
                driver.set_suspended(false, now, tracker);
            }
            Command::Help => {
                return Reply::say(format!("{HELP}\nprices: {}", price_list(tracker.economy())));
            }
            Command::Quit => return Reply::Quit,
        }
        Reply::silent()
    }
}

/// Pauses the tracker when dropped, so a running session is committed and
/// saved on every way out of the host loop, unwinding included.
pub struct PauseOnExit<'a, S: StateStore> {
    tracker: &'a mut StudyTracker<S>,
}

impl<'a, S: StateStore> PauseOnExit<'a, S> {
    /// Guards `tracker` until the guard goes out of scope.
    #[must_use]
    pub fn new(tracker: &'a mut StudyTracker<S>) -> Self {
        Self { tracker }
    }
}

impl<S: StateStore> Deref for PauseOnExit<'_, S> {
    type Target = StudyTracker<S>;

    fn deref(&self) -> &Self::Target {
        self.tracker
    }
}

impl<S: StateStore> DerefMut for PauseOnExit<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.tracker
    }
}

impl<S: StateStore> Drop for PauseOnExit<'_, S> {
    fn drop(&mut self) {
        self.tracker.pause();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pancakes_economy::{
        EventBus, EventReceiver, Ingredient, ManualClock, MemoryStore, StudyEvent, StudyState,
        StudyTime,
    };

    struct Fixture {
        shell: Shell,
        tracker: StudyTracker<MemoryStore>,
        driver: FrameDriver,
        events: EventReceiver,
        now: Instant,
    }

    impl Fixture {
        fn new() -> Self {
            let bus = EventBus::new(64);
            let now = Instant::now();
            Self {
                shell: Shell::new(TrackerConfig::default()),
                tracker: StudyTracker::open(MemoryStore::new(), ManualClock::new(0), bus.sender())
                    .unwrap(),
                driver: FrameDriver::new(now),
                events: bus.receiver(),
                now,
            }
        }

        fn run(&mut self, command: Command) -> Reply {
            self.shell
                .handle(command, self.now, &mut self.tracker, &mut self.driver)
        }

        fn type_line(&mut self, line: &str) -> Reply {
            self.shell
                .handle_line(line, self.now, &mut self.tracker, &mut self.driver)
        }
    }

    #[test]
    fn test_wipe_requires_yes() {
        let mut fx = Fixture::new();
        fx.tracker.start();
        fx.tracker.tick(120.0).unwrap();

        assert!(matches!(fx.run(Command::Wipe), Reply::Continue(Some(_))));
        assert!(fx.shell.wipe_pending());
        assert_eq!(fx.run(Command::Confirm), Reply::Continue(None));
        assert_eq!(fx.tracker.state(), &StudyState::default());
    }

    #[test]
    fn test_wipe_cancelled_by_other_command() {
        let mut fx = Fixture::new();
        fx.tracker.start();
        fx.tracker.tick(120.0).unwrap();

        fx.run(Command::Wipe);
        assert_eq!(fx.run(Command::Status), Reply::say("Reset cancelled."));
        assert!(!fx.shell.wipe_pending());
        assert_eq!(fx.run(Command::Confirm), Reply::say("Nothing to confirm."));
        assert_eq!(fx.tracker.state().coins, 20);
    }

    #[test]
    fn test_wipe_cancelled_by_unparsable_line() {
        let mut fx = Fixture::new();
        fx.tracker.start();
        fx.tracker.tick(120.0).unwrap();

        fx.type_line("wipe");
        assert!(fx.shell.wipe_pending());
        let Reply::Continue(Some(text)) = fx.type_line("no") else {
            panic!("a bad answer is reported");
        };
        assert!(text.starts_with("Reset cancelled."));
        assert!(text.contains("unknown command 'no'"));
        assert!(!fx.shell.wipe_pending());

        assert_eq!(fx.type_line("yes"), Reply::say("Nothing to confirm."));
        assert_eq!(fx.tracker.state().coins, 20);
    }

    #[test]
    fn test_unparsable_line_without_wipe() {
        let mut fx = Fixture::new();
        assert_eq!(
            fx.type_line("bake"),
            Reply::say("unknown command 'bake' (try 'help')")
        );
    }

    #[test]
    fn test_pause_on_exit_commits_session() {
        let mut fx = Fixture::new();
        {
            let mut guard = PauseOnExit::new(&mut fx.tracker);
            guard.start();
            guard.tick(90.0).unwrap();
            assert!(guard.is_running());
        }

        assert!(!fx.tracker.is_running());
        let stored = fx.tracker.store().load().unwrap().unwrap();
        assert!(!stored.running);
        assert_eq!(stored.coins, 10);
        assert_eq!(stored.total_seconds, StudyTime::from_secs(90));
    }

    #[test]
    fn test_toggle_and_status() {
        let mut fx = Fixture::new();
        fx.run(Command::Toggle);
        assert!(fx.tracker.is_running());

        let Reply::Continue(Some(text)) = fx.run(Command::Status) else {
            panic!("status prints the dashboard");
        };
        assert!(text.contains("[running]"));

        fx.run(Command::Toggle);
        assert!(!fx.tracker.is_running());
        assert_eq!(fx.run(Command::Pause), Reply::say("Timer is not running."));
    }

    #[test]
    fn test_buy_rejection_goes_to_event_feed() {
        let mut fx = Fixture::new();
        assert_eq!(
            fx.run(Command::Buy {
                ingredient: Ingredient::Egg,
                quantity: 5
            }),
            Reply::Continue(None)
        );
        assert_eq!(
            fx.events.drain(),
            vec![StudyEvent::PurchaseRejected {
                ingredient: Ingredient::Egg,
                quantity: 5
            }]
        );
    }

    #[test]
    fn test_hide_announces_while_running() {
        let mut fx = Fixture::new();
        fx.run(Command::Start);
        fx.run(Command::Hide);
        assert!(fx.driver.is_suspended());
        fx.run(Command::Show);
        assert_eq!(
            fx.events.drain(),
            vec![
                StudyEvent::TimerStarted,
                StudyEvent::Suspended,
                StudyEvent::Resumed
            ]
        );
    }

    #[test]
    fn test_quit() {
        let mut fx = Fixture::new();
        assert_eq!(fx.run(Command::Quit), Reply::Quit);
    }
}
