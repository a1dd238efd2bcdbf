//! # Pancakes
//!
//! Study with the timer running, earn 10 coins per minute, buy ingredients
//! and cook pancakes.
//!
//! ```bash
//! pancakes                 # reads ./pancakes.toml if present
//! pancakes my-config.toml
//! RUST_LOG=pancakes=debug pancakes
//! ```

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pancakes::economy::{EventBus, EventReceiver, FileStore, StudyTracker, SystemClock};
use pancakes::{
    Command, FrameDriver, PauseOnExit, Reply, Shell, TrackerConfig, DEFAULT_CONFIG_PATH,
};

fn init_tracing(default_filter: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout belongs to the dashboard.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(env_filter)
        .init();
}

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_events(events: &EventReceiver) {
    let mut out = io::stdout().lock();
    for event in events.drain() {
        let _ = writeln!(out, "• {event}");
    }
    let _ = out.flush();
}

fn main() -> ExitCode {
    let config_path = env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    let config = match TrackerConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("pancakes: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.log_filter);
    info!(save_path = %config.save_path.display(), frame_rate = config.frame_rate, "starting");

    let bus = EventBus::default();
    let events = bus.receiver();
    let mut tracker = match StudyTracker::open(
        FileStore::new(&config.save_path),
        SystemClock,
        bus.sender(),
    ) {
        Ok(tracker) => tracker,
        Err(e) => {
            eprintln!("pancakes: {}: {e}", config.save_path.display());
            return ExitCode::FAILURE;
        }
    };
    // Commits the running session however the loop is left.
    let mut tracker = PauseOnExit::new(&mut tracker);
    let mut driver = FrameDriver::new(Instant::now());
    let frame_interval = config.frame_interval();
    let mut shell = Shell::new(config);

    println!("🥞 Study Pancakes. Press <enter> to start or pause, 'help' for commands.");
    print_events(&events);
    if let Reply::Continue(Some(text)) =
        shell.handle(Command::Status, Instant::now(), &mut *tracker, &mut driver)
    {
        println!("{text}");
    }

    let lines = spawn_stdin_reader();
    loop {
        match lines.recv_timeout(frame_interval) {
            Ok(line) => {
                // Account for time up to the keypress before acting on it.
                if let Err(e) = driver.frame(Instant::now(), &mut *tracker) {
                    warn!(error = %e, "tick failed");
                }
                match shell.handle_line(&line, Instant::now(), &mut *tracker, &mut driver) {
                    Reply::Continue(Some(text)) => println!("{text}"),
                    Reply::Continue(None) => {}
                    Reply::Quit => break,
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if let Err(e) = driver.frame(Instant::now(), &mut *tracker) {
            warn!(error = %e, "tick failed");
        }
        print_events(&events);
    }

    drop(tracker);
    print_events(&events);

    let stats = driver.stats();
    info!(
        frames = stats.frames,
        ticked = stats.ticked_frames,
        coins = stats.coins_credited,
        "bye"
    );
    ExitCode::SUCCESS
}
