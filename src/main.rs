//! termchat — a polling chat client for the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐  PollEvent  ┌──────────┐  draw()  ┌──────────┐
//! │  poll.rs │ ──────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (tokio)  │  (channel)  │  (sink)  │          │ (render) │
//! └──────────┘             └──────────┘          └──────────┘
//!      ▲  submit()              ▲
//!      │                        │ handle_key_event()
//!      └──────────────────┌──────────┐
//!                         │ input.rs │
//!                         └──────────┘
//! ```
//!
//! * **`chat/`** — the `ChatTransport` trait, wire types, and the HTTP
//!   implementation.
//! * **`poll`** — the polling loop: sync cursor, refresh timer, posting.
//! * **`app`** — transcript and input state; the display sink.
//! * **`ui`** — pure rendering: reads `App` state and draws widgets.
//! * **`input`** — maps key events to `App` edits.
//! * **`config`** — flags and environment.
//! * **`main`** — wires everything together and runs the event loop, which
//!   is the only place poll state is touched.

mod app;
mod chat;
mod config;
mod input;
mod poll;
mod ui;

use std::fs::File;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use chat::{ChatTransport, HttpTransport};
use config::Config;
use poll::Poller;

// ---------------------------------------------------------------------------
// RAII terminal guard — idiomatic cleanup even on panic
// ---------------------------------------------------------------------------

/// Manages raw mode, the alternate screen and focus reporting via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            DisableFocusChange,
            LeaveAlternateScreen
        );
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableFocusChange, LeaveAlternateScreen);
        original_hook(info);
    }));
}

/// Send logs to `config.log_file`; `RUST_LOG` overrides the default filter.
fn init_logging(config: &Config) -> Result<()> {
    let file = File::create(&config.log_file)
        .with_context(|| format!("cannot open log file {}", config.log_file.display()))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("termchat=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    // -- configuration (bad host/port fails here, before the terminal) -------
    let config = Config::parse();
    let base_url = config.base_url()?;
    init_logging(&config)?;
    info!(%base_url, nick = %config.nick, "starting");

    // -- networking runs on tokio; this thread stays the UI thread -----------
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let http = HttpTransport::new(&base_url)?;
    info!(endpoint = %http.endpoint(), "chat endpoint");
    let transport: Arc<dyn ChatTransport> = Arc::new(http);
    let (mut poller, mut rx) = Poller::new(
        transport,
        config.nick.clone(),
        config.refresh_interval(),
        runtime.handle().clone(),
    );

    install_panic_hook();
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(poller.nick());

    poller.activate();
    app.live = poller.is_active();

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Apply completed requests and timers.
    //   2. Render the UI.
    //   3. Poll for terminal input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        // 1. Process poll events
        while let Ok(event) = rx.try_recv() {
            poller.handle(event, &mut app);
        }

        // 2. Render
        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        // 3. Handle input
        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) => {
                    if let Some(line) = input::handle_key_event(&mut app, key) {
                        poller.submit(&line);
                    }
                }
                Event::FocusGained => poller.activate(),
                Event::FocusLost => poller.deactivate(),
                _ => {}
            }
            app.live = poller.is_active();
        }

        if app.quit {
            break;
        }
    }

    info!(last_seq = poller.state().last_seq, "shutting down");
    // Restore the terminal before tearing down the runtime.
    drop(guard);
    runtime.shutdown_background();
    Ok(())
}
