//! Terminal chat client: modal vi-like keymap, live push updates, and
//! attachment helpers (§1-§2).
//!
//! Startup sequence (§2 "Control flow"): load config, set up logging,
//! log in against the backend, prime the model with a first page of
//! chats, register the push-update handler table, spawn the input
//! thread, and run the draw loop on the main thread until a command
//! reports `Quit`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{Event, KeyEventKind};
use tracing_subscriber::EnvFilter;

use piper_chat::config::{self, Config};
use piper_chat::controller::Controller;
use piper_chat::view::{self, CrosstermSurface, TerminalGuard};
use piper_chat::{mp, render_queue, shell, updates};

/// `piper-chat` — terminal chat client.
#[derive(Parser)]
#[command(name = "piper-chat", version)]
struct Cli {
    /// Path to a config file; defaults to `~/.config/piper-chat/config.toml`.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref());
    let _log_guard = init_logging(&config)?;

    if let Some(days) = config.keep_media {
        match config::sweep_old_media(&config.files_dir, Some(days)) {
            Ok(n) if n > 0 => tracing::info!(removed = n, "swept stale media files"),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "media sweep failed"),
        }
    }

    let mp: Arc<dyn mp::MessagingProvider> = login(&config).context("backend login failed")?;
    let shell = shell::Shell::new(config.default_open.clone());
    let mut controller = Controller::new(mp.clone(), shell, config);

    prime_model(&mut controller)?;

    let (queue, consumer) = render_queue::channel();
    updates::register_all(mp.as_ref(), queue.clone());

    let mut stdout = std::io::stdout();
    let _terminal_guard = TerminalGuard::acquire(&mut stdout).context("failed to acquire terminal")?;
    let surface = CrosstermSurface::new(stdout).context("failed to read terminal size")?;

    let input_queue = queue.clone();
    let input_thread = std::thread::spawn(move || input_loop(input_queue));

    run_draw_loop(&mut controller, &consumer, surface);

    drop(queue);
    let _ = input_thread.join();
    Ok(())
}

/// Sets up `tracing` with a rolling file appender at `config.log_path`,
/// filtered by `config.log_level` (§1 "Logging"). Returns the guard that
/// must stay alive for the duration of `main` so buffered log lines are
/// flushed on exit.
fn init_logging(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = config
        .log_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&log_dir).context("creating log directory")?;
    let file_name = config
        .log_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "piper-chat.log".to_string());
    let appender = tracing_appender::rolling::never(&log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    Ok(guard)
}

/// Logs in and returns the live backend handle. The concrete TDLib binding
/// is outside this crate's scope (§1 Non-goals); this wires up whatever
/// `MessagingProvider` implementation is configured, currently a stub that
/// documents the seam for that binding.
fn login(_config: &Config) -> Result<Arc<dyn mp::MessagingProvider>> {
    anyhow::bail!(
        "no MessagingProvider backend is compiled in; this binary defines the trait \
         and control flow around it but does not embed a TDLib binding"
    )
}

/// Primes the model with the first page of chats and the current user
/// (§2 "on startup, the controller primes state with a first chat page").
fn prime_model(controller: &mut Controller) -> Result<()> {
    let me = controller.mp.get_me().wait().context("get_me")?;
    controller.model.users.set_me(me);
    controller.model.chats.load_next(controller.mp.as_ref());
    Ok(())
}

/// Dedicated OS thread that blocks on terminal key reads and submits a
/// closure per key to the render queue (§5 "Input thread"). Resize events
/// are forwarded as a no-op redraw trigger; `Ctrl-C` is left to the
/// terminal's own signal handling rather than intercepted here.
fn input_loop(queue: render_queue::RenderQueue) {
    loop {
        let event = match crossterm::event::read() {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "terminal read failed, stopping input thread");
                return;
            }
        };
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                queue.submit(move |controller: &mut Controller| {
                    controller.handle_key(key);
                });
            }
            Event::Resize(_, _) => {
                queue.submit(|_controller: &mut Controller| {});
            }
            _ => {}
        }
    }
}

/// Consumes render-queue jobs and redraws the full screen after each one,
/// until a job sets `controller.is_running = false` (§5 "draw thread").
/// This is the only place that calls [`view::draw_all`] — every other
/// producer only ever mutates the model and leaves drawing to this loop.
fn run_draw_loop<W: std::io::Write>(controller: &mut Controller, consumer: &render_queue::RenderQueueConsumer, mut surface: CrosstermSurface<W>) {
    while controller.is_running {
        if !consumer.run_one(controller) {
            break;
        }
        if let Err(e) = view::draw_all(&mut surface, controller) {
            tracing::error!(error = %e, "draw failed");
        }
    }
}
