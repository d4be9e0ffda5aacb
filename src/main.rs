use ghd::cli::Cli;
use ghd::config::{default_config_dir, Config, FsConfigStore};
use ghd::dashboard::{validate_profile_name, Dashboard, Mode, Request, Settings};
use ghd::events::{AppEvent, EventHandler, TICK_RATE};
use ghd::gh::executor::GhExecutor;
use ghd::grid::GridState;
use ghd::input::{self, InputContext};
use ghd::poller;
use ghd::repo::GitRepoResolver;
use ghd::traits::{CiExecutor, ConfigStore};
use ghd::tui;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, SetTitle};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

fn setup_verbose_logging() -> Result<()> {
    let state_dir = state_dir();
    std::fs::create_dir_all(&state_dir)
        .map_err(|e| eyre!("Failed to create log directory {state_dir:?}: {e}"))?;
    let log_path = state_dir.join("debug.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| eyre!("Failed to open log file {log_path:?}: {e}"))?;
    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .init();
    tracing::info!(
        "ghd v{} starting with verbose logging",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn state_dir() -> PathBuf {
    if let Some(state) = std::env::var_os("XDG_STATE_HOME") {
        PathBuf::from(state).join("ghd")
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local").join("state").join("ghd")
    } else {
        PathBuf::from("/tmp/ghd")
    }
}

fn spawn_monitored(
    tx: UnboundedSender<AppEvent>,
    label: &'static str,
    fut: impl Future<Output = ()> + Send + 'static,
) {
    tokio::spawn(async move {
        let handle = tokio::spawn(fut);
        if let Err(join_err) = handle.await {
            let msg = if join_err.is_panic() {
                match join_err.into_panic().downcast::<String>() {
                    Ok(s) => *s,
                    Err(payload) => match payload.downcast::<&str>() {
                        Ok(s) => s.to_string(),
                        Err(_) => "unknown panic".to_string(),
                    },
                }
            } else {
                "task cancelled".to_string()
            };
            tracing::error!("{label} panicked: {msg}");
            if tx
                .send(AppEvent::Error(format!("{label} crashed: {msg}")))
                .is_err()
            {
                tracing::warn!("{label}: channel closed while reporting panic");
            }
        }
    });
}

fn dispatch(
    requests: Vec<Request>,
    executor: &Arc<dyn CiExecutor>,
    tx: &UnboundedSender<AppEvent>,
) {
    for request in requests {
        let label = match request {
            Request::FetchRuns { .. } => "fetch_runs",
            Request::FetchJobs { .. } => "fetch_jobs",
        };
        let executor = executor.clone();
        let task_tx = tx.clone();
        spawn_monitored(tx.clone(), label, async move {
            poller::perform(executor.as_ref(), request, &task_tx).await;
        });
    }
}

fn resize_grid(dash: &mut Dashboard, width: u16, height: u16) {
    let area = tui::render::grid_area(Rect::new(0, 0, width, height));
    dash.set_grid_size(area.width as usize, area.height as usize);
}

/// Loads the startup configuration, switching to `profile` when one is named.
fn load_config(store: &FsConfigStore, profile: Option<&str>) -> Result<Config> {
    match profile {
        Some(name) => {
            validate_profile_name(name)?;
            let mut config = store.load_profile(name)?;
            config.profile_name = Some(name.to_string());
            if let Err(e) = store.save(&config) {
                tracing::warn!(error = %e, "failed to persist startup profile");
            }
            Ok(config)
        }
        None => store.load(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    if args.verbose {
        setup_verbose_logging()?;
    }

    let config_dir = args.config_dir.clone().unwrap_or_else(default_config_dir);
    tracing::debug!(dir = ?config_dir, "using config directory");
    let store = FsConfigStore::new(config_dir);
    let config = match load_config(&store, args.profile.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let executor: Arc<dyn CiExecutor> = Arc::new(GhExecutor);
    if !executor.is_tool_installed().await {
        eprintln!("Error: GitHub CLI (gh) not found. Install it from https://cli.github.com/");
        std::process::exit(1);
    }
    if !executor.is_authenticated().await {
        eprintln!("Error: gh is not authenticated. Run `gh auth login` first.");
        std::process::exit(1);
    }

    let settings = Settings {
        run_limit: args.limit,
        refresh_period: Duration::from_secs(args.interval),
    };
    let mut dash = Dashboard::new(
        config,
        Box::new(store),
        Box::new(GitRepoResolver),
        settings,
        Instant::now(),
    );

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = terminal::disable_raw_mode() {
            eprintln!("Failed to disable raw mode during panic: {e}");
        }
        if let Err(e) = execute!(io::stdout(), LeaveAlternateScreen, SetTitle("")) {
            eprintln!("Failed to leave alternate screen during panic: {e}");
        }
        original_hook(panic_info);
    }));

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, SetTitle(dash.title()))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut dash, &executor).await;

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, SetTitle(""))?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    dash: &mut Dashboard,
    executor: &Arc<dyn CiExecutor>,
) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);
    let tx = events.sender();

    let size = terminal.size()?;
    resize_grid(dash, size.width, size.height);
    dispatch(dash.start(Instant::now()), executor, &tx);

    let mut title = dash.title();

    loop {
        terminal.draw(|f| tui::render::render(f, dash, Instant::now(), chrono::Utc::now()))?;

        let Some(event) = events.next().await else {
            break;
        };
        let now = Instant::now();
        let requests = match event {
            AppEvent::Key(key) => {
                let ctx = InputContext {
                    command_mode: dash.mode() == Mode::Command,
                    card_focused: dash.grid().state() == GridState::CardFocused,
                    has_error: dash.error_message().is_some(),
                };
                dash.handle_action(input::map_key(key, &ctx), now)
            }
            AppEvent::Resize(w, h) => {
                resize_grid(dash, w, h);
                Vec::new()
            }
            AppEvent::Tick => dash.handle_tick(now),
            AppEvent::RunsResult {
                index,
                repo_key,
                result,
            } => {
                dash.apply_runs(index, &repo_key, result);
                Vec::new()
            }
            AppEvent::JobsResult {
                index,
                run_id,
                result,
            } => {
                dash.apply_jobs(index, run_id, result);
                Vec::new()
            }
            AppEvent::Error(e) => {
                dash.set_error(e, now);
                Vec::new()
            }
        };

        dispatch(requests, executor, &tx);

        let next_title = dash.title();
        if next_title != title {
            execute!(terminal.backend_mut(), SetTitle(&next_title))?;
            title = next_title;
        }

        if dash.should_quit() {
            break;
        }
    }

    events.stop();
    Ok(())
}
