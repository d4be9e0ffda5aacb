//! Top-level mode switch and the only owner of the tracked-repo configuration.
//!
//! Every entry point returns the fetches it wants started as [`Request`]s. The
//! caller spawns them and feeds the outcomes back through [`Dashboard::apply_runs`]
//! and [`Dashboard::apply_jobs`], so nothing here blocks on the network.

use crate::command::{Command, CommandKind, CommandOutcome, CommandOverlay, CompletionSources};
use crate::config::Config;
use crate::grid::{Grid, GridAction, GridState};
use crate::input::Action;
use crate::model::{Job, RepoRef, WorkflowRun};
use crate::repo::expand_home;
use crate::traits::{ConfigStore, RepoResolver};
use color_eyre::eyre::{eyre, Result};
use std::time::{Duration, Instant};

pub const ERROR_TTL_SECS: u64 = 10;
pub const SPINNER_FRAME_COUNT: usize = 10;
pub const DEFAULT_REFRESH_SECS: u64 = 30;
pub const DEFAULT_RUN_LIMIT: usize = 5;

/// A fetch the event loop should start on the dashboard's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    FetchRuns {
        index: usize,
        repo: RepoRef,
        limit: usize,
    },
    FetchJobs {
        index: usize,
        repo: RepoRef,
        run_id: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Grid,
    Command,
}

/// Fixed-period refresh. Re-armed after it fires, never ahead of time.
#[derive(Debug, Clone, Copy)]
pub struct RefreshTimer {
    period: Duration,
    due: Instant,
}

impl RefreshTimer {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            due: now + period,
        }
    }

    /// `true` once per elapsed period.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.due {
            return false;
        }
        self.rearm(now);
        true
    }

    pub fn rearm(&mut self, now: Instant) {
        self.due = now + self.period;
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.due.saturating_duration_since(now)
    }

}

#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub run_limit: usize,
    pub refresh_period: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            run_limit: DEFAULT_RUN_LIMIT,
            refresh_period: Duration::from_secs(DEFAULT_REFRESH_SECS),
        }
    }
}

pub struct Dashboard {
    config: Config,
    store: Box<dyn ConfigStore>,
    resolver: Box<dyn RepoResolver>,
    grid: Grid,
    command: CommandOverlay,
    mode: Mode,
    settings: Settings,
    timer: RefreshTimer,
    error: Option<(String, Instant)>,
    pending: usize,
    spinner_frame: usize,
    should_quit: bool,
}

impl Dashboard {
    pub fn new(
        config: Config,
        store: Box<dyn ConfigStore>,
        resolver: Box<dyn RepoResolver>,
        settings: Settings,
        now: Instant,
    ) -> Self {
        let grid = Grid::new(&config.repos);
        Self {
            config,
            store,
            resolver,
            grid,
            command: CommandOverlay::new(),
            mode: Mode::Grid,
            timer: RefreshTimer::new(settings.refresh_period, now),
            settings,
            error: None,
            pending: 0,
            spinner_frame: 0,
            should_quit: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn command(&self) -> &CommandOverlay {
        &self.command
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn spinner_frame(&self) -> usize {
        self.spinner_frame
    }

    pub fn refresh_remaining(&self, now: Instant) -> Duration {
        self.timer.remaining(now)
    }

    /// Terminal window title.
    pub fn title(&self) -> String {
        match &self.config.profile_name {
            Some(name) => format!("ghd: {name}"),
            None => "ghd".to_string(),
        }
    }

    pub fn set_error(&mut self, msg: impl Into<String>, now: Instant) {
        let msg = msg.into();
        tracing::warn!(error = %msg, "dashboard error");
        self.error = Some((msg, now));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|(msg, _)| msg.as_str())
    }

    fn prune_error(&mut self, now: Instant) {
        if let Some((_, at)) = &self.error {
            if now.duration_since(*at).as_secs() >= ERROR_TTL_SECS {
                self.error = None;
            }
        }
    }

    pub fn set_grid_size(&mut self, width: usize, height: usize) {
        self.grid.set_size(width, height);
    }

    /// Initial fetch for every card.
    pub fn start(&mut self, now: Instant) -> Vec<Request> {
        self.refresh(now)
    }

    pub fn refresh(&mut self, now: Instant) -> Vec<Request> {
        self.timer.rearm(now);
        let requests = self.grid.refresh_all(self.settings.run_limit);
        self.pending += requests.len();
        tracing::debug!(count = requests.len(), "refreshing all cards");
        requests
    }

    pub fn handle_tick(&mut self, now: Instant) -> Vec<Request> {
        self.prune_error(now);
        if self.is_loading() {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAME_COUNT;
        }
        if self.timer.poll(now) {
            self.refresh(now)
        } else {
            Vec::new()
        }
    }

    pub fn handle_action(&mut self, action: Action, now: Instant) -> Vec<Request> {
        match (self.mode, action) {
            (_, Action::Quit) => {
                self.should_quit = true;
                Vec::new()
            }
            (_, Action::None) => Vec::new(),
            (Mode::Command, Action::Command(key)) => {
                match self.command.handle(key, self.resolver.as_ref()) {
                    CommandOutcome::Editing => Vec::new(),
                    CommandOutcome::Cancelled => {
                        self.mode = Mode::Grid;
                        Vec::new()
                    }
                    CommandOutcome::Execute(command) => {
                        self.mode = Mode::Grid;
                        self.execute(command, now)
                    }
                }
            }
            (Mode::Command, _) | (Mode::Grid, Action::Command(_)) => Vec::new(),
            (Mode::Grid, Action::DismissError) => {
                self.clear_error();
                Vec::new()
            }
            (Mode::Grid, Action::Refresh) => self.refresh(now),
            (Mode::Grid, Action::EnterCommand) => {
                self.enter_command_mode();
                Vec::new()
            }
            (Mode::Grid, Action::MoveLeft) => self.grid_input(GridAction::Left),
            (Mode::Grid, Action::MoveRight) => self.grid_input(GridAction::Right),
            (Mode::Grid, Action::MoveUp) => self.grid_input(GridAction::Up),
            (Mode::Grid, Action::MoveDown) => self.grid_input(GridAction::Down),
            (Mode::Grid, Action::Confirm) => self.grid_input(GridAction::Confirm),
            (Mode::Grid, Action::Back) => self.grid_input(GridAction::Cancel),
        }
    }

    fn grid_input(&mut self, action: GridAction) -> Vec<Request> {
        let requests: Vec<Request> = self.grid.handle(action).into_iter().collect();
        self.pending += requests.len();
        requests
    }

    fn enter_command_mode(&mut self) {
        if self.grid.state() != GridState::Navigating {
            return;
        }
        let profiles = self.store.list_profiles().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "profile listing unavailable");
            Vec::new()
        });
        let sources = CompletionSources {
            repo_keys: self.config.repos.iter().map(RepoRef::key).collect(),
            profiles,
        };
        self.command.open(sources, self.resolver.as_ref());
        self.mode = Mode::Command;
    }

    pub fn apply_runs(
        &mut self,
        index: usize,
        repo_key: &str,
        result: Result<Vec<WorkflowRun>, String>,
    ) {
        self.pending = self.pending.saturating_sub(1);
        self.grid.apply_runs(index, repo_key, result);
    }

    pub fn apply_jobs(&mut self, index: usize, run_id: u64, result: Result<Vec<Job>, String>) {
        self.pending = self.pending.saturating_sub(1);
        self.grid.apply_jobs(index, run_id, result);
    }

    pub fn execute(&mut self, command: Command, now: Instant) -> Vec<Request> {
        tracing::debug!(kind = ?command.kind, arg = %command.arg, "executing command");
        match command.kind {
            CommandKind::Add => self.add_repo(&command.arg, now),
            CommandKind::Remove => {
                self.remove_repo(&command.arg, now);
                Vec::new()
            }
            CommandKind::Save => {
                self.save_profile(&command.arg, now);
                Vec::new()
            }
            CommandKind::Load => self.load_profile(&command.arg, now),
            CommandKind::New => {
                self.config = Config::default();
                self.persist(now);
                self.grid.rebuild(&self.config.repos);
                Vec::new()
            }
            CommandKind::Refresh => self.refresh(now),
            CommandKind::Quit => {
                self.should_quit = true;
                Vec::new()
            }
            CommandKind::Unknown => {
                tracing::debug!(arg = %command.arg, "ignoring unknown command");
                Vec::new()
            }
        }
    }

    fn add_repo(&mut self, path: &str, now: Instant) -> Vec<Request> {
        if path.is_empty() {
            self.set_error("Usage: /add <path>", now);
            return Vec::new();
        }
        let target = self.add_target(path);
        let repo = match self.resolver.resolve(&target) {
            Ok(Some(repo)) => repo,
            Ok(None) => {
                self.set_error(format!("Not a GitHub repository: {path}"), now);
                return Vec::new();
            }
            Err(e) => {
                self.set_error(format!("Failed to resolve {path}: {e}"), now);
                return Vec::new();
            }
        };
        self.command.set_last_path(&repo.path);
        if !self.config.add_repo(repo.clone()) {
            tracing::debug!(repo = %repo.key(), "already tracked");
            return Vec::new();
        }
        tracing::info!(repo = %repo.key(), path = %repo.path, "repository added");
        self.persist(now);
        self.grid.rebuild(&self.config.repos);
        self.refresh(now)
    }

    /// Relative paths are taken from the browse root, the same directory path
    /// completion lists.
    fn add_target(&self, path: &str) -> String {
        if expand_home(path).is_absolute() {
            return path.to_string();
        }
        self.command
            .browse_root()
            .join(path)
            .to_string_lossy()
            .into_owned()
    }

    fn remove_repo(&mut self, key: &str, now: Instant) {
        let Some((owner, name)) = key.split_once('/') else {
            self.set_error("Usage: /remove <owner/name>", now);
            return;
        };
        if !self.config.remove_repo(owner, name) {
            self.set_error(format!("Not tracking {key}"), now);
            return;
        }
        tracing::info!(repo = %key, "repository removed");
        self.persist(now);
        self.grid.rebuild(&self.config.repos);
    }

    fn save_profile(&mut self, name: &str, now: Instant) {
        if let Err(e) = validate_profile_name(name) {
            self.set_error(e.to_string(), now);
            return;
        }
        let mut snapshot = self.config.clone();
        snapshot.profile_name = Some(name.to_string());
        if let Err(e) = self.store.save_profile(name, &snapshot) {
            self.set_error(format!("Failed to save profile '{name}': {e}"), now);
            return;
        }
        self.config.profile_name = Some(name.to_string());
        self.persist(now);
    }

    fn load_profile(&mut self, name: &str, now: Instant) -> Vec<Request> {
        if let Err(e) = validate_profile_name(name) {
            self.set_error(e.to_string(), now);
            return Vec::new();
        }
        let loaded = match self.store.load_profile(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                self.set_error(format!("{e}"), now);
                return Vec::new();
            }
        };
        tracing::info!(profile = name, repos = loaded.repos.len(), "profile loaded");
        self.config.repos = loaded.repos;
        self.config.profile_name = Some(name.to_string());
        self.persist(now);
        self.grid.rebuild(&self.config.repos);
        self.refresh(now)
    }

    /// Writes the current config; a failure is shown but the in-memory change stands.
    fn persist(&mut self, now: Instant) {
        if let Err(e) = self.store.save(&self.config) {
            self.set_error(format!("Failed to save config: {e}"), now);
        }
    }
}

/// Profile names become file names, so they must stay inside the profiles directory.
pub fn validate_profile_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(eyre!("Profile name required"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(eyre!("Profile name cannot contain path separators: {name}"));
    }
    if name.starts_with('.') {
        return Err(eyre!("Profile name cannot start with '.': {name}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_once_per_period() {
        let start = Instant::now();
        let mut timer = RefreshTimer::new(Duration::from_secs(30), start);
        assert!(!timer.poll(start + Duration::from_secs(29)));
        assert!(timer.poll(start + Duration::from_secs(30)));
        assert!(!timer.poll(start + Duration::from_secs(31)));
        assert!(timer.poll(start + Duration::from_secs(60)));
    }

    #[test]
    fn late_timer_does_not_stack() {
        let start = Instant::now();
        let mut timer = RefreshTimer::new(Duration::from_secs(30), start);
        let late = start + Duration::from_secs(95);
        assert!(timer.poll(late));
        assert!(!timer.poll(late));
        assert_eq!(timer.remaining(late), Duration::from_secs(30));
    }

    #[test]
    fn rearm_pushes_deadline_out() {
        let start = Instant::now();
        let mut timer = RefreshTimer::new(Duration::from_secs(30), start);
        timer.rearm(start + Duration::from_secs(20));
        assert!(!timer.poll(start + Duration::from_secs(30)));
        assert_eq!(
            timer.remaining(start + Duration::from_secs(30)),
            Duration::from_secs(20)
        );
    }

    #[test]
    fn profile_names_validated() {
        assert!(validate_profile_name("work").is_ok());
        assert!(validate_profile_name("side-projects_2").is_ok());
        assert!(validate_profile_name("").is_err());
        assert!(validate_profile_name("../etc").is_err());
        assert!(validate_profile_name("a\\b").is_err());
        assert!(validate_profile_name(".hidden").is_err());
    }
}
