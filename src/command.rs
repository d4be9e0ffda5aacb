//! The `/` command line: editing buffer, completion and parsing.

use crate::repo::{expand_home, parent_dir};
use crate::traits::RepoResolver;
use std::path::PathBuf;

pub const SIGIL: char = '/';
const MAX_SUGGESTIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Add,
    Remove,
    Save,
    Load,
    New,
    Refresh,
    Quit,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub arg: String,
}

impl Command {
    fn new(kind: CommandKind, arg: &str) -> Self {
        Self {
            kind,
            arg: arg.to_string(),
        }
    }
}

/// Known commands and the placeholder shown after those that take an argument.
const COMMANDS: [(&str, Option<&str>); 8] = [
    ("add", Some("<path>")),
    ("remove", Some("<repo>")),
    ("save", Some("<name>")),
    ("load", Some("<profile>")),
    ("new", None),
    ("refresh", None),
    ("quit", None),
    ("q", None),
];

/// Splits `/name arg` on the first space. The argument is trimmed.
pub fn parse_command(input: &str) -> Command {
    let body = input.strip_prefix(SIGIL).unwrap_or(input);
    let (name, arg) = body.split_once(' ').unwrap_or((body, ""));
    let arg = arg.trim();
    match name {
        "add" => Command::new(CommandKind::Add, arg),
        "remove" => Command::new(CommandKind::Remove, arg),
        "save" => Command::new(CommandKind::Save, arg),
        "load" => Command::new(CommandKind::Load, arg),
        "new" => Command::new(CommandKind::New, ""),
        "refresh" => Command::new(CommandKind::Refresh, ""),
        "quit" | "q" => Command::new(CommandKind::Quit, ""),
        _ => Command::new(CommandKind::Unknown, arg),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    Command {
        name: &'static str,
        placeholder: Option<&'static str>,
    },
    Directory {
        path: String,
        is_repo: bool,
    },
    Repo(String),
    Profile(String),
}

impl Suggestion {
    /// Text shown in the suggestion list, decoration included.
    pub fn label(&self) -> String {
        match self {
            Suggestion::Command {
                name,
                placeholder: Some(hint),
            } => format!("{SIGIL}{name} {hint}"),
            Suggestion::Command { name, .. } => format!("{SIGIL}{name}"),
            Suggestion::Directory { path, is_repo: true } => format!("{SIGIL}add {path} [repo]"),
            Suggestion::Directory { path, .. } => format!("{SIGIL}add {path}"),
            Suggestion::Repo(key) => format!("{SIGIL}remove {key}"),
            Suggestion::Profile(name) => format!("{SIGIL}load {name}"),
        }
    }

    /// Buffer contents after accepting this suggestion.
    pub fn completion(&self) -> String {
        match self {
            Suggestion::Command {
                name,
                placeholder: Some(_),
            } => format!("{SIGIL}{name} "),
            Suggestion::Command { name, .. } => format!("{SIGIL}{name}"),
            Suggestion::Directory { path, is_repo: true } => format!("{SIGIL}add {path}"),
            Suggestion::Directory { path, .. } => {
                format!("{SIGIL}add {}/", path.trim_end_matches('/'))
            }
            Suggestion::Repo(key) => format!("{SIGIL}remove {key}"),
            Suggestion::Profile(name) => format!("{SIGIL}load {name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKey {
    Char(char),
    Backspace,
    Tab,
    Prev,
    Next,
    Enter,
    Esc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Editing,
    Cancelled,
    Execute(Command),
}

/// Snapshot of what `/remove` and `/load` can complete against.
#[derive(Debug, Clone, Default)]
pub struct CompletionSources {
    pub repo_keys: Vec<String>,
    pub profiles: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CommandOverlay {
    input: String,
    suggestions: Vec<Suggestion>,
    cursor: usize,
    browsing: bool,
    last_path: Option<String>,
    sources: CompletionSources,
}

impl CommandOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the buffer with the sigil and takes a fresh completion snapshot.
    pub fn open(&mut self, sources: CompletionSources, resolver: &dyn RepoResolver) {
        self.sources = sources;
        self.input = SIGIL.to_string();
        self.refresh_suggestions(resolver);
    }

    pub fn close(&mut self) {
        self.input.clear();
        self.suggestions.clear();
        self.cursor = 0;
        self.browsing = false;
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    /// Highlighted suggestion, only while the list is being browsed.
    pub fn highlighted(&self) -> Option<usize> {
        (self.browsing && !self.suggestions.is_empty()).then_some(self.cursor)
    }

    /// Remembers the parent of an added repo as the next browse root.
    pub fn set_last_path(&mut self, path: &str) {
        self.last_path = parent_dir(path);
    }

    pub fn browse_root(&self) -> PathBuf {
        match &self.last_path {
            Some(p) => PathBuf::from(p),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    pub fn handle(&mut self, key: CommandKey, resolver: &dyn RepoResolver) -> CommandOutcome {
        match key {
            CommandKey::Char(c) => {
                self.input.push(c);
                self.refresh_suggestions(resolver);
            }
            CommandKey::Backspace => {
                if self.input.len() > SIGIL.len_utf8() {
                    self.input.pop();
                    self.refresh_suggestions(resolver);
                }
            }
            CommandKey::Tab => self.accept(resolver),
            CommandKey::Prev => {
                if !self.suggestions.is_empty() {
                    self.browsing = true;
                    self.cursor = self
                        .cursor
                        .checked_sub(1)
                        .unwrap_or(self.suggestions.len() - 1);
                }
            }
            CommandKey::Next => {
                if !self.suggestions.is_empty() {
                    self.browsing = true;
                    self.cursor = (self.cursor + 1) % self.suggestions.len();
                }
            }
            CommandKey::Enter => {
                if self.browsing && !self.suggestions.is_empty() {
                    self.accept(resolver);
                } else {
                    let command = parse_command(&self.input);
                    self.close();
                    return CommandOutcome::Execute(command);
                }
            }
            CommandKey::Esc => {
                self.close();
                return CommandOutcome::Cancelled;
            }
        }
        CommandOutcome::Editing
    }

    fn accept(&mut self, resolver: &dyn RepoResolver) {
        if let Some(s) = self.suggestions.get(self.cursor) {
            self.input = s.completion();
            self.refresh_suggestions(resolver);
        }
    }

    fn refresh_suggestions(&mut self, resolver: &dyn RepoResolver) {
        self.cursor = 0;
        self.browsing = false;
        let body = self.input.strip_prefix(SIGIL).unwrap_or(&self.input);
        self.suggestions = match body.split_once(' ') {
            None => COMMANDS
                .iter()
                .filter(|(name, _)| name.starts_with(body))
                .map(|&(name, placeholder)| Suggestion::Command { name, placeholder })
                .collect(),
            Some(("add", arg)) => self.complete_path(arg, resolver),
            Some(("remove", arg)) => {
                let needle = arg.to_lowercase();
                self.sources
                    .repo_keys
                    .iter()
                    .filter(|k| k.to_lowercase().contains(&needle))
                    .take(MAX_SUGGESTIONS)
                    .cloned()
                    .map(Suggestion::Repo)
                    .collect()
            }
            Some(("load", arg)) => {
                let needle = arg.to_lowercase();
                self.sources
                    .profiles
                    .iter()
                    .filter(|p| p.to_lowercase().starts_with(&needle))
                    .take(MAX_SUGGESTIONS)
                    .cloned()
                    .map(Suggestion::Profile)
                    .collect()
            }
            Some(_) => Vec::new(),
        };
    }

    /// Child directories of the directory `partial` points into, filtered by
    /// its last segment.
    fn complete_path(&self, partial: &str, resolver: &dyn RepoResolver) -> Vec<Suggestion> {
        let (dir, prefix) = if partial.is_empty() || partial.ends_with('/') {
            (partial, "")
        } else {
            match partial.rsplit_once('/') {
                Some(("", name)) => ("/", name),
                Some((dir, name)) => (dir, name),
                None => ("", partial),
            }
        };

        let root = self.browse_root();
        let base = if dir.is_empty() {
            root
        } else {
            let expanded = expand_home(dir);
            if expanded.is_absolute() {
                expanded
            } else {
                root.join(expanded)
            }
        };

        let entries = match std::fs::read_dir(&base) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %base.display(), error = %e, "path completion skipped");
                return Vec::new();
            }
        };
        let mut names: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.') && name.starts_with(prefix))
            .collect();
        names.sort();

        names
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|name| {
                let path = base.join(name).to_string_lossy().into_owned();
                let is_repo = resolver.is_repo(&path);
                Suggestion::Directory { path, is_repo }
            })
            .collect()
    }
}
