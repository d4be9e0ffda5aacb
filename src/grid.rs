//! Fixed-column arrangement of cards with one navigation cursor.

use crate::card::{Card, CardAction, CardOutcome, CardState};
use crate::dashboard::Request;
use crate::model::{Job, RepoRef, WorkflowRun};
use std::ops::Range;

pub const COLUMNS: usize = 3;
/// Shortest card the grid will lay out before it starts scrolling rows.
pub const MIN_CARD_HEIGHT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridState {
    Navigating,
    CardFocused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAction {
    Left,
    Right,
    Up,
    Down,
    Confirm,
    Cancel,
}

#[derive(Debug, Clone)]
pub struct Grid {
    cards: Vec<Card>,
    cursor: Option<usize>,
    state: GridState,
    width: usize,
    height: usize,
    scroll_row: usize,
}

impl Grid {
    pub fn new(repos: &[RepoRef]) -> Self {
        let mut grid = Self {
            cards: Vec::new(),
            cursor: None,
            state: GridState::Navigating,
            width: 0,
            height: 0,
            scroll_row: 0,
        };
        grid.rebuild(repos);
        grid
    }

    /// Replaces the card list. Cards for repos that survive keep their fetched runs.
    pub fn rebuild(&mut self, repos: &[RepoRef]) {
        let old = std::mem::take(&mut self.cards);
        self.cards = repos
            .iter()
            .map(|repo| {
                let mut card = Card::new(repo.clone());
                if let Some(prev) = old.iter().find(|c| c.repo.same_repo(repo)) {
                    card.adopt_runs_from(prev);
                }
                card
            })
            .collect();
        self.state = GridState::Navigating;
        self.scroll_row = 0;
        self.cursor = if self.cards.is_empty() { None } else { Some(0) };
        if let Some(card) = self.cards.first_mut() {
            card.select();
        }
        tracing::debug!(cards = self.cards.len(), "grid rebuilt");
        self.set_size(self.width, self.height);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn state(&self) -> GridState {
        self.state
    }

    pub fn selected_card(&self) -> Option<&Card> {
        self.cursor.and_then(|i| self.cards.get(i))
    }

    fn max_row(&self) -> usize {
        self.cards.len().saturating_sub(1) / COLUMNS
    }

    pub fn rows(&self) -> usize {
        self.cards.len().div_ceil(COLUMNS)
    }

    pub fn move_cursor(&mut self, dx: isize, dy: isize) {
        let Some(current) = self.cursor else {
            return;
        };
        let col = (current % COLUMNS).saturating_add_signed(dx).min(COLUMNS - 1);
        let row = (current / COLUMNS).saturating_add_signed(dy).min(self.max_row());
        let next = (row * COLUMNS + col).min(self.cards.len() - 1);
        if next == current {
            return;
        }
        self.cards[current].deselect();
        self.cards[next].select();
        self.cursor = Some(next);
        self.keep_cursor_visible();
    }

    pub fn confirm(&mut self) {
        if self.state != GridState::Navigating {
            return;
        }
        let Some(card) = self.cursor.and_then(|i| self.cards.get_mut(i)) else {
            return;
        };
        card.focus();
        self.state = GridState::CardFocused;
    }

    pub fn cancel(&mut self) {
        if self.state != GridState::CardFocused {
            return;
        }
        if let Some(card) = self.cursor.and_then(|i| self.cards.get_mut(i)) {
            card.unfocus();
        }
        self.state = GridState::Navigating;
    }

    /// Routes one input: cursor movement while navigating, otherwise the focused
    /// card first. Returns a job fetch when the card opened a run.
    pub fn handle(&mut self, action: GridAction) -> Option<Request> {
        match self.state {
            GridState::Navigating => {
                match action {
                    GridAction::Left => self.move_cursor(-1, 0),
                    GridAction::Right => self.move_cursor(1, 0),
                    GridAction::Up => self.move_cursor(0, -1),
                    GridAction::Down => self.move_cursor(0, 1),
                    GridAction::Confirm => self.confirm(),
                    GridAction::Cancel => {}
                }
                None
            }
            GridState::CardFocused => {
                let index = self.cursor?;
                let card_action = match action {
                    GridAction::Up => CardAction::Up,
                    GridAction::Down => CardAction::Down,
                    GridAction::Confirm => CardAction::Confirm,
                    GridAction::Cancel => CardAction::Cancel,
                    GridAction::Left | GridAction::Right => return None,
                };
                let card = self.cards.get_mut(index)?;
                match card.handle(card_action) {
                    CardOutcome::FetchJobs(run_id) => Some(Request::FetchJobs {
                        index,
                        repo: card.repo.clone(),
                        run_id,
                    }),
                    CardOutcome::Ignored if action == GridAction::Cancel => {
                        self.cancel();
                        None
                    }
                    CardOutcome::Ignored | CardOutcome::Consumed => None,
                }
            }
        }
    }

    /// One run-list fetch per card, tagged with its index.
    pub fn refresh_all(&self, limit: usize) -> Vec<Request> {
        self.cards
            .iter()
            .enumerate()
            .map(|(index, card)| Request::FetchRuns {
                index,
                repo: card.repo.clone(),
                limit,
            })
            .collect()
    }

    /// Returns `false` when the result is stale and was dropped.
    pub fn apply_runs(
        &mut self,
        index: usize,
        repo_key: &str,
        result: Result<Vec<WorkflowRun>, String>,
    ) -> bool {
        match self.cards.get_mut(index) {
            Some(card) if card.repo.key() == repo_key => {
                card.apply_runs(result);
                true
            }
            _ => {
                tracing::debug!(index, repo_key, "dropping stale run result");
                false
            }
        }
    }

    pub fn apply_jobs(&mut self, index: usize, run_id: u64, result: Result<Vec<Job>, String>) -> bool {
        let applied = self
            .cards
            .get_mut(index)
            .is_some_and(|card| card.apply_jobs(run_id, result));
        if !applied {
            tracing::debug!(index, run_id, "dropping stale job result");
        }
        applied
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let card_width = width / COLUMNS;
        let card_height = height / self.visible_rows();
        for card in &mut self.cards {
            card.set_size(card_width, card_height);
        }
        self.keep_cursor_visible();
    }

    /// Card rows that fit on screen at once; at least one.
    pub fn visible_rows(&self) -> usize {
        self.rows().min(self.height / MIN_CARD_HEIGHT).max(1)
    }

    pub fn scroll_row(&self) -> usize {
        self.scroll_row
    }

    /// Indices of the cards currently on screen.
    pub fn visible_range(&self) -> Range<usize> {
        let start = (self.scroll_row * COLUMNS).min(self.cards.len());
        let end = (start + self.visible_rows() * COLUMNS).min(self.cards.len());
        start..end
    }

    fn keep_cursor_visible(&mut self) {
        let Some(cursor) = self.cursor else {
            self.scroll_row = 0;
            return;
        };
        let row = cursor / COLUMNS;
        let window = self.visible_rows();
        if row < self.scroll_row {
            self.scroll_row = row;
        } else if row >= self.scroll_row + window {
            self.scroll_row = row + 1 - window;
        }
    }

    /// True while the focused card is showing a run's jobs.
    pub fn in_run_detail(&self) -> bool {
        self.selected_card()
            .is_some_and(|c| matches!(c.state(), CardState::RunDetail(..)))
    }
}
