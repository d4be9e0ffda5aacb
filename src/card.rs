//! One repository's run list and its run → job drill-down.

use crate::model::{
    format_duration, format_time_ago, truncate, Job, RepoRef, RunStatus, WorkflowRun,
};
use chrono::{DateTime, Utc};
use unicode_width::UnicodeWidthStr;

/// Rows taken by the border, repo line, status line and divider.
pub const HEADER_ALLOWANCE: usize = 5;
/// Extra rows the run-detail view spends on the run header and job label.
const DETAIL_HEADER_ROWS: usize = 3;
const MIN_LAYOUT_WIDTH: usize = 20;
const MIN_NAME_WIDTH: usize = 10;
const HEADER_BRANCH_WIDTH: usize = 15;
const ROW_BRANCH_WIDTH: usize = 12;

/// Cursor and scroll offset into the run list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCursor {
    pub cursor: usize,
    pub scroll: usize,
}

impl RunCursor {
    fn step(&mut self, down: bool, len: usize, window: usize) {
        if down {
            if self.cursor + 1 < len {
                self.cursor += 1;
            }
        } else {
            self.cursor = self.cursor.saturating_sub(1);
        }
        self.keep_visible(window);
    }

    /// Restores `scroll <= cursor < scroll + window`.
    fn keep_visible(&mut self, window: usize) {
        let window = window.max(1);
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + window {
            self.scroll = self.cursor + 1 - window;
        }
    }

    fn clamp(&mut self, len: usize, window: usize) {
        self.cursor = self.cursor.min(len.saturating_sub(1));
        self.keep_visible(window);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobsState {
    Loading,
    Loaded(Vec<Job>),
    Failed(String),
}

impl JobsState {
    fn len(&self) -> usize {
        match self {
            JobsState::Loaded(jobs) => jobs.len(),
            JobsState::Loading | JobsState::Failed(_) => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunDetail {
    pub run: WorkflowRun,
    pub jobs: JobsState,
    pub cursor: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CardState {
    Normal,
    Selected,
    Focused(RunCursor),
    RunDetail(RunCursor, RunDetail),
}

/// Border treatment chosen by the painter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Normal,
    Selected,
    Focused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    Up,
    Down,
    Confirm,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardOutcome {
    /// The card did not use the input; the grid may act on it.
    Ignored,
    Consumed,
    /// Entered run detail; the caller must fetch jobs for this run id.
    FetchJobs(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Plain,
    Highlight,
    Heading,
    Dim,
    Error,
    Loading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLine {
    pub status: Option<RunStatus>,
    pub text: String,
    pub style: LineStyle,
}

impl CardLine {
    fn message(text: impl Into<String>, style: LineStyle) -> Self {
        Self {
            status: None,
            text: text.into(),
            style,
        }
    }
}

/// Everything the painter needs, already truncated to the card's size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub title: String,
    pub status: Option<RunStatus>,
    pub branch: String,
    pub emphasis: Emphasis,
    pub lines: Vec<CardLine>,
    pub scroll_indicator: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Card {
    pub repo: RepoRef,
    runs: Vec<WorkflowRun>,
    runs_error: Option<String>,
    loaded: bool,
    state: CardState,
    width: usize,
    height: usize,
}

impl Card {
    pub fn new(repo: RepoRef) -> Self {
        Self {
            repo,
            runs: Vec::new(),
            runs_error: None,
            loaded: false,
            state: CardState::Normal,
            width: 0,
            height: 0,
        }
    }

    pub fn state(&self) -> &CardState {
        &self.state
    }

    pub fn runs(&self) -> &[WorkflowRun] {
        &self.runs
    }

    pub fn runs_error(&self) -> Option<&str> {
        self.runs_error.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn in_run_detail(&self) -> bool {
        matches!(self.state, CardState::RunDetail(..))
    }

    pub fn emphasis(&self) -> Emphasis {
        match self.state {
            CardState::Normal => Emphasis::Normal,
            CardState::Selected => Emphasis::Selected,
            CardState::Focused(_) | CardState::RunDetail(..) => Emphasis::Focused,
        }
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        let window = self.visible_run_count();
        if let CardState::Focused(rc) | CardState::RunDetail(rc, _) = &mut self.state {
            rc.keep_visible(window);
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Rows available to the run list; never less than one.
    pub fn visible_run_count(&self) -> usize {
        self.height.saturating_sub(HEADER_ALLOWANCE).max(1)
    }

    fn visible_job_count(&self) -> usize {
        self.height
            .saturating_sub(HEADER_ALLOWANCE + DETAIL_HEADER_ROWS)
            .max(1)
    }

    pub fn select(&mut self) {
        self.state = CardState::Selected;
    }

    pub fn deselect(&mut self) {
        self.state = CardState::Normal;
    }

    /// Starts browsing the run list from the top.
    pub fn focus(&mut self) {
        self.state = CardState::Focused(RunCursor::default());
    }

    /// Drops any run list or drill-down position; the card stays selected.
    pub fn unfocus(&mut self) {
        self.state = CardState::Selected;
    }

    pub fn handle(&mut self, action: CardAction) -> CardOutcome {
        let window = self.visible_run_count();
        let run_count = self.runs.len();
        match &mut self.state {
            CardState::Normal | CardState::Selected => CardOutcome::Ignored,
            CardState::Focused(rc) => match action {
                CardAction::Down => {
                    rc.step(true, run_count, window);
                    CardOutcome::Consumed
                }
                CardAction::Up => {
                    rc.step(false, run_count, window);
                    CardOutcome::Consumed
                }
                CardAction::Confirm => {
                    let rc = *rc;
                    let Some(run) = self.runs.get(rc.cursor) else {
                        return CardOutcome::Consumed;
                    };
                    let run_id = run.id;
                    tracing::debug!(repo = %self.repo.key(), run_id, "opening run detail");
                    self.state = CardState::RunDetail(
                        rc,
                        RunDetail {
                            run: run.clone(),
                            jobs: JobsState::Loading,
                            cursor: 0,
                        },
                    );
                    CardOutcome::FetchJobs(run_id)
                }
                CardAction::Cancel => CardOutcome::Ignored,
            },
            CardState::RunDetail(rc, detail) => {
                match action {
                    CardAction::Down => {
                        if detail.cursor + 1 < detail.jobs.len() {
                            detail.cursor += 1;
                        }
                    }
                    CardAction::Up => detail.cursor = detail.cursor.saturating_sub(1),
                    CardAction::Cancel => {
                        let rc = *rc;
                        self.state = CardState::Focused(rc);
                    }
                    CardAction::Confirm => {}
                }
                CardOutcome::Consumed
            }
        }
    }

    /// Replaces the run list with a fetch outcome; errors clear the list.
    pub fn apply_runs(&mut self, result: Result<Vec<WorkflowRun>, String>) {
        match result {
            Ok(runs) => {
                self.runs = runs;
                self.runs_error = None;
            }
            Err(e) => {
                self.runs.clear();
                self.runs_error = Some(e);
            }
        }
        self.loaded = true;
        let window = self.visible_run_count();
        let len = self.runs.len();
        if let CardState::Focused(rc) | CardState::RunDetail(rc, _) = &mut self.state {
            rc.clamp(len, window);
        }
    }

    /// Keeps fetched runs from a previous incarnation of this card.
    pub fn adopt_runs_from(&mut self, other: &Card) {
        self.runs.clone_from(&other.runs);
        self.runs_error.clone_from(&other.runs_error);
        self.loaded = other.loaded;
    }

    /// Returns `false` when the result no longer matches the open run detail.
    pub fn apply_jobs(&mut self, run_id: u64, result: Result<Vec<Job>, String>) -> bool {
        let CardState::RunDetail(_, detail) = &mut self.state else {
            return false;
        };
        if detail.run.id != run_id {
            return false;
        }
        detail.jobs = match result {
            Ok(jobs) => JobsState::Loaded(jobs),
            Err(e) => JobsState::Failed(e),
        };
        detail.cursor = detail.cursor.min(detail.jobs.len().saturating_sub(1));
        true
    }

    pub fn latest_status(&self) -> Option<RunStatus> {
        self.runs.first().map(WorkflowRun::run_status)
    }

    pub fn view(&self, now: DateTime<Utc>) -> CardView {
        let width = self.width.max(MIN_LAYOUT_WIDTH);
        let title = truncate(
            &self.repo.key(),
            width.saturating_sub(4).max(MIN_NAME_WIDTH),
        );
        let branch = self
            .runs
            .first()
            .map(|r| truncate(&r.head_branch, HEADER_BRANCH_WIDTH))
            .unwrap_or_default();

        let (lines, scroll_indicator) = match &self.state {
            CardState::RunDetail(_, detail) => self.detail_lines(detail, width, now),
            CardState::Focused(rc) => self.run_lines(*rc, true, width, now),
            CardState::Normal | CardState::Selected => {
                self.run_lines(RunCursor::default(), false, width, now)
            }
        };

        CardView {
            title,
            status: self.latest_status(),
            branch,
            emphasis: self.emphasis(),
            lines,
            scroll_indicator,
        }
    }

    fn run_lines(
        &self,
        rc: RunCursor,
        focused: bool,
        width: usize,
        now: DateTime<Utc>,
    ) -> (Vec<CardLine>, Option<String>) {
        if let Some(err) = &self.runs_error {
            let lines = vec![
                CardLine::message("Error loading", LineStyle::Error),
                CardLine::message(truncate(err, width.saturating_sub(4)), LineStyle::Dim),
            ];
            return (lines, None);
        }
        if !self.loaded {
            return (vec![CardLine::message("Loading…", LineStyle::Loading)], None);
        }
        if self.runs.is_empty() {
            return (vec![CardLine::message("No runs", LineStyle::Dim)], None);
        }

        let window = self.visible_run_count();
        let lines = self
            .runs
            .iter()
            .enumerate()
            .skip(rc.scroll)
            .take(window)
            .map(|(i, run)| {
                let selected = focused && i == rc.cursor;
                CardLine {
                    status: Some(run.run_status()),
                    text: run_row_text(run, width, now),
                    style: if selected {
                        LineStyle::Highlight
                    } else {
                        LineStyle::Plain
                    },
                }
            })
            .collect();
        let indicator = (self.runs.len() > window)
            .then(|| format!("({}/{})", rc.cursor + 1, self.runs.len()));
        (lines, indicator)
    }

    fn detail_lines(
        &self,
        detail: &RunDetail,
        width: usize,
        now: DateTime<Utc>,
    ) -> (Vec<CardLine>, Option<String>) {
        let run = &detail.run;
        let mut lines = vec![
            CardLine {
                status: Some(run.run_status()),
                text: truncate(
                    &format!("#{} {}", run.run_number, run.display_name()),
                    width.saturating_sub(6),
                ),
                style: LineStyle::Heading,
            },
            CardLine::message(
                truncate(
                    &format!("{} · {}", run.head_branch, format_time_ago(run.created_at, now)),
                    width.saturating_sub(4),
                ),
                LineStyle::Dim,
            ),
            CardLine::message("Jobs:", LineStyle::Dim),
        ];

        let mut indicator = None;
        match &detail.jobs {
            JobsState::Loading => lines.push(CardLine::message("Loading…", LineStyle::Loading)),
            JobsState::Failed(err) => {
                lines.push(CardLine::message("Error loading jobs", LineStyle::Error));
                lines.push(CardLine::message(
                    truncate(err, width.saturating_sub(4)),
                    LineStyle::Dim,
                ));
            }
            JobsState::Loaded(jobs) if jobs.is_empty() => {
                lines.push(CardLine::message("No jobs", LineStyle::Dim));
            }
            JobsState::Loaded(jobs) => {
                let window = self.visible_job_count();
                let offset = (detail.cursor + 1).saturating_sub(window);
                let name_max = width.saturating_sub(20).max(MIN_NAME_WIDTH);
                lines.extend(jobs.iter().enumerate().skip(offset).take(window).map(
                    |(i, job)| {
                        let duration = job.duration().map(format_duration).unwrap_or_default();
                        CardLine {
                            status: Some(job.job_status()),
                            text: format!("{} {duration}", truncate(&job.name, name_max))
                                .trim_end()
                                .to_string(),
                            style: if i == detail.cursor {
                                LineStyle::Highlight
                            } else {
                                LineStyle::Plain
                            },
                        }
                    },
                ));
                if jobs.len() > window {
                    indicator = Some(format!("({}/{})", detail.cursor + 1, jobs.len()));
                }
            }
        }
        (lines, indicator)
    }
}

/// `#123 Name (branch) 2m`, with the name shrunk to what the card can hold.
fn run_row_text(run: &WorkflowRun, width: usize, now: DateTime<Utc>) -> String {
    let branch = truncate(&run.head_branch, ROW_BRANCH_WIDTH);
    let name_max = width
        .saturating_sub(30 + UnicodeWidthStr::width(branch.as_str()))
        .max(6);
    format!(
        "#{} {} ({}) {}",
        run.run_number,
        truncate(run.display_name(), name_max),
        branch,
        format_time_ago(run.created_at, now)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn run(id: u64) -> WorkflowRun {
        WorkflowRun {
            id,
            name: format!("wf-{id}"),
            workflow_name: String::new(),
            head_branch: "main".into(),
            run_number: id,
            status: "completed".into(),
            conclusion: Some("success".into()),
            created_at: now() - chrono::Duration::minutes(5),
        }
    }

    fn job(id: u64) -> Job {
        Job {
            id,
            name: format!("job-{id}"),
            status: "completed".into(),
            conclusion: Some("failure".into()),
            started_at: Some(now() - chrono::Duration::seconds(90)),
            completed_at: Some(now()),
        }
    }

    fn card_with_runs(n: u64, height: usize) -> Card {
        let mut card = Card::new(RepoRef::new("/src/cat", "octo", "cat"));
        card.set_size(40, height);
        card.apply_runs(Ok((1..=n).map(run).collect()));
        card
    }

    fn run_cursor(card: &Card) -> RunCursor {
        match card.state() {
            CardState::Focused(rc) | CardState::RunDetail(rc, _) => *rc,
            other => panic!("card not focused: {other:?}"),
        }
    }

    #[test]
    fn focus_starts_at_top() {
        let mut card = card_with_runs(5, 7);
        card.focus();
        card.handle(CardAction::Down);
        card.handle(CardAction::Down);
        card.unfocus();
        card.focus();
        assert_eq!(run_cursor(&card), RunCursor::default());
    }

    #[test]
    fn run_cursor_clamps_at_both_ends() {
        let mut card = card_with_runs(3, 20);
        card.focus();
        card.handle(CardAction::Up);
        assert_eq!(run_cursor(&card).cursor, 0);
        for _ in 0..10 {
            card.handle(CardAction::Down);
        }
        assert_eq!(run_cursor(&card).cursor, 2);
    }

    #[test]
    fn scroll_window_tracks_cursor_for_every_window_size() {
        for height in 0..12 {
            let mut card = card_with_runs(9, height);
            card.focus();
            let window = card.visible_run_count();
            let moves = [CardAction::Down; 12]
                .into_iter()
                .chain([CardAction::Up; 5])
                .chain([CardAction::Down; 2])
                .chain([CardAction::Up; 12]);
            for action in moves {
                card.handle(action);
                let rc = run_cursor(&card);
                assert!(
                    rc.scroll <= rc.cursor && rc.cursor < rc.scroll + window,
                    "height {height}: {rc:?} window {window}"
                );
            }
        }
    }

    #[test]
    fn visible_window_is_at_least_one_row() {
        let card = card_with_runs(1, 2);
        assert_eq!(card.visible_run_count(), 1);
    }

    #[test]
    fn confirm_opens_detail_and_requests_jobs() {
        let mut card = card_with_runs(3, 20);
        card.focus();
        card.handle(CardAction::Down);
        assert_eq!(card.handle(CardAction::Confirm), CardOutcome::FetchJobs(2));
        match card.state() {
            CardState::RunDetail(_, detail) => {
                assert_eq!(detail.run.id, 2);
                assert_eq!(detail.jobs, JobsState::Loading);
                assert_eq!(detail.cursor, 0);
            }
            other => panic!("expected run detail, got {other:?}"),
        }
    }

    #[test]
    fn confirm_without_runs_stays_focused() {
        let mut card = card_with_runs(0, 20);
        card.focus();
        assert_eq!(card.handle(CardAction::Confirm), CardOutcome::Consumed);
        assert!(matches!(card.state(), CardState::Focused(_)));
    }

    #[test]
    fn cancel_from_detail_returns_to_same_run_position() {
        let mut card = card_with_runs(4, 20);
        card.focus();
        card.handle(CardAction::Down);
        card.handle(CardAction::Down);
        card.handle(CardAction::Confirm);
        assert!(card.apply_jobs(3, Ok(vec![job(1), job(2), job(3)])));
        card.handle(CardAction::Down);
        card.handle(CardAction::Down);
        card.handle(CardAction::Up);

        assert_eq!(card.handle(CardAction::Cancel), CardOutcome::Consumed);
        assert_eq!(card.state(), &CardState::Focused(RunCursor { cursor: 2, scroll: 0 }));
    }

    #[test]
    fn cancel_while_focused_is_left_to_the_grid() {
        let mut card = card_with_runs(2, 20);
        card.focus();
        assert_eq!(card.handle(CardAction::Cancel), CardOutcome::Ignored);
    }

    #[test]
    fn idle_card_ignores_input() {
        let mut card = card_with_runs(2, 20);
        card.select();
        assert_eq!(card.handle(CardAction::Down), CardOutcome::Ignored);
        assert_eq!(card.state(), &CardState::Selected);
    }

    #[test]
    fn job_cursor_clamps() {
        let mut card = card_with_runs(1, 20);
        card.focus();
        card.handle(CardAction::Confirm);
        card.handle(CardAction::Down);
        card.apply_jobs(1, Ok(vec![job(1), job(2)]));
        for _ in 0..5 {
            card.handle(CardAction::Down);
        }
        let CardState::RunDetail(_, detail) = card.state() else {
            panic!("expected run detail");
        };
        assert_eq!(detail.cursor, 1);
    }

    #[test]
    fn jobs_for_another_run_are_ignored() {
        let mut card = card_with_runs(2, 20);
        card.focus();
        card.handle(CardAction::Confirm);
        assert!(!card.apply_jobs(2, Ok(vec![job(1)])));
        card.handle(CardAction::Cancel);
        assert!(!card.apply_jobs(1, Ok(vec![job(1)])));
        assert!(matches!(card.state(), CardState::Focused(_)));
    }

    #[test]
    fn job_fetch_error_is_rendered() {
        let mut card = card_with_runs(1, 20);
        card.focus();
        card.handle(CardAction::Confirm);
        card.apply_jobs(1, Err("boom".into()));
        let view = card.view(now());
        assert!(view.lines.iter().any(|l| l.text == "Error loading jobs"));
        assert!(view.lines.iter().any(|l| l.text == "boom"));
    }

    #[test]
    fn shrinking_run_list_clamps_cursor() {
        let mut card = card_with_runs(5, 20);
        card.focus();
        for _ in 0..4 {
            card.handle(CardAction::Down);
        }
        card.apply_runs(Ok(vec![run(1), run(2)]));
        assert_eq!(run_cursor(&card).cursor, 1);
    }

    #[test]
    fn run_fetch_error_clears_runs() {
        let mut card = card_with_runs(3, 20);
        card.apply_runs(Err("gh api failed".into()));
        assert!(card.runs().is_empty());
        assert_eq!(card.runs_error(), Some("gh api failed"));
        assert_eq!(card.view(now()).lines[0].text, "Error loading");
    }

    #[test]
    fn view_before_first_fetch_says_loading() {
        let card = Card::new(RepoRef::new("/x", "octo", "cat"));
        let view = card.view(now());
        assert_eq!(view.lines, vec![CardLine::message("Loading…", LineStyle::Loading)]);
        assert_eq!(view.status, None);
    }

    #[test]
    fn view_empty_runs_and_empty_jobs() {
        let mut card = card_with_runs(0, 20);
        assert_eq!(card.view(now()).lines[0].text, "No runs");

        card.apply_runs(Ok(vec![run(1)]));
        card.focus();
        card.handle(CardAction::Confirm);
        assert!(card.view(now()).lines.iter().any(|l| l.style == LineStyle::Loading));
        card.apply_jobs(1, Ok(Vec::new()));
        assert!(card.view(now()).lines.iter().any(|l| l.text == "No jobs"));
    }

    #[test]
    fn view_run_rows_and_header() {
        let mut card = card_with_runs(2, 20);
        card.focus();
        let view = card.view(now());
        assert_eq!(view.title, "octo/cat");
        assert_eq!(view.branch, "main");
        assert_eq!(view.status, Some(RunStatus::Success));
        assert_eq!(view.emphasis, Emphasis::Focused);
        assert_eq!(view.lines[0].text, "#1 wf-1 (main) 5m");
        assert_eq!(view.lines[0].style, LineStyle::Highlight);
        assert_eq!(view.lines[1].style, LineStyle::Plain);
        assert_eq!(view.scroll_indicator, None);
    }

    #[test]
    fn scroll_indicator_only_when_list_overflows() {
        let mut card = card_with_runs(5, 7); // window of 2
        card.focus();
        card.handle(CardAction::Down);
        card.handle(CardAction::Down);
        let view = card.view(now());
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.lines[1].text, "#3 wf-3 (main) 5m");
        assert_eq!(view.scroll_indicator.as_deref(), Some("(3/5)"));
    }

    #[test]
    fn long_repo_name_keeps_ten_visible_columns() {
        let mut card = Card::new(RepoRef::new("/x", "an-organisation", "a-very-long-repo"));
        card.set_size(8, 10);
        let title = card.view(now()).title;
        assert_eq!(UnicodeWidthStr::width(title.as_str()), 16);
        assert!(title.ends_with('…'));
    }

    #[test]
    fn job_rows_show_duration() {
        let mut card = card_with_runs(1, 20);
        card.focus();
        card.handle(CardAction::Confirm);
        card.apply_jobs(1, Ok(vec![job(7)]));
        let view = card.view(now());
        let row = view.lines.last().unwrap();
        assert_eq!(row.text, "job-7 1m30s");
        assert_eq!(row.status, Some(RunStatus::Failure));
        assert_eq!(row.style, LineStyle::Highlight);
    }

    #[test]
    fn adopt_runs_keeps_fetched_data() {
        let old = card_with_runs(2, 20);
        let mut fresh = Card::new(old.repo.clone());
        fresh.adopt_runs_from(&old);
        assert!(fresh.is_loaded());
        assert_eq!(fresh.runs().len(), 2);
        assert_eq!(fresh.state(), &CardState::Normal);
    }
}
