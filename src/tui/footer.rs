use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::dashboard::{Dashboard, Mode};
use crate::grid::GridState;

const NARROW_WIDTH_THRESHOLD: u16 = 60;

fn hints(dash: &Dashboard, narrow: bool) -> &'static [(&'static str, &'static str)] {
    match (dash.mode(), dash.grid().state()) {
        (Mode::Command, _) => &[
            ("Tab", "complete"),
            ("↑↓", "select"),
            ("Enter", "run"),
            ("Esc", "cancel"),
        ],
        (Mode::Grid, GridState::CardFocused) if dash.grid().in_run_detail() => {
            &[("↑↓/jk", "jobs"), ("Esc", "back")]
        }
        (Mode::Grid, GridState::CardFocused) => &[
            ("↑↓/jk", "runs"),
            ("Enter", "jobs"),
            ("Esc", "back"),
        ],
        (Mode::Grid, GridState::Navigating) if narrow => &[
            ("hjkl", "move"),
            ("⏎", "open"),
            ("/", "cmd"),
            ("q", "quit"),
        ],
        (Mode::Grid, GridState::Navigating) => &[
            ("←↓↑→/hjkl", "navigate"),
            ("Enter", "focus"),
            ("/", "command"),
            ("r", "refresh"),
            ("q", "quit"),
        ],
    }
}

pub fn render(f: &mut Frame, area: Rect, dash: &Dashboard) {
    let narrow = area.width < NARROW_WIDTH_THRESHOLD;

    let mut spans: Vec<Span> = Vec::new();
    for (i, (key, desc)) in hints(dash, narrow).iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(
            format!(" {desc}"),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let footer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}
