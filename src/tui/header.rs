use crate::dashboard::Dashboard;
use crate::tui::spinner;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use std::time::Instant;

pub fn render(f: &mut Frame, area: Rect, dash: &Dashboard, now: Instant) {
    let mut spans = vec![
        Span::styled(
            format!(
                " ghd v{}+{} ",
                env!("CARGO_PKG_VERSION"),
                env!("BUILD_NUMBER")
            ),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
    ];

    if let Some(profile) = &dash.config().profile_name {
        spans.push(Span::styled(
            format!("[{profile}] "),
            Style::default().fg(Color::Magenta),
        ));
    }

    let count = dash.config().repos.len();
    spans.push(Span::styled(
        format!("{count} repo{}", if count == 1 { "" } else { "s" }),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ));

    // Spinner while fetches are in flight, otherwise the refresh countdown
    if dash.is_loading() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("{}", spinner::frame(dash.spinner_frame())),
            Style::default().fg(Color::Yellow),
        ));
    } else {
        let secs = dash.refresh_remaining(now).as_secs();
        spans.push(Span::styled(
            format!(" {secs}s"),
            Style::default().fg(Color::DarkGray),
        ));
    }

    if dash.error_message().is_some() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            "!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(header, area);
}
