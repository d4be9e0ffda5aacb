use crate::command::CommandOverlay;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::Frame;

const MAX_VISIBLE_SUGGESTIONS: usize = 5;
const PLACEHOLDER: &str = "Type / to enter a command";

/// Input line for the command bar. Inactive bars show a hint instead.
pub fn render(f: &mut Frame, area: Rect, overlay: &CommandOverlay, active: bool) {
    let (line, border_color) = if active {
        (
            Line::from(vec![
                Span::styled("> ", Style::default().fg(Color::Cyan)),
                Span::raw(overlay.input().to_owned()),
                Span::styled("█", Style::default().fg(Color::Cyan)),
            ]),
            Color::Cyan,
        )
    } else {
        (
            Line::from(Span::styled(
                format!("> {PLACEHOLDER}"),
                Style::default().fg(Color::DarkGray),
            )),
            Color::DarkGray,
        )
    };

    let bar = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color)),
    );
    f.render_widget(bar, area);

    if active {
        render_suggestions(f, area, overlay);
    }
}

/// Rows the popup needs: shown suggestions, the overflow marker and borders.
fn popup_height(total: usize) -> u16 {
    let shown = total.min(MAX_VISIBLE_SUGGESTIONS);
    let overflow = usize::from(total > MAX_VISIBLE_SUGGESTIONS);
    (shown + overflow + 2) as u16
}

/// First suggestion shown so that the highlighted one stays on screen.
fn window_start(highlighted: Option<usize>) -> usize {
    highlighted.map_or(0, |h| (h + 1).saturating_sub(MAX_VISIBLE_SUGGESTIONS))
}

fn render_suggestions(f: &mut Frame, bar: Rect, overlay: &CommandOverlay) {
    let suggestions = overlay.suggestions();
    if suggestions.is_empty() {
        return;
    }

    let height = popup_height(suggestions.len()).min(bar.y);
    if height < 3 {
        return;
    }
    let area = Rect::new(bar.x, bar.y - height, bar.width, height);

    let highlighted = overlay.highlighted();
    let start = window_start(highlighted);
    let mut lines: Vec<Line> = suggestions
        .iter()
        .enumerate()
        .skip(start)
        .take(MAX_VISIBLE_SUGGESTIONS)
        .map(|(i, s)| {
            let style = if Some(i) == highlighted {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(s.label(), style))
        })
        .collect();
    if suggestions.len() > MAX_VISIBLE_SUGGESTIONS {
        lines.push(Line::from(Span::styled(
            "…",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let popup = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_caps_rows_and_adds_overflow_marker() {
        assert_eq!(popup_height(2), 4);
        assert_eq!(popup_height(5), 7);
        assert_eq!(popup_height(10), 8);
    }

    #[test]
    fn window_follows_highlight() {
        assert_eq!(window_start(None), 0);
        assert_eq!(window_start(Some(3)), 0);
        assert_eq!(window_start(Some(7)), 3);
    }
}
