use crate::card::{CardLine, CardView, Emphasis, LineStyle};
use crate::grid::{Grid, COLUMNS};
use crate::model::{status_icon, RunStatus};
use chrono::{DateTime, Utc};
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;

const EMPTY_STATE: &str = "No repositories added. Type /add to add one.";

pub fn status_color(status: RunStatus) -> Color {
    match status {
        RunStatus::Success => Color::Green,
        RunStatus::Failure => Color::Red,
        RunStatus::InProgress => Color::Yellow,
        RunStatus::Pending => Color::Blue,
        RunStatus::Cancelled | RunStatus::Unknown => Color::DarkGray,
    }
}

pub fn render(f: &mut Frame, area: Rect, grid: &Grid, now: DateTime<Utc>) {
    if grid.is_empty() {
        let y = area.y + area.height / 2;
        let line_area = Rect::new(area.x, y.min(area.bottom().saturating_sub(1)), area.width, 1);
        let empty = Paragraph::new(EMPTY_STATE)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(empty, line_area);
        return;
    }

    let rows = grid.visible_rows() as u16;
    let card_w = area.width / COLUMNS as u16;
    let card_h = area.height / rows.max(1);
    if card_w == 0 || card_h == 0 {
        return;
    }

    for index in grid.visible_range() {
        let row = (index / COLUMNS - grid.scroll_row()) as u16;
        let col = (index % COLUMNS) as u16;
        let rect = Rect::new(area.x + col * card_w, area.y + row * card_h, card_w, card_h);
        render_card(f, rect, &grid.cards()[index].view(now));
    }
}

fn border(emphasis: Emphasis) -> (BorderType, Style) {
    match emphasis {
        Emphasis::Normal => (BorderType::Rounded, Style::default().fg(Color::DarkGray)),
        Emphasis::Selected => (BorderType::Rounded, Style::default().fg(Color::Magenta)),
        Emphasis::Focused => (BorderType::Thick, Style::default().fg(Color::Cyan)),
    }
}

fn render_card(f: &mut Frame, area: Rect, view: &CardView) {
    let (border_type, border_style) = border(view.emphasis);
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style);
    if let Some(indicator) = &view.scroll_indicator {
        block = block.title_bottom(
            Line::from(Span::styled(
                format!(" {indicator} "),
                Style::default().fg(Color::DarkGray),
            ))
            .right_aligned(),
        );
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let mut lines = Vec::with_capacity(view.lines.len() + 3);
    lines.push(Line::from(Span::styled(
        view.title.clone(),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )));

    let mut status_line = Vec::new();
    if let Some(status) = view.status {
        status_line.push(Span::styled(
            format!("{} ", status_icon(status)),
            Style::default().fg(status_color(status)),
        ));
    }
    status_line.push(Span::styled(
        view.branch.clone(),
        Style::default().fg(Color::DarkGray),
    ));
    lines.push(Line::from(status_line));
    lines.push(Line::from(Span::styled(
        "─".repeat(inner_width),
        Style::default().fg(Color::DarkGray),
    )));
    lines.extend(view.lines.iter().map(body_line));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn body_line(line: &CardLine) -> Line<'static> {
    let style = match line.style {
        LineStyle::Plain => Style::default(),
        LineStyle::Highlight => Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
        LineStyle::Heading => Style::default().add_modifier(Modifier::BOLD),
        LineStyle::Dim => Style::default().fg(Color::DarkGray),
        LineStyle::Error => Style::default().fg(Color::Red),
        LineStyle::Loading => Style::default().fg(Color::Yellow),
    };

    let mut spans = Vec::with_capacity(2);
    if let Some(status) = line.status {
        spans.push(Span::styled(
            format!("{} ", status_icon(status)),
            style.fg(status_color(status)),
        ));
    }
    spans.push(Span::styled(line.text.clone(), style));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_is_red_success_is_green() {
        assert_eq!(status_color(RunStatus::Failure), Color::Red);
        assert_eq!(status_color(RunStatus::Success), Color::Green);
    }

    #[test]
    fn focused_cards_get_thick_border() {
        assert_eq!(border(Emphasis::Focused).0, BorderType::Thick);
        assert_eq!(border(Emphasis::Selected).0, BorderType::Rounded);
        assert_eq!(border(Emphasis::Normal).1.fg, Some(Color::DarkGray));
    }
}
