use crate::dashboard::{Dashboard, Mode};
use crate::tui::{command_bar, footer, grid, header};
use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use std::rc::Rc;
use std::time::Instant;

fn chunks(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // header
            Constraint::Min(1),    // grid
            Constraint::Length(3), // command bar
            Constraint::Length(2), // footer
        ])
        .split(area)
}

/// Area left for cards once header, command bar and footer are laid out.
pub fn grid_area(area: Rect) -> Rect {
    chunks(area)[1]
}

pub fn render(f: &mut Frame, dash: &Dashboard, now: Instant, wall: DateTime<Utc>) {
    let chunks = chunks(f.area());

    header::render(f, chunks[0], dash, now);
    grid::render(f, chunks[1], dash.grid(), wall);
    command_bar::render(f, chunks[2], dash.command(), dash.mode() == Mode::Command);
    footer::render(f, chunks[3], dash);

    if let Some(err) = dash.error_message() {
        let area = f.area();
        if area.height > 8 && area.width >= 4 {
            let err_area = Rect {
                x: area.x + 1,
                y: area.y + area.height.saturating_sub(8),
                width: area.width.saturating_sub(2),
                height: 3,
            };
            let err_widget = Paragraph::new(err.to_owned())
                .style(Style::default().fg(Color::Red))
                .block(
                    Block::default()
                        .title(" Error ")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Red)),
                )
                .wrap(Wrap { trim: true });
            f.render_widget(Clear, err_area);
            f.render_widget(err_widget, err_area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_area_leaves_room_for_chrome() {
        let area = grid_area(Rect::new(0, 0, 120, 40));
        assert_eq!(area, Rect::new(0, 2, 120, 33));
    }
}
