use std::time::Instant;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Gauge, Paragraph},
};

use crate::catalog::Catalog;
use crate::dump::EMPTY_QUEUE_MESSAGE;
use crate::playback_settings::NumericField;
use crate::text::TextRow;
use crate::ui::board::Board;
use crate::ui::views::PlayerView;

/// One-word state of the player, with the gap countdown when waiting.
pub fn state_label(view: &PlayerView, now: Instant) -> String {
    let player = &view.player;
    let cursor = player.cursor();
    if player.is_empty() {
        return EMPTY_QUEUE_MESSAGE.to_string();
    }
    if cursor.done {
        return "Finished".to_string();
    }
    if cursor.paused {
        return "Paused".to_string();
    }
    match player.next_deadline() {
        Some(deadline) => format!(
            "Next in {:.1}s",
            deadline.saturating_duration_since(now).as_secs_f64()
        ),
        None => "Playing".to_string(),
    }
}

pub fn error_line(view: &PlayerView) -> Option<String> {
    view.player.last_error().map(|error| format!("Error: {}", error))
}

pub fn settings_line(view: &PlayerView) -> String {
    let player = &view.player;
    let on_off = |flag: bool| if flag { "on" } else { "off" };
    format!(
        "Repeat x{} | Gap {:.1}s | Loop {} | Text {}",
        player.config().repeat_count,
        view.gap_field.value(),
        on_off(player.config().looping),
        on_off(player.show_text())
    )
}

pub struct PlayerWindow;

impl PlayerWindow {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        view: &PlayerView,
        catalog: &Catalog,
        rows: &[TextRow],
        now: Instant,
    ) {
        let player = &view.player;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(6)])
            .split(area);

        if player.is_empty() {
            let paragraph = Paragraph::new(EMPTY_QUEUE_MESSAGE)
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().title(view.title.as_str()).borders(Borders::ALL));
            frame.render_widget(paragraph, chunks[0]);
        } else if player.show_text() {
            Board::new(rows, player.cursor().track)
                .with_title(view.title.as_str())
                .render(frame, chunks[0]);
        } else {
            let paragraph = Paragraph::new(player.current_key(catalog))
                .style(Style::default().add_modifier(Modifier::BOLD))
                .block(Block::default().title(view.title.as_str()).borders(Borders::ALL));
            frame.render_widget(paragraph, chunks[0]);
        }

        let block = Block::default().title("Player").borders(Borders::ALL);
        let inner = block.inner(chunks[1]);
        frame.render_widget(block, chunks[1]);
        let lines = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let status = Line::from(format!(
            "{} | {}",
            player.status_line(catalog),
            state_label(view, now)
        ));
        frame.render_widget(Paragraph::new(status), lines[0]);

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(Color::Blue))
            .ratio(player.progress_ratio())
            .label(player.time_label());
        frame.render_widget(gauge, lines[1]);

        frame.render_widget(Paragraph::new(settings_line(view)), lines[2]);

        if let Some(error) = error_line(view) {
            let paragraph = Paragraph::new(error).style(Style::default().fg(Color::Red));
            frame.render_widget(paragraph, lines[3]);
        }
    }

    pub fn render_gap_input(frame: &mut Frame, area: Rect, field: &NumericField<f64>) {
        let popup_area = super::fixed_popup_area(area, 48, 4);
        frame.render_widget(Clear, popup_area);

        let mut lines = vec![Line::from(format!("Gap (seconds): {}_", field.draft()))];
        if field.is_draft_invalid() {
            lines.push(Line::styled(
                field.invalid_hint(),
                Style::default().fg(Color::Red),
            ));
        }
        let paragraph = Paragraph::new(lines)
            .block(Block::default().title("Gap").borders(Borders::ALL));
        frame.render_widget(paragraph, popup_area);
    }
}
