use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::ui::views::{DetailView, SettingsField};

/// Label and current draft of each panel row.
pub fn settings_entries(view: &DetailView) -> Vec<String> {
    SettingsField::ALL
        .iter()
        .map(|field| match field {
            SettingsField::Repeat => format!("Repeat each ayah:  {}", view.settings.repeat.draft()),
            SettingsField::Gap => format!("Gap (seconds):     {}", view.settings.gap.draft()),
            SettingsField::ShowText => format!(
                "Show text:         [{}]",
                if view.settings.show_text { "x" } else { " " }
            ),
            SettingsField::Play => format!("Play {}", view.summary()),
        })
        .collect()
}

pub struct PlaybackSettingsWindow;

impl PlaybackSettingsWindow {
    pub fn render(frame: &mut Frame, area: Rect, view: &DetailView) {
        let popup_area = super::fixed_popup_area(area, 52, 10);

        frame.render_widget(Clear, popup_area);
        let block = Block::default()
            .title("Playback Settings")
            .borders(Borders::ALL);
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let items: Vec<ListItem> = settings_entries(view)
            .into_iter()
            .zip(SettingsField::ALL)
            .map(|(entry, field)| {
                let style = if field == view.focus {
                    Style::default().bg(Color::Blue).fg(Color::White)
                } else if view.field_hint(field).is_some() {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(entry)).style(style)
            })
            .collect();
        frame.render_widget(List::new(items), rows[0]);

        if let Some(hint) = view.field_hint(view.focus) {
            let paragraph = Paragraph::new(hint).style(Style::default().fg(Color::Red));
            frame.render_widget(paragraph, rows[1]);
        }

        let footer = Paragraph::new("Tips: j/k move | Space toggle | Enter play | Esc close")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(footer, rows[2]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::models::DivisionKind;
    use crate::settings::Settings;
    use eyre::Result;

    #[test]
    fn entries_show_drafts() -> Result<()> {
        let catalog = Catalog::load()?;
        let mut view =
            DetailView::new(catalog.division(DivisionKind::Chapter, 1), &Settings::default());
        view.toggle_select_all();
        view.settings.repeat.set_draft("1x");
        let entries = settings_entries(&view);
        assert_eq!(entries[0], "Repeat each ayah:  1x");
        assert_eq!(entries[1], "Gap (seconds):     2");
        assert_eq!(entries[2], "Show text:         [x]");
        assert_eq!(entries[3], "Play 1 - 7");
        Ok(())
    }
}
