use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::ui::views::{DetailView, SelectMode};

pub const CELL_WIDTH: u16 = 6;

/// Cells per grid row for a detail window spanning `width` columns.
pub fn grid_columns(width: u16) -> u16 {
    (width.saturating_sub(2) / CELL_WIDTH).max(1)
}

/// Grid lines with group headings, and the line holding the cursor.
pub fn grid_lines(view: &DetailView, columns: u16) -> (Vec<Line<'static>>, usize) {
    let columns = columns.max(1) as usize;
    let mut lines = Vec::new();
    let mut cursor_line = 0;
    let mut local = 0u32;

    for group in &view.division.groups {
        lines.push(Line::from(vec![
            Span::styled(
                format!("Surah {}: {}", group.chapter, group.heading),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", group.arabic_heading),
                Style::default().fg(Color::Cyan),
            ),
        ]));
        for row in group.ayahs.chunks(columns) {
            let mut spans = Vec::with_capacity(row.len());
            for ayah in row {
                local += 1;
                let mut style = Style::default();
                if view.is_selected(local) {
                    style = style.bg(Color::Green).fg(Color::Black);
                } else if matches!(view.mode, SelectMode::Range)
                    && view.range.start() == Some(local)
                {
                    style = style.bg(Color::Yellow).fg(Color::Black);
                }
                if local == view.cursor {
                    style = style.add_modifier(Modifier::REVERSED);
                    cursor_line = lines.len();
                }
                spans.push(Span::styled(format!("{:>5}", ayah), style));
                spans.push(Span::raw(" "));
            }
            lines.push(Line::from(spans));
        }
        lines.push(Line::from(""));
    }
    (lines, cursor_line)
}

fn scroll_for(cursor_line: usize, height: usize) -> u16 {
    if height == 0 {
        return 0;
    }
    cursor_line.saturating_sub(height.saturating_sub(2)) as u16
}

pub struct DetailWindow;

impl DetailWindow {
    pub fn render(frame: &mut Frame, area: Rect, view: &DetailView) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(area);

        let division = &view.division;
        let title = format!(
            "{} {}: {} {}",
            division.kind.label(),
            division.number,
            division.title,
            division.arabic_title
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(rows[0]);

        if division.is_placeholder() {
            let paragraph = Paragraph::new("Not Found")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(paragraph, rows[0]);
        } else {
            let (lines, cursor_line) = grid_lines(view, grid_columns(rows[0].width));
            let paragraph = Paragraph::new(lines)
                .block(block)
                .scroll((scroll_for(cursor_line, inner.height as usize), 0));
            frame.render_widget(paragraph, rows[0]);
        }

        let mode = match view.mode {
            SelectMode::Range => "Range",
            SelectMode::Pick => "Pick",
        };
        let footer = Paragraph::new(format!(
            " {} | Selected: {} | Space select  a all  m mode  c clear  p play  H/L prev/next",
            mode,
            view.summary()
        ))
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(footer, rows[1]);
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
    fn columns_never_zero() {
        assert_eq!(grid_columns(0), 1);
        assert_eq!(grid_columns(62), 10);
    }

    #[test]
    fn grid_has_heading_rows_and_blank_separators() -> Result<()> {
        let catalog = Catalog::load()?;
        let view = DetailView::new(catalog.division(DivisionKind::Chapter, 1), &Settings::default());
        let (lines, cursor_line) = grid_lines(&view, 3);
        // heading, 3 rows of cells, blank
        assert_eq!(lines.len(), 5);
        assert_eq!(cursor_line, 1);
        Ok(())
    }

    #[test]
    fn cursor_line_tracks_across_groups() -> Result<()> {
        let catalog = Catalog::load()?;
        let mut view =
            DetailView::new(catalog.division(DivisionKind::Section, 30), &Settings::default());
        // 78 has 40 ayahs: heading + 4 rows + blank, then 79's heading
        view.jump_cursor(41);
        let (_, cursor_line) = grid_lines(&view, 10);
        assert_eq!(cursor_line, 7);
        Ok(())
    }

    #[test]
    fn scroll_keeps_cursor_visible() {
        assert_eq!(scroll_for(3, 10), 0);
        assert_eq!(scroll_for(20, 10), 12);
        assert_eq!(scroll_for(5, 0), 0);
    }
}
