use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
};

use crate::text::TextRow;

/// Verse text shown while playing, one row per queue track.
pub struct Board<'a> {
    rows: &'a [TextRow],
    current: usize,
    title: String,
}

impl<'a> Board<'a> {
    pub fn new(rows: &'a [TextRow], current: usize) -> Self {
        Self {
            rows,
            current,
            title: "Text".to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title.as_str());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.rows.is_empty() || inner.width == 0 || inner.height == 0 {
            return;
        }

        let width = inner.width as usize;
        let wrapped: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| wrap_row(&row.text, width))
            .collect();
        let heights: Vec<usize> = wrapped.iter().map(|lines| lines.len() + 1).collect();
        let offset = scroll_offset(&heights, self.current, inner.height as usize);

        let mut lines: Vec<Line> = Vec::new();
        for (index, (row, row_lines)) in self.rows.iter().zip(&wrapped).enumerate() {
            let style = row_style(row, index == self.current);
            let alignment = if row.is_preamble {
                Alignment::Center
            } else {
                Alignment::Right
            };
            for text in row_lines {
                lines.push(Line::styled(text.clone(), style).alignment(alignment));
            }
            lines.push(Line::from(""));
        }

        let paragraph = Paragraph::new(lines).scroll((offset, 0));
        frame.render_widget(paragraph, inner);
    }
}

fn row_style(row: &TextRow, current: bool) -> Style {
    let mut style = if current {
        Style::default().fg(Color::White).bg(Color::Blue)
    } else {
        Style::default().fg(Color::Gray)
    };
    if row.is_preamble {
        style = style.add_modifier(Modifier::BOLD);
    }
    style
}

/// Wrap a row to the board width; an empty row still takes one line.
pub fn wrap_row(text: &str, width: usize) -> Vec<String> {
    let lines: Vec<String> = textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(|line| line.into_owned())
        .collect();
    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

/// First visible line so the current row sits about a third of the way down.
///
/// `heights` are the rendered heights of each row, spacing included.
/// Offsets past `u16::MAX` saturate.
pub fn scroll_offset(heights: &[usize], current: usize, viewport: usize) -> u16 {
    if heights.is_empty() || viewport == 0 {
        return 0;
    }
    let current = current.min(heights.len() - 1);
    let total: usize = heights.iter().sum();
    let row_top: usize = heights[..current].iter().sum();
    let max_offset = total.saturating_sub(viewport);
    let offset = row_top.saturating_sub(viewport / 3).min(max_offset);
    u16::try_from(offset).unwrap_or(u16::MAX)
}
