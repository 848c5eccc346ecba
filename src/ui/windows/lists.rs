use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};

use crate::models::{Chapter, Section};
use crate::text::SectionNames;

/// Row text for one surah in the chapter list.
pub fn chapter_row(chapter: &Chapter) -> String {
    let revelation = chapter
        .revelation_type
        .map(|kind| kind.label())
        .unwrap_or("");
    format!(
        "{:>3}. {} ({}) | {} ayahs | {}",
        chapter.number,
        chapter.english_name,
        chapter.english_name_translation,
        chapter.number_of_ayahs,
        revelation
    )
}

/// Row text for one juz in the section list.
pub fn section_row(section: &Section, names: &SectionNames) -> String {
    format!(
        "Juz {:>2} | {} | {} ayahs",
        section.number,
        names.label(section.number),
        section.number_of_ayahs
    )
}

pub struct ChapterListWindow;

impl ChapterListWindow {
    pub fn render(frame: &mut Frame, area: Rect, chapters: &[Chapter], selected: usize) {
        let items: Vec<ListItem> = chapters
            .iter()
            .map(|chapter| {
                ListItem::new(Line::from(vec![
                    Span::raw(chapter_row(chapter)),
                    Span::styled(
                        format!("  {}", chapter.name),
                        Style::default().fg(Color::Cyan),
                    ),
                ]))
            })
            .collect();
        render_list(frame, area, items, selected, "Surahs");
    }
}

pub struct SectionListWindow;

impl SectionListWindow {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        sections: &[Section],
        names: &SectionNames,
        selected: usize,
    ) {
        let items: Vec<ListItem> = sections
            .iter()
            .map(|section| ListItem::new(Line::from(section_row(section, names))))
            .collect();
        render_list(frame, area, items, selected, "Juz");
    }
}

fn render_list(frame: &mut Frame, area: Rect, items: Vec<ListItem>, selected: usize, title: &str) {
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
    let mut state = ListState::default();
    state.select(Some(selected));
    frame.render_stateful_widget(list, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use eyre::Result;

    #[test]
    fn chapter_row_lists_metadata() -> Result<()> {
        let catalog = Catalog::load()?;
        let row = chapter_row(catalog.chapter(1).unwrap());
        assert!(row.starts_with("  1. Al-Faatiha"));
        assert!(row.contains("| 7 ayahs |"));
        assert!(row.ends_with("Meccan"));
        Ok(())
    }

    #[test]
    fn section_row_waits_for_name() -> Result<()> {
        let catalog = Catalog::load()?;
        let names = SectionNames::new();
        let row = section_row(catalog.section(2).unwrap(), &names);
        assert_eq!(row, "Juz  2 | Loading... | 111 ayahs");
        Ok(())
    }
}
