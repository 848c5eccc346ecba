use eyre::Result;

use crate::models::{Chapter, Division, DivisionKind, Section, SurahInSection, VerseGroup};

const CHAPTERS_JSON: &str = include_str!("../data/chapters.json");
const SECTIONS_JSON: &str = include_str!("../data/sections.json");

pub const CHAPTER_COUNT: usize = 114;
pub const SECTION_COUNT: usize = 30;

/// Read-only chapter and section tables.
#[derive(Debug, Clone)]
pub struct Catalog {
    chapters: Vec<Chapter>,
    sections: Vec<Section>,
    chapter_starts: Vec<u32>,
}

impl Catalog {
    /// Load the tables bundled into the binary.
    pub fn load() -> Result<Self> {
        Self::from_json(CHAPTERS_JSON, SECTIONS_JSON)
    }

    pub fn from_json(chapters_json: &str, sections_json: &str) -> Result<Self> {
        let chapters: Vec<Chapter> = serde_json::from_str(chapters_json)?;
        let sections: Vec<Section> = serde_json::from_str(sections_json)?;

        let mut expected = 1;
        for chapter in &chapters {
            if chapter.first_ayah_index != expected {
                return Err(eyre::eyre!(
                    "Chapter {} starts at verse {} but {} was expected",
                    chapter.number,
                    chapter.first_ayah_index,
                    expected
                ));
            }
            expected += chapter.number_of_ayahs;
        }
        let total = expected - 1;
        for section in &sections {
            let last = section.first_ayah_index + section.number_of_ayahs;
            if section.first_ayah_index == 0 || last - 1 > total {
                return Err(eyre::eyre!(
                    "Section {} lies outside the {} verses of the text",
                    section.number,
                    total
                ));
            }
        }

        let chapter_starts = chapters.iter().map(|c| c.first_ayah_index).collect();
        Ok(Self {
            chapters,
            sections,
            chapter_starts,
        })
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn chapter(&self, number: u32) -> Option<&Chapter> {
        if number == 0 {
            return None;
        }
        self.chapters.get(number as usize - 1)
    }

    pub fn section(&self, number: u32) -> Option<&Section> {
        if number == 0 {
            return None;
        }
        self.sections.get(number as usize - 1)
    }

    pub fn total_verses(&self) -> u32 {
        self.chapters
            .last()
            .map(Chapter::last_ayah_index)
            .unwrap_or(0)
    }

    pub fn is_chapter_start(&self, global: u32) -> bool {
        self.chapter_starts.binary_search(&global).is_ok()
    }

    /// Map a global verse index to `(chapter, verse within chapter)`.
    pub fn locate(&self, global: u32) -> Option<(u32, u32)> {
        if global == 0 || global > self.total_verses() {
            return None;
        }
        let idx = self.chapter_starts.partition_point(|&start| start <= global) - 1;
        let chapter = &self.chapters[idx];
        Some((chapter.number, global - chapter.first_ayah_index + 1))
    }

    /// `"chapter:verse"` key for a global verse index.
    pub fn verse_key(&self, global: u32) -> Option<String> {
        self.locate(global)
            .map(|(chapter, verse)| format!("{}:{}", chapter, verse))
    }

    /// Chapters overlapping a section, each with the verses that fall inside it.
    pub fn membership(&self, section: &Section) -> Vec<SurahInSection> {
        let mut groups: Vec<SurahInSection> = Vec::new();
        let end = section.first_ayah_index + section.number_of_ayahs;
        for global in section.first_ayah_index..end {
            let Some((chapter, verse)) = self.locate(global) else {
                break;
            };
            match groups.last_mut() {
                Some(group) if group.chapter == chapter => group.ayahs.push(verse),
                _ => groups.push(SurahInSection {
                    chapter,
                    ayahs: vec![verse],
                }),
            }
        }
        groups
    }

    /// Build the detail-view model, falling back to the "not found" placeholder.
    pub fn division(&self, kind: DivisionKind, number: u32) -> Division {
        match kind {
            DivisionKind::Chapter => {
                let chapter = self.chapter(number).cloned().unwrap_or_else(Chapter::not_found);
                let groups = if chapter.number_of_ayahs == 0 {
                    Vec::new()
                } else {
                    vec![VerseGroup {
                        chapter: chapter.number,
                        heading: chapter.english_name.clone(),
                        arabic_heading: chapter.name.clone(),
                        ayahs: (1..=chapter.number_of_ayahs).collect(),
                    }]
                };
                Division {
                    kind,
                    number: chapter.number,
                    title: chapter.english_name.clone(),
                    arabic_title: chapter.name.clone(),
                    first_ayah_index: chapter.first_ayah_index,
                    verse_count: chapter.number_of_ayahs,
                    groups,
                }
            }
            DivisionKind::Section => {
                let section = self.section(number).cloned().unwrap_or_else(Section::not_found);
                let groups = self
                    .membership(&section)
                    .into_iter()
                    .filter_map(|member| {
                        let chapter = self.chapter(member.chapter)?;
                        Some(VerseGroup {
                            chapter: member.chapter,
                            heading: chapter.english_name.clone(),
                            arabic_heading: chapter.name.clone(),
                            ayahs: member.ayahs,
                        })
                    })
                    .collect();
                let title = if section.number == 0 {
                    "Error".to_string()
                } else {
                    format!("Juz {}", section.number)
                };
                Division {
                    kind,
                    number: section.number,
                    title,
                    arabic_title: section.name.clone().unwrap_or_default(),
                    first_ayah_index: section.first_ayah_index,
                    verse_count: section.number_of_ayahs,
                    groups,
                }
            }
        }
    }
}
