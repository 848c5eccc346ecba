use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RevelationType {
    Meccan,
    Medinan,
}

impl RevelationType {
    pub fn label(&self) -> &'static str {
        match self {
            RevelationType::Meccan => "Meccan",
            RevelationType::Medinan => "Medinan",
        }
    }
}

/// One surah as shipped in `data/chapters.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub number: u32,
    pub name: String,
    pub english_name: String,
    pub english_name_translation: String,
    pub number_of_ayahs: u32,
    pub revelation_type: Option<RevelationType>,
    pub first_ayah_index: u32,
}

impl Chapter {
    /// Stand-in rendered for an out-of-range chapter number.
    pub fn not_found() -> Self {
        Self {
            number: 0,
            name: "Error".to_string(),
            english_name: "Error".to_string(),
            english_name_translation: "Not Found".to_string(),
            number_of_ayahs: 0,
            revelation_type: None,
            first_ayah_index: 0,
        }
    }

    pub fn last_ayah_index(&self) -> u32 {
        (self.first_ayah_index + self.number_of_ayahs).saturating_sub(1)
    }
}

/// One juz (para) as shipped in `data/sections.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub number: u32,
    pub first_ayah_index: u32,
    pub number_of_ayahs: u32,
    #[serde(default)]
    pub name: Option<String>,
}

impl Section {
    pub fn not_found() -> Self {
        Self {
            number: 0,
            first_ayah_index: 0,
            number_of_ayahs: 0,
            name: Some("Error".to_string()),
        }
    }
}

/// Verses of one chapter that fall inside a section.
#[derive(Debug, Clone, PartialEq)]
pub struct SurahInSection {
    pub chapter: u32,
    pub ayahs: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivisionKind {
    Chapter,
    Section,
}

impl DivisionKind {
    pub fn label(&self) -> &'static str {
        match self {
            DivisionKind::Chapter => "Surah",
            DivisionKind::Section => "Juz",
        }
    }
}

/// A run of selectable verses under one heading in the detail grid.
#[derive(Debug, Clone, PartialEq)]
pub struct VerseGroup {
    pub chapter: u32,
    pub heading: String,
    pub arabic_heading: String,
    /// Chapter-local verse numbers, used as button labels.
    pub ayahs: Vec<u32>,
}

/// What the detail view shows: a chapter or a section, flattened into groups.
///
/// Local verse numbers run 1..=verse_count across all groups in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Division {
    pub kind: DivisionKind,
    pub number: u32,
    pub title: String,
    pub arabic_title: String,
    pub first_ayah_index: u32,
    pub verse_count: u32,
    pub groups: Vec<VerseGroup>,
}

impl Division {
    pub fn is_placeholder(&self) -> bool {
        self.verse_count == 0
    }

    /// Global index of a 1-based local verse number.
    pub fn global_index(&self, local: u32) -> Option<u32> {
        if local == 0 || local > self.verse_count {
            return None;
        }
        Some(self.first_ayah_index + local - 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WindowType {
    Main,
    Help,
    PlaybackSettings,
    GapInput,
}

impl Default for WindowType {
    fn default() -> Self {
        WindowType::Main
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageType {
    Info,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_type_default() {
        assert_eq!(WindowType::default(), WindowType::Main);
    }

    #[test]
    fn test_chapter_deserializes_camel_case() {
        let json = r#"{
            "number": 112,
            "name": "الإخلاص",
            "englishName": "Al-Ikhlaas",
            "englishNameTranslation": "Sincerity",
            "numberOfAyahs": 4,
            "revelationType": "Meccan",
            "firstAyahIndex": 6222
        }"#;
        let chapter: Chapter = serde_json::from_str(json).unwrap();
        assert_eq!(chapter.english_name, "Al-Ikhlaas");
        assert_eq!(chapter.revelation_type, Some(RevelationType::Meccan));
        assert_eq!(chapter.last_ayah_index(), 6225);
    }

    #[test]
    fn test_not_found_placeholders_are_empty() {
        let chapter = Chapter::not_found();
        assert_eq!(chapter.number_of_ayahs, 0);
        assert_eq!(chapter.english_name_translation, "Not Found");
        assert_eq!(Section::not_found().number_of_ayahs, 0);
    }

    #[test]
    fn test_division_global_index_bounds() {
        let division = Division {
            kind: DivisionKind::Chapter,
            number: 1,
            title: "Al-Faatiha".to_string(),
            arabic_title: "الفاتحة".to_string(),
            first_ayah_index: 1,
            verse_count: 7,
            groups: Vec::new(),
        };
        assert_eq!(division.global_index(0), None);
        assert_eq!(division.global_index(1), Some(1));
        assert_eq!(division.global_index(7), Some(7));
        assert_eq!(division.global_index(8), None);
    }
}
