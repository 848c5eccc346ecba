//! Verse selection state for the detail grid.
//!
//! Everything a view needs is derived from the fields below; there is no
//! per-verse bookkeeping in range mode.

use std::collections::BTreeSet;

/// Two-tap range selection with a "select all" override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSelection {
    start: Option<u32>,
    end: Option<u32>,
    select_all: bool,
    verse_count: u32,
}

/// Normalized selection: `min..=max`, `count` verses, all 1-based local numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedRange {
    pub min: u32,
    pub max: u32,
    pub count: u32,
}

impl RangeSelection {
    pub fn new(verse_count: u32) -> Self {
        Self {
            verse_count,
            ..Self::default()
        }
    }

    pub fn start(&self) -> Option<u32> {
        self.start
    }

    pub fn end(&self) -> Option<u32> {
        self.end
    }

    pub fn is_select_all(&self) -> bool {
        self.select_all
    }

    /// Apply a tap on a local verse number. Out-of-range taps are ignored.
    pub fn tap(&mut self, verse: u32) {
        if verse == 0 || verse > self.verse_count {
            return;
        }
        if self.select_all {
            self.select_all = false;
            self.start = Some(verse);
            self.end = None;
            return;
        }
        match (self.start, self.end) {
            (Some(start), None) => {
                self.start = Some(start);
                self.end = Some(verse);
            }
            _ => {
                self.start = Some(verse);
                self.end = None;
            }
        }
    }

    /// Flip "select all"; turning it off leaves nothing selected.
    pub fn toggle_select_all(&mut self) {
        self.set_select_all(!self.select_all);
    }

    pub fn set_select_all(&mut self, enabled: bool) {
        self.select_all = enabled && self.verse_count > 0;
        self.start = None;
        self.end = None;
    }

    pub fn clear(&mut self) {
        self.select_all = false;
        self.start = None;
        self.end = None;
    }

    pub fn is_selected(&self, verse: u32) -> bool {
        if self.select_all {
            return verse >= 1 && verse <= self.verse_count;
        }
        match (self.start, self.end) {
            (None, _) => false,
            (Some(start), None) => verse == start,
            (Some(start), Some(end)) => verse >= start.min(end) && verse <= start.max(end),
        }
    }

    /// A finalized range or select-all, ready to be played.
    pub fn is_finalized(&self) -> bool {
        self.range().is_some()
    }

    pub fn range(&self) -> Option<SelectedRange> {
        if self.select_all {
            return Some(SelectedRange {
                min: 1,
                max: self.verse_count,
                count: self.verse_count,
            });
        }
        let (start, end) = (self.start?, self.end?);
        let min = start.min(end);
        let max = start.max(end);
        Some(SelectedRange {
            min,
            max,
            count: max - min + 1,
        })
    }

    /// Text for the settings panel, e.g. `"3 - 9"`.
    pub fn summary(&self) -> String {
        match self.range() {
            Some(range) => format!("{} - {}", range.min, range.max),
            None => "None Selected".to_string(),
        }
    }
}

/// Free-form selection: each verse is toggled on its own.
///
/// Offsets are 0-based positions from the first verse of the chapter or
/// section, matching the `ayaat` list of a play route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickSelection {
    picked: BTreeSet<u32>,
    verse_count: u32,
}

impl PickSelection {
    pub fn new(verse_count: u32) -> Self {
        Self {
            picked: BTreeSet::new(),
            verse_count,
        }
    }

    pub fn toggle(&mut self, offset: u32) {
        if offset >= self.verse_count {
            return;
        }
        if !self.picked.remove(&offset) {
            self.picked.insert(offset);
        }
    }

    pub fn set_all(&mut self, enabled: bool) {
        self.picked.clear();
        if enabled {
            self.picked.extend(0..self.verse_count);
        }
    }

    pub fn is_all(&self) -> bool {
        self.verse_count > 0 && self.picked.len() as u32 == self.verse_count
    }

    pub fn is_selected(&self, offset: u32) -> bool {
        self.picked.contains(&offset)
    }

    pub fn is_empty(&self) -> bool {
        self.picked.is_empty()
    }

    /// Picked offsets in ascending order.
    pub fn offsets(&self) -> Vec<u32> {
        self.picked.iter().copied().collect()
    }

    /// 1-based verse list, cut after 15 characters.
    pub fn summary(&self) -> String {
        let list = self
            .picked
            .iter()
            .map(|offset| (offset + 1).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        if list.chars().count() > 14 {
            let head: String = list.chars().take(15).collect();
            format!("{}...", head)
        } else {
            list
        }
    }
}
