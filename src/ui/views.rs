//! Per-route view state, kept free of terminal concerns.

use std::time::Instant;

use crate::audio::PlaybackPort;
use crate::catalog::Catalog;
use crate::models::Division;
use crate::playback_settings::{NumericField, PlaybackSettings};
use crate::player::{Player, gap_duration};
use crate::queue::{AudioSource, PlaybackQueue};
use crate::route::PlayRequest;
use crate::selection::{PickSelection, RangeSelection};
use crate::sequencer::SequencerConfig;
use crate::settings::{MAX_GAP_LIMIT, Settings};

/// Cursor over a fixed-length list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListView {
    pub selected: usize,
    pub len: usize,
}

impl ListView {
    pub fn new(len: usize, selected: usize) -> Self {
        Self {
            selected: selected.min(len.saturating_sub(1)),
            len,
        }
    }

    pub fn next(&mut self, step: usize) {
        if self.len > 0 {
            self.selected = self.selected.saturating_add(step).min(self.len - 1);
        }
    }

    pub fn previous(&mut self, step: usize) {
        self.selected = self.selected.saturating_sub(step);
    }

    pub fn first(&mut self) {
        self.selected = 0;
    }

    pub fn last(&mut self) {
        self.selected = self.len.saturating_sub(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    Range,
    Pick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Repeat,
    Gap,
    ShowText,
    Play,
}

impl SettingsField {
    pub const ALL: [SettingsField; 4] = [
        SettingsField::Repeat,
        SettingsField::Gap,
        SettingsField::ShowText,
        SettingsField::Play,
    ];

    fn position(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Verse grid of one chapter or section plus its playback-settings panel.
#[derive(Debug, Clone)]
pub struct DetailView {
    pub division: Division,
    pub mode: SelectMode,
    pub range: RangeSelection,
    pub pick: PickSelection,
    /// 1-based local verse under the cursor; 0 for an empty division.
    pub cursor: u32,
    pub settings: PlaybackSettings,
    pub focus: SettingsField,
    labels: Vec<u32>,
}

impl DetailView {
    pub fn new(division: Division, settings: &Settings) -> Self {
        let count = division.verse_count;
        let labels = division
            .groups
            .iter()
            .flat_map(|group| group.ayahs.iter().copied())
            .collect();
        Self {
            range: RangeSelection::new(count),
            pick: PickSelection::new(count),
            cursor: if count > 0 { 1 } else { 0 },
            settings: PlaybackSettings::new(
                settings.default_repeat,
                settings.default_gap,
                settings.max_gap,
                settings.show_text,
            ),
            focus: SettingsField::Repeat,
            mode: SelectMode::Range,
            division,
            labels,
        }
    }

    /// Chapter-local verse number printed on a cell.
    pub fn label(&self, local: u32) -> u32 {
        local
            .checked_sub(1)
            .and_then(|i| self.labels.get(i as usize))
            .copied()
            .unwrap_or(local)
    }

    pub fn move_cursor(&mut self, delta: i64) {
        let count = self.division.verse_count as i64;
        if count == 0 {
            return;
        }
        self.cursor = (self.cursor as i64 + delta).clamp(1, count) as u32;
    }

    pub fn jump_cursor(&mut self, local: u32) {
        if self.division.verse_count > 0 {
            self.cursor = local.clamp(1, self.division.verse_count);
        }
    }

    /// Tap (range mode) or toggle (pick mode) the verse under the cursor.
    pub fn activate(&mut self) {
        if self.cursor == 0 {
            return;
        }
        match self.mode {
            SelectMode::Range => self.range.tap(self.cursor),
            SelectMode::Pick => self.pick.toggle(self.cursor - 1),
        }
    }

    pub fn toggle_select_all(&mut self) {
        match self.mode {
            SelectMode::Range => self.range.toggle_select_all(),
            SelectMode::Pick => {
                let all = self.pick.is_all();
                self.pick.set_all(!all);
            }
        }
    }

    pub fn is_all_selected(&self) -> bool {
        match self.mode {
            SelectMode::Range => self.range.is_select_all(),
            SelectMode::Pick => self.pick.is_all(),
        }
    }

    pub fn clear(&mut self) {
        self.range.clear();
        self.pick.set_all(false);
    }

    pub fn switch_mode(&mut self) {
        self.mode = match self.mode {
            SelectMode::Range => SelectMode::Pick,
            SelectMode::Pick => SelectMode::Range,
        };
    }

    pub fn is_selected(&self, local: u32) -> bool {
        match self.mode {
            SelectMode::Range => self.range.is_selected(local),
            SelectMode::Pick => local > 0 && self.pick.is_selected(local - 1),
        }
    }

    /// Whether the settings panel can turn the selection into a request.
    pub fn has_selection(&self) -> bool {
        match self.mode {
            SelectMode::Range => self.range.is_finalized(),
            SelectMode::Pick => !self.pick.is_empty(),
        }
    }

    pub fn summary(&self) -> String {
        match self.mode {
            SelectMode::Range => self.range.summary(),
            SelectMode::Pick if self.pick.is_empty() => "None Selected".to_string(),
            SelectMode::Pick => self.pick.summary(),
        }
    }

    pub fn request(&mut self) -> Option<PlayRequest> {
        let first = self.division.first_ayah_index;
        match self.mode {
            SelectMode::Range => self.settings.request_range(first, &self.range),
            SelectMode::Pick => self.settings.request_picked(first, &self.pick),
        }
    }

    /// Move panel focus, committing the numeric field being left.
    pub fn set_focus(&mut self, focus: SettingsField) {
        match self.focus {
            SettingsField::Repeat => {
                self.settings.repeat.commit();
            }
            SettingsField::Gap => {
                self.settings.gap.commit();
            }
            SettingsField::ShowText | SettingsField::Play => {}
        }
        self.focus = focus;
    }

    pub fn edit_char(&mut self, c: char) {
        match self.focus {
            SettingsField::Repeat if c.is_ascii_digit() => self.settings.repeat.push_char(c),
            SettingsField::Gap => self.settings.gap.push_char(c),
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            SettingsField::Repeat => self.settings.repeat.pop_char(),
            SettingsField::Gap => self.settings.gap.pop_char(),
            _ => {}
        }
    }

    /// Inline hint for the focused field's draft, if it is invalid.
    pub fn field_hint(&self, field: SettingsField) -> Option<String> {
        match field {
            SettingsField::Repeat if self.settings.repeat.is_draft_invalid() => {
                Some(self.settings.repeat.invalid_hint())
            }
            SettingsField::Gap if self.settings.gap.is_draft_invalid() => {
                Some(self.settings.gap.invalid_hint())
            }
            _ => None,
        }
    }
}

/// The player route: controller plus the gap input of its control bar.
pub struct PlayerView {
    pub player: Player<Box<dyn PlaybackPort>>,
    pub gap_field: NumericField<f64>,
    pub title: String,
}

impl PlayerView {
    pub fn new(
        request: &PlayRequest,
        catalog: &Catalog,
        source: &AudioSource,
        port: Box<dyn PlaybackPort>,
        now: Instant,
    ) -> Self {
        let queue = PlaybackQueue::build(catalog, source, request);
        let title = queue_title(&queue, catalog);
        let gap_field = NumericField::new(request.gap, 0.0, MAX_GAP_LIMIT);
        let config = SequencerConfig {
            repeat_count: request.repeat,
            gap: gap_duration(gap_field.value()),
            looping: false,
        };
        Self {
            player: Player::new(queue, config, request.show_text, port, now),
            gap_field,
            title,
        }
    }

    /// Apply the gap draft; invalid input reverts.
    pub fn commit_gap(&mut self, now: Instant) {
        self.gap_field.commit();
        self.player.set_gap(self.gap_field.value(), now);
    }

    pub fn nudge_gap(&mut self, delta: f64, now: Instant) {
        self.gap_field.nudge(delta);
        self.player.set_gap(self.gap_field.value(), now);
    }
}

fn queue_title(queue: &PlaybackQueue, catalog: &Catalog) -> String {
    let verses: Vec<u32> = queue
        .tracks()
        .iter()
        .filter(|t| !t.kind.is_preamble())
        .map(|t| t.kind.verse())
        .collect();
    let key = |g: Option<&u32>| g.and_then(|g| catalog.verse_key(*g));
    match (key(verses.first()), key(verses.last())) {
        (Some(first), Some(last)) if first == last => format!("Ayah {}", first),
        (Some(first), Some(last)) => format!("Ayahs {} - {} ({} total)", first, last, verses.len()),
        _ => "Player".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::OfflinePort;
    use crate::models::DivisionKind;
    use crate::route::Verses;
    use eyre::Result;

    fn detail(kind: DivisionKind, number: u32) -> Result<DetailView> {
        let catalog = Catalog::load()?;
        Ok(DetailView::new(catalog.division(kind, number), &Settings::default()))
    }

    #[test]
    fn list_view_clamps() {
        let mut list = ListView::new(3, 10);
        assert_eq!(list.selected, 2);
        list.next(5);
        assert_eq!(list.selected, 2);
        list.previous(7);
        assert_eq!(list.selected, 0);
        list.last();
        assert_eq!(list.selected, 2);

        let mut empty = ListView::new(0, 0);
        empty.next(1);
        assert_eq!(empty.selected, 0);
    }

    #[test]
    fn settings_focus_cycles() {
        assert_eq!(SettingsField::Repeat.next(), SettingsField::Gap);
        assert_eq!(SettingsField::Play.next(), SettingsField::Repeat);
        assert_eq!(SettingsField::Repeat.previous(), SettingsField::Play);
    }

    #[test]
    fn range_taps_build_request() -> Result<()> {
        let mut view = detail(DivisionKind::Chapter, 2)?;
        view.jump_cursor(255);
        view.activate();
        assert!(!view.has_selection());
        view.move_cursor(2);
        view.activate();
        assert!(view.has_selection());
        assert_eq!(view.summary(), "255 - 257");

        let request = view.request().unwrap();
        assert_eq!(request.start, 262);
        assert_eq!(request.verses, Verses::Count(3));
        assert_eq!(request.repeat, 1);
        assert_eq!(request.gap, 2.0);
        assert!(request.show_text);
        Ok(())
    }

    #[test]
    fn pick_mode_uses_offsets() -> Result<()> {
        let mut view = detail(DivisionKind::Chapter, 1)?;
        view.switch_mode();
        view.jump_cursor(2);
        view.activate();
        view.jump_cursor(5);
        view.activate();
        assert!(view.is_selected(5));
        assert!(!view.is_selected(3));
        assert_eq!(view.summary(), "2, 5");

        let request = view.request().unwrap();
        assert_eq!(request.start, 1);
        assert_eq!(request.verses, Verses::Offsets(vec![1, 4]));
        Ok(())
    }

    #[test]
    fn section_labels_restart_per_chapter() -> Result<()> {
        let view = detail(DivisionKind::Section, 30)?;
        assert_eq!(view.label(1), 1);
        // 78 has 40 verses, so local 41 is 79:1
        assert_eq!(view.label(41), 1);
        Ok(())
    }

    #[test]
    fn placeholder_has_no_cursor() -> Result<()> {
        let mut view = detail(DivisionKind::Chapter, 0)?;
        assert_eq!(view.cursor, 0);
        view.move_cursor(3);
        view.activate();
        view.toggle_select_all();
        assert!(view.request().is_none());
        Ok(())
    }

    #[test]
    fn leaving_a_field_commits_or_reverts() -> Result<()> {
        let mut view = detail(DivisionKind::Chapter, 1)?;
        view.settings.repeat.set_draft("");
        view.edit_char('4');
        view.edit_char('2');
        view.set_focus(SettingsField::Gap);
        assert_eq!(view.settings.repeat.value(), 42);

        view.settings.gap.set_draft("");
        view.edit_char('9');
        view.edit_char('9');
        assert_eq!(
            view.field_hint(SettingsField::Gap).as_deref(),
            Some("Value must be between 0 and 30 seconds.")
        );
        view.set_focus(SettingsField::ShowText);
        assert_eq!(view.settings.gap.value(), 2.0);
        assert_eq!(view.settings.gap.draft(), "2");
        Ok(())
    }

    #[test]
    fn player_view_titles_queue() -> Result<()> {
        let catalog = Catalog::load()?;
        let request = PlayRequest::range(262, 3);
        let view = PlayerView::new(
            &request,
            &catalog,
            &AudioSource::default(),
            Box::new(OfflinePort::default()),
            Instant::now(),
        );
        assert_eq!(view.title, "Ayahs 2:255 - 2:257 (3 total)");
        assert_eq!(view.player.queue().len(), 3);
        Ok(())
    }

    #[test]
    fn player_view_gap_edits() -> Result<()> {
        let catalog = Catalog::load()?;
        let now = Instant::now();
        let mut view = PlayerView::new(
            &PlayRequest::range(1, 1),
            &catalog,
            &AudioSource::default(),
            Box::new(OfflinePort::default()),
            now,
        );
        view.gap_field.set_draft("120.5");
        view.commit_gap(now);
        assert_eq!(view.gap_field.value(), 120.5);
        assert_eq!(
            view.player.config().gap,
            std::time::Duration::from_secs_f64(120.5)
        );

        view.gap_field.set_draft("abc");
        view.commit_gap(now);
        assert_eq!(view.gap_field.value(), 120.5);

        view.nudge_gap(-200.0, now);
        assert_eq!(view.gap_field.value(), 0.0);
        Ok(())
    }
}
