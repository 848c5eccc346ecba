//! Turning a play request into the ordered list of clips to play.

use std::collections::BTreeSet;

use crate::catalog::Catalog;
use crate::route::{PlayRequest, Verses};
use crate::settings::Settings;

/// The chapter 1 verse whose clip doubles as the preamble.
pub const PREAMBLE_VERSE: u32 = 1;

/// First verse of chapter 9, which is recited without the preamble.
///
/// Kept literal; `catalog` tests check it against the chapter table.
pub const NO_PREAMBLE_VERSE: u32 = 1236;

pub const PREAMBLE_TEXT: &str = "بِسْمِ ٱللَّهِ ٱلرَّحْمَٰنِ ٱلرَّحِيمِ";

/// Where verse clips live: `https://<host>/quran/audio/<quality>/<reciter>/<n>.mp3`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSource {
    pub cdn_host: String,
    pub quality: String,
    pub reciter: String,
}

impl AudioSource {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            cdn_host: settings.cdn_host.clone(),
            quality: settings.audio_quality.clone(),
            reciter: settings.reciter.clone(),
        }
    }

    pub fn verse_url(&self, global: u32) -> String {
        format!(
            "https://{}/quran/audio/{}/{}/{}.mp3",
            self.cdn_host.trim_end_matches('/'),
            self.quality,
            self.reciter,
            global
        )
    }

    pub fn preamble_url(&self) -> String {
        self.verse_url(PREAMBLE_VERSE)
    }
}

impl Default for AudioSource {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// Preamble played ahead of the verse `before`.
    Preamble { before: u32 },
    Verse(u32),
}

impl TrackKind {
    /// Verse this track belongs to; a preamble belongs to the verse it precedes.
    pub fn verse(&self) -> u32 {
        match self {
            TrackKind::Preamble { before } => *before,
            TrackKind::Verse(global) => *global,
        }
    }

    pub fn is_preamble(&self) -> bool {
        matches!(self, TrackKind::Preamble { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub url: String,
    pub kind: TrackKind,
}

/// One display row of the synchronized text, index-aligned with the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSlot {
    Preamble,
    Verse(u32),
}

/// Whether the preamble is played before `global`.
pub fn needs_preamble(catalog: &Catalog, global: u32) -> bool {
    global != PREAMBLE_VERSE && global != NO_PREAMBLE_VERSE && catalog.is_chapter_start(global)
}

/// Global verse indices a request covers, ascending, without duplicates.
///
/// Verses past the end of the text are dropped.
pub fn requested_verses(catalog: &Catalog, start: u32, verses: &Verses) -> Vec<u32> {
    let total = catalog.total_verses();
    if start == 0 || start > total {
        return Vec::new();
    }
    match verses {
        Verses::Count(count) => {
            let end = start.saturating_add(*count).min(total + 1);
            (start..end).collect()
        }
        Verses::Offsets(offsets) => offsets
            .iter()
            .filter_map(|offset| start.checked_add(*offset))
            .filter(|global| *global <= total)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackQueue {
    tracks: Vec<Track>,
    verse_count: usize,
}

impl PlaybackQueue {
    pub fn build(catalog: &Catalog, source: &AudioSource, request: &PlayRequest) -> Self {
        Self::build_verses(catalog, source, request.start, &request.verses)
    }

    pub fn build_verses(catalog: &Catalog, source: &AudioSource, start: u32, verses: &Verses) -> Self {
        let globals = requested_verses(catalog, start, verses);
        let mut tracks = Vec::with_capacity(globals.len() + 1);
        for &global in &globals {
            if needs_preamble(catalog, global) {
                tracks.push(Track {
                    url: source.preamble_url(),
                    kind: TrackKind::Preamble { before: global },
                });
            }
            tracks.push(Track {
                url: source.verse_url(global),
                kind: TrackKind::Verse(global),
            });
        }
        Self {
            tracks,
            verse_count: globals.len(),
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Number of verses, not counting inserted preambles.
    pub fn verse_count(&self) -> usize {
        self.verse_count
    }

    pub fn urls(&self) -> Vec<&str> {
        self.tracks.iter().map(|t| t.url.as_str()).collect()
    }

    /// Text rows for the synchronized display; row `i` shows track `i`.
    pub fn text_slots(&self) -> Vec<TextSlot> {
        self.tracks
            .iter()
            .map(|track| match track.kind {
                TrackKind::Preamble { .. } => TextSlot::Preamble,
                TrackKind::Verse(global) => TextSlot::Verse(global),
            })
            .collect()
    }
}
