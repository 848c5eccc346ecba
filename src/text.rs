//! Verse text for the synchronized display and section names for the juz list.

use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use eyre::{Result, WrapErr};
use serde::Deserialize;

use crate::api;
use crate::models::Section;
use crate::queue::{PREAMBLE_TEXT, TextSlot};

#[derive(Debug, Clone, PartialEq)]
pub enum TextState {
    Loaded(String),
    Loading,
    Failed(String),
}

impl TextState {
    /// What a text row shows for this state.
    pub fn display(&self) -> String {
        match self {
            TextState::Loaded(text) => text.clone(),
            TextState::Loading => "Loading...".to_string(),
            TextState::Failed(message) => format!("Error: {}", message),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    text: String,
    #[serde(default)]
    verse_key: Option<String>,
}

/// Parse a text dump keyed by global verse index.
pub fn parse_text_table(json: &str) -> Result<HashMap<u32, String>> {
    let raw: HashMap<String, FileEntry> = serde_json::from_str(json)?;
    let mut table = HashMap::with_capacity(raw.len());
    for (key, entry) in raw {
        match key.trim().parse::<u32>() {
            Ok(global) if global > 0 => {
                table.insert(global, entry.text);
            }
            _ => log::debug!(
                "Skipping text entry `{}` ({})",
                key,
                entry.verse_key.unwrap_or_default()
            ),
        }
    }
    Ok(table)
}

type FetchResult = (u32, std::result::Result<String, String>);

pub struct TextStore {
    entries: HashMap<u32, TextState>,
    api_base: String,
    timeout: Duration,
    tx: Sender<FetchResult>,
    rx: Receiver<FetchResult>,
}

impl TextStore {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            entries: HashMap::new(),
            api_base: api_base.into(),
            timeout,
            tx,
            rx,
        }
    }

    /// Preload every verse found in a local text file.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let json = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading verse text from {}", path.display()))?;
        let table = parse_text_table(&json)?;
        let count = table.len();
        for (global, text) in table {
            self.entries.insert(global, TextState::Loaded(text));
        }
        log::info!("Loaded {} verses from {}", count, path.display());
        Ok(count)
    }

    pub fn get(&self, global: u32) -> Option<&TextState> {
        self.entries.get(&global)
    }

    pub fn insert(&mut self, global: u32, state: TextState) {
        self.entries.insert(global, state);
    }

    /// Start fetching every listed verse that is not known yet.
    pub fn request(&mut self, globals: &[u32]) {
        let missing: Vec<u32> = globals
            .iter()
            .copied()
            .filter(|g| !self.entries.contains_key(g))
            .collect();
        if missing.is_empty() {
            return;
        }
        for global in &missing {
            self.entries.insert(*global, TextState::Loading);
        }

        let tx = self.tx.clone();
        let base = self.api_base.clone();
        let timeout = self.timeout;
        std::thread::spawn(move || {
            let client = match api::build_client(timeout, &base) {
                Ok(client) => client,
                Err(err) => {
                    for global in missing {
                        let _ = tx.send((global, Err(err.to_string())));
                    }
                    return;
                }
            };
            for global in missing {
                let result = api::fetch_verse(&client, &base, global)
                    .map(|verse| api::strip_preamble(&verse.text).to_string())
                    .map_err(|err| err.to_string());
                if tx.send((global, result)).is_err() {
                    return;
                }
            }
        });
    }

    pub fn is_loading(&self) -> bool {
        self.entries.values().any(|state| *state == TextState::Loading)
    }

    /// Drain finished fetches; true when anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok((global, result)) = self.rx.try_recv() {
            let state = match result {
                Ok(text) => TextState::Loaded(text),
                Err(message) => {
                    log::warn!("Fetching text of verse {} failed: {}", global, message);
                    TextState::Failed(message)
                }
            };
            self.entries.insert(global, state);
            changed = true;
        }
        changed
    }

    /// Rows for the given slots, in order.
    pub fn rows(&self, slots: &[TextSlot]) -> Vec<TextRow> {
        slots
            .iter()
            .map(|slot| match slot {
                TextSlot::Preamble => TextRow {
                    text: PREAMBLE_TEXT.to_string(),
                    is_preamble: true,
                },
                TextSlot::Verse(global) => TextRow {
                    text: self
                        .get(*global)
                        .map(TextState::display)
                        .unwrap_or_else(|| TextState::Loading.display()),
                    is_preamble: false,
                },
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRow {
    pub text: String,
    pub is_preamble: bool,
}

type NameResult = (u32, std::result::Result<String, String>);

/// Display names for the section list, fetched once in the background.
pub struct SectionNames {
    names: HashMap<u32, TextState>,
    rx: Option<Receiver<NameResult>>,
}

impl SectionNames {
    pub fn new() -> Self {
        Self {
            names: HashMap::new(),
            rx: None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.rx.is_some()
    }

    pub fn start(&mut self, sections: &[Section], api_base: &str, timeout: Duration) {
        if self.is_started() {
            return;
        }
        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);

        let mut pending = Vec::new();
        for section in sections {
            match &section.name {
                Some(name) => {
                    self.names
                        .insert(section.number, TextState::Loaded(name.clone()));
                }
                None => {
                    self.names.insert(section.number, TextState::Loading);
                    pending.push(section.clone());
                }
            }
        }

        let base = api_base.to_string();
        std::thread::spawn(move || {
            let client = match api::build_client(timeout, &base) {
                Ok(client) => client,
                Err(err) => {
                    for section in pending {
                        let _ = tx.send((section.number, Err(err.to_string())));
                    }
                    return;
                }
            };
            for section in pending {
                let result = api::fetch_section_name(&client, &base, &section)
                    .map_err(|err| err.to_string());
                if tx.send((section.number, result)).is_err() {
                    return;
                }
            }
        });
    }

    pub fn poll(&mut self) -> bool {
        let Some(rx) = &self.rx else {
            return false;
        };
        let mut changed = false;
        while let Ok((number, result)) = rx.try_recv() {
            let state = match result {
                Ok(name) => TextState::Loaded(name),
                Err(message) => {
                    log::warn!("Fetching name of section {} failed: {}", number, message);
                    TextState::Failed(message)
                }
            };
            self.names.insert(number, state);
            changed = true;
        }
        changed
    }

    pub fn is_loading(&self) -> bool {
        self.names.values().any(|state| *state == TextState::Loading)
    }

    pub fn get(&self, number: u32) -> Option<&TextState> {
        self.names.get(&number)
    }

    /// Short label for list rows.
    pub fn label(&self, number: u32) -> String {
        match self.get(number) {
            Some(TextState::Loaded(name)) => name.clone(),
            Some(TextState::Failed(_)) => "Error".to_string(),
            Some(TextState::Loading) | None => "Loading...".to_string(),
        }
    }
}

impl Default for SectionNames {
    fn default() -> Self {
        Self::new()
    }
}
