//! In-app routes and the `/play` query encoding.

use std::fmt;

use reqwest::Url;
use thiserror::Error;

const ROUTE_BASE: &str = "http://hifz.local/";

#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("Could not parse route '{0}'")]
    Malformed(String),
    #[error("Unknown route '{0}'")]
    UnknownPath(String),
}

/// Which verses a play request covers, relative to its start.
#[derive(Debug, Clone, PartialEq)]
pub enum Verses {
    /// `count` consecutive verses from the start.
    Count(u32),
    /// 0-based offsets from the start.
    Offsets(Vec<u32>),
}

/// Everything the player view needs, as carried by `/play?...`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequest {
    pub start: u32,
    pub verses: Verses,
    pub gap: f64,
    pub repeat: u32,
    pub show_text: bool,
}

impl PlayRequest {
    pub fn range(start: u32, count: u32) -> Self {
        Self {
            start,
            verses: Verses::Count(count),
            gap: 0.0,
            repeat: 1,
            show_text: false,
        }
    }

    fn from_query(pairs: impl Iterator<Item = (String, String)>) -> Self {
        let mut start = None;
        let mut count = None;
        let mut ayaat = None;
        let mut gap = None;
        let mut repeat = None;
        let mut show = None;

        for (key, value) in pairs {
            match key.as_str() {
                "start" => start = Some(value),
                "count" => count = Some(value),
                "ayaat" => ayaat = Some(value),
                "gap" => gap = Some(value),
                "rep" => repeat = Some(value),
                "show" => show = Some(value),
                _ => {}
            }
        }

        let verses = match ayaat {
            Some(list) => Verses::Offsets(parse_offsets(&list)),
            None => Verses::Count(positive_or(count.as_deref(), 1)),
        };

        Self {
            start: positive_or(start.as_deref(), 1),
            verses,
            gap: gap
                .as_deref()
                .and_then(|g| g.trim().parse::<f64>().ok())
                .filter(|g| g.is_finite())
                .unwrap_or(0.0),
            repeat: positive_or(repeat.as_deref(), 1),
            show_text: show.as_deref() == Some("true"),
        }
    }
}

/// Missing, unparseable and zero values fall back to `default`.
fn positive_or(value: Option<&str>, default: u32) -> u32 {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(default)
}

fn parse_offsets(list: &str) -> Vec<u32> {
    list.split(',')
        .filter_map(|item| item.trim().parse::<u32>().ok())
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Chapters,
    Chapter(u32),
    Sections,
    Section(u32),
    Play(PlayRequest),
}

impl Default for Route {
    fn default() -> Self {
        Route::Chapters
    }
}

impl Route {
    /// Parse a path such as `/surah/18` or `/play?start=1&count=7`.
    ///
    /// Non-numeric chapter or section numbers map to 0, which every view
    /// renders as its "not found" placeholder.
    pub fn parse(input: &str) -> Result<Self, RouteError> {
        let base = Url::parse(ROUTE_BASE).map_err(|_| RouteError::Malformed(input.to_string()))?;
        let url = base
            .join(input.trim())
            .map_err(|_| RouteError::Malformed(input.to_string()))?;
        if url.host_str() != base.host_str() {
            return Err(RouteError::Malformed(input.to_string()));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|segment| !segment.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [] => Ok(Route::Chapters),
            ["surah", number] => Ok(Route::Chapter(number.parse().unwrap_or(0))),
            ["juz"] => Ok(Route::Sections),
            ["juz", number] => Ok(Route::Section(number.parse().unwrap_or(0))),
            ["play"] => Ok(Route::Play(PlayRequest::from_query(
                url.query_pairs()
                    .map(|(k, v)| (k.into_owned(), v.into_owned())),
            ))),
            _ => Err(RouteError::UnknownPath(input.to_string())),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Chapters => write!(f, "/"),
            Route::Chapter(n) => write!(f, "/surah/{}", n),
            Route::Sections => write!(f, "/juz"),
            Route::Section(n) => write!(f, "/juz/{}", n),
            Route::Play(request) => {
                let mut url = Url::parse(ROUTE_BASE).map_err(|_| fmt::Error)?;
                url.set_path("/play");
                {
                    let mut query = url.query_pairs_mut();
                    query.append_pair("start", &request.start.to_string());
                    match &request.verses {
                        Verses::Count(count) => {
                            query.append_pair("count", &count.to_string());
                        }
                        Verses::Offsets(offsets) => {
                            let list = offsets
                                .iter()
                                .map(u32::to_string)
                                .collect::<Vec<_>>()
                                .join(",");
                            query.append_pair("ayaat", &list);
                        }
                    }
                    query.append_pair("gap", &request.gap.to_string());
                    query.append_pair("rep", &request.repeat.to_string());
                    query.append_pair("show", if request.show_text { "true" } else { "false" });
                }
                write!(f, "{}?{}", url.path(), url.query().unwrap_or_default())
            }
        }
    }
}
