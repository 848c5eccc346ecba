//! Plain-text rendering of a route for `--dump`.

use std::io::Write;

use eyre::Result;

use crate::catalog::Catalog;
use crate::models::{Division, DivisionKind};
use crate::queue::{AudioSource, PlaybackQueue};
use crate::route::Route;

pub const EMPTY_QUEUE_MESSAGE: &str = "No Ayahs selected for playback.";

pub fn dump_route(
    route: &Route,
    catalog: &Catalog,
    source: &AudioSource,
    out: &mut impl Write,
) -> Result<()> {
    match route {
        Route::Chapters => {
            for chapter in catalog.chapters() {
                writeln!(
                    out,
                    "{:>3}  {:<20} {:<28} {:>3} ayahs  {}",
                    chapter.number,
                    chapter.english_name,
                    chapter.english_name_translation,
                    chapter.number_of_ayahs,
                    chapter.revelation_type.map(|r| r.label()).unwrap_or("")
                )?;
            }
        }
        Route::Sections => {
            for section in catalog.sections() {
                let start = catalog
                    .verse_key(section.first_ayah_index)
                    .unwrap_or_default();
                writeln!(
                    out,
                    "Juz {:>2}  starts {:<7} {:>3} ayahs",
                    section.number, start, section.number_of_ayahs
                )?;
            }
        }
        Route::Chapter(number) => {
            dump_division(&catalog.division(DivisionKind::Chapter, *number), out)?;
        }
        Route::Section(number) => {
            dump_division(&catalog.division(DivisionKind::Section, *number), out)?;
        }
        Route::Play(request) => {
            let queue = PlaybackQueue::build(catalog, source, request);
            if queue.is_empty() {
                writeln!(out, "{}", EMPTY_QUEUE_MESSAGE)?;
            }
            for url in queue.urls() {
                writeln!(out, "{}", url)?;
            }
        }
    }
    Ok(())
}

fn dump_division(division: &Division, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "{} {}: {} ({} ayahs)",
        division.kind.label(),
        division.number,
        division.title,
        division.verse_count
    )?;
    for group in &division.groups {
        let first = group.ayahs.first().copied().unwrap_or(0);
        let last = group.ayahs.last().copied().unwrap_or(0);
        writeln!(
            out,
            "  {:>3} {:<20} {}-{}",
            group.chapter, group.heading, first, last
        )?;
    }
    Ok(())
}
