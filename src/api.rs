//! Blocking helpers for the alquran.cloud text API.

use std::time::Duration;

use eyre::Result;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::models::Section;

/// Preamble prefix the API prepends to the first verse of most chapters.
pub const API_PREAMBLE_PREFIX: &str = "بِسۡمِ ٱللَّهِ ٱلرَّحۡمَـٰنِ ٱلرَّحِیمِ ";

/// Quarter-section marker that opens many section-initial verses.
pub const RUB_EL_HIZB: &str = "۞";

#[derive(Debug, Clone, PartialEq)]
pub struct VerseText {
    pub global: u32,
    pub text: String,
    pub verse_key: String,
}

#[derive(Debug, Deserialize)]
struct AyahResponse {
    data: AyahData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AyahData {
    number: u32,
    text: String,
    number_in_surah: u32,
    surah: SurahRef,
}

#[derive(Debug, Deserialize)]
struct SurahRef {
    number: u32,
}

pub fn build_client(timeout: Duration, base: &str) -> Result<Client> {
    let mut builder = Client::builder().timeout(timeout).user_agent("hifz");
    if base.starts_with("http://127.0.0.1") || base.starts_with("http://localhost") {
        builder = builder.no_proxy();
    }
    Ok(builder.build()?)
}

pub fn fetch_verse(client: &Client, base: &str, global: u32) -> Result<VerseText> {
    let url = format!("{}/ayah/{}", base.trim_end_matches('/'), global);
    let response = client.get(&url).send()?.error_for_status()?;
    let parsed: AyahResponse = response.json()?;
    Ok(VerseText {
        global: parsed.data.number,
        verse_key: format!("{}:{}", parsed.data.surah.number, parsed.data.number_in_surah),
        text: parsed.data.text,
    })
}

/// Display name for a section, derived from the text of its first verse.
pub fn fetch_section_name(client: &Client, base: &str, section: &Section) -> Result<String> {
    if let Some(name) = &section.name {
        return Ok(name.clone());
    }
    let verse = fetch_verse(client, base, section.first_ayah_index)?;
    Ok(short_name(&verse.text))
}

pub fn strip_preamble(text: &str) -> &str {
    text.strip_prefix(API_PREAMBLE_PREFIX).unwrap_or(text)
}

/// First two words of a verse, skipping the preamble and a leading marker.
///
/// Only a leading ۞ is dropped. Any other first word is kept as part of
/// the name, so a section opening mid-chapter without the marker still
/// reads from its first word.
pub fn short_name(text: &str) -> String {
    let text = strip_preamble(text);
    let mut words: Vec<&str> = text.split_whitespace().collect();
    if words.first() == Some(&RUB_EL_HIZB) {
        words.remove(0);
    }
    words.truncate(2);
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    fn read_request_line(stream: TcpStream) -> (TcpStream, String) {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        (reader.into_inner(), request_line)
    }

    fn write_json_response(stream: &mut TcpStream, status: &str, body: &str) {
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
    }

    #[test]
    fn strip_preamble_only_removes_exact_prefix() {
        let with = format!("{}ٱلۡحَمۡدُ لِلَّهِ", API_PREAMBLE_PREFIX);
        assert_eq!(strip_preamble(&with), "ٱلۡحَمۡدُ لِلَّهِ");
        assert_eq!(strip_preamble("سَيَقُولُ ٱلسُّفَهَآءُ"), "سَيَقُولُ ٱلسُّفَهَآءُ");
    }

    #[test]
    fn short_name_skips_marker_and_truncates() {
        assert_eq!(
            short_name("۞ سَيَقُولُ ٱلسُّفَهَآءُ مِنَ ٱلنَّاسِ"),
            "سَيَقُولُ ٱلسُّفَهَآءُ"
        );
        assert_eq!(short_name("تِلۡكَ ٱلرُّسُلُ فَضَّلۡنَا"), "تِلۡكَ ٱلرُّسُلُ");
        assert_eq!(short_name("قَدۡ"), "قَدۡ");
        let opening = format!("{}عَمَّ يَتَسَآءَلُونَ", API_PREAMBLE_PREFIX);
        assert_eq!(short_name(&opening), "عَمَّ يَتَسَآءَلُونَ");
    }

    #[test]
    fn fetch_verse_mock_http() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/v1", listener.local_addr().unwrap());

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let (mut stream, request_line) = read_request_line(stream);
            assert!(request_line.starts_with("GET /v1/ayah/262 "));
            let body = r#"{
              "code": 200,
              "status": "OK",
              "data": {
                "number": 262,
                "text": "ٱللَّهُ لَآ إِلَـٰهَ إِلَّا هُوَ",
                "numberInSurah": 255,
                "surah": { "number": 2, "englishName": "Al-Baqara" }
              }
            }"#;
            write_json_response(&mut stream, "200 OK", body);
        });

        let client = build_client(Duration::from_secs(2), &base).unwrap();
        let verse = fetch_verse(&client, &base, 262).expect("mock fetch should succeed");
        server.join().unwrap();

        assert_eq!(verse.global, 262);
        assert_eq!(verse.verse_key, "2:255");
        assert!(verse.text.starts_with("ٱللَّهُ"));
    }

    #[test]
    fn fetch_verse_reports_http_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let (mut stream, _) = read_request_line(stream);
            write_json_response(&mut stream, "404 Not Found", r#"{"code":404}"#);
        });

        let client = build_client(Duration::from_secs(2), &base).unwrap();
        let result = fetch_verse(&client, &base, 9999);
        server.join().unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn fetch_section_name_uses_fixed_name_without_request() {
        let section = Section {
            number: 1,
            first_ayah_index: 1,
            number_of_ayahs: 148,
            name: Some("الٓمّٓ".to_string()),
        };
        // No server is listening; a request would fail.
        let client = build_client(Duration::from_millis(200), "http://127.0.0.1:9").unwrap();
        let name = fetch_section_name(&client, "http://127.0.0.1:9", &section).unwrap();
        assert_eq!(name, "الٓمّٓ");
    }
}
