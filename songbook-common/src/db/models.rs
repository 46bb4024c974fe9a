//! Database models and the row-to-API mapping
//!
//! Rows carry nullable columns; the API types carry plain strings where an
//! absent value is `""`. The `From` impls here are the only place that
//! conversion happens, so point lookups, update `RETURNING` rows and list
//! scans cannot diverge.

use crate::release_date::format_release_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column list matching [`SongRow`] field order
pub const SONG_COLUMNS: &str = "id, song_name, artist_name, release_date, song_text, link";

/// One row of the `songs` table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SongRow {
    pub id: String,
    pub song_name: String,
    pub artist_name: String,
    pub release_date: Option<NaiveDate>,
    pub song_text: Option<String>,
    pub link: Option<String>,
}

/// Release info columns for a (song, group) lookup
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SongInfoRow {
    pub release_date: Option<NaiveDate>,
    pub song_text: Option<String>,
    pub link: Option<String>,
}

/// API representation of a song
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    #[serde(rename = "song")]
    pub name: String,
    #[serde(rename = "group")]
    pub artist: String,
    #[serde(rename = "releaseDate")]
    pub release: String,
    pub text: String,
    pub link: String,
}

/// API representation of the info lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongInfo {
    #[serde(rename = "releaseDate")]
    pub release: String,
    pub text: String,
    pub link: String,
}

impl From<SongRow> for Song {
    fn from(row: SongRow) -> Self {
        Self {
            id: row.id,
            name: row.song_name,
            artist: row.artist_name,
            release: format_release_date(row.release_date),
            text: row.song_text.unwrap_or_default(),
            link: row.link.unwrap_or_default(),
        }
    }
}

impl From<SongInfoRow> for SongInfo {
    fn from(row: SongInfoRow) -> Self {
        Self {
            release: format_release_date(row.release_date),
            text: row.song_text.unwrap_or_default(),
            link: row.link.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> SongRow {
        SongRow {
            id: "0b7e2c4a-1111-4222-8333-944445555666".to_string(),
            song_name: "Supermassive Black Hole".to_string(),
            artist_name: "Muse".to_string(),
            release_date: None,
            song_text: None,
            link: None,
        }
    }

    #[test]
    fn test_nulls_become_empty_strings() {
        let song = Song::from(row());
        assert_eq!(song.name, "Supermassive Black Hole");
        assert_eq!(song.artist, "Muse");
        assert_eq!(song.release, "");
        assert_eq!(song.text, "");
        assert_eq!(song.link, "");
    }

    #[test]
    fn test_populated_row() {
        let song = Song::from(SongRow {
            release_date: NaiveDate::from_ymd_opt(2006, 7, 16),
            song_text: Some("Ooh baby\n\nYou set my soul alight".to_string()),
            link: Some("https://www.youtube.com/watch?v=Xsp3_a-PMTw".to_string()),
            ..row()
        });
        assert_eq!(song.release, "16.07.2006");
        assert_eq!(song.text, "Ooh baby\n\nYou set my soul alight");
        assert_eq!(song.link, "https://www.youtube.com/watch?v=Xsp3_a-PMTw");
    }

    #[test]
    fn test_song_json_field_names() {
        let json = serde_json::to_value(Song::from(row())).unwrap();
        assert_eq!(json["song"], "Supermassive Black Hole");
        assert_eq!(json["group"], "Muse");
        assert_eq!(json["releaseDate"], "");
        assert!(json.get("name").is_none());
    }

    #[test]
    fn test_info_mapping() {
        let info = SongInfo::from(SongInfoRow {
            release_date: NaiveDate::from_ymd_opt(1973, 1, 5),
            song_text: None,
            link: Some("https://example.org".to_string()),
        });
        assert_eq!(info.release, "05.01.1973");
        assert_eq!(info.text, "");
        assert_eq!(info.link, "https://example.org");
    }
}
