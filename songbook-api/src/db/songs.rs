//! Song persistence
//!
//! Every operation is one statement on one pooled connection, bounded by the
//! configured query timeout. Nothing spans calls and nothing is retried here.

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use songbook_common::db::{Song, SongInfo, SongInfoRow, SongRow, SONG_COLUMNS};
use songbook_common::{Error, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::query::{build_list_query, ListOptions, SqlArg};

/// Change to one optional column in an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Leave the stored value as it is
    Keep,
    /// Store NULL
    Clear,
    /// Store the value
    Set(T),
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        FieldUpdate::Keep
    }
}

/// Full update of one song; name and artist are always written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongUpdate {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub release: FieldUpdate<NaiveDate>,
    pub text: FieldUpdate<String>,
    pub link: FieldUpdate<String>,
}

/// Stateless access to the `songs` table
#[derive(Debug, Clone)]
pub struct SongRepository {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl SongRepository {
    pub fn new(pool: SqlitePool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Await one store round trip, failing with `Timeout` when it overruns
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result.map_err(|e| {
                let err = Error::from(e);
                warn!(operation, error = %err, "Store operation failed");
                err
            }),
            Err(_) => {
                warn!(operation, timeout = ?self.query_timeout, "Store operation timed out");
                Err(Error::Timeout {
                    operation,
                    elapsed: self.query_timeout,
                })
            }
        }
    }

    /// Insert a song with only its required fields, returning the new id
    pub async fn create(&self, name: &str, artist: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        debug!(%id, name, artist, "Creating song");

        let id: String = self
            .bounded(
                "create",
                sqlx::query_scalar(
                    "INSERT INTO songs (id, song_name, artist_name) VALUES (?, ?, ?) RETURNING id",
                )
                .bind(&id)
                .bind(name)
                .bind(artist)
                .fetch_one(&self.pool),
            )
            .await?;

        debug!(%id, "Song created");
        Ok(id)
    }

    /// Point lookup by id. A malformed id is simply not found.
    pub async fn get(&self, id: &str) -> Result<Song> {
        debug!(id, "Reading song");

        let sql = format!("SELECT {} FROM songs WHERE id = ?", SONG_COLUMNS);
        let row: Option<SongRow> = self
            .bounded(
                "get",
                sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool),
            )
            .await?;

        row.map(Song::from)
            .ok_or_else(|| Error::NotFound(format!("song {}", id)))
    }

    /// Apply `update` to its row and return the stored result
    pub async fn update(&self, update: &SongUpdate) -> Result<Song> {
        debug!(id = %update.id, "Updating song");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE songs SET song_name = ");
        qb.push_bind(update.name.clone());
        qb.push(", artist_name = ");
        qb.push_bind(update.artist.clone());

        match &update.release {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => {
                qb.push(", release_date = NULL");
            }
            FieldUpdate::Set(date) => {
                qb.push(", release_date = ");
                qb.push_bind(*date);
            }
        }
        push_text_update(&mut qb, "song_text", &update.text);
        push_text_update(&mut qb, "link", &update.link);

        qb.push(" WHERE id = ");
        qb.push_bind(update.id.clone());
        qb.push(" RETURNING ");
        qb.push(SONG_COLUMNS);

        let row: Option<SongRow> = self
            .bounded(
                "update",
                qb.build_query_as::<SongRow>().fetch_optional(&self.pool),
            )
            .await?;

        row.map(Song::from)
            .ok_or_else(|| Error::NotFound(format!("song {}", update.id)))
    }

    /// Delete by id, returning the deleted id
    pub async fn delete(&self, id: &str) -> Result<String> {
        debug!(id, "Deleting song");

        let deleted: Option<String> = self
            .bounded(
                "delete",
                sqlx::query_scalar("DELETE FROM songs WHERE id = ? RETURNING id")
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?;

        deleted.ok_or_else(|| Error::NotFound(format!("song {}", id)))
    }

    /// Filtered, sorted, paginated listing. No match is an empty list.
    pub async fn list(&self, options: &ListOptions) -> Result<Vec<Song>> {
        let built = build_list_query(options)?;
        debug!(sql = %built.sql, args = ?built.args, "Listing songs");

        let mut query = sqlx::query_as::<_, SongRow>(&built.sql);
        for arg in built.args {
            query = match arg {
                SqlArg::Text(s) => query.bind(s),
                SqlArg::Date(d) => query.bind(d),
                SqlArg::Int(i) => query.bind(i),
            };
        }

        let rows = self.bounded("list", query.fetch_all(&self.pool)).await?;
        Ok(rows.into_iter().map(Song::from).collect())
    }

    /// Release info by (name, artist). With duplicates the most recently
    /// inserted row wins.
    pub async fn info(&self, name: &str, artist: &str) -> Result<SongInfo> {
        debug!(name, artist, "Reading song info");

        let row: Option<SongInfoRow> = self
            .bounded(
                "info",
                sqlx::query_as(
                    "SELECT release_date, song_text, link FROM songs
                     WHERE song_name = ? AND artist_name = ?
                     ORDER BY rowid DESC LIMIT 1",
                )
                .bind(name)
                .bind(artist)
                .fetch_optional(&self.pool),
            )
            .await?;

        row.map(SongInfo::from)
            .ok_or_else(|| Error::NotFound(format!("song '{}' by '{}'", name, artist)))
    }

    /// Lyric text of one song, `""` when it has none
    pub async fn text(&self, id: &str) -> Result<String> {
        debug!(id, "Reading song text");

        let text: Option<Option<String>> = self
            .bounded(
                "text",
                sqlx::query_scalar("SELECT song_text FROM songs WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool),
            )
            .await?;

        text.map(Option::unwrap_or_default)
            .ok_or_else(|| Error::NotFound(format!("song {}", id)))
    }
}

fn push_text_update(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, update: &FieldUpdate<String>) {
    match update {
        FieldUpdate::Keep => {}
        FieldUpdate::Clear => {
            qb.push(format!(", {} = NULL", column));
        }
        FieldUpdate::Set(value) => {
            qb.push(format!(", {} = ", column));
            qb.push_bind(value.clone());
        }
    }
}
