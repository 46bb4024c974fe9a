//! Song endpoints
//!
//! Handlers only translate between HTTP and the repository: parse and
//! validate boundary input, call one repository operation, shape the JSON.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use songbook_common::db::{Song, SongInfo};
use songbook_common::release_date::parse_release_date;
use songbook_common::Error;
use tracing::info;

use super::request_id::RequestId;
use crate::couplet::{couplet, parse_couplet_index};
use crate::db::{FieldUpdate, SongUpdate};
use crate::error::{ApiError, ApiResult, WithRequestId};
use crate::pagination::Pagination;
use crate::query::{ListOptions, SortOptions, DEFAULT_SORT_FIELD, DEFAULT_SORT_ORDER};
use crate::AppState;

/// Query keys that steer listing instead of filtering
const RESERVED_LIST_KEYS: [&str; 5] = ["sort_by", "sort_order", "limit", "offset", "page_token"];

/// `{song, group}` as sent to create and info
#[derive(Debug, Default, Deserialize)]
pub struct SongKeyRequest {
    pub song: Option<String>,
    pub group: Option<String>,
}

/// PUT body. Optional fields distinguish absent (keep) from `null` (clear).
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSongRequest {
    pub id: Option<String>,
    pub song: Option<String>,
    pub group: Option<String>,
    #[serde(
        default,
        rename = "releaseDate",
        alias = "release_date",
        deserialize_with = "present"
    )]
    pub release: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub text: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub link: Option<Option<String>>,
}

/// Marks a field as present, keeping an explicit `null` as `Some(None)`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct SongIdResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct SongListResponse {
    pub songs: Vec<Song>,
}

#[derive(Debug, Serialize)]
pub struct CoupletResponse {
    pub id: String,
    #[serde(rename = "coupletId")]
    pub couplet_id: usize,
    pub couplet: String,
}

/// Present and not blank
fn required(name: &str, value: Option<String>) -> songbook_common::Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::InvalidInput(format!("{} is required", name))),
    }
}

/// Absent keeps, `null` or `""` clears, anything else sets
fn text_update(value: Option<Option<String>>) -> FieldUpdate<String> {
    match value {
        None => FieldUpdate::Keep,
        Some(None) => FieldUpdate::Clear,
        Some(Some(v)) if v.is_empty() => FieldUpdate::Clear,
        Some(Some(v)) => FieldUpdate::Set(v),
    }
}

impl UpdateSongRequest {
    /// Validate into a repository update; a bad date fails before any query
    pub fn into_update(self) -> songbook_common::Result<SongUpdate> {
        let release = match text_update(self.release) {
            FieldUpdate::Keep => FieldUpdate::Keep,
            FieldUpdate::Clear => FieldUpdate::Clear,
            FieldUpdate::Set(raw) => FieldUpdate::Set(parse_release_date(&raw)?),
        };

        Ok(SongUpdate {
            id: required("id", self.id)?,
            name: required("song", self.song)?,
            artist: required("group", self.group)?,
            release,
            text: text_update(self.text),
            link: text_update(self.link),
        })
    }
}

/// Split list query parameters into sort, pagination and filters.
/// Empty filter values are ignored.
pub fn list_options(params: &HashMap<String, String>) -> songbook_common::Result<ListOptions> {
    let param = |key: &str| params.get(key).map(String::as_str).filter(|v| !v.is_empty());

    let pagination = Pagination::parse(param("limit"), param("offset"), param("page_token"))?;
    let sort = SortOptions {
        field: param("sort_by").unwrap_or(DEFAULT_SORT_FIELD).to_string(),
        order: param("sort_order").unwrap_or(DEFAULT_SORT_ORDER).to_string(),
    };
    let filters = params
        .iter()
        .filter(|(key, value)| !RESERVED_LIST_KEYS.contains(&key.as_str()) && !value.is_empty())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(ListOptions {
        filters,
        sort,
        pagination,
    })
}

/// POST /api/song
pub async fn create_song(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    payload: Result<Json<SongKeyRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SongIdResponse>)> {
    let Json(payload) = payload.with_request_id(&request_id)?;
    let name = required("song", payload.song).with_request_id(&request_id)?;
    let artist = required("group", payload.group).with_request_id(&request_id)?;

    let id = state
        .songs
        .create(&name, &artist)
        .await
        .with_request_id(&request_id)?;

    info!(%request_id, %id, "Song created");
    Ok((StatusCode::CREATED, Json(SongIdResponse { id })))
}

/// GET /api/song/:id
pub async fn get_song(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    Path(id): Path<String>,
) -> ApiResult<Json<Song>> {
    let song = state.songs.get(&id).await.with_request_id(&request_id)?;
    Ok(Json(song))
}

/// PUT /api/song
pub async fn update_song(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    payload: Result<Json<UpdateSongRequest>, JsonRejection>,
) -> ApiResult<Json<Song>> {
    let Json(payload) = payload.with_request_id(&request_id)?;
    let update = payload.into_update().with_request_id(&request_id)?;

    let song = state
        .songs
        .update(&update)
        .await
        .with_request_id(&request_id)?;

    info!(%request_id, id = %song.id, "Song updated");
    Ok(Json(song))
}

/// DELETE /api/song/:id
pub async fn delete_song(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    Path(id): Path<String>,
) -> ApiResult<Json<SongIdResponse>> {
    let id = state.songs.delete(&id).await.with_request_id(&request_id)?;

    info!(%request_id, %id, "Song deleted");
    Ok(Json(SongIdResponse { id }))
}

/// GET /api/song/ (no id)
pub async fn missing_song_id(RequestId(request_id): RequestId) -> ApiError {
    ApiError::new(
        request_id,
        Error::InvalidInput("song id is required".to_string()),
    )
}

/// GET /api/song/info
///
/// `song` and `group` come from the query string, or from a JSON body when
/// the query string names neither.
pub async fn song_info(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    query: Result<Query<SongKeyRequest>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Json<SongInfo>> {
    let Query(mut key) = query.with_request_id(&request_id)?;

    if key.song.is_none() && key.group.is_none() && !body.is_empty() {
        key = serde_json::from_slice(&body)
            .map_err(|e| Error::InvalidInput(format!("invalid JSON body: {}", e)))
            .with_request_id(&request_id)?;
    }

    let name = required("song", key.song).with_request_id(&request_id)?;
    let artist = required("group", key.group).with_request_id(&request_id)?;

    let info = state
        .songs
        .info(&name, &artist)
        .await
        .with_request_id(&request_id)?;
    Ok(Json(info))
}

/// GET /api/songs
pub async fn list_songs(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> ApiResult<Json<SongListResponse>> {
    let Query(params) = query.with_request_id(&request_id)?;
    let options = list_options(&params).with_request_id(&request_id)?;

    let songs = state
        .songs
        .list(&options)
        .await
        .with_request_id(&request_id)?;
    Ok(Json(SongListResponse { songs }))
}

#[derive(Debug, Deserialize)]
pub struct CoupletQuery {
    pub couplet_id: Option<String>,
}

/// GET /api/song/:id/couplet
pub async fn get_couplet(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    Path(id): Path<String>,
    query: Result<Query<CoupletQuery>, QueryRejection>,
) -> ApiResult<Json<CoupletResponse>> {
    let Query(query) = query.with_request_id(&request_id)?;
    let index = parse_couplet_index(query.couplet_id.as_deref()).with_request_id(&request_id)?;

    let text = state.songs.text(&id).await.with_request_id(&request_id)?;
    let verse = couplet(&text, index).with_request_id(&request_id)?;

    Ok(Json(CoupletResponse {
        id,
        couplet_id: index,
        couplet: verse,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_update_absent_null_and_empty() {
        let request: UpdateSongRequest = serde_json::from_str(
            r#"{"id":"x","song":"Numb","group":"Linkin Park","text":null,"link":""}"#,
        )
        .unwrap();
        let update = request.into_update().unwrap();

        assert_eq!(update.release, FieldUpdate::Keep);
        assert_eq!(update.text, FieldUpdate::Clear);
        assert_eq!(update.link, FieldUpdate::Clear);
    }

    #[test]
    fn test_update_release_date_alias() {
        let request: UpdateSongRequest = serde_json::from_str(
            r#"{"id":"x","song":"Numb","group":"Linkin Park","release_date":"25.03.2003"}"#,
        )
        .unwrap();
        let update = request.into_update().unwrap();
        assert_eq!(
            update.release,
            FieldUpdate::Set(NaiveDate::from_ymd_opt(2003, 3, 25).unwrap())
        );
    }

    #[test]
    fn test_update_rejects_bad_date_and_missing_keys() {
        let request: UpdateSongRequest = serde_json::from_str(
            r#"{"id":"x","song":"Numb","group":"Linkin Park","releaseDate":"2003-03-25"}"#,
        )
        .unwrap();
        assert!(request.into_update().unwrap_err().is_validation());

        let request: UpdateSongRequest =
            serde_json::from_str(r#"{"id":"x","song":"Numb"}"#).unwrap();
        assert!(matches!(
            request.into_update(),
            Err(Error::InvalidInput(msg)) if msg.contains("group")
        ));
    }

    #[test]
    fn test_blank_song_or_group_rejected() {
        let request: UpdateSongRequest =
            serde_json::from_str(r#"{"id":"x","song":"   ","group":"Muse"}"#).unwrap();
        assert!(matches!(
            request.into_update(),
            Err(Error::InvalidInput(msg)) if msg.contains("song")
        ));

        assert!(required("group", Some("\t \n".to_string())).is_err());
        assert_eq!(required("group", Some("Muse".to_string())).unwrap(), "Muse");
    }

    #[test]
    fn test_list_options_split() {
        let options = list_options(&params(&[
            ("sort_by", "song"),
            ("sort_order", "asc"),
            ("limit", "5"),
            ("group", "Muse"),
            ("link", ""),
        ]))
        .unwrap();

        assert_eq!(options.sort.field, "song");
        assert_eq!(options.sort.order, "asc");
        assert_eq!(options.pagination.limit, 5);
        assert_eq!(options.filters.len(), 1);
        assert_eq!(options.filters["group"], "Muse");
    }

    #[test]
    fn test_list_options_defaults() {
        let options = list_options(&params(&[("sort_by", ""), ("limit", "")])).unwrap();
        assert_eq!(options, ListOptions::default());
    }
}
