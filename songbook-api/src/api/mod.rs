//! HTTP API handlers for songbook-api

pub mod health;
pub mod request_id;
pub mod songs;

pub use health::health_routes;
pub use request_id::{RequestId, REQUEST_ID_HEADER};
pub use songs::{
    create_song, delete_song, get_couplet, get_song, list_songs, missing_song_id, song_info,
    update_song,
};
