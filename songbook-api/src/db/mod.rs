//! Store access for the HTTP layer

mod songs;

pub use songs::{FieldUpdate, SongRepository, SongUpdate};
