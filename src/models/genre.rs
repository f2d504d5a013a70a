//! Genre lists for venues and artists.
//!
//! Each owner keeps its genres as ordered rows in a join table, so a genre
//! name is stored verbatim and never split or re-joined.

use crate::error::Result;
use crate::orm::{BoxFuture, Db, Model};
use sqlx::{Executor, Sqlite, SqliteConnection};
use std::sync::Arc;

pub const GENRE_CHOICES: &[&str] = &[
    "Alternative",
    "Blues",
    "Classical",
    "Country",
    "Electronic",
    "Folk",
    "Funk",
    "Hip-Hop",
    "Heavy Metal",
    "Instrumental",
    "Jazz",
    "Musical Theatre",
    "Pop",
    "Punk",
    "R&B",
    "Reggae",
    "Rock n Roll",
    "Soul",
    "Other",
];

pub fn is_known_genre(name: &str) -> bool {
    GENRE_CHOICES.contains(&name)
}

/// The entity a genre list belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenreOwner {
    Venue,
    Artist,
}

impl GenreOwner {
    fn table(self) -> &'static str {
        match self {
            GenreOwner::Venue => VenueGenre::table_name(),
            GenreOwner::Artist => ArtistGenre::table_name(),
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            GenreOwner::Venue => "venue_id",
            GenreOwner::Artist => "artist_id",
        }
    }
}

/// Genres of one owner, in submission order.
pub async fn load<'e, E>(executor: E, owner: GenreOwner, owner_id: i64) -> Result<Vec<String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<(String,)> = sqlx::query_as(&format!(
        "SELECT genre FROM {} WHERE {} = ? ORDER BY position",
        owner.table(),
        owner.owner_column()
    ))
    .bind(owner_id)
    .fetch_all(executor)
    .await?;
    Ok(rows.into_iter().map(|(genre,)| genre).collect())
}

/// Replace the genre list of one owner. Meant to run inside the owner's write transaction.
pub async fn replace(
    conn: &mut SqliteConnection,
    owner: GenreOwner,
    owner_id: i64,
    genres: &[String],
) -> Result<()> {
    sqlx::query(&format!(
        "DELETE FROM {} WHERE {} = ?",
        owner.table(),
        owner.owner_column()
    ))
    .bind(owner_id)
    .execute(&mut *conn)
    .await?;

    let insert = format!(
        "INSERT INTO {} ({}, position, genre) VALUES (?, ?, ?)",
        owner.table(),
        owner.owner_column()
    );
    for (position, genre) in genres.iter().enumerate() {
        sqlx::query(&insert)
            .bind(owner_id)
            .bind(position as i64)
            .bind(genre)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub struct VenueGenre;

impl Model for VenueGenre {
    fn table_name() -> &'static str {
        "venue_genre"
    }

    fn create_table_sql() -> String {
        "CREATE TABLE IF NOT EXISTS venue_genre (
            venue_id INTEGER NOT NULL REFERENCES venue(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            genre TEXT NOT NULL,
            PRIMARY KEY (venue_id, position)
        )"
        .to_string()
    }

    fn columns() -> Vec<(String, String)> {
        vec![
            ("venue_id".into(), "INTEGER".into()),
            ("position".into(), "INTEGER".into()),
            ("genre".into(), "TEXT".into()),
        ]
    }
}

pub struct ArtistGenre;

impl Model for ArtistGenre {
    fn table_name() -> &'static str {
        "artist_genre"
    }

    fn create_table_sql() -> String {
        "CREATE TABLE IF NOT EXISTS artist_genre (
            artist_id INTEGER NOT NULL REFERENCES artist(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            genre TEXT NOT NULL,
            PRIMARY KEY (artist_id, position)
        )"
        .to_string()
    }

    fn columns() -> Vec<(String, String)> {
        vec![
            ("artist_id".into(), "INTEGER".into()),
            ("position".into(), "INTEGER".into()),
            ("genre".into(), "TEXT".into()),
        ]
    }
}

pub fn venue_genre_migration(
    db: Arc<Db>,
) -> BoxFuture<'static, std::result::Result<(), sqlx::Error>> {
    Box::pin(async move { VenueGenre::migrate(db).await })
}

pub fn artist_genre_migration(
    db: Arc<Db>,
) -> BoxFuture<'static, std::result::Result<(), sqlx::Error>> {
    Box::pin(async move { ArtistGenre::migrate(db).await })
}
