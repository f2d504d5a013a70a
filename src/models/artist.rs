use super::name_contains;
use super::genre::{self, GenreOwner};
use crate::error::{Error, Result};
use crate::orm::{BoxFuture, Db, FromRow, Model};
use serde::Serialize;
use std::sync::Arc;

/// A performer who can be booked.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewArtist {
    pub name: String,
    pub city: String,
    pub state: String,
    pub genres: Vec<String>,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

const SELECT_ARTIST: &str = "SELECT id, name, city, state, phone, image_link, website, \
     facebook_link, seeking_venue, seeking_description FROM artist";

impl Artist {
    pub async fn all(db: &Db) -> Result<Vec<Artist>> {
        Ok(db.fetch_all(&format!("{SELECT_ARTIST} ORDER BY id")).await?)
    }

    pub async fn find(db: &Db, id: i64) -> Result<Artist> {
        sqlx::query_as(&format!("{SELECT_ARTIST} WHERE id = ?"))
            .bind(id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| Error::not_found(format!("artist {id}")))
    }

    pub async fn search(db: &Db, term: &str) -> Result<Vec<Artist>> {
        Ok(Artist::all(db)
            .await?
            .into_iter()
            .filter(|artist| name_contains(&artist.name, term))
            .collect())
    }

    pub async fn genres(&self, db: &Db) -> Result<Vec<String>> {
        genre::load(db.pool(), GenreOwner::Artist, self.id).await
    }

    pub async fn insert(db: &Db, artist: &NewArtist) -> Result<i64> {
        let mut tx = db.begin().await?;
        let id = sqlx::query(
            "INSERT INTO artist (name, city, state, phone, image_link, website, \
             facebook_link, seeking_venue, seeking_description) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&artist.name)
        .bind(&artist.city)
        .bind(&artist.state)
        .bind(&artist.phone)
        .bind(&artist.image_link)
        .bind(&artist.website)
        .bind(&artist.facebook_link)
        .bind(artist.seeking_venue)
        .bind(&artist.seeking_description)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        genre::replace(&mut tx, GenreOwner::Artist, id, &artist.genres).await?;
        tx.commit().await?;
        log::info!("Artist {} `{}` created", id, artist.name);
        Ok(id)
    }

    pub async fn update(db: &Db, id: i64, artist: &NewArtist) -> Result<()> {
        let mut tx = db.begin().await?;
        let affected = sqlx::query(
            "UPDATE artist SET name = ?, city = ?, state = ?, phone = ?, image_link = ?, \
             website = ?, facebook_link = ?, seeking_venue = ?, seeking_description = ? \
             WHERE id = ?",
        )
        .bind(&artist.name)
        .bind(&artist.city)
        .bind(&artist.state)
        .bind(&artist.phone)
        .bind(&artist.image_link)
        .bind(&artist.website)
        .bind(&artist.facebook_link)
        .bind(artist.seeking_venue)
        .bind(&artist.seeking_description)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if affected == 0 {
            return Err(Error::not_found(format!("artist {id}")));
        }
        genre::replace(&mut tx, GenreOwner::Artist, id, &artist.genres).await?;
        tx.commit().await?;
        log::info!("Artist {} updated", id);
        Ok(())
    }

    pub async fn delete(db: &Db, id: i64) -> Result<()> {
        let mut tx = db.begin().await?;
        let affected = sqlx::query("DELETE FROM artist WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(Error::not_found(format!("artist {id}")));
        }
        tx.commit().await?;
        log::info!("Artist {} deleted", id);
        Ok(())
    }
}

impl Model for Artist {
    fn table_name() -> &'static str {
        "artist"
    }

    fn create_table_sql() -> String {
        "CREATE TABLE IF NOT EXISTS artist (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            city VARCHAR(120) NOT NULL,
            state VARCHAR(120) NOT NULL,
            phone VARCHAR(120),
            image_link VARCHAR(500),
            website VARCHAR(120),
            facebook_link VARCHAR(120),
            seeking_venue BOOLEAN NOT NULL DEFAULT 0,
            seeking_description VARCHAR(500)
        )"
        .to_string()
    }

    fn columns() -> Vec<(String, String)> {
        vec![
            ("id".into(), "INTEGER".into()),
            ("name".into(), "TEXT NOT NULL DEFAULT ''".into()),
            ("city".into(), "VARCHAR(120) NOT NULL DEFAULT ''".into()),
            ("state".into(), "VARCHAR(120) NOT NULL DEFAULT ''".into()),
            ("phone".into(), "VARCHAR(120)".into()),
            ("image_link".into(), "VARCHAR(500)".into()),
            ("website".into(), "VARCHAR(120)".into()),
            ("facebook_link".into(), "VARCHAR(120)".into()),
            ("seeking_venue".into(), "BOOLEAN NOT NULL DEFAULT 0".into()),
            ("seeking_description".into(), "VARCHAR(500)".into()),
        ]
    }
}

pub fn migration(db: Arc<Db>) -> BoxFuture<'static, std::result::Result<(), sqlx::Error>> {
    Box::pin(async move { Artist::migrate(db).await })
}
