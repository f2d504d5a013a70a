use super::name_contains;
use super::genre::{self, GenreOwner};
use crate::error::{Error, Result};
use crate::orm::{BoxFuture, Db, FromRow, Model};
use serde::Serialize;
use std::sync::Arc;

/// A place that can host shows.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

/// Every mutable field of a venue, genres included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewVenue {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub genres: Vec<String>,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

const SELECT_VENUE: &str = "SELECT id, name, city, state, address, phone, image_link, website, \
     facebook_link, seeking_talent, seeking_description FROM venue";

impl Venue {
    /// All venues in id order.
    pub async fn all(db: &Db) -> Result<Vec<Venue>> {
        Ok(db.fetch_all(&format!("{SELECT_VENUE} ORDER BY id")).await?)
    }

    pub async fn find(db: &Db, id: i64) -> Result<Venue> {
        sqlx::query_as(&format!("{SELECT_VENUE} WHERE id = ?"))
            .bind(id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| Error::not_found(format!("venue {id}")))
    }

    /// Case-insensitive substring match on the name.
    pub async fn search(db: &Db, term: &str) -> Result<Vec<Venue>> {
        Ok(Venue::all(db)
            .await?
            .into_iter()
            .filter(|venue| name_contains(&venue.name, term))
            .collect())
    }

    pub async fn genres(&self, db: &Db) -> Result<Vec<String>> {
        genre::load(db.pool(), GenreOwner::Venue, self.id).await
    }

    /// Insert the venue and its genres in one transaction, returning the new id.
    pub async fn insert(db: &Db, venue: &NewVenue) -> Result<i64> {
        let mut tx = db.begin().await?;
        let id = sqlx::query(
            "INSERT INTO venue (name, city, state, address, phone, image_link, website, \
             facebook_link, seeking_talent, seeking_description) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&venue.name)
        .bind(&venue.city)
        .bind(&venue.state)
        .bind(&venue.address)
        .bind(&venue.phone)
        .bind(&venue.image_link)
        .bind(&venue.website)
        .bind(&venue.facebook_link)
        .bind(venue.seeking_talent)
        .bind(&venue.seeking_description)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        genre::replace(&mut tx, GenreOwner::Venue, id, &venue.genres).await?;
        tx.commit().await?;
        log::info!("Venue {} `{}` created", id, venue.name);
        Ok(id)
    }

    /// Overwrite every mutable field of an existing venue.
    pub async fn update(db: &Db, id: i64, venue: &NewVenue) -> Result<()> {
        let mut tx = db.begin().await?;
        let affected = sqlx::query(
            "UPDATE venue SET name = ?, city = ?, state = ?, address = ?, phone = ?, \
             image_link = ?, website = ?, facebook_link = ?, seeking_talent = ?, \
             seeking_description = ? WHERE id = ?",
        )
        .bind(&venue.name)
        .bind(&venue.city)
        .bind(&venue.state)
        .bind(&venue.address)
        .bind(&venue.phone)
        .bind(&venue.image_link)
        .bind(&venue.website)
        .bind(&venue.facebook_link)
        .bind(venue.seeking_talent)
        .bind(&venue.seeking_description)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if affected == 0 {
            return Err(Error::not_found(format!("venue {id}")));
        }
        genre::replace(&mut tx, GenreOwner::Venue, id, &venue.genres).await?;
        tx.commit().await?;
        log::info!("Venue {} updated", id);
        Ok(())
    }

    /// Delete a venue; its shows and genres go with it.
    pub async fn delete(db: &Db, id: i64) -> Result<()> {
        let mut tx = db.begin().await?;
        let affected = sqlx::query("DELETE FROM venue WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if affected == 0 {
            return Err(Error::not_found(format!("venue {id}")));
        }
        tx.commit().await?;
        log::info!("Venue {} deleted", id);
        Ok(())
    }
}

impl Model for Venue {
    fn table_name() -> &'static str {
        "venue"
    }

    fn create_table_sql() -> String {
        "CREATE TABLE IF NOT EXISTS venue (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            city VARCHAR(120) NOT NULL,
            state VARCHAR(120) NOT NULL,
            address VARCHAR(120) NOT NULL,
            phone VARCHAR(120),
            image_link VARCHAR(500),
            website VARCHAR(120),
            facebook_link VARCHAR(120),
            seeking_talent BOOLEAN NOT NULL DEFAULT 0,
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
            ("address".into(), "VARCHAR(120) NOT NULL DEFAULT ''".into()),
            ("phone".into(), "VARCHAR(120)".into()),
            ("image_link".into(), "VARCHAR(500)".into()),
            ("website".into(), "VARCHAR(120)".into()),
            ("facebook_link".into(), "VARCHAR(120)".into()),
            ("seeking_talent".into(), "BOOLEAN NOT NULL DEFAULT 0".into()),
            ("seeking_description".into(), "VARCHAR(500)".into()),
        ]
    }
}

pub fn migration(db: Arc<Db>) -> BoxFuture<'static, std::result::Result<(), sqlx::Error>> {
    Box::pin(async move { Venue::migrate(db).await })
}
