use crate::error::Result;
use crate::orm::{BoxFuture, Db, FromRow, Model};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;

/// One artist playing one venue at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Show {
    pub id: i64,
    pub artist_id: i64,
    pub venue_id: i64,
    pub start_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShow {
    pub artist_id: i64,
    pub venue_id: i64,
    pub start_time: NaiveDateTime,
}

/// A show joined with both of its parties.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ShowListing {
    pub show_id: i64,
    pub start_time: NaiveDateTime,
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
}

/// Whether a show has happened yet, relative to a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Past,
    Upcoming,
}

impl Timing {
    /// Upcoming only when strictly after `now`.
    pub fn classify(start_time: NaiveDateTime, now: NaiveDateTime) -> Timing {
        if start_time > now {
            Timing::Upcoming
        } else {
            Timing::Past
        }
    }
}

/// The venue or artist side of a show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Venue(i64),
    Artist(i64),
}

impl Party {
    fn column(self) -> &'static str {
        match self {
            Party::Venue(_) => "venue_id",
            Party::Artist(_) => "artist_id",
        }
    }

    fn id(self) -> i64 {
        match self {
            Party::Venue(id) | Party::Artist(id) => id,
        }
    }
}

const SELECT_LISTING: &str = "SELECT s.id AS show_id, s.start_time, \
     v.id AS venue_id, v.name AS venue_name, v.image_link AS venue_image_link, \
     a.id AS artist_id, a.name AS artist_name, a.image_link AS artist_image_link \
     FROM show s \
     JOIN venue v ON v.id = s.venue_id \
     JOIN artist a ON a.id = s.artist_id";

impl Show {
    /// Insert a show; unknown artist or venue ids and taken start times fail on constraints.
    pub async fn insert(db: &Db, show: &NewShow) -> Result<i64> {
        let mut tx = db.begin().await?;
        let id = sqlx::query("INSERT INTO show (artist_id, venue_id, start_time) VALUES (?, ?, ?)")
            .bind(show.artist_id)
            .bind(show.venue_id)
            .bind(show.start_time)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        tx.commit().await?;
        log::info!(
            "Show {} created: artist {} at venue {} on {}",
            id,
            show.artist_id,
            show.venue_id,
            show.start_time
        );
        Ok(id)
    }

    /// Every show with venue and artist details, earliest first.
    pub async fn listings(db: &Db) -> Result<Vec<ShowListing>> {
        Ok(db
            .fetch_all(&format!("{SELECT_LISTING} ORDER BY julianday(s.start_time), s.id"))
            .await?)
    }

    /// Shows of one venue or artist, earliest first.
    pub async fn listings_for(db: &Db, party: Party) -> Result<Vec<ShowListing>> {
        Ok(sqlx::query_as(&format!(
            "{SELECT_LISTING} WHERE s.{} = ? ORDER BY julianday(s.start_time), s.id",
            party.column()
        ))
        .bind(party.id())
        .fetch_all(db.pool())
        .await?)
    }

    /// Number of shows of one venue or artist starting strictly after `now`.
    /// Compared as julian days, so `T`-separated timestamps from seed files agree with sqlx's.
    pub async fn upcoming_count(db: &Db, party: Party, now: NaiveDateTime) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM show WHERE {} = ? AND julianday(start_time) > julianday(?)",
            party.column()
        ))
        .bind(party.id())
        .bind(now)
        .fetch_one(db.pool())
        .await?;
        Ok(count)
    }

    pub async fn count(db: &Db, party: Party) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM show WHERE {} = ?",
            party.column()
        ))
        .bind(party.id())
        .fetch_one(db.pool())
        .await?;
        Ok(count)
    }
}

impl Model for Show {
    fn table_name() -> &'static str {
        "show"
    }

    fn create_table_sql() -> String {
        "CREATE TABLE IF NOT EXISTS show (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            artist_id INTEGER NOT NULL REFERENCES artist(id) ON DELETE CASCADE,
            venue_id INTEGER NOT NULL REFERENCES venue(id) ON DELETE CASCADE,
            start_time DATETIME NOT NULL UNIQUE
        )"
        .to_string()
    }

    fn columns() -> Vec<(String, String)> {
        vec![
            ("id".into(), "INTEGER".into()),
            ("artist_id".into(), "INTEGER".into()),
            ("venue_id".into(), "INTEGER".into()),
            ("start_time".into(), "DATETIME".into()),
        ]
    }
}

pub fn migration(db: Arc<Db>) -> BoxFuture<'static, std::result::Result<(), sqlx::Error>> {
    Box::pin(async move { Show::migrate(db).await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2035, 4, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_classify_strictly_after_now_is_upcoming() {
        let now = at(20, 0);
        assert_eq!(Timing::classify(now + Duration::seconds(1), now), Timing::Upcoming);
        assert_eq!(Timing::classify(now - Duration::seconds(1), now), Timing::Past);
    }

    #[test]
    fn test_classify_exactly_now_is_past() {
        let now = at(20, 0);
        assert_eq!(Timing::classify(now, now), Timing::Past);
    }

    #[test]
    fn test_party_column() {
        assert_eq!(Party::Venue(3).column(), "venue_id");
        assert_eq!(Party::Artist(4).column(), "artist_id");
        assert_eq!(Party::Artist(4).id(), 4);
    }
}
