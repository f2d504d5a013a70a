//! View models handed to the templates.
//!
//! Everything time-dependent takes `now` explicitly; handlers pass the wall
//! clock and tests pass a fixed instant.

use crate::error::Result;
use crate::models::{Artist, Party, Show, ShowListing, Timing, Venue};
use crate::orm::Db;
use chrono::{Local, NaiveDateTime};
use serde::Serialize;

/// Display format of show start times.
pub const START_TIME_FORMAT: &str = "%m/%d/%Y, %H:%M:%S";

/// Wall-clock instant shows are classified against.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn format_start_time(start_time: NaiveDateTime) -> String {
    start_time.format(START_TIME_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueSummary {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: i64,
}

/// Venues sharing one (city, state) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Area {
    pub city: String,
    pub state: String,
    pub venues: Vec<VenueSummary>,
}

/// Group venues by exact (city, state) match, keeping first-seen order.
pub fn group_by_area(rows: impl IntoIterator<Item = (Venue, i64)>) -> Vec<Area> {
    let mut areas: Vec<Area> = Vec::new();
    for (venue, num_upcoming_shows) in rows {
        let summary = VenueSummary {
            id: venue.id,
            name: venue.name,
            num_upcoming_shows,
        };
        match areas
            .iter_mut()
            .find(|a| a.city == venue.city && a.state == venue.state)
        {
            Some(area) => area.venues.push(summary),
            None => areas.push(Area {
                city: venue.city,
                state: venue.state,
                venues: vec![summary],
            }),
        }
    }
    areas
}

pub async fn venue_areas(db: &Db, now: NaiveDateTime) -> Result<Vec<Area>> {
    let venues = Venue::all(db).await?;
    let mut rows = Vec::with_capacity(venues.len());
    for venue in venues {
        let upcoming = Show::upcoming_count(db, Party::Venue(venue.id), now).await?;
        rows.push((venue, upcoming));
    }
    Ok(group_by_area(rows))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistSummary {
    pub id: i64,
    pub name: String,
}

pub async fn artist_list(db: &Db) -> Result<Vec<ArtistSummary>> {
    Ok(Artist::all(db)
        .await?
        .into_iter()
        .map(|a| ArtistSummary {
            id: a.id,
            name: a.name,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub search_term: String,
    pub count: usize,
    pub data: Vec<SearchHit>,
}

pub async fn search_venues(db: &Db, term: &str, now: NaiveDateTime) -> Result<SearchResults> {
    let mut data = Vec::new();
    for venue in Venue::search(db, term).await? {
        data.push(SearchHit {
            num_upcoming_shows: Show::upcoming_count(db, Party::Venue(venue.id), now).await?,
            id: venue.id,
            name: venue.name,
        });
    }
    Ok(SearchResults {
        search_term: term.to_string(),
        count: data.len(),
        data,
    })
}

pub async fn search_artists(db: &Db, term: &str, now: NaiveDateTime) -> Result<SearchResults> {
    let mut data = Vec::new();
    for artist in Artist::search(db, term).await? {
        data.push(SearchHit {
            num_upcoming_shows: Show::upcoming_count(db, Party::Artist(artist.id), now).await?,
            id: artist.id,
            name: artist.name,
        });
    }
    Ok(SearchResults {
        search_term: term.to_string(),
        count: data.len(),
        data,
    })
}

/// A show as displayed on listing and detail pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowView {
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: String,
}

impl From<ShowListing> for ShowView {
    fn from(s: ShowListing) -> Self {
        ShowView {
            venue_id: s.venue_id,
            venue_name: s.venue_name,
            venue_image_link: s.venue_image_link,
            artist_id: s.artist_id,
            artist_name: s.artist_name,
            artist_image_link: s.artist_image_link,
            start_time: format_start_time(s.start_time),
        }
    }
}

/// Split shows into (past, upcoming) relative to `now`, keeping order.
pub fn partition_shows(
    shows: Vec<ShowListing>,
    now: NaiveDateTime,
) -> (Vec<ShowView>, Vec<ShowView>) {
    let mut past = Vec::new();
    let mut upcoming = Vec::new();
    for show in shows {
        match Timing::classify(show.start_time, now) {
            Timing::Past => past.push(ShowView::from(show)),
            Timing::Upcoming => upcoming.push(ShowView::from(show)),
        }
    }
    (past, upcoming)
}

pub async fn show_list(db: &Db) -> Result<Vec<ShowView>> {
    Ok(Show::listings(db)
        .await?
        .into_iter()
        .map(ShowView::from)
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueDetail {
    pub id: i64,
    pub name: String,
    pub genres: Vec<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
    pub past_shows: Vec<ShowView>,
    pub upcoming_shows: Vec<ShowView>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

pub async fn venue_detail(db: &Db, id: i64, now: NaiveDateTime) -> Result<VenueDetail> {
    let venue = Venue::find(db, id).await?;
    let genres = venue.genres(db).await?;
    let shows = Show::listings_for(db, Party::Venue(id)).await?;
    let (past_shows, upcoming_shows) = partition_shows(shows, now);
    Ok(VenueDetail {
        id: venue.id,
        name: venue.name,
        genres,
        address: venue.address,
        city: venue.city,
        state: venue.state,
        phone: venue.phone,
        website: venue.website,
        facebook_link: venue.facebook_link,
        seeking_talent: venue.seeking_talent,
        seeking_description: venue.seeking_description,
        image_link: venue.image_link,
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistDetail {
    pub id: i64,
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
    pub image_link: Option<String>,
    pub past_shows: Vec<ShowView>,
    pub upcoming_shows: Vec<ShowView>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

pub async fn artist_detail(db: &Db, id: i64, now: NaiveDateTime) -> Result<ArtistDetail> {
    let artist = Artist::find(db, id).await?;
    let genres = artist.genres(db).await?;
    let shows = Show::listings_for(db, Party::Artist(id)).await?;
    let (past_shows, upcoming_shows) = partition_shows(shows, now);
    Ok(ArtistDetail {
        id: artist.id,
        name: artist.name,
        genres,
        city: artist.city,
        state: artist.state,
        phone: artist.phone,
        website: artist.website,
        facebook_link: artist.facebook_link,
        seeking_venue: artist.seeking_venue,
        seeking_description: artist.seeking_description,
        image_link: artist.image_link,
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn venue(id: i64, name: &str, city: &str, state: &str) -> Venue {
        Venue {
            id,
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            address: "1 Main St".to_string(),
            phone: None,
            image_link: None,
            website: None,
            facebook_link: None,
            seeking_talent: false,
            seeking_description: None,
        }
    }

    fn listing(id: i64, start_time: NaiveDateTime) -> ShowListing {
        ShowListing {
            show_id: id,
            start_time,
            venue_id: 1,
            venue_name: "The Musical Hop".to_string(),
            venue_image_link: None,
            artist_id: 2,
            artist_name: "Guns N Petals".to_string(),
            artist_image_link: Some("https://img.example/gnp.jpg".to_string()),
        }
    }

    #[test]
    fn test_group_by_area_same_city_and_state() {
        let areas = group_by_area(vec![
            (venue(1, "The Musical Hop", "San Francisco", "CA"), 0),
            (venue(2, "The Dueling Pianos Bar", "New York", "NY"), 1),
            (venue(3, "Park Square Live Music & Coffee", "San Francisco", "CA"), 2),
        ]);
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].city, "San Francisco");
        let ids: Vec<i64> = areas[0].venues.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(areas[0].venues[1].num_upcoming_shows, 2);
        assert_eq!(areas[1].venues.len(), 1);
    }

    #[test]
    fn test_group_by_area_is_exact_match() {
        let areas = group_by_area(vec![
            (venue(1, "A", "Portland", "OR"), 0),
            (venue(2, "B", "Portland", "ME"), 0),
            (venue(3, "C", "portland", "OR"), 0),
        ]);
        assert_eq!(areas.len(), 3);
    }

    #[test]
    fn test_partition_shows_disjoint_and_exhaustive() {
        let now = NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let shows = vec![
            listing(1, now - Duration::days(3)),
            listing(2, now),
            listing(3, now + Duration::hours(1)),
            listing(4, now + Duration::days(30)),
        ];
        let (past, upcoming) = partition_shows(shows, now);
        assert_eq!(past.len(), 2);
        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming[0].start_time, "01/01/2030, 13:00:00");
        assert_eq!(upcoming[0].artist_name, "Guns N Petals");
    }

    #[test]
    fn test_format_start_time() {
        let t = NaiveDate::from_ymd_opt(2019, 5, 21)
            .unwrap()
            .and_hms_opt(21, 30, 0)
            .unwrap();
        assert_eq!(format_start_time(t), "05/21/2019, 21:30:00");
    }
}
