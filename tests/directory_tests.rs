use chrono::{NaiveDate, NaiveDateTime};
use gigboard::models::{Artist, MIGRATIONS, NewArtist, NewShow, NewVenue, Party, Show, Venue};
use gigboard::orm::{Db, auto_migrate};
use gigboard::{Error, views};
use std::sync::Arc;

fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn venue(name: &str, city: &str, state: &str) -> NewVenue {
    NewVenue {
        name: name.to_string(),
        city: city.to_string(),
        state: state.to_string(),
        address: "1 Main Street".to_string(),
        genres: vec!["Jazz".to_string()],
        ..Default::default()
    }
}

fn artist(name: &str) -> NewArtist {
    NewArtist {
        name: name.to_string(),
        city: "San Francisco".to_string(),
        state: "CA".to_string(),
        genres: vec!["Rock n Roll".to_string()],
        ..Default::default()
    }
}

struct Seeded {
    db: Arc<Db>,
    hop: i64,
    pianos: i64,
    park: i64,
    petals: i64,
    quevedo: i64,
}

/// Three venues in two areas, two artists, shows on both sides of 2030-01-01.
async fn seeded() -> Seeded {
    let db = Arc::new(Db::connect("sqlite::memory:").await.unwrap());
    auto_migrate(db.clone(), MIGRATIONS).await.unwrap();

    let hop = Venue::insert(&db, &venue("The Musical Hop", "San Francisco", "CA"))
        .await
        .unwrap();
    let pianos = Venue::insert(&db, &venue("The Dueling Pianos Bar", "New York", "NY"))
        .await
        .unwrap();
    let park = Venue::insert(
        &db,
        &venue("Park Square Live Music & Coffee", "San Francisco", "CA"),
    )
    .await
    .unwrap();
    let petals = Artist::insert(&db, &artist("Guns N Petals")).await.unwrap();
    let quevedo = Artist::insert(&db, &artist("Matt Quevedo")).await.unwrap();

    for (artist_id, venue_id, start_time) in [
        (petals, hop, at(2019, 5, 21, 21)),
        (quevedo, park, at(2019, 6, 15, 23)),
        (petals, park, at(2035, 4, 1, 20)),
        (quevedo, park, at(2035, 4, 8, 20)),
        (petals, hop, at(2030, 1, 1, 0)),
    ] {
        Show::insert(
            &db,
            &NewShow {
                artist_id,
                venue_id,
                start_time,
            },
        )
        .await
        .unwrap();
    }

    Seeded {
        db,
        hop,
        pianos,
        park,
        petals,
        quevedo,
    }
}

fn now() -> NaiveDateTime {
    at(2030, 1, 1, 0)
}

#[tokio::test]
async fn test_search_is_case_insensitive_substring() {
    let s = seeded().await;

    let hop = views::search_venues(&s.db, "Hop", now()).await.unwrap();
    assert_eq!(hop.count, 1);
    assert_eq!(hop.data[0].id, s.hop);
    assert_eq!(hop.search_term, "Hop");

    let music = views::search_venues(&s.db, "music", now()).await.unwrap();
    let ids: Vec<i64> = music.data.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![s.hop, s.park]);
    assert_eq!(music.count, 2);

    let park = music.data.iter().find(|h| h.id == s.park).unwrap();
    assert_eq!(park.num_upcoming_shows, 2);

    let artists = views::search_artists(&s.db, "A", now()).await.unwrap();
    assert_eq!(artists.count, 2);
    let none = views::search_artists(&s.db, "%", now()).await.unwrap();
    assert_eq!(none.count, 0);
}

#[tokio::test]
async fn test_search_folds_non_ascii_case() {
    let s = seeded().await;
    let cafe = Venue::insert(&s.db, &venue("CAFÉ ÉTOILE", "Montréal", "NY"))
        .await
        .unwrap();
    let dvorak = Artist::insert(&s.db, &artist("Ánton Dvořák Trio")).await.unwrap();

    let venues = views::search_venues(&s.db, "café", now()).await.unwrap();
    assert_eq!(venues.count, 1);
    assert_eq!(venues.data[0].id, cafe);

    let artists = views::search_artists(&s.db, "ÁNTON DVOŘ", now()).await.unwrap();
    assert_eq!(artists.count, 1);
    assert_eq!(artists.data[0].id, dvorak);
}

#[tokio::test]
async fn test_empty_search_term_matches_everything() {
    let s = seeded().await;
    let all = views::search_venues(&s.db, "", now()).await.unwrap();
    assert_eq!(all.count, 3);
}

#[tokio::test]
async fn test_venues_grouped_by_area() {
    let s = seeded().await;
    let areas = views::venue_areas(&s.db, now()).await.unwrap();

    assert_eq!(areas.len(), 2);
    assert_eq!((areas[0].city.as_str(), areas[0].state.as_str()), ("San Francisco", "CA"));
    let sf: Vec<i64> = areas[0].venues.iter().map(|v| v.id).collect();
    assert_eq!(sf, vec![s.hop, s.park]);
    assert_eq!(areas[1].venues[0].id, s.pianos);
    assert_eq!(areas[1].venues[0].num_upcoming_shows, 0);
}

#[tokio::test]
async fn test_detail_partitions_every_show() {
    let s = seeded().await;

    for venue_id in [s.hop, s.pianos, s.park] {
        let detail = views::venue_detail(&s.db, venue_id, now()).await.unwrap();
        let total = Show::count(&s.db, Party::Venue(venue_id)).await.unwrap() as usize;
        assert_eq!(detail.past_shows_count + detail.upcoming_shows_count, total);
        assert_eq!(detail.past_shows.len(), detail.past_shows_count);
    }
    for artist_id in [s.petals, s.quevedo] {
        let detail = views::artist_detail(&s.db, artist_id, now()).await.unwrap();
        let total = Show::count(&s.db, Party::Artist(artist_id)).await.unwrap() as usize;
        assert_eq!(detail.past_shows_count + detail.upcoming_shows_count, total);
    }
}

#[tokio::test]
async fn test_show_starting_now_counts_as_past() {
    let s = seeded().await;
    let hop = views::venue_detail(&s.db, s.hop, now()).await.unwrap();
    assert_eq!(hop.past_shows_count, 2);
    assert_eq!(hop.upcoming_shows_count, 0);
    assert_eq!(hop.past_shows[1].start_time, "01/01/2030, 00:00:00");
    assert_eq!(hop.genres, vec!["Jazz"]);
}

#[tokio::test]
async fn test_seeded_iso_timestamps_agree_with_detail() {
    let s = seeded().await;
    s.db.execute(&format!(
        "INSERT INTO show (artist_id, venue_id, start_time) \
         VALUES ({}, {}, '2030-01-01T10:00:00.000Z')",
        s.quevedo, s.pianos
    ))
    .await
    .unwrap();
    let evening = at(2030, 1, 1, 20);

    let upcoming = Show::upcoming_count(&s.db, Party::Venue(s.pianos), evening)
        .await
        .unwrap();
    assert_eq!(upcoming, 0);

    let detail = views::venue_detail(&s.db, s.pianos, evening).await.unwrap();
    assert_eq!(detail.upcoming_shows_count, 0);
    assert_eq!(detail.past_shows_count, 1);

    let morning = at(2030, 1, 1, 9);
    let areas = views::venue_areas(&s.db, morning).await.unwrap();
    let pianos = areas
        .iter()
        .flat_map(|area| area.venues.iter())
        .find(|v| v.id == s.pianos)
        .unwrap();
    assert_eq!(pianos.num_upcoming_shows, 1);

    s.db.execute(&format!(
        "INSERT INTO show (artist_id, venue_id, start_time) \
         VALUES ({}, {}, '2035-04-01T19:00:00')",
        s.quevedo, s.hop
    ))
    .await
    .unwrap();
    let shows = views::show_list(&s.db).await.unwrap();
    let times: Vec<&str> = shows.iter().map(|show| show.start_time.as_str()).collect();
    assert_eq!(times[3], "01/01/2030, 10:00:00");
    assert_eq!(times[4], "04/01/2035, 19:00:00");
    assert_eq!(times[5], "04/01/2035, 20:00:00");
}

#[tokio::test]
async fn test_artist_detail_lists_venues() {
    let s = seeded().await;
    let petals = views::artist_detail(&s.db, s.petals, now()).await.unwrap();
    assert_eq!(petals.upcoming_shows_count, 1);
    let upcoming = &petals.upcoming_shows[0];
    assert_eq!(upcoming.venue_id, s.park);
    assert_eq!(upcoming.venue_name, "Park Square Live Music & Coffee");
    assert_eq!(upcoming.start_time, "04/01/2035, 20:00:00");
}

#[tokio::test]
async fn test_missing_detail_is_not_found() {
    let s = seeded().await;
    assert!(matches!(
        views::venue_detail(&s.db, 999, now()).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        views::artist_detail(&s.db, 999, now()).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_show_list_is_chronological() {
    let s = seeded().await;
    let shows = views::show_list(&s.db).await.unwrap();
    assert_eq!(shows.len(), 5);
    assert_eq!(shows[0].artist_name, "Guns N Petals");
    assert_eq!(shows[0].venue_name, "The Musical Hop");
    assert_eq!(shows[4].artist_id, s.quevedo);

    let artists = views::artist_list(&s.db).await.unwrap();
    let names: Vec<&str> = artists.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Guns N Petals", "Matt Quevedo"]);
}
