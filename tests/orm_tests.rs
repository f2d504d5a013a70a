use chrono::NaiveDate;
use gigboard::Error;
use gigboard::models::{Artist, MIGRATIONS, NewArtist, NewShow, NewVenue, Party, Show, Venue};
use gigboard::orm::{Db, Model, apply_migration_files, auto_migrate};
use sqlx::FromRow;
use std::fs;
use std::sync::Arc;

async fn migrated_db() -> Arc<Db> {
    let db = Arc::new(Db::connect("sqlite::memory:").await.unwrap());
    auto_migrate(db.clone(), MIGRATIONS).await.unwrap();
    db
}

async fn column_names(db: &Db, table: &str) -> Vec<String> {
    #[derive(FromRow)]
    struct Column {
        name: String,
    }
    let columns: Vec<Column> = db
        .fetch_all(&format!("SELECT name FROM pragma_table_info('{table}')"))
        .await
        .unwrap();
    columns.into_iter().map(|c| c.name).collect()
}

fn venue(name: &str) -> NewVenue {
    NewVenue {
        name: name.to_string(),
        city: "San Francisco".to_string(),
        state: "CA".to_string(),
        address: "1015 Folsom Street".to_string(),
        genres: vec!["Jazz".to_string(), "Reggae".to_string()],
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

#[tokio::test]
async fn test_db_basic_crud() {
    #[derive(Debug, FromRow, PartialEq, Eq)]
    struct Person {
        name: String,
    }

    let db = Db::connect("sqlite::memory:").await.unwrap();
    db.execute("CREATE TABLE person (id INTEGER PRIMARY KEY, name TEXT)")
        .await
        .unwrap();
    db.execute("INSERT INTO person (name) VALUES ('Alice')")
        .await
        .unwrap();

    let people: Vec<Person> = db.fetch_all("SELECT name FROM person").await.unwrap();
    let names: Vec<String> = people.into_iter().map(|person| person.name).collect();
    assert_eq!(names, vec!["Alice"]);
}

#[tokio::test]
async fn test_auto_migrate_is_idempotent() {
    let db = migrated_db().await;
    auto_migrate(db.clone(), MIGRATIONS).await.unwrap();

    for table in ["venue", "artist", "show", "venue_genre", "artist_genre"] {
        assert!(!column_names(&db, table).await.is_empty(), "{table} missing");
    }
    let recorded: Vec<(String,)> = db
        .fetch_all("SELECT table_name FROM __gigboard_migrations WHERE table_name IS NOT NULL")
        .await
        .unwrap();
    assert_eq!(recorded.len(), MIGRATIONS.len());
}

struct PosterV1;
struct PosterV2;

impl Model for PosterV1 {
    fn table_name() -> &'static str {
        "poster"
    }
    fn create_table_sql() -> String {
        "CREATE TABLE IF NOT EXISTS poster (id INTEGER PRIMARY KEY, title TEXT)".to_string()
    }
    fn columns() -> Vec<(String, String)> {
        vec![("id".into(), "INTEGER".into()), ("title".into(), "TEXT".into())]
    }
}

impl Model for PosterV2 {
    fn table_name() -> &'static str {
        "poster"
    }
    fn create_table_sql() -> String {
        "CREATE TABLE IF NOT EXISTS poster (id INTEGER PRIMARY KEY, title TEXT, image_link TEXT)"
            .to_string()
    }
    fn columns() -> Vec<(String, String)> {
        vec![
            ("id".into(), "INTEGER".into()),
            ("title".into(), "TEXT".into()),
            ("image_link".into(), "TEXT".into()),
        ]
    }
}

#[tokio::test]
async fn test_schema_change_adds_missing_columns() {
    let db = Arc::new(Db::connect("sqlite::memory:").await.unwrap());
    PosterV1::migrate(db.clone()).await.unwrap();
    assert_eq!(column_names(&db, "poster").await, vec!["id", "title"]);

    PosterV2::migrate(db.clone()).await.unwrap();
    assert_eq!(column_names(&db, "poster").await, vec!["id", "title", "image_link"]);

    // unchanged schema is a no-op
    PosterV2::migrate(db.clone()).await.unwrap();
    assert_eq!(column_names(&db, "poster").await.len(), 3);
}

#[tokio::test]
async fn test_migration_files_apply_once_in_order() {
    let db = migrated_db().await;
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("001_seed.sql"),
        "INSERT INTO venue (name, city, state, address) \
         VALUES ('The Musical Hop', 'San Francisco', 'CA', '1015 Folsom Street');",
    )
    .unwrap();
    fs::write(
        dir.path().join("002_rename.sql"),
        "UPDATE venue SET name = name || '!' WHERE id = 1;",
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "not a migration").unwrap();

    let dir_str = dir.path().to_str().unwrap();
    assert_eq!(apply_migration_files(db.clone(), dir_str).await.unwrap(), 2);
    assert_eq!(apply_migration_files(db.clone(), dir_str).await.unwrap(), 0);

    let venue = Venue::find(&db, 1).await.unwrap();
    assert_eq!(venue.name, "The Musical Hop!");
}

#[tokio::test]
async fn test_failed_migration_file_is_rolled_back() {
    let db = migrated_db().await;
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("001_broken.sql"),
        "INSERT INTO venue (name, city, state, address) VALUES ('A', 'B', 'CA', 'C'); \
         INSERT INTO nowhere VALUES (1);",
    )
    .unwrap();

    let result = apply_migration_files(db.clone(), dir.path().to_str().unwrap()).await;
    assert!(matches!(result, Err(Error::Database(_))));
    assert!(Venue::all(&db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_insert_and_find_round_trip_with_genres() {
    let db = migrated_db().await;
    let mut new = venue("The Musical Hop");
    new.phone = Some("123-123-1234".to_string());
    new.seeking_talent = true;
    let id = Venue::insert(&db, &new).await.unwrap();

    let stored = Venue::find(&db, id).await.unwrap();
    assert_eq!(stored.name, "The Musical Hop");
    assert_eq!(stored.phone.as_deref(), Some("123-123-1234"));
    assert!(stored.seeking_talent);
    assert_eq!(stored.genres(&db).await.unwrap(), vec!["Jazz", "Reggae"]);
}

#[tokio::test]
async fn test_update_overwrites_fields_and_genres() {
    let db = migrated_db().await;
    let id = Artist::insert(&db, &artist("Guns N Petals")).await.unwrap();

    let mut changed = artist("Guns N Petals");
    changed.city = "New York".to_string();
    changed.state = "NY".to_string();
    changed.genres = vec!["Jazz".to_string(), "Classical".to_string()];
    Artist::update(&db, id, &changed).await.unwrap();

    let stored = Artist::find(&db, id).await.unwrap();
    assert_eq!(stored.city, "New York");
    assert_eq!(stored.genres(&db).await.unwrap(), vec!["Jazz", "Classical"]);

    let missing = Artist::update(&db, id + 100, &changed).await;
    assert!(matches!(missing, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_deleting_a_venue_removes_its_shows_and_genres() {
    let db = migrated_db().await;
    let venue_id = Venue::insert(&db, &venue("The Dueling Pianos Bar")).await.unwrap();
    let artist_id = Artist::insert(&db, &artist("Matt Quevedo")).await.unwrap();
    let start = NaiveDate::from_ymd_opt(2019, 6, 15)
        .unwrap()
        .and_hms_opt(23, 0, 0)
        .unwrap();
    Show::insert(
        &db,
        &NewShow {
            artist_id,
            venue_id,
            start_time: start,
        },
    )
    .await
    .unwrap();
    assert_eq!(Show::count(&db, Party::Artist(artist_id)).await.unwrap(), 1);

    Venue::delete(&db, venue_id).await.unwrap();

    assert_eq!(Show::count(&db, Party::Artist(artist_id)).await.unwrap(), 0);
    let genres: Vec<(String,)> = db.fetch_all("SELECT genre FROM venue_genre").await.unwrap();
    assert!(genres.is_empty());
    assert!(matches!(Venue::find(&db, venue_id).await, Err(Error::NotFound(_))));
    assert!(matches!(Venue::delete(&db, venue_id).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_deleting_an_artist_removes_its_shows_and_genres() {
    let db = migrated_db().await;
    let venue_id = Venue::insert(&db, &venue("The Musical Hop")).await.unwrap();
    let artist_id = Artist::insert(&db, &artist("Guns N Petals")).await.unwrap();
    let other_id = Artist::insert(&db, &artist("The Wild Sax Band")).await.unwrap();
    for (id, day) in [(artist_id, 1), (artist_id, 8), (other_id, 15)] {
        let start_time = NaiveDate::from_ymd_opt(2035, 4, day)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap();
        Show::insert(
            &db,
            &NewShow {
                artist_id: id,
                venue_id,
                start_time,
            },
        )
        .await
        .unwrap();
    }
    assert_eq!(Show::count(&db, Party::Venue(venue_id)).await.unwrap(), 3);

    Artist::delete(&db, artist_id).await.unwrap();

    assert_eq!(Show::count(&db, Party::Venue(venue_id)).await.unwrap(), 1);
    assert_eq!(Show::count(&db, Party::Artist(other_id)).await.unwrap(), 1);
    let genres: Vec<(i64,)> = db
        .fetch_all("SELECT artist_id FROM artist_genre")
        .await
        .unwrap();
    assert_eq!(genres, vec![(other_id,)]);
    assert_eq!(Venue::find(&db, venue_id).await.unwrap().name, "The Musical Hop");
    assert!(matches!(Artist::find(&db, artist_id).await, Err(Error::NotFound(_))));
    assert!(matches!(Artist::delete(&db, artist_id).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_show_constraints() {
    let db = migrated_db().await;
    let venue_id = Venue::insert(&db, &venue("Park Square Live Music & Coffee")).await.unwrap();
    let artist_id = Artist::insert(&db, &artist("The Wild Sax Band")).await.unwrap();
    let start = NaiveDate::from_ymd_opt(2035, 4, 1)
        .unwrap()
        .and_hms_opt(20, 0, 0)
        .unwrap();

    let unknown_venue = Show::insert(
        &db,
        &NewShow {
            artist_id,
            venue_id: venue_id + 99,
            start_time: start,
        },
    )
    .await;
    assert!(matches!(unknown_venue, Err(Error::Database(_))));

    let show = NewShow {
        artist_id,
        venue_id,
        start_time: start,
    };
    Show::insert(&db, &show).await.unwrap();
    assert!(matches!(Show::insert(&db, &show).await, Err(Error::Database(_))));
    assert_eq!(Show::count(&db, Party::Venue(venue_id)).await.unwrap(), 1);
}
