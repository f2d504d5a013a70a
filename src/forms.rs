//! Form parsing and validation for venue, artist and show submissions.

use crate::models::genre::{GENRE_CHOICES, is_known_genre};
use crate::models::{Artist, NewArtist, NewShow, NewVenue, Venue};
use chrono::NaiveDateTime;
use serde::Serialize;

pub const STATE_CHOICES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MT", "NE", "NV", "NH", "NJ", "NM", "NY", "NC", "ND", "OH",
    "OK", "OR", "MD", "MA", "MI", "MN", "MS", "MO", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY",
];

const START_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Decoded `application/x-www-form-urlencoded` pairs, in order, keys may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        FormData { pairs }
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Value as submitted, empty when absent.
    pub fn text(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    pub fn checked(&self, key: &str) -> bool {
        matches!(
            self.get(key).map(|v| v.trim().to_ascii_lowercase()).as_deref(),
            Some("y" | "on" | "true" | "1")
        )
    }
}

impl FromIterator<(String, String)> for FormData {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        FormData::new(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// One `<option>` of a select box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: String,
    pub selected: bool,
}

pub fn state_choices(selected: &str) -> Vec<Choice> {
    STATE_CHOICES
        .iter()
        .map(|s| Choice {
            value: s.to_string(),
            selected: *s == selected,
        })
        .collect()
}

pub fn genre_choices(selected: &[String]) -> Vec<Choice> {
    GENRE_CHOICES
        .iter()
        .map(|g| Choice {
            value: g.to_string(),
            selected: selected.iter().any(|s| s == g),
        })
        .collect()
}

/// `None` for a blank value, otherwise the value untouched.
fn optional(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn require(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "This field is required."));
    }
}

fn check_state(errors: &mut Vec<FieldError>, state: &str) {
    if !state.is_empty() && !STATE_CHOICES.contains(&state) {
        errors.push(FieldError::new("state", format!("Unknown state `{state}`.")));
    }
}

/// Known genres, duplicates dropped, submission order kept.
fn clean_genres(errors: &mut Vec<FieldError>, submitted: &[String]) -> Vec<String> {
    let mut genres: Vec<String> = Vec::new();
    for genre in submitted {
        if !is_known_genre(genre) {
            errors.push(FieldError::new("genres", format!("Unknown genre `{genre}`.")));
        } else if !genres.contains(genre) {
            genres.push(genre.clone());
        }
    }
    if submitted.is_empty() {
        errors.push(FieldError::new("genres", "Pick at least one genre."));
    }
    genres
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VenueForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: String,
    pub image_link: String,
    pub genres: Vec<String>,
    pub facebook_link: String,
    pub website_link: String,
    pub seeking_talent: bool,
    pub seeking_description: String,
}

impl VenueForm {
    pub fn from_form(form: &FormData) -> Self {
        VenueForm {
            name: form.text("name"),
            city: form.text("city"),
            state: form.text("state"),
            address: form.text("address"),
            phone: form.text("phone"),
            image_link: form.text("image_link"),
            genres: form
                .get_all("genres")
                .into_iter()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect(),
            facebook_link: form.text("facebook_link"),
            website_link: form.text("website_link"),
            seeking_talent: form.checked("seeking_talent"),
            seeking_description: form.text("seeking_description"),
        }
    }

    /// Prefill from a stored venue.
    pub fn from_venue(venue: &Venue, genres: Vec<String>) -> Self {
        VenueForm {
            name: venue.name.clone(),
            city: venue.city.clone(),
            state: venue.state.clone(),
            address: venue.address.clone(),
            phone: venue.phone.clone().unwrap_or_default(),
            image_link: venue.image_link.clone().unwrap_or_default(),
            genres,
            facebook_link: venue.facebook_link.clone().unwrap_or_default(),
            website_link: venue.website.clone().unwrap_or_default(),
            seeking_talent: venue.seeking_talent,
            seeking_description: venue.seeking_description.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<NewVenue, Vec<FieldError>> {
        let mut errors = Vec::new();
        require(&mut errors, "name", &self.name);
        require(&mut errors, "city", &self.city);
        require(&mut errors, "state", &self.state);
        require(&mut errors, "address", &self.address);
        check_state(&mut errors, &self.state);
        let genres = clean_genres(&mut errors, &self.genres);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(NewVenue {
            name: self.name.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            address: self.address.clone(),
            genres,
            phone: optional(&self.phone),
            image_link: optional(&self.image_link),
            website: optional(&self.website_link),
            facebook_link: optional(&self.facebook_link),
            seeking_talent: self.seeking_talent,
            seeking_description: optional(&self.seeking_description),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtistForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub image_link: String,
    pub genres: Vec<String>,
    pub facebook_link: String,
    pub website_link: String,
    pub seeking_venue: bool,
    pub seeking_description: String,
}

impl ArtistForm {
    pub fn from_form(form: &FormData) -> Self {
        ArtistForm {
            name: form.text("name"),
            city: form.text("city"),
            state: form.text("state"),
            phone: form.text("phone"),
            image_link: form.text("image_link"),
            genres: form
                .get_all("genres")
                .into_iter()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect(),
            facebook_link: form.text("facebook_link"),
            website_link: form.text("website_link"),
            seeking_venue: form.checked("seeking_venue"),
            seeking_description: form.text("seeking_description"),
        }
    }

    pub fn from_artist(artist: &Artist, genres: Vec<String>) -> Self {
        ArtistForm {
            name: artist.name.clone(),
            city: artist.city.clone(),
            state: artist.state.clone(),
            phone: artist.phone.clone().unwrap_or_default(),
            image_link: artist.image_link.clone().unwrap_or_default(),
            genres,
            facebook_link: artist.facebook_link.clone().unwrap_or_default(),
            website_link: artist.website.clone().unwrap_or_default(),
            seeking_venue: artist.seeking_venue,
            seeking_description: artist.seeking_description.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<NewArtist, Vec<FieldError>> {
        let mut errors = Vec::new();
        require(&mut errors, "name", &self.name);
        require(&mut errors, "city", &self.city);
        require(&mut errors, "state", &self.state);
        check_state(&mut errors, &self.state);
        let genres = clean_genres(&mut errors, &self.genres);
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(NewArtist {
            name: self.name.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            genres,
            phone: optional(&self.phone),
            image_link: optional(&self.image_link),
            website: optional(&self.website_link),
            facebook_link: optional(&self.facebook_link),
            seeking_venue: self.seeking_venue,
            seeking_description: optional(&self.seeking_description),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShowForm {
    pub artist_id: String,
    pub venue_id: String,
    pub start_time: String,
}

pub fn parse_start_time(value: &str) -> Option<NaiveDateTime> {
    START_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
}

fn parse_id(errors: &mut Vec<FieldError>, field: &str, value: &str) -> i64 {
    let value = value.trim();
    match value.parse::<i64>() {
        Ok(id) if id > 0 => id,
        _ if value.is_empty() => {
            errors.push(FieldError::new(field, "This field is required."));
            0
        }
        _ => {
            errors.push(FieldError::new(field, format!("`{value}` is not a valid id.")));
            0
        }
    }
}

impl ShowForm {
    pub fn from_form(form: &FormData) -> Self {
        ShowForm {
            artist_id: form.text("artist_id"),
            venue_id: form.text("venue_id"),
            start_time: form.text("start_time"),
        }
    }

    pub fn validate(&self) -> Result<NewShow, Vec<FieldError>> {
        let mut errors = Vec::new();
        let artist_id = parse_id(&mut errors, "artist_id", &self.artist_id);
        let venue_id = parse_id(&mut errors, "venue_id", &self.venue_id);
        let start_time = parse_start_time(&self.start_time);
        if start_time.is_none() {
            errors.push(FieldError::new(
                "start_time",
                "Expected a date and time like 2035-04-01 20:00.",
            ));
        }
        match start_time {
            Some(start_time) if errors.is_empty() => Ok(NewShow {
                artist_id,
                venue_id,
                start_time,
            }),
            _ => Err(errors),
        }
    }
}
