//! Tables of the booking directory and the queries run against them.

pub mod artist;
pub mod genre;
pub mod show;
pub mod venue;

pub use artist::{Artist, NewArtist};
pub use genre::{GENRE_CHOICES, GenreOwner};
pub use show::{NewShow, Party, Show, ShowListing, Timing};
pub use venue::{NewVenue, Venue};

use crate::orm::Migration;

/// Every table, owners before the tables referencing them.
pub const MIGRATIONS: &[Migration] = &[
    Migration(venue::migration),
    Migration(artist::migration),
    Migration(show::migration),
    Migration(genre::venue_genre_migration),
    Migration(genre::artist_genre_migration),
];

/// Whether `name` contains `term`, trimmed, ignoring case.
///
/// Both sides are folded with Unicode lowercasing, so "café" finds "CAFÉ".
pub(crate) fn name_contains(name: &str, term: &str) -> bool {
    name.to_lowercase().contains(&term.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_contains_folds_case() {
        assert!(name_contains("The Musical Hop", "hop"));
        assert!(name_contains("CAFÉ ÉTOILE", " café "));
        assert!(name_contains("Anything", ""));
        assert!(!name_contains("100 Club", "%"));
    }
}
