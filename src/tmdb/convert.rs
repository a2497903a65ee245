use chrono::NaiveDate;
use serde::Serialize;

use super::client::ImageUrls;
use super::types::{Credits, MovieDetails};
use crate::db::{
    ImportCredit, ImportGenre, ImportPerson, MovieInput, ROLE_ACTOR, ROLE_DIRECTOR,
    ROLE_PRODUCER, ROLE_WRITER,
};
use crate::util::slugify;

/// Only the top-billed actors are imported.
pub const MAX_IMPORTED_CAST: usize = 10;

/// A TMDb movie converted to catalog fields, as shown in the prefill form.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedMovie {
    #[serde(flatten)]
    pub movie: MovieInput,
    pub genres: Vec<ImportGenre>,
}

pub fn parse_release_date(value: Option<&str>) -> Option<NaiveDate> {
    value.and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}

/// First non-empty US certification.
pub fn mpaa_rating(details: &MovieDetails) -> String {
    details
        .release_dates
        .results
        .iter()
        .filter(|country| country.iso_3166_1 == "US")
        .flat_map(|country| country.release_dates.iter())
        .map(|rd| rd.certification.trim())
        .find(|c| !c.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Titles without any letters or digits get `tmdb-<id>` as their slug.
pub fn movie_slug(details: &MovieDetails) -> String {
    let slug = slugify(&details.title);
    if slug.is_empty() {
        format!("tmdb-{}", details.id)
    } else {
        slug
    }
}

pub fn convert_movie(details: &MovieDetails, images: &ImageUrls) -> ConvertedMovie {
    let movie = MovieInput {
        title: details.title.clone(),
        slug: movie_slug(details),
        release_date: parse_release_date(details.release_date.as_deref()),
        duration_minutes: details.runtime.filter(|r| *r > 0),
        synopsis: details.overview.clone(),
        poster_url: images.poster(details.poster_path.as_deref()),
        backdrop_url: images.backdrop(details.backdrop_path.as_deref()),
        average_rating: details.vote_average,
        mpaa_rating: mpaa_rating(details),
        tmdb_id: Some(details.id),
    };

    let genres = details
        .genres
        .iter()
        .map(|g| ImportGenre {
            tmdb_id: g.id,
            name: g.name.clone(),
        })
        .collect();

    ConvertedMovie { movie, genres }
}

fn crew_role(job: &str) -> Option<&'static str> {
    match job {
        "Director" => Some(ROLE_DIRECTOR),
        "Screenplay" | "Writer" => Some(ROLE_WRITER),
        "Producer" => Some(ROLE_PRODUCER),
        _ => None,
    }
}

/// Top-billed cast as actors, then directors, writers and producers. A crew
/// member is linked once, under the first matching job.
pub fn convert_credits(credits: &Credits, images: &ImageUrls) -> Vec<ImportCredit> {
    let mut out: Vec<ImportCredit> = credits
        .cast
        .iter()
        .take(MAX_IMPORTED_CAST)
        .map(|member| ImportCredit {
            person: ImportPerson {
                tmdb_id: member.id,
                name: member.name.clone(),
                profile_image_url: images.profile(member.profile_path.as_deref()),
            },
            role: ROLE_ACTOR.to_string(),
            character_name: member.character.clone(),
            cast_order: Some(member.order),
        })
        .collect();

    let mut linked_crew = std::collections::HashSet::new();
    for member in &credits.crew {
        let Some(role) = crew_role(&member.job) else {
            continue;
        };
        if !linked_crew.insert(member.id) {
            continue;
        }
        out.push(ImportCredit {
            person: ImportPerson {
                tmdb_id: member.id,
                name: member.name.clone(),
                profile_image_url: images.profile(member.profile_path.as_deref()),
            },
            role: role.to_string(),
            character_name: String::new(),
            cast_order: None,
        });
    }

    out
}
