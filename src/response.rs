//! Outbound shapes. Movie references are plucked down to the referenced row's name.

use crate::model::{Director, Genre, Movie};
use serde::Serialize;
use std::collections::HashMap;

/// Movie with `genre` and `director` replaced by their names. A null or dangling reference
/// serializes as `null`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieView {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub trailer: Option<String>,
    pub year: Option<i64>,
    pub rating: Option<f64>,
    pub genre: Option<String>,
    pub director: Option<String>,
}

impl MovieView {
    pub fn new(movie: Movie, genre: Option<&Genre>, director: Option<&Director>) -> Self {
        MovieView {
            id: movie.id,
            title: movie.title,
            description: movie.description,
            trailer: movie.trailer,
            year: movie.year,
            rating: movie.rating,
            genre: genre.and_then(|g| g.name.clone()),
            director: director.and_then(|d| d.name.clone()),
        }
    }
}

/// Referenced rows loaded for one batch of movies.
#[derive(Debug, Default)]
pub struct References {
    pub genres: HashMap<i64, Genre>,
    pub directors: HashMap<i64, Director>,
}

impl References {
    pub fn view(&self, movie: Movie) -> MovieView {
        let genre = movie.genre_id.and_then(|id| self.genres.get(&id));
        let director = movie.director_id.and_then(|id| self.directors.get(&id));
        MovieView::new(movie, genre, director)
    }
}

/// Trailing record of a movies page: the raw `page` / `per_page` query values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PageMeta {
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// One element of the movies collection body: movies first, then a single `PageMeta`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MovieListEntry {
    Movie(MovieView),
    Page(PageMeta),
}

pub fn movie_page(movies: Vec<MovieView>, meta: PageMeta) -> Vec<MovieListEntry> {
    let mut out: Vec<MovieListEntry> = movies.into_iter().map(MovieListEntry::Movie).collect();
    out.push(MovieListEntry::Page(meta));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn movie(genre_id: Option<i64>, director_id: Option<i64>) -> Movie {
        Movie {
            id: 1,
            title: Some("Alien".into()),
            description: Some("In space".into()),
            trailer: Some("https://example.com/alien".into()),
            year: Some(1979),
            rating: Some(8.5),
            genre_id,
            director_id,
        }
    }

    #[test]
    fn plucks_names_of_references() {
        let mut refs = References::default();
        refs.genres.insert(3, Genre { id: 3, name: Some("Horror".into()) });
        refs.directors.insert(5, Director { id: 5, name: Some("Ridley Scott".into()) });

        let v = serde_json::to_value(refs.view(movie(Some(3), Some(5)))).unwrap();
        assert_eq!(
            v,
            json!({
                "id": 1,
                "title": "Alien",
                "description": "In space",
                "trailer": "https://example.com/alien",
                "year": 1979,
                "rating": 8.5,
                "genre": "Horror",
                "director": "Ridley Scott"
            })
        );
    }

    #[test]
    fn missing_references_are_null() {
        let refs = References::default();
        let v = serde_json::to_value(refs.view(movie(None, Some(99)))).unwrap();
        assert_eq!(v["genre"], serde_json::Value::Null);
        assert_eq!(v["director"], serde_json::Value::Null);
        assert!(v.as_object().unwrap().contains_key("director"));
    }

    #[test]
    fn page_meta_trails_the_movies() {
        let refs = References::default();
        let body = movie_page(
            vec![refs.view(movie(None, None))],
            PageMeta {
                page: Some("1".into()),
                per_page: Some("2".into()),
            },
        );
        let v = serde_json::to_value(body).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 2);
        assert_eq!(v[1], json!({"page": "1", "per_page": "2"}));
    }

    #[test]
    fn director_serializes_as_id_and_name() {
        let d = Director { id: 2, name: Some("Kurosawa".into()) };
        assert_eq!(serde_json::to_value(d).unwrap(), json!({"id": 2, "name": "Kurosawa"}));
    }
}
