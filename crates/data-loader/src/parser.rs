//! Parser for MovieLens data files.
//!
//! - movies.dat: movieId::title::genres
//! - ratings.dat: userId::movieId::rating::timestamp
//!
//! The files are ISO-8859-1 encoded. Each parse function has a `_str` variant
//! working on already-decoded content, which is what the tests use.

use crate::error::{DataError, Result};
use crate::types::*;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Read a file with ISO-8859-1 encoding (Latin-1)
///
/// Every Latin-1 byte maps directly to the Unicode code point of the same
/// value, so the conversion never fails.
fn read_latin1(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|_| DataError::FileNotFound {
        path: path.display().to_string(),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    Ok(bytes.iter().map(|&b| b as char).collect())
}

/// Iterate over the non-empty lines of `content` as `(line_no, fields)`
fn records<'a>(content: &'a str) -> impl Iterator<Item = (usize, Vec<&'a str>)> + 'a {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx + 1, line.trim().split("::").collect()))
}

/// Take field `pos` named `name`, failing with a located parse error
fn field<'a>(
    fields: &[&'a str],
    pos: usize,
    name: &str,
    file: &str,
    line: usize,
) -> Result<&'a str> {
    fields.get(pos).copied().ok_or_else(|| DataError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Missing {}", name),
    })
}

/// Parse field `pos` named `name` into `T`
fn parse_field<T>(fields: &[&str], pos: usize, name: &str, file: &str, line: usize) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    field(fields, pos, name, file, line)?
        .parse()
        .map_err(|e| DataError::ParseError {
            file: file.to_string(),
            line,
            reason: format!("Invalid {}: {}", name, e),
        })
}

/// Parse the movies.dat file
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    parse_movies_str(&read_latin1(path)?)
}

/// Parse movies.dat content
///
/// The title often includes year in parentheses: "Toy Story (1995)"
/// Genres are pipe-separated: "Animation|Children's|Comedy"
pub fn parse_movies_str(content: &str) -> Result<Vec<Movie>> {
    const FILE: &str = "movies.dat";
    let mut movies = Vec::new();

    for (line, fields) in records(content) {
        let title = field(&fields, 1, "title", FILE, line)?;
        movies.push(Movie {
            id: parse_field(&fields, 0, "movieId", FILE, line)?,
            title: title.to_string(),
            year: extract_year_from_title(title),
            genres: parse_genres(field(&fields, 2, "genres", FILE, line)?)?,
        });
    }
    Ok(movies)
}

/// Parse the ratings.dat file
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    parse_ratings_str(&read_latin1(path)?)
}

/// Parse ratings.dat content
pub fn parse_ratings_str(content: &str) -> Result<Vec<Rating>> {
    const FILE: &str = "ratings.dat";
    let mut ratings = Vec::new();

    for (line, fields) in records(content) {
        ratings.push(Rating {
            user_id: parse_field(&fields, 0, "userId", FILE, line)?,
            movie_id: parse_field(&fields, 1, "movieId", FILE, line)?,
            rating: parse_field(&fields, 2, "rating", FILE, line)?,
            timestamp: parse_field(&fields, 3, "timestamp", FILE, line)?,
        });
    }
    Ok(ratings)
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
fn extract_year_from_title(title: &str) -> Option<u16> {
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        return title[start + 1..end].parse::<u16>().ok();
    }
    None
}

/// Parse a genre string into Genre enum
fn parse_genre(s: &str) -> Result<Genre> {
    match s {
        "Action" => Ok(Genre::Action),
        "Adventure" => Ok(Genre::Adventure),
        "Animation" => Ok(Genre::Animation),
        "Children's" => Ok(Genre::Children), // MovieLens spells it with an apostrophe
        "Comedy" => Ok(Genre::Comedy),
        "Crime" => Ok(Genre::Crime),
        "Documentary" => Ok(Genre::Documentary),
        "Drama" => Ok(Genre::Drama),
        "Fantasy" => Ok(Genre::Fantasy),
        "Film-Noir" => Ok(Genre::FilmNoir),
        "Horror" => Ok(Genre::Horror),
        "Musical" => Ok(Genre::Musical),
        "Mystery" => Ok(Genre::Mystery),
        "Romance" => Ok(Genre::Romance),
        "Sci-Fi" => Ok(Genre::SciFi),
        "Thriller" => Ok(Genre::Thriller),
        "War" => Ok(Genre::War),
        "Western" => Ok(Genre::Western),
        _ => Err(DataError::InvalidValue {
            field: "genre".to_string(),
            value: s.to_string(),
        }),
    }
}

/// Parse pipe-separated genres
fn parse_genres(s: &str) -> Result<Vec<Genre>> {
    s.split('|').map(parse_genre).collect()
}
