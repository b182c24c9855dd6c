//! Parsers for the preprocessed graph files.
//!
//! This module handles parsing the files written by the preprocessing step:
//! - datainfo.md: movies genres casts users total
//! - mId2CC.txt / mId2Genre.txt: mId count id_1 .. id_count
//! - rating_train.csv: header, then uId,mId,binary,rating
//!
//! All ids in these files are global ids. The parsers only check syntax and
//! return raw records; range checks against the node layout happen in the
//! loader once the counts are known.

use crate::error::{DataLoadError, Result};
use crate::types::{NodeCounts, RatingValue};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

/// One line of a membership file: a movie and its genre or cast ids
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipRecord {
    pub line: usize,
    pub movie: u64,
    pub members: Vec<u64>,
}

/// One row of the rating table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingRecord {
    pub line: usize,
    pub user: u64,
    pub movie: u64,
    pub rating: RatingValue,
}

/// Read a whole file, reporting a missing file by path
fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse one token, naming the field in the error
fn parse_field<T>(token: &str, file: &str, line: usize, field: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    token.trim().parse().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {} ({:?})", field, e, token),
    })
}

/// Parse the node-count record
///
/// Format: five whitespace-separated integers, `movies genres casts users total`
///
/// Returns the counts and the declared total; the caller checks that they agree.
pub fn parse_node_counts(path: &Path) -> Result<(NodeCounts, u64)> {
    let file = file_name(path);
    let content = read_to_string(path)?;
    let tokens: Vec<&str> = content.split_whitespace().collect();

    if tokens.len() != 5 {
        return Err(DataLoadError::FieldCountMismatch {
            file,
            expected: 5,
            found: tokens.len(),
            line: 1,
        });
    }

    let counts = NodeCounts {
        movies: parse_field(tokens[0], &file, 1, "movie count")?,
        genres: parse_field(tokens[1], &file, 1, "genre count")?,
        casts: parse_field(tokens[2], &file, 1, "cast count")?,
        users: parse_field(tokens[3], &file, 1, "user count")?,
    };
    let total = parse_field(tokens[4], &file, 1, "total count")?;

    Ok((counts, total))
}

/// Parse a movie membership file (mId2CC.txt or mId2Genre.txt)
///
/// Format: `mId n id_1 ... id_n`, space separated
///
/// The declared count `n` must match the number of ids on the line.
pub fn parse_memberships(path: &Path) -> Result<Vec<MembershipRecord>> {
    let file = file_name(path);
    let content = read_to_string(path)?;
    let mut records = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let mut parts = line.split_whitespace();

        let Some(movie) = parts.next() else {
            continue; // Skip empty lines
        };
        let movie = parse_field(movie, &file, line_no, "mId")?;

        let declared: usize = parts
            .next()
            .ok_or_else(|| DataLoadError::ParseError {
                file: file.clone(),
                line: line_no,
                reason: "Missing member count".to_string(),
            })
            .and_then(|t| parse_field(t, &file, line_no, "member count"))?;

        let members = parts
            .map(|t| parse_field(t, &file, line_no, "member id"))
            .collect::<Result<Vec<u64>>>()?;

        if members.len() != declared {
            return Err(DataLoadError::FieldCountMismatch {
                file,
                expected: declared + 2,
                found: members.len() + 2,
                line: line_no,
            });
        }

        records.push(MembershipRecord {
            line: line_no,
            movie,
            members,
        });
    }

    Ok(records)
}

/// Parse the rating table
///
/// Format: a header line, then `uId,mId,binary,rating`
///
/// The binary column is a thresholded copy of the rating and is ignored.
pub fn parse_ratings(path: &Path) -> Result<Vec<RatingRecord>> {
    let file = file_name(path);
    let content = read_to_string(path)?;
    let mut ratings = Vec::new();

    // The first line is always the header
    for (idx, line) in content.lines().enumerate().skip(1) {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line_trimmed.split(',').collect();
        if parts.len() != 4 {
            return Err(DataLoadError::FieldCountMismatch {
                file,
                expected: 4,
                found: parts.len(),
                line: line_no,
            });
        }

        ratings.push(RatingRecord {
            line: line_no,
            user: parse_field(parts[0], &file, line_no, "uId")?,
            movie: parse_field(parts[1], &file, line_no, "mId")?,
            rating: parse_field(parts[3], &file, line_no, "rating")?,
        });
    }

    Ok(ratings)
}
