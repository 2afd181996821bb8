//! Record model (C1): fixed-shape cast/title/result records and their constructors.

use crate::error::ParseError;
use std::cmp::Ordering;
use std::fmt;

/// A fixed-capacity byte buffer mirroring the source's `char[N]` fields. Bytes
/// past the cap are silently discarded, never signalled as an error (§3 invariants).
#[derive(Clone, Copy)]
pub struct BoundedBytes<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> BoundedBytes<N> {
    /// Truncate `bytes` to the field cap and store it verbatim.
    pub fn new(bytes: &[u8]) -> Self {
        let len = bytes.len().min(N);
        let mut buf = [0u8; N];
        buf[..len].copy_from_slice(&bytes[..len]);
        Self { buf, len }
    }

    /// The stored bytes, not including any zero padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl<const N: usize> Default for BoundedBytes<N> {
    fn default() -> Self {
        Self {
            buf: [0u8; N],
            len: 0,
        }
    }
}

impl<const N: usize> PartialEq for BoundedBytes<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}
impl<const N: usize> Eq for BoundedBytes<N> {}

impl<const N: usize> fmt::Debug for BoundedBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(self.as_bytes()))
    }
}

/// `cast_info` relation tuple.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CastRecord {
    /// Primary key of this cast row, not used as a join key.
    pub cast_info_id: i32,
    /// Person appearing in the role.
    pub person_id: i32,
    /// Join key: equates to [`TitleRecord::title_id`].
    pub movie_id: i32,
    /// Role identifier for the person.
    pub person_role_id: i32,
    /// Free-text note, also usable as the left-side key for the prefix join (§4.9).
    pub note: BoundedBytes<100>,
    /// Ordering of the credit within the title.
    pub nr_order: i32,
    /// Role category identifier.
    pub role_id: i32,
}

/// `title` relation tuple.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleRecord {
    /// Join key: equates to [`CastRecord::movie_id`].
    pub title_id: i32,
    /// Title text, probed as the right-side text for the prefix join (§4.9).
    pub title: BoundedBytes<200>,
    /// Index distinguishing entries sharing a title, e.g. "I", "II".
    pub imdb_index: BoundedBytes<12>,
    /// Kind of title (movie, episode, ...).
    pub kind_id: i32,
    /// Year of production.
    pub production_year: i32,
    /// IMDb numeric identifier. A data column, never a join key (see DESIGN.md
    /// Open Question 1).
    pub imdb_id: i32,
    /// Phonetic code for fuzzy title matching.
    pub phonetic_code: BoundedBytes<5>,
    /// Parent title id, for episodes.
    pub episode_of_id: i32,
    /// Season number, for episodes.
    pub season_nr: i32,
    /// Episode number, for episodes.
    pub episode_nr: i32,
    /// Active years range as free text, e.g. "2004-2012".
    pub series_years: BoundedBytes<49>,
    /// MD5 checksum of some canonical representation of the title.
    pub md5sum: BoundedBytes<32>,
}

/// Field-wise concatenation of a matched title and cast record (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    /// See [`TitleRecord::title_id`].
    pub title_id: i32,
    /// See [`TitleRecord::title`].
    pub title: BoundedBytes<200>,
    /// See [`TitleRecord::imdb_index`].
    pub imdb_index: BoundedBytes<12>,
    /// See [`TitleRecord::kind_id`].
    pub kind_id: i32,
    /// See [`TitleRecord::production_year`].
    pub production_year: i32,
    /// See [`TitleRecord::imdb_id`].
    pub imdb_id: i32,
    /// See [`TitleRecord::phonetic_code`].
    pub phonetic_code: BoundedBytes<5>,
    /// See [`TitleRecord::episode_of_id`].
    pub episode_of_id: i32,
    /// See [`TitleRecord::season_nr`].
    pub season_nr: i32,
    /// See [`TitleRecord::episode_nr`].
    pub episode_nr: i32,
    /// See [`TitleRecord::series_years`].
    pub series_years: BoundedBytes<49>,
    /// See [`TitleRecord::md5sum`].
    pub md5sum: BoundedBytes<32>,
    /// See [`CastRecord::cast_info_id`].
    pub cast_info_id: i32,
    /// See [`CastRecord::person_id`].
    pub person_id: i32,
    /// See [`CastRecord::movie_id`].
    pub movie_id: i32,
    /// See [`CastRecord::person_role_id`].
    pub person_role_id: i32,
    /// See [`CastRecord::note`].
    pub note: BoundedBytes<100>,
    /// See [`CastRecord::nr_order`].
    pub nr_order: i32,
    /// See [`CastRecord::role_id`].
    pub role_id: i32,
}

/// Memberwise copy into the fixed result schema. No allocation beyond the fixed
/// record size.
pub fn make_result(cast: &CastRecord, title: &TitleRecord) -> ResultRecord {
    ResultRecord {
        title_id: title.title_id,
        title: title.title,
        imdb_index: title.imdb_index,
        kind_id: title.kind_id,
        production_year: title.production_year,
        imdb_id: title.imdb_id,
        phonetic_code: title.phonetic_code,
        episode_of_id: title.episode_of_id,
        season_nr: title.season_nr,
        episode_nr: title.episode_nr,
        series_years: title.series_years,
        md5sum: title.md5sum,
        cast_info_id: cast.cast_info_id,
        person_id: cast.person_id,
        movie_id: cast.movie_id,
        person_role_id: cast.person_role_id,
        note: cast.note,
        nr_order: cast.nr_order,
        role_id: cast.role_id,
    }
}

const CAST_FIELD_COUNT: usize = 7;
const TITLE_FIELD_COUNT: usize = 12;

fn parse_i32(field: &str) -> i32 {
    field.trim().parse().unwrap_or(0)
}

/// Parse one comma-separated `cast_info` line. `line` must not include the
/// trailing newline.
pub fn parse_cast_line(line: &str, line_number: usize) -> Result<CastRecord, ParseError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != CAST_FIELD_COUNT {
        return Err(ParseError {
            line: line_number,
            expected: CAST_FIELD_COUNT,
            actual: fields.len(),
        });
    }
    Ok(CastRecord {
        cast_info_id: parse_i32(fields[0]),
        person_id: parse_i32(fields[1]),
        movie_id: parse_i32(fields[2]),
        person_role_id: parse_i32(fields[3]),
        note: BoundedBytes::new(fields[4].as_bytes()),
        nr_order: parse_i32(fields[5]),
        role_id: parse_i32(fields[6]),
    })
}

/// Parse one comma-separated `title` line. `line` must not include the trailing
/// newline.
pub fn parse_title_line(line: &str, line_number: usize) -> Result<TitleRecord, ParseError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != TITLE_FIELD_COUNT {
        return Err(ParseError {
            line: line_number,
            expected: TITLE_FIELD_COUNT,
            actual: fields.len(),
        });
    }
    Ok(TitleRecord {
        title_id: parse_i32(fields[0]),
        title: BoundedBytes::new(fields[1].as_bytes()),
        imdb_index: BoundedBytes::new(fields[2].as_bytes()),
        kind_id: parse_i32(fields[3]),
        production_year: parse_i32(fields[4]),
        imdb_id: parse_i32(fields[5]),
        phonetic_code: BoundedBytes::new(fields[6].as_bytes()),
        episode_of_id: parse_i32(fields[7]),
        season_nr: parse_i32(fields[8]),
        episode_nr: parse_i32(fields[9]),
        series_years: BoundedBytes::new(fields[10].as_bytes()),
        md5sum: BoundedBytes::new(fields[11].as_bytes()),
    })
}

/// Strict weak order on `movie_id`. Every sort over cast records MUST use this.
pub fn cast_ordering(a: &CastRecord, b: &CastRecord) -> Ordering {
    a.movie_id.cmp(&b.movie_id)
}

/// Strict weak order on `title_id`. Every sort over title records MUST use this.
pub fn title_ordering(a: &TitleRecord, b: &TitleRecord) -> Ordering {
    a.title_id.cmp(&b.title_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_cast_line() {
        let record = parse_cast_line("1,2,3,4,a note,5,6", 1).unwrap();
        assert_eq!(record.cast_info_id, 1);
        assert_eq!(record.movie_id, 3);
        assert_eq!(record.note.as_bytes(), b"a note");
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = parse_cast_line("1,2,3", 7).unwrap_err();
        assert_eq!(err.line, 7);
        assert_eq!(err.expected, CAST_FIELD_COUNT);
        assert_eq!(err.actual, 3);
    }

    #[test]
    fn note_truncates_at_cap_without_erroring() {
        let long = "x".repeat(150);
        let line = format!("1,2,3,4,{long},5,6");
        let record = parse_cast_line(&line, 1).unwrap();
        assert_eq!(record.note.as_bytes().len(), 100);
    }

    #[test]
    fn make_result_is_memberwise() {
        let cast = parse_cast_line("1,2,3,4,note,5,6", 1).unwrap();
        let title = parse_title_line("3,t,idx,1,1999,9,ph,0,0,0,years,md5", 1).unwrap();
        let result = make_result(&cast, &title);
        assert_eq!(result.title_id, 3);
        assert_eq!(result.movie_id, 3);
        assert_eq!(result.cast_info_id, 1);
    }
}
