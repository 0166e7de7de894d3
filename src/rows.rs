//! Reading and writing the comma separated tables the pipeline keeps on disk
//!
//! Rows are numeric-aware: quoted fields are text (a doubled quote escapes a quote), unquoted
//! fields are numbers and an empty field is null. That is enough for every table we write, and it
//! means a token like `"nan"` can never be mistaken for a number.
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use nom::branch::alt;
use nom::bytes::complete::{is_not, tag};
use nom::character::complete::char;
use nom::combinator::{all_consuming, map, map_res, success, value};
use nom::multi::{many0, separated_list1};
use nom::number::complete::recognize_float;
use nom::sequence::delimited;
use nom::IResult;

use crate::errors::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Text(String),
    Int(i64),
    Float(f64),
    Null,
}

impl Field {
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Field::Int(i) => Some(i),
            Field::Float(f) if f.fract() == 0.0 => Some(f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Field::Int(i) => Some(i as f64),
            Field::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match *self {
            Field::Text(ref s) => Some(s),
            _ => None,
        }
    }
}

fn quoted(input: &str) -> IResult<&str, Field> {
    map(
        delimited(
            char('"'),
            many0(alt((is_not("\""), value("\"", tag("\"\""))))),
            char('"'),
        ),
        |pieces: Vec<&str>| Field::Text(pieces.concat()),
    )(input)
}

fn number(input: &str) -> IResult<&str, Field> {
    map_res(recognize_float, |digits: &str| {
        if digits.contains(|c: char| c == '.' || c == 'e' || c == 'E') {
            digits.parse().map(Field::Float).map_err(|_| ())
        } else {
            digits.parse().map(Field::Int).map_err(|_| ())
        }
    })(input)
}

fn field(input: &str) -> IResult<&str, Field> {
    alt((quoted, number, map(success(()), |_| Field::Null)))(input)
}

/// Parse one line into fields. Fails unless the whole line is understood.
pub fn parse_row(line: &str) -> Option<Vec<Field>> {
    let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
    all_consuming(separated_list1(char(','), field))(line)
        .ok()
        .map(|(_rest, fields)| fields)
}

/// Quote a text field for writing
pub fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Walk the rows of a table, handing each parsed row and its 1-based line number to `visit`.
///
/// Blank lines are ignored; a header, if `header` says there is one, is skipped unparsed.
pub fn for_each_row<P, F>(path: P, header: bool, mut visit: F) -> Result<()>
    where P: AsRef<Path>, F: FnMut(usize, &[Field]) -> Result<()> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if (header && idx == 0) || line.trim().is_empty() {
            continue;
        }
        let fields = parse_row(&line)
            .ok_or_else(|| Error::malformed(path, idx + 1, format!("cannot parse {:?}", line)))?;
        visit(idx + 1, &fields)?;
    }
    Ok(())
}

/// Fetch an integer column, complaining with the position if it isn't one
pub fn int_at(fields: &[Field], col: usize, path: &Path, line: usize) -> Result<i64> {
    fields.get(col)
        .and_then(Field::as_i64)
        .ok_or_else(|| Error::malformed(path, line, format!("column {} is not an integer", col)))
}

/// An integer column that must be at least `min` and fit in `T`
pub fn bounded_at<T: TryFrom<i64>>(fields: &[Field], col: usize, min: i64, path: &Path, line: usize)
    -> Result<T> {
    let value = int_at(fields, col, path, line)?;
    if value < min {
        return Err(Error::malformed(path, line, format!("column {} is {}, below {}", col, value, min)));
    }
    T::try_from(value)
        .map_err(|_| Error::malformed(path, line, format!("column {} is out of range: {}", col, value)))
}

/// Like `int_at` but an empty field is fine
pub fn opt_int_at(fields: &[Field], col: usize, path: &Path, line: usize) -> Result<Option<i64>> {
    match fields.get(col) {
        Some(&Field::Null) | None => Ok(None),
        Some(_) => int_at(fields, col, path, line).map(Some),
    }
}

pub fn float_at(fields: &[Field], col: usize, path: &Path, line: usize) -> Result<f64> {
    fields.get(col)
        .and_then(Field::as_f64)
        .ok_or_else(|| Error::malformed(path, line, format!("column {} is not a number", col)))
}

pub fn text_at<'f>(fields: &'f [Field], col: usize, path: &Path, line: usize) -> Result<&'f str> {
    fields.get(col)
        .and_then(Field::as_text)
        .ok_or_else(|| Error::malformed(path, line, format!("column {} is not quoted text", col)))
}

/// Write an optional value, nothing for null
pub fn write_opt<W: Write, T: ::std::fmt::Display>(out: &mut W, value: Option<T>) -> ::std::io::Result<()> {
    match value {
        Some(v) => write!(out, "{}", v),
        None => Ok(()),
    }
}
