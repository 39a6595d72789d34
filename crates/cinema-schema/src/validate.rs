use serde_json::{Map, Number, Value};

use crate::error::{FieldError, FieldErrors, IssueCode, PathSegment};
use crate::movie::{Genre, MoviePatch, NewMovie};

pub const MIN_YEAR: i64 = 1900;
pub const MAX_YEAR: i64 = 2022;
pub const MIN_RATE: f64 = 0.0;
pub const MAX_RATE: f64 = 10.0;
pub const DEFAULT_RATE: f64 = 5.0;

type Parse<T> = fn(&'static str, &Value) -> Result<T, Vec<FieldError>>;

/// Per-field rule shared by full and partial validation.
struct Rule<T> {
    key: &'static str,
    missing: &'static str,
    parse: Parse<T>,
}

const TITLE: Rule<String> = Rule {
    key: "title",
    missing: "title is required",
    parse: parse_title,
};

const YEAR: Rule<u16> = Rule {
    key: "year",
    missing: "Required",
    parse: parse_year,
};

const DIRECTOR: Rule<String> = Rule {
    key: "director",
    missing: "Required",
    parse: parse_string,
};

const DURATION: Rule<u64> = Rule {
    key: "duration",
    missing: "Required",
    parse: parse_duration,
};

const RATE: Rule<f64> = Rule {
    key: "rate",
    missing: "Required",
    parse: parse_rate,
};

const POSTER: Rule<String> = Rule {
    key: "poster",
    missing: "Required",
    parse: parse_poster,
};

const GENRE: Rule<Vec<Genre>> = Rule {
    key: "genre",
    missing: "Movie genre is required",
    parse: parse_genre,
};

/// Validate a create payload. Every field except `rate` must be present;
/// `rate` falls back to [`DEFAULT_RATE`]. Unknown keys are ignored.
pub fn validate_full(payload: &Value) -> Result<NewMovie, FieldErrors> {
    let mut reader = FieldReader::new(payload)?;

    let title = reader.required(&TITLE);
    let year = reader.required(&YEAR);
    let director = reader.required(&DIRECTOR);
    let duration = reader.required(&DURATION);
    let rate = reader
        .optional(&RATE)
        .map(|rate| rate.unwrap_or(DEFAULT_RATE));
    let poster = reader.required(&POSTER);
    let genre = reader.required(&GENRE);

    match (title, year, director, duration, rate, poster, genre) {
        (
            Some(title),
            Some(year),
            Some(director),
            Some(duration),
            Some(rate),
            Some(poster),
            Some(genre),
        ) if reader.is_clean() => Ok(NewMovie {
            title,
            year,
            director,
            duration,
            poster,
            genre,
            rate,
        }),
        _ => Err(reader.into_errors()),
    }
}

/// Validate an update payload. No field is required and nothing is
/// defaulted; the patch carries exactly the fields that were sent.
pub fn validate_partial(payload: &Value) -> Result<MoviePatch, FieldErrors> {
    let mut reader = FieldReader::new(payload)?;

    let patch = MoviePatch {
        title: reader.optional(&TITLE).flatten(),
        year: reader.optional(&YEAR).flatten(),
        director: reader.optional(&DIRECTOR).flatten(),
        duration: reader.optional(&DURATION).flatten(),
        rate: reader.optional(&RATE).flatten(),
        poster: reader.optional(&POSTER).flatten(),
        genre: reader.optional(&GENRE).flatten(),
    };

    if reader.is_clean() {
        Ok(patch)
    } else {
        Err(reader.into_errors())
    }
}

struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    errors: Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    fn new(payload: &'a Value) -> Result<Self, FieldErrors> {
        match payload {
            Value::Object(object) => Ok(Self {
                object,
                errors: Vec::new(),
            }),
            other => Err(FieldErrors::from(vec![FieldError::new(
                IssueCode::InvalidType,
                Vec::new(),
                format!("Expected object, received {}", kind(other)),
            )])),
        }
    }

    /// `Some(None)` when absent, `None` when present but invalid.
    fn optional<T>(&mut self, rule: &Rule<T>) -> Option<Option<T>> {
        let Some(value) = self.object.get(rule.key) else {
            return Some(None);
        };
        match (rule.parse)(rule.key, value) {
            Ok(parsed) => Some(Some(parsed)),
            Err(mut errors) => {
                self.errors.append(&mut errors);
                None
            }
        }
    }

    fn required<T>(&mut self, rule: &Rule<T>) -> Option<T> {
        match self.optional(rule)? {
            Some(parsed) => Some(parsed),
            None => {
                self.errors.push(FieldError::new(
                    IssueCode::InvalidType,
                    vec![PathSegment::from(rule.key)],
                    rule.missing,
                ));
                None
            }
        }
    }

    fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn into_errors(self) -> FieldErrors {
        FieldErrors::from(self.errors)
    }
}

fn reject<T>(code: IssueCode, key: &'static str, message: impl Into<String>) -> Result<T, Vec<FieldError>> {
    Err(vec![FieldError::new(code, vec![PathSegment::from(key)], message)])
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse_title(key: &'static str, value: &Value) -> Result<String, Vec<FieldError>> {
    match value {
        Value::String(s) if s.is_empty() => {
            reject(IssueCode::TooSmall, key, "title must not be empty")
        }
        Value::String(s) => Ok(s.clone()),
        _ => reject(IssueCode::InvalidType, key, "title must be a string"),
    }
}

fn parse_string(key: &'static str, value: &Value) -> Result<String, Vec<FieldError>> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => reject(
            IssueCode::InvalidType,
            key,
            format!("Expected string, received {}", kind(other)),
        ),
    }
}

fn parse_number(key: &'static str, value: &Value) -> Result<f64, Vec<FieldError>> {
    match value.as_f64() {
        Some(n) => Ok(n),
        None => reject(
            IssueCode::InvalidType,
            key,
            format!("Expected number, received {}", kind(value)),
        ),
    }
}

enum Integer {
    Exact(i64),
    Fraction,
    Above,
    Below,
}

fn integer(number: &Number) -> Integer {
    if let Some(i) = number.as_i64() {
        return Integer::Exact(i);
    }
    if number.is_u64() {
        return Integer::Above;
    }
    // 2020.0 is still an integer as far as JSON numbers go.
    match number.as_f64() {
        Some(f) if !f.is_finite() || f.fract() != 0.0 => Integer::Fraction,
        Some(f) if f >= i64::MAX as f64 => Integer::Above,
        Some(f) if f < i64::MIN as f64 => Integer::Below,
        Some(f) => Integer::Exact(f as i64),
        None => Integer::Fraction,
    }
}

fn parse_integer(key: &'static str, value: &Value) -> Result<i64, Vec<FieldError>> {
    let Value::Number(number) = value else {
        return reject(
            IssueCode::InvalidType,
            key,
            format!("Expected number, received {}", kind(value)),
        );
    };
    match integer(number) {
        Integer::Exact(i) => Ok(i),
        Integer::Fraction => {
            reject(IssueCode::InvalidType, key, "Expected integer, received float")
        }
        Integer::Above => reject(
            IssueCode::TooBig,
            key,
            format!("Number must be less than or equal to {}", i64::MAX),
        ),
        Integer::Below => reject(
            IssueCode::TooSmall,
            key,
            format!("Number must be greater than or equal to {}", i64::MIN),
        ),
    }
}

fn parse_year(key: &'static str, value: &Value) -> Result<u16, Vec<FieldError>> {
    let year = parse_integer(key, value)?;
    if year < MIN_YEAR {
        return reject(
            IssueCode::TooSmall,
            key,
            format!("Number must be greater than or equal to {MIN_YEAR}"),
        );
    }
    if year > MAX_YEAR {
        return reject(
            IssueCode::TooBig,
            key,
            format!("Number must be less than or equal to {MAX_YEAR}"),
        );
    }
    u16::try_from(year).or_else(|_| {
        reject(
            IssueCode::TooBig,
            key,
            format!("Number must be less than or equal to {MAX_YEAR}"),
        )
    })
}

fn parse_duration(key: &'static str, value: &Value) -> Result<u64, Vec<FieldError>> {
    let duration = parse_integer(key, value)?;
    match u64::try_from(duration) {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => reject(IssueCode::TooSmall, key, "Number must be greater than 0"),
    }
}

fn parse_rate(key: &'static str, value: &Value) -> Result<f64, Vec<FieldError>> {
    let rate = parse_number(key, value)?;
    if rate < MIN_RATE {
        return reject(
            IssueCode::TooSmall,
            key,
            format!("Number must be greater than or equal to {MIN_RATE}"),
        );
    }
    if rate > MAX_RATE {
        return reject(
            IssueCode::TooBig,
            key,
            format!("Number must be less than or equal to {MAX_RATE}"),
        );
    }
    Ok(rate)
}

fn parse_poster(key: &'static str, value: &Value) -> Result<String, Vec<FieldError>> {
    let poster = parse_string(key, value)?;
    match url::Url::parse(&poster) {
        Ok(_) => Ok(poster),
        Err(_) => reject(IssueCode::InvalidString, key, "poster must be a valid URL"),
    }
}

fn expected_genres() -> String {
    Genre::ALL
        .iter()
        .map(|g| format!("'{g}'"))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn parse_genre(key: &'static str, value: &Value) -> Result<Vec<Genre>, Vec<FieldError>> {
    let Value::Array(items) = value else {
        return reject(
            IssueCode::InvalidType,
            key,
            "Movie genre must be an array of enum",
        );
    };
    if items.is_empty() {
        return reject(
            IssueCode::TooSmall,
            key,
            "Movie genre must contain at least one genre",
        );
    }

    let mut genres = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let path = vec![PathSegment::from(key), PathSegment::from(index)];
        match item {
            Value::String(name) => match Genre::from_name(name) {
                Some(genre) => genres.push(genre),
                None => errors.push(FieldError::new(
                    IssueCode::InvalidEnumValue,
                    path,
                    format!(
                        "Invalid enum value. Expected {}, received '{name}'",
                        expected_genres()
                    ),
                )),
            },
            other => errors.push(FieldError::new(
                IssueCode::InvalidType,
                path,
                format!("Expected {}, received {}", expected_genres(), kind(other)),
            )),
        }
    }

    if errors.is_empty() {
        Ok(genres)
    } else {
        Err(errors)
    }
}
