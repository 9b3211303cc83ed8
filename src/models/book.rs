//! Book model and the payload parsing shared by the JSON API and the admin console.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult, FieldErrors};

pub const TITLE_MAX_LEN: u64 = 255;
pub const AUTHOR_MAX_LEN: u64 = 255;

const MSG_REQUIRED: &str = "This field is required.";
const MSG_NULL: &str = "This field may not be null.";
const MSG_BLANK: &str = "This field may not be blank.";
const MSG_NOT_STRING: &str = "Not a valid string.";
const MSG_NOT_INTEGER: &str = "A valid integer is required.";

/// Availability of a catalog copy. Stored and serialized as its Russian label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum BookStatus {
    #[default]
    #[serde(rename = "В наличии")]
    Available,
    #[serde(rename = "Выдана")]
    CheckedOut,
}

impl BookStatus {
    pub const ALL: [BookStatus; 2] = [BookStatus::Available, BookStatus::CheckedOut];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "В наличии",
            BookStatus::CheckedOut => "Выдана",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct InvalidStatus(pub String);

impl TryFrom<String> for BookStatus {
    type Error = InvalidStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BookStatus::parse(&value).ok_or(InvalidStatus(value))
    }
}

/// Book record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    /// Publication year
    pub year: i32,
    #[sqlx(try_from = "String")]
    pub status: BookStatus,
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Create book request, as accepted by the collection endpoint.
///
/// There is no status: new books always start out available.
#[derive(Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub year: i32,
}

/// A complete row to insert
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct NewBook {
    #[validate(length(max = TITLE_MAX_LEN, message = "Ensure this field has no more than 255 characters."))]
    pub title: String,
    #[validate(length(max = AUTHOR_MAX_LEN, message = "Ensure this field has no more than 255 characters."))]
    pub author: String,
    pub year: i32,
    pub status: BookStatus,
}

/// Update book request. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Validate, ToSchema)]
pub struct BookChanges {
    #[validate(length(max = TITLE_MAX_LEN, message = "Ensure this field has no more than 255 characters."))]
    pub title: Option<String>,
    #[validate(length(max = AUTHOR_MAX_LEN, message = "Ensure this field has no more than 255 characters."))]
    pub author: Option<String>,
    pub year: Option<i32>,
    pub status: Option<BookStatus>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.year.is_none() && self.status.is_none()
    }

    /// Parse an update body. A full update (PUT) requires title, author and
    /// year; a partial one (PATCH) accepts any subset.
    pub fn from_json(body: &Value, partial: bool) -> AppResult<Self> {
        let required: &[&str] = if partial { &[] } else { &["title", "author", "year"] };
        let changes = BookFields::parse(object(body)?, required, true)?;
        validate(changes)
    }
}

impl CreateBook {
    /// Parse a create body. Any `status` or `id` in the body is ignored.
    pub fn from_json(body: &Value) -> AppResult<Self> {
        let fields = BookFields::parse(object(body)?, &["title", "author", "year"], false)?;
        let fields = validate(fields)?;
        match (fields.title, fields.author, fields.year) {
            (Some(title), Some(author), Some(year)) => Ok(Self { title, author, year }),
            _ => Err(AppError::Internal("required book fields missing after validation".into())),
        }
    }

    pub fn into_new_book(self, status: BookStatus) -> NewBook {
        NewBook {
            title: self.title,
            author: self.author,
            year: self.year,
            status,
        }
    }
}

impl NewBook {
    /// Parse a record where every column, status included, must be supplied.
    pub fn from_fields(fields: &Map<String, Value>) -> AppResult<Self> {
        let parsed = BookFields::parse(fields, &["title", "author", "year", "status"], true)?;
        let parsed = validate(parsed)?;
        match (parsed.title, parsed.author, parsed.year, parsed.status) {
            (Some(title), Some(author), Some(year), Some(status)) => Ok(Self {
                title,
                author,
                year,
                status,
            }),
            _ => Err(AppError::Internal("required book fields missing after validation".into())),
        }
    }

    pub fn into_changes(self) -> BookChanges {
        BookChanges {
            title: Some(self.title),
            author: Some(self.author),
            year: Some(self.year),
            status: Some(self.status),
        }
    }
}

fn object(body: &Value) -> AppResult<&Map<String, Value>> {
    body.as_object().ok_or_else(|| {
        let kind = match body {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "str",
            Value::Array(_) => "list",
            Value::Object(_) => "dict",
        };
        AppError::field(
            FieldErrors::NON_FIELD,
            format!("Invalid data. Expected a dictionary, but got {}.", kind),
        )
    })
}

fn validate(changes: BookChanges) -> AppResult<BookChanges> {
    match changes.validate() {
        Ok(()) => Ok(changes),
        Err(e) => Err(AppError::Validation(e.into())),
    }
}

/// Field-by-field coercion of a JSON object, collecting every failure.
struct BookFields<'a> {
    map: &'a Map<String, Value>,
    required: &'a [&'a str],
    errors: FieldErrors,
}

impl<'a> BookFields<'a> {
    fn parse(
        map: &'a Map<String, Value>,
        required: &'a [&'a str],
        with_status: bool,
    ) -> AppResult<BookChanges> {
        let mut fields = Self {
            map,
            required,
            errors: FieldErrors::new(),
        };
        let changes = BookChanges {
            title: fields.text("title"),
            author: fields.text("author"),
            year: fields.year("year"),
            status: if with_status { fields.status("status") } else { None },
        };
        fields.errors.into_result(changes)
    }

    /// The raw value, or `None` after recording a missing/null error
    fn value(&mut self, name: &str) -> Option<&'a Value> {
        match self.map.get(name) {
            None => {
                if self.required.iter().any(|r| *r == name) {
                    self.errors.add(name, MSG_REQUIRED);
                }
                None
            }
            Some(Value::Null) => {
                self.errors.add(name, MSG_NULL);
                None
            }
            Some(value) => Some(value),
        }
    }

    fn text(&mut self, name: &str) -> Option<String> {
        let text = match self.value(name)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => {
                self.errors.add(name, MSG_NOT_STRING);
                return None;
            }
        };
        if text.is_empty() {
            self.errors.add(name, MSG_BLANK);
            return None;
        }
        Some(text)
    }

    fn year(&mut self, name: &str) -> Option<i32> {
        let value = self.value(name)?;
        let Some(year) = parse_integer(value) else {
            self.errors.add(name, MSG_NOT_INTEGER);
            return None;
        };
        match i32::try_from(year) {
            Ok(year) => Some(year),
            Err(_) if year > 0 => {
                self.errors.add(
                    name,
                    format!("Ensure this value is less than or equal to {}.", i32::MAX),
                );
                None
            }
            Err(_) => {
                self.errors.add(
                    name,
                    format!("Ensure this value is greater than or equal to {}.", i32::MIN),
                );
                None
            }
        }
    }

    fn status(&mut self, name: &str) -> Option<BookStatus> {
        let raw = match self.value(name)? {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        match BookStatus::try_from(raw) {
            Ok(status) => Some(status),
            Err(e) => {
                self.errors.add(name, e.to_string());
                None
            }
        }
    }
}

/// Integers, integral floats and strings holding an integer (an optional
/// `.0` tail is tolerated). Booleans are rejected.
pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => parse_integer_str(s),
        _ => None,
    }
}

pub fn parse_integer_str(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    let digits = match trimmed.find('.') {
        Some(dot) if trimmed[dot + 1..].chars().all(|c| c == '0') => &trimmed[..dot],
        Some(_) => return None,
        None => trimmed,
    };
    digits.parse().ok()
}
