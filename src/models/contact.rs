use chrono::{DateTime, Datelike, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

lazy_static! {
    // Digits, spaces and the usual phone punctuation.
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9][0-9 ()-]*$").unwrap();
}

/// Input structure for creating or replacing a contact.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContactInput {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50))]
    pub last_name: String,

    #[validate(email, length(max = 100))]
    pub email: String,

    /// Must be 3 to 20 characters of digits, spaces, `+`, `-`, `(` or `)`.
    #[validate(
        length(min = 3, max = 20),
        regex(path = "PHONE_REGEX", message = "Phone number contains invalid characters")
    )]
    pub phone_number: String,

    #[serde(default)]
    pub birth_date: Option<NaiveDate>,

    #[serde(default)]
    #[validate(length(max = 255))]
    pub additional_info: Option<String>,
}

/// A contact as stored in the `contacts` table and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Contact {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birth_date: Option<NaiveDate>,
    pub additional_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Owner of the contact.
    pub user_id: i32,
}

/// Pagination parameters for listing contacts.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct ContactQuery {
    #[validate(range(min = 0))]
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Query parameters for the upcoming-birthdays listing.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct BirthdayQuery {
    /// Size of the window in days, counted from today.
    #[validate(range(min = 1, max = 365))]
    pub days: Option<i64>,
}

/// Search filters. A contact matches when ANY provided filter matches
/// (case-insensitive substring).
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct ContactSearch {
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    #[validate(length(min = 3, max = 100))]
    pub email: Option<String>,
}

impl ContactSearch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email.is_none()
    }

    /// In-process equivalent of the SQL `ILIKE` filter.
    pub fn matches(&self, contact: &Contact) -> bool {
        if self.is_empty() {
            return true;
        }
        let contains = |haystack: &str, needle: &Option<String>| {
            needle
                .as_deref()
                .map(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
                .unwrap_or(false)
        };
        contains(&contact.first_name, &self.first_name)
            || contains(&contact.last_name, &self.last_name)
            || contains(&contact.email, &self.email)
    }
}

/// The date in `year` on which a birthday falls. A 29 February birthday is
/// celebrated on 28 February in non-leap years.
fn anniversary(birth_date: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, birth_date.month(), birth_date.day()).or_else(|| {
        if birth_date.month() == 2 && birth_date.day() == 29 {
            NaiveDate::from_ymd_opt(year, 2, 28)
        } else {
            None
        }
    })
}

/// The first birthday on or after `today`.
pub fn next_birthday(birth_date: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    let this_year = anniversary(birth_date, today.year())?;
    if this_year >= today {
        Some(this_year)
    } else {
        anniversary(birth_date, today.year() + 1)
    }
}

/// Days from `today` until the next birthday; 0 when the birthday is today.
pub fn days_until_birthday(birth_date: NaiveDate, today: NaiveDate) -> Option<i64> {
    next_birthday(birth_date, today).map(|next| (next - today).num_days())
}
