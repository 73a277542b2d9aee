use lazy_static::lazy_static;
use regex::Regex;
use time::{Date, OffsetDateTime};

use crate::error::{AppError, AppResult};

pub const NAME_MAX: usize = 200;
pub const EMAIL_MAX: usize = 200;
pub const PLACE_MAX: usize = 100;
pub const ADDRESS_MAX: usize = 500;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Birth dates must be strictly before the current UTC date.
pub(crate) fn ensure_birth_date(birth_date: Date) -> AppResult<()> {
    if birth_date >= today_utc() {
        return Err(AppError::validation("Birth date must be before today"));
    }
    Ok(())
}

/// Collapse blank optional strings to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn max_len(value: &str, max: usize, field: &str) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Field-shape checks shared by every person write and by registration.
pub(crate) fn check_person_shape(
    name: &str,
    sex: Option<&str>,
    email: Option<&str>,
    birthplace: Option<&str>,
    nationality: Option<&str>,
    document: &str,
) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    max_len(name, NAME_MAX, "Name")?;

    if let Some(sex) = sex {
        if sex != "M" && sex != "F" {
            return Err(AppError::validation("Sex must be M or F"));
        }
    }

    if let Some(email) = email {
        max_len(email, EMAIL_MAX, "Email")?;
        if !is_valid_email(email) {
            return Err(AppError::validation("Invalid email"));
        }
    }

    if let Some(place) = birthplace {
        max_len(place, PLACE_MAX, "Birthplace")?;
    }
    if let Some(nat) = nationality {
        max_len(nat, PLACE_MAX, "Nationality")?;
    }

    if document.trim().is_empty() {
        return Err(AppError::validation("Document is required"));
    }
    Ok(())
}

pub(crate) fn check_address(address: &str) -> AppResult<()> {
    if address.trim().is_empty() {
        return Err(AppError::validation("Address is required in version 2"));
    }
    max_len(address, ADDRESS_MAX, "Address")
}
