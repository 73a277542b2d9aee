use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::people::repo_types::Person;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Base (v1) representation of a person.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonV1 {
    pub id: i32,
    pub name: String,
    pub sex: Option<String>,
    pub email: Option<String>,
    #[serde(with = "iso_date")]
    pub birth_date: Date,
    pub birthplace: Option<String>,
    pub nationality: Option<String>,
    pub document: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Extended (v2) representation: every v1 field plus a mandatory address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonV2 {
    pub id: i32,
    pub name: String,
    pub sex: Option<String>,
    pub email: Option<String>,
    #[serde(with = "iso_date")]
    pub birth_date: Date,
    pub birthplace: Option<String>,
    pub nationality: Option<String>,
    pub document: String,
    pub address: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&Person> for PersonV1 {
    fn from(p: &Person) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            sex: p.sex.clone(),
            email: p.email.clone(),
            birth_date: p.birth_date,
            birthplace: p.birthplace.clone(),
            nationality: p.nationality.clone(),
            document: p.document.clone(),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<&Person> for PersonV2 {
    fn from(p: &Person) -> Self {
        let mut v2 = PersonV2::from_base(PersonV1::from(p));
        if let Some(address) = &p.address {
            v2.address = address.clone();
        }
        v2
    }
}

impl PersonV2 {
    /// Extend a base record. The base shape never carries an address, so the
    /// result has an empty one.
    pub fn from_base(v1: PersonV1) -> Self {
        Self {
            id: v1.id,
            name: v1.name,
            sex: v1.sex,
            email: v1.email,
            birth_date: v1.birth_date,
            birthplace: v1.birthplace,
            nationality: v1.nationality,
            document: v1.document,
            address: String::new(),
            created_at: v1.created_at,
            updated_at: v1.updated_at,
        }
    }
}

/// Request body for v1 create/update.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonInputV1 {
    pub name: String,
    pub sex: Option<String>,
    pub email: Option<String>,
    #[serde(with = "iso_date")]
    pub birth_date: Date,
    pub birthplace: Option<String>,
    pub nationality: Option<String>,
    pub document: String,
}

/// Request body for v2 create/update; `address` is mandatory.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonInputV2 {
    pub name: String,
    pub sex: Option<String>,
    pub email: Option<String>,
    #[serde(with = "iso_date")]
    pub birth_date: Date,
    pub birthplace: Option<String>,
    pub nationality: Option<String>,
    pub document: String,
    #[serde(default)]
    pub address: String,
}
