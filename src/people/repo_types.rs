use sqlx::FromRow;
use time::{Date, OffsetDateTime};

/// Person record in the database.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Person {
    pub id: i32,
    pub name: String,
    pub sex: Option<String>,
    pub email: Option<String>,
    pub birth_date: Date,
    pub birthplace: Option<String>,
    pub nationality: Option<String>,
    pub document: String,            // normalised, 11 digits
    pub address: Option<String>,     // only captured through the v2 write path
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Person about to be inserted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewPerson {
    pub name: String,
    pub sex: Option<String>,
    pub email: Option<String>,
    pub birth_date: Date,
    pub birthplace: Option<String>,
    pub nationality: Option<String>,
    pub document: String,
    pub address: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
