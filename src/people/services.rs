use time::{Date, OffsetDateTime};
use tracing::{info, warn};

use crate::{
    db::is_duplicate_key,
    document::{is_valid_document, normalize_document},
    error::{AppError, AppResult},
    people::{
        dto::{PersonInputV1, PersonInputV2},
        repo_types::{NewPerson, Person},
    },
    state::AppState,
    validation::{check_address, check_person_shape, ensure_birth_date, non_blank},
};

pub const DOCUMENT_IN_USE: &str = "Document already in use";
pub const DOCUMENT_IN_USE_BY_OTHER: &str = "Document already in use by another person";
pub const INVALID_DOCUMENT: &str = "Invalid document";
pub const PERSON_NOT_FOUND: &str = "Person not found";

/// Write-side person fields, independent of the API version they came from.
#[derive(Debug, Clone)]
pub struct PersonFields {
    pub name: String,
    pub sex: Option<String>,
    pub email: Option<String>,
    pub birth_date: Date,
    pub birthplace: Option<String>,
    pub nationality: Option<String>,
    pub document: String,
    /// `None` leaves any stored address untouched on update.
    pub address: Option<String>,
}

impl From<PersonInputV1> for PersonFields {
    fn from(i: PersonInputV1) -> Self {
        Self {
            name: i.name,
            sex: i.sex,
            email: i.email,
            birth_date: i.birth_date,
            birthplace: i.birthplace,
            nationality: i.nationality,
            document: i.document,
            address: None,
        }
    }
}

impl TryFrom<PersonInputV2> for PersonFields {
    type Error = AppError;

    fn try_from(i: PersonInputV2) -> AppResult<Self> {
        check_address(&i.address)?;
        Ok(Self {
            name: i.name,
            sex: i.sex,
            email: i.email,
            birth_date: i.birth_date,
            birthplace: i.birthplace,
            nationality: i.nationality,
            document: i.document,
            address: Some(i.address.trim().to_string()),
        })
    }
}

impl PersonFields {
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            sex: non_blank(self.sex),
            email: non_blank(self.email),
            birth_date: self.birth_date,
            birthplace: non_blank(self.birthplace),
            nationality: non_blank(self.nationality),
            document: self.document.trim().to_string(),
            address: self.address,
        }
    }

    fn check_shape(&self) -> AppResult<()> {
        check_person_shape(
            &self.name,
            self.sex.as_deref(),
            self.email.as_deref(),
            self.birthplace.as_deref(),
            self.nationality.as_deref(),
            &self.document,
        )
    }
}

/// Uniqueness, check digits and birth date, in that order. Returns the
/// normalised document.
async fn check_rules(
    state: &AppState,
    fields: &PersonFields,
    exclude_id: Option<i32>,
) -> AppResult<String> {
    let document = normalize_document(&fields.document);

    if state.people.exists_by_document(&document, exclude_id).await? {
        warn!(%document, ?exclude_id, "document already in use");
        let msg = match exclude_id {
            Some(_) => DOCUMENT_IN_USE_BY_OTHER,
            None => DOCUMENT_IN_USE,
        };
        return Err(AppError::validation(msg));
    }

    if !is_valid_document(&document) {
        return Err(AppError::validation(INVALID_DOCUMENT));
    }

    ensure_birth_date(fields.birth_date)?;
    Ok(document)
}

pub async fn create_person(state: &AppState, fields: PersonFields) -> AppResult<Person> {
    let fields = fields.normalized();
    fields.check_shape()?;
    let document = check_rules(state, &fields, None).await?;

    let now = OffsetDateTime::now_utc();
    let new = NewPerson {
        name: fields.name,
        sex: fields.sex,
        email: fields.email,
        birth_date: fields.birth_date,
        birthplace: fields.birthplace,
        nationality: fields.nationality,
        document,
        address: fields.address,
        created_at: now,
        updated_at: now,
    };

    let person = state.people.insert(new).await.map_err(|e| {
        if is_duplicate_key(&e) {
            AppError::validation(DOCUMENT_IN_USE)
        } else {
            AppError::Unexpected(e)
        }
    })?;

    info!(person_id = person.id, "person created");
    Ok(person)
}

pub async fn update_person(state: &AppState, id: i32, fields: PersonFields) -> AppResult<Person> {
    let mut existing = state
        .people
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(PERSON_NOT_FOUND))?;

    let fields = fields.normalized();
    fields.check_shape()?;
    let document = check_rules(state, &fields, Some(id)).await?;

    existing.name = fields.name;
    existing.sex = fields.sex;
    existing.email = fields.email;
    existing.birth_date = fields.birth_date;
    existing.birthplace = fields.birthplace;
    existing.nationality = fields.nationality;
    existing.document = document;
    if let Some(address) = fields.address {
        existing.address = Some(address);
    }
    existing.updated_at = OffsetDateTime::now_utc();

    let person = state
        .people
        .update(&existing)
        .await
        .map_err(|e| {
            if is_duplicate_key(&e) {
                AppError::validation(DOCUMENT_IN_USE_BY_OTHER)
            } else {
                AppError::Unexpected(e)
            }
        })?
        // removed concurrently between the lookup and the update
        .ok_or_else(|| AppError::not_found(PERSON_NOT_FOUND))?;

    info!(person_id = person.id, "person updated");
    Ok(person)
}

pub async fn delete_person(state: &AppState, id: i32) -> AppResult<()> {
    if state.people.get_by_id(id).await?.is_none() {
        return Err(AppError::not_found(PERSON_NOT_FOUND));
    }
    if !state.people.delete(id).await? {
        // removed concurrently between the lookup and the delete
        return Err(AppError::not_found(PERSON_NOT_FOUND));
    }
    info!(person_id = id, "person deleted");
    Ok(())
}

pub async fn get_person(state: &AppState, id: i32) -> AppResult<Option<Person>> {
    Ok(state.people.get_by_id(id).await?)
}

pub async fn list_people(state: &AppState) -> AppResult<Vec<Person>> {
    Ok(state.people.get_all().await?)
}
