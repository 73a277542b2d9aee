//! Person endpoints, mounted once per API version.
//!
//! | Method   | Path                   | Notes                         |
//! |----------|------------------------|-------------------------------|
//! | `GET`    | `/v{1,2}/people`       | every record, ordered by id   |
//! | `POST`   | `/v{1,2}/people`       | 201; v2 requires `address`    |
//! | `GET`    | `/v{1,2}/people/:id`   | 404 if unknown                |
//! | `PUT`    | `/v{1,2}/people/:id`   | full replacement              |
//! | `DELETE` | `/v{1,2}/people/:id`   | 204, or 404 if unknown        |

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult},
    people::{
        dto::{PersonInputV1, PersonInputV2, PersonV1, PersonV2},
        services::{self, PersonFields, PERSON_NOT_FOUND},
    },
    state::AppState,
};

pub fn v1_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/people", get(list_v1).post(create_v1))
        .route("/v1/people/:id", get(get_v1).put(update_v1).delete(delete_person))
}

pub fn v2_routes() -> Router<AppState> {
    Router::new()
        .route("/v2/people", get(list_v2).post(create_v2))
        .route("/v2/people/:id", get(get_v2).put(update_v2).delete(delete_person))
}

fn location(version: &str, id: i32) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(v) = HeaderValue::from_str(&format!("/api/{version}/people/{id}")) {
        headers.insert(header::LOCATION, v);
    }
    headers
}

// --- v1 ---

#[instrument(skip(state))]
pub async fn list_v1(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<PersonV1>>> {
    let people = services::list_people(&state).await?;
    Ok(Json(people.iter().map(PersonV1::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_v1(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<PersonV1>> {
    let person = services::get_person(&state, id)
        .await?
        .ok_or_else(|| AppError::not_found(PERSON_NOT_FOUND))?;
    Ok(Json(PersonV1::from(&person)))
}

#[instrument(skip(state, payload))]
pub async fn create_v1(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<PersonInputV1>,
) -> AppResult<(StatusCode, HeaderMap, Json<PersonV1>)> {
    let person = services::create_person(&state, PersonFields::from(payload)).await?;
    Ok((
        StatusCode::CREATED,
        location("v1", person.id),
        Json(PersonV1::from(&person)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_v1(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<PersonInputV1>,
) -> AppResult<Json<PersonV1>> {
    let person = services::update_person(&state, id, PersonFields::from(payload)).await?;
    Ok(Json(PersonV1::from(&person)))
}

// --- v2 ---

#[instrument(skip(state))]
pub async fn list_v2(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<PersonV2>>> {
    let people = services::list_people(&state).await?;
    Ok(Json(people.iter().map(PersonV2::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_v2(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<PersonV2>> {
    let person = services::get_person(&state, id)
        .await?
        .ok_or_else(|| AppError::not_found(PERSON_NOT_FOUND))?;
    Ok(Json(PersonV2::from(&person)))
}

#[instrument(skip(state, payload))]
pub async fn create_v2(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<PersonInputV2>,
) -> AppResult<(StatusCode, HeaderMap, Json<PersonV2>)> {
    let fields = PersonFields::try_from(payload)?;
    let person = services::create_person(&state, fields).await?;
    Ok((
        StatusCode::CREATED,
        location("v2", person.id),
        Json(PersonV2::from(&person)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_v2(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<PersonInputV2>,
) -> AppResult<Json<PersonV2>> {
    let fields = PersonFields::try_from(payload)?;
    let person = services::update_person(&state, id, fields).await?;
    Ok(Json(PersonV2::from(&person)))
}

// --- shared ---

#[instrument(skip(state))]
pub async fn delete_person(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    services::delete_person(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
