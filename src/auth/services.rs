use anyhow::Context;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
        jwt::JwtKeys,
        password::{check_password, hash_password},
        repo_types::NewAccount,
    },
    db::duplicate_constraint,
    document::{is_valid_document, normalize_document, DOCUMENT_LEN},
    error::{AppError, AppResult},
    people::{repo_types::NewPerson, services::INVALID_DOCUMENT},
    state::AppState,
    validation::{check_person_shape, ensure_birth_date, non_blank},
};

pub const PERSON_ALREADY_REGISTERED: &str = "A person with this document is already registered";
pub const EMAIL_ALREADY_REGISTERED: &str = "An account with this email is already registered";
pub const USERNAME_ALREADY_REGISTERED: &str =
    "An account with this document is already registered";
pub const REGISTERED: &str = "Account created successfully";

/// Document-shaped usernames are matched without their punctuation.
pub(crate) fn normalize_username(username: &str) -> String {
    let stripped: String = username
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | ' '))
        .collect();
    if stripped.len() == DOCUMENT_LEN && stripped.chars().all(|c| c.is_ascii_digit()) {
        stripped
    } else {
        username.to_string()
    }
}

pub async fn login(state: &AppState, req: LoginRequest) -> AppResult<LoginResponse> {
    if req.username.trim().is_empty() || req.password.trim().is_empty() {
        warn!("login with blank credentials");
        return Err(AppError::Unauthorized);
    }

    let username = normalize_username(&req.username);

    let Some(account) = state.accounts.get_by_username(&username).await? else {
        warn!(%username, "login unknown username");
        return Err(AppError::Unauthorized);
    };

    if !state
        .accounts
        .validate_credentials(&username, &req.password)
        .await?
    {
        warn!(%username, account_id = account.id, "login rejected");
        return Err(AppError::Unauthorized);
    }

    let issued = JwtKeys::from(&state.config.jwt)
        .sign(&account)
        .context("sign token")?;

    info!(account_id = account.id, username = %account.username, "user logged in");
    Ok(LoginResponse {
        token: issued.token,
        username: account.username,
        expires_at: issued.expires_at,
    })
}

pub async fn register(state: &AppState, req: RegisterRequest) -> AppResult<RegisterResponse> {
    let name = req.name.trim().to_string();
    let sex = non_blank(req.sex);
    let email = non_blank(req.email).map(|e| e.to_lowercase());
    let birthplace = non_blank(req.birthplace);
    let nationality = non_blank(req.nationality);

    check_person_shape(
        &name,
        sex.as_deref(),
        email.as_deref(),
        birthplace.as_deref(),
        nationality.as_deref(),
        &req.document,
    )?;
    check_password(&req.password)?;

    let document = normalize_document(&req.document);

    if state.people.get_by_document(&document).await?.is_some() {
        warn!(%document, "register with document already on file");
        return Err(AppError::validation(PERSON_ALREADY_REGISTERED));
    }

    // Accounts outlive their person record, so the username can still be taken.
    if state.accounts.get_by_username(&document).await?.is_some() {
        warn!(%document, "register with username already taken");
        return Err(AppError::validation(USERNAME_ALREADY_REGISTERED));
    }

    if let Some(email) = &email {
        if state.accounts.get_by_email(email).await?.is_some() {
            warn!(%email, "register with email already taken");
            return Err(AppError::validation(EMAIL_ALREADY_REGISTERED));
        }
    }

    ensure_birth_date(req.birth_date)?;

    if !is_valid_document(&document) {
        return Err(AppError::validation(INVALID_DOCUMENT));
    }

    let password_hash = hash_password(&req.password).context("hash password")?;
    let account_email = email
        .clone()
        .unwrap_or_else(|| format!("{document}@{}", state.config.placeholder_email_domain));

    // Two independent writes: a failure on the account leaves the person behind.
    let now = OffsetDateTime::now_utc();
    let person = state
        .people
        .insert(NewPerson {
            name,
            sex,
            email,
            birth_date: req.birth_date,
            birthplace,
            nationality,
            document: document.clone(),
            address: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .map_err(registration_failure)?;

    let account = state
        .accounts
        .insert(NewAccount {
            username: document,
            email: account_email,
            password_hash,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
        .await
        .map_err(|e| {
            warn!(person_id = person.id, "account insert failed after person was created");
            registration_failure(e)
        })?;

    info!(person_id = person.id, account_id = account.id, username = %account.username, "user registered");
    Ok(RegisterResponse {
        message: REGISTERED.into(),
        username: account.username,
        email: account.email,
    })
}

fn registration_failure(e: anyhow::Error) -> AppError {
    let duplicate = match duplicate_constraint(&e) {
        Some("people_document_key") => Some(PERSON_ALREADY_REGISTERED),
        Some("accounts_username_key") => Some(USERNAME_ALREADY_REGISTERED),
        Some("accounts_email_key") => Some(EMAIL_ALREADY_REGISTERED),
        _ => None,
    };
    match duplicate {
        Some(msg) => AppError::validation(msg),
        None => AppError::Unexpected(e.context("Failed to register account")),
    }
}
