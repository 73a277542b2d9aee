use async_trait::async_trait;
use anyhow::Context;
use sqlx::PgPool;

use crate::db::classify;
use crate::people::repo_types::{NewPerson, Person};

#[async_trait]
pub trait PersonRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> anyhow::Result<Option<Person>>;
    async fn get_by_document(&self, document: &str) -> anyhow::Result<Option<Person>>;
    /// Every record, ordered by id.
    async fn get_all(&self) -> anyhow::Result<Vec<Person>>;
    async fn insert(&self, person: NewPerson) -> anyhow::Result<Person>;
    /// `None` when the row no longer exists.
    async fn update(&self, person: &Person) -> anyhow::Result<Option<Person>>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: i32) -> anyhow::Result<bool>;
    /// Whether any record other than `exclude_id` holds `document`.
    async fn exists_by_document(
        &self,
        document: &str,
        exclude_id: Option<i32>,
    ) -> anyhow::Result<bool>;
}

const PERSON_COLUMNS: &str = "id, name, sex, email, birth_date, birthplace, nationality, \
                              document, address, created_at, updated_at";

#[derive(Clone)]
pub struct PgPersonRepository {
    db: PgPool,
}

impl PgPersonRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PersonRepository for PgPersonRepository {
    async fn get_by_id(&self, id: i32) -> anyhow::Result<Option<Person>> {
        let person = sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM people WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get person by id")?;
        Ok(person)
    }

    async fn get_by_document(&self, document: &str) -> anyhow::Result<Option<Person>> {
        let person = sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM people WHERE document = $1"
        ))
        .bind(document)
        .fetch_optional(&self.db)
        .await
        .context("get person by document")?;
        Ok(person)
    }

    async fn get_all(&self) -> anyhow::Result<Vec<Person>> {
        let rows = sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM people ORDER BY id"
        ))
        .fetch_all(&self.db)
        .await
        .context("list people")?;
        Ok(rows)
    }

    async fn insert(&self, p: NewPerson) -> anyhow::Result<Person> {
        let person = sqlx::query_as::<_, Person>(&format!(
            r#"
            INSERT INTO people
                (name, sex, email, birth_date, birthplace, nationality,
                 document, address, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PERSON_COLUMNS}
            "#
        ))
        .bind(&p.name)
        .bind(&p.sex)
        .bind(&p.email)
        .bind(p.birth_date)
        .bind(&p.birthplace)
        .bind(&p.nationality)
        .bind(&p.document)
        .bind(&p.address)
        .bind(p.created_at)
        .bind(p.updated_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| classify(e, "insert person"))?;
        Ok(person)
    }

    async fn update(&self, p: &Person) -> anyhow::Result<Option<Person>> {
        let person = sqlx::query_as::<_, Person>(&format!(
            r#"
            UPDATE people
               SET name = $2, sex = $3, email = $4, birth_date = $5,
                   birthplace = $6, nationality = $7, document = $8,
                   address = $9, updated_at = $10
             WHERE id = $1
            RETURNING {PERSON_COLUMNS}
            "#
        ))
        .bind(p.id)
        .bind(&p.name)
        .bind(&p.sex)
        .bind(&p.email)
        .bind(p.birth_date)
        .bind(&p.birthplace)
        .bind(&p.nationality)
        .bind(&p.document)
        .bind(&p.address)
        .bind(p.updated_at)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| classify(e, "update person"))?;
        Ok(person)
    }

    async fn delete(&self, id: i32) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM people WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete person")?;
        Ok(res.rows_affected() > 0)
    }

    async fn exists_by_document(
        &self,
        document: &str,
        exclude_id: Option<i32>,
    ) -> anyhow::Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM people
                 WHERE document = $1
                   AND ($2::INT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(document)
        .bind(exclude_id)
        .fetch_one(&self.db)
        .await
        .context("check document uniqueness")?;
        Ok(exists)
    }
}
