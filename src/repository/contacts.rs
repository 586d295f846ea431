use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{Contact, ContactInput, ContactSearch};
use crate::repository::like_pattern;

const CONTACT_COLUMNS: &str = "id, first_name, last_name, email, phone_number, birth_date, \
     additional_info, created_at, updated_at, user_id";

#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// The owner's contacts ordered by id.
    async fn list(&self, owner_id: i32, skip: i64, limit: i64) -> Result<Vec<Contact>, AppError>;

    async fn get(&self, owner_id: i32, contact_id: i32) -> Result<Option<Contact>, AppError>;

    async fn create(&self, owner_id: i32, input: &ContactInput) -> Result<Contact, AppError>;

    /// Replaces every field of the contact. `None` if it does not exist or is not owned.
    async fn update(
        &self,
        owner_id: i32,
        contact_id: i32,
        input: &ContactInput,
    ) -> Result<Option<Contact>, AppError>;

    /// Deletes and returns the contact. `None` if it does not exist or is not owned.
    async fn delete(&self, owner_id: i32, contact_id: i32) -> Result<Option<Contact>, AppError>;

    /// Every contact of the owner that has a birth date.
    async fn list_with_birth_date(&self, owner_id: i32) -> Result<Vec<Contact>, AppError>;

    async fn search(&self, owner_id: i32, filter: &ContactSearch)
        -> Result<Vec<Contact>, AppError>;
}

/// `ContactRepository` over PostgreSQL.
#[derive(Clone)]
pub struct PgContactRepository {
    pool: PgPool,
}

impl PgContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    async fn list(&self, owner_id: i32, skip: i64, limit: i64) -> Result<Vec<Contact>, AppError> {
        let sql = format!(
            "SELECT {} FROM contacts WHERE user_id = $1 ORDER BY id LIMIT $2 OFFSET $3",
            CONTACT_COLUMNS
        );
        let contacts = sqlx::query_as::<_, Contact>(&sql)
            .bind(owner_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;
        Ok(contacts)
    }

    async fn get(&self, owner_id: i32, contact_id: i32) -> Result<Option<Contact>, AppError> {
        let sql = format!(
            "SELECT {} FROM contacts WHERE id = $1 AND user_id = $2",
            CONTACT_COLUMNS
        );
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(contact_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(contact)
    }

    async fn create(&self, owner_id: i32, input: &ContactInput) -> Result<Contact, AppError> {
        let sql = format!(
            "INSERT INTO contacts (first_name, last_name, email, phone_number, birth_date, additional_info, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {}",
            CONTACT_COLUMNS
        );
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.phone_number)
            .bind(input.birth_date)
            .bind(&input.additional_info)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(contact)
    }

    async fn update(
        &self,
        owner_id: i32,
        contact_id: i32,
        input: &ContactInput,
    ) -> Result<Option<Contact>, AppError> {
        let sql = format!(
            "UPDATE contacts \
             SET first_name = $1, last_name = $2, email = $3, phone_number = $4, \
                 birth_date = $5, additional_info = $6, updated_at = NOW() \
             WHERE id = $7 AND user_id = $8 \
             RETURNING {}",
            CONTACT_COLUMNS
        );
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.phone_number)
            .bind(input.birth_date)
            .bind(&input.additional_info)
            .bind(contact_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(contact)
    }

    async fn delete(&self, owner_id: i32, contact_id: i32) -> Result<Option<Contact>, AppError> {
        let sql = format!(
            "DELETE FROM contacts WHERE id = $1 AND user_id = $2 RETURNING {}",
            CONTACT_COLUMNS
        );
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(contact_id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(contact)
    }

    async fn list_with_birth_date(&self, owner_id: i32) -> Result<Vec<Contact>, AppError> {
        let sql = format!(
            "SELECT {} FROM contacts WHERE user_id = $1 AND birth_date IS NOT NULL ORDER BY id",
            CONTACT_COLUMNS
        );
        let contacts = sqlx::query_as::<_, Contact>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(contacts)
    }

    async fn search(
        &self,
        owner_id: i32,
        filter: &ContactSearch,
    ) -> Result<Vec<Contact>, AppError> {
        let mut sql = format!("SELECT {} FROM contacts WHERE user_id = $1", CONTACT_COLUMNS);

        // Each provided filter adds one ILIKE condition; conditions are OR-ed.
        let terms: Vec<(&str, &str)> = [
            ("first_name", filter.first_name.as_deref()),
            ("last_name", filter.last_name.as_deref()),
            ("email", filter.email.as_deref()),
        ]
        .into_iter()
        .filter_map(|(column, term)| term.map(|t| (column, t)))
        .collect();

        if !terms.is_empty() {
            let conditions: Vec<String> = terms
                .iter()
                .enumerate()
                .map(|(i, (column, _))| format!("{} ILIKE ${}", column, i + 2))
                .collect();
            sql.push_str(" AND (");
            sql.push_str(&conditions.join(" OR "));
            sql.push(')');
        }
        sql.push_str(" ORDER BY id");

        let mut query_builder = sqlx::query_as::<_, Contact>(&sql).bind(owner_id);
        for (_, term) in &terms {
            query_builder = query_builder.bind(like_pattern(term));
        }

        let contacts = query_builder.fetch_all(&self.pool).await?;
        Ok(contacts)
    }
}
