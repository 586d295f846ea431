use chrono::NaiveDate;
use std::sync::Arc;
use validator::Validate;

use crate::error::AppError;
use crate::models::{
    days_until_birthday, Contact, ContactInput, ContactQuery, ContactSearch,
};
use crate::repository::ContactRepository;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_BIRTHDAY_WINDOW_DAYS: i64 = 7;

/// Contact operations for a single owner, layered over a [`ContactRepository`].
#[derive(Clone)]
pub struct ContactService {
    repository: Arc<dyn ContactRepository>,
}

impl ContactService {
    pub fn new(repository: Arc<dyn ContactRepository>) -> Self {
        Self { repository }
    }

    /// Lists the owner's contacts. `limit` is clamped to `1..=MAX_PAGE_SIZE`.
    pub async fn list(&self, owner_id: i32, query: &ContactQuery) -> Result<Vec<Contact>, AppError> {
        query.validate()?;
        let skip = query.skip.unwrap_or(0);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        self.repository.list(owner_id, skip, limit).await
    }

    pub async fn get(&self, owner_id: i32, contact_id: i32) -> Result<Contact, AppError> {
        self.repository
            .get(owner_id, contact_id)
            .await?
            .ok_or_else(contact_not_found)
    }

    pub async fn create(&self, owner_id: i32, input: &ContactInput) -> Result<Contact, AppError> {
        input.validate()?;
        let contact = self.repository.create(owner_id, input).await?;
        log::debug!("User {} created contact {}", owner_id, contact.id);
        Ok(contact)
    }

    pub async fn update(
        &self,
        owner_id: i32,
        contact_id: i32,
        input: &ContactInput,
    ) -> Result<Contact, AppError> {
        input.validate()?;
        self.repository
            .update(owner_id, contact_id, input)
            .await?
            .ok_or_else(contact_not_found)
    }

    pub async fn remove(&self, owner_id: i32, contact_id: i32) -> Result<Contact, AppError> {
        let contact = self
            .repository
            .delete(owner_id, contact_id)
            .await?
            .ok_or_else(contact_not_found)?;
        log::debug!("User {} deleted contact {}", owner_id, contact_id);
        Ok(contact)
    }

    /// Contacts whose next birthday is between `today` and `today + days`
    /// inclusive, soonest first.
    pub async fn upcoming_birthdays(
        &self,
        owner_id: i32,
        today: NaiveDate,
        days: i64,
    ) -> Result<Vec<Contact>, AppError> {
        let mut upcoming: Vec<(i64, Contact)> = self
            .repository
            .list_with_birth_date(owner_id)
            .await?
            .into_iter()
            .filter_map(|contact| {
                let until = days_until_birthday(contact.birth_date?, today)?;
                (until <= days).then_some((until, contact))
            })
            .collect();

        upcoming.sort_by_key(|(until, contact)| (*until, contact.id));
        Ok(upcoming.into_iter().map(|(_, contact)| contact).collect())
    }

    /// Searches the owner's contacts. An empty result is `NotFound`.
    pub async fn search(
        &self,
        owner_id: i32,
        filter: &ContactSearch,
    ) -> Result<Vec<Contact>, AppError> {
        filter.validate()?;
        let contacts = self.repository.search(owner_id, filter).await?;
        if contacts.is_empty() {
            return Err(AppError::NotFound("Contacts not found".into()));
        }
        Ok(contacts)
    }
}

fn contact_not_found() -> AppError {
    AppError::NotFound("Contact not found".into())
}
