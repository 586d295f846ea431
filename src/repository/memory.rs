//! In-memory repositories.
//!
//! Behave like the PostgreSQL implementations (owner scoping, ordering by id,
//! unique usernames and e-mails) so the HTTP layer can be exercised without a
//! database.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::AppError;
use crate::models::{Contact, ContactInput, ContactSearch, NewUser, User};
use crate::repository::{ContactRepository, UserRepository};

struct Table<T> {
    rows: BTreeMap<i32, T>,
    next_id: i32,
}

// Manual impl: a derive would demand `T: Default`.
impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::InternalServerError("In-memory store poisoned".into()))
}

#[derive(Default)]
pub struct InMemoryContactRepository {
    table: Mutex<Table<Contact>>,
}

impl InMemoryContactRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {
    async fn list(&self, owner_id: i32, skip: i64, limit: i64) -> Result<Vec<Contact>, AppError> {
        let table = lock(&self.table)?;
        Ok(table
            .rows
            .values()
            .filter(|c| c.user_id == owner_id)
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn get(&self, owner_id: i32, contact_id: i32) -> Result<Option<Contact>, AppError> {
        let table = lock(&self.table)?;
        Ok(table
            .rows
            .get(&contact_id)
            .filter(|c| c.user_id == owner_id)
            .cloned())
    }

    async fn create(&self, owner_id: i32, input: &ContactInput) -> Result<Contact, AppError> {
        let mut table = lock(&self.table)?;
        let id = table.allocate_id();
        let now = Utc::now();
        let contact = Contact {
            id,
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email: input.email.clone(),
            phone_number: input.phone_number.clone(),
            birth_date: input.birth_date,
            additional_info: input.additional_info.clone(),
            created_at: now,
            updated_at: now,
            user_id: owner_id,
        };
        table.rows.insert(id, contact.clone());
        Ok(contact)
    }

    async fn update(
        &self,
        owner_id: i32,
        contact_id: i32,
        input: &ContactInput,
    ) -> Result<Option<Contact>, AppError> {
        let mut table = lock(&self.table)?;
        let Some(contact) = table
            .rows
            .get_mut(&contact_id)
            .filter(|c| c.user_id == owner_id)
        else {
            return Ok(None);
        };

        contact.first_name = input.first_name.clone();
        contact.last_name = input.last_name.clone();
        contact.email = input.email.clone();
        contact.phone_number = input.phone_number.clone();
        contact.birth_date = input.birth_date;
        contact.additional_info = input.additional_info.clone();
        contact.updated_at = Utc::now();
        Ok(Some(contact.clone()))
    }

    async fn delete(&self, owner_id: i32, contact_id: i32) -> Result<Option<Contact>, AppError> {
        let mut table = lock(&self.table)?;
        let owned = table
            .rows
            .get(&contact_id)
            .map(|c| c.user_id == owner_id)
            .unwrap_or(false);
        if !owned {
            return Ok(None);
        }
        Ok(table.rows.remove(&contact_id))
    }

    async fn list_with_birth_date(&self, owner_id: i32) -> Result<Vec<Contact>, AppError> {
        let table = lock(&self.table)?;
        Ok(table
            .rows
            .values()
            .filter(|c| c.user_id == owner_id && c.birth_date.is_some())
            .cloned()
            .collect())
    }

    async fn search(
        &self,
        owner_id: i32,
        filter: &ContactSearch,
    ) -> Result<Vec<Contact>, AppError> {
        let table = lock(&self.table)?;
        Ok(table
            .rows
            .values()
            .filter(|c| c.user_id == owner_id && filter.matches(c))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    table: Mutex<Table<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn find<F>(&self, predicate: F) -> Result<Option<User>, AppError>
    where
        F: Fn(&User) -> bool,
    {
        let table = lock(&self.table)?;
        Ok(table.rows.values().find(|u| predicate(u)).cloned())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_by_id(&self, user_id: i32) -> Result<Option<User>, AppError> {
        let table = lock(&self.table)?;
        Ok(table.rows.get(&user_id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.find(|u| u.username == username)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find(|u| u.email == email)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut table = lock(&self.table)?;
        if table
            .rows
            .values()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(AppError::Conflict("Record already exists".into()));
        }

        let id = table.allocate_id();
        let user = User {
            id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            avatar: new_user.avatar,
            confirmed: false,
            role: new_user.role,
            created_at: Utc::now(),
        };
        table.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn confirm_email(&self, email: &str) -> Result<bool, AppError> {
        let mut table = lock(&self.table)?;
        match table.rows.values_mut().find(|u| u.email == email) {
            Some(user) => {
                user.confirmed = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_avatar(&self, user_id: i32, url: &str) -> Result<Option<User>, AppError> {
        let mut table = lock(&self.table)?;
        Ok(table.rows.get_mut(&user_id).map(|user| {
            user.avatar = Some(url.to_string());
            user.clone()
        }))
    }
}
