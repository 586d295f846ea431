pub mod contact;
pub mod user;

pub use contact::{
    days_until_birthday, next_birthday, BirthdayQuery, Contact, ContactInput, ContactQuery,
    ContactSearch,
};
pub use user::{gravatar_url, NewUser, User, UserRole};
