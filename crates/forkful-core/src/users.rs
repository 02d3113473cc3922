use chrono::{Datelike, NaiveDate, Utc};
use tracing::info;

use forkful_db::models::NewUser;
use forkful_db::queries::{follows, users};
use forkful_db::sequence::{self, IdKind};
use forkful_types::models::{AuthInfo, Gender, User, UserId};

use crate::Forkful;
use crate::error::{Entity, Result, ServiceError};
use crate::guard;

/// Whole years elapsed from `birth` to `today`.
fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years
}

fn validate_age(age: i32) -> Result<()> {
    if age > 0 {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!("age must be positive, got {age}")))
    }
}

impl Forkful {
    /// Create an account. `birthdate` is `YYYY-MM-DD`; the stored age is derived from it.
    pub fn register(
        &self,
        name: &str,
        password: &str,
        gender: Option<Gender>,
        birthdate: &str,
    ) -> Result<UserId> {
        if name.trim().is_empty() {
            return Err(ServiceError::Validation("name must not be empty".into()));
        }
        if password.is_empty() {
            return Err(ServiceError::Validation("password must not be empty".into()));
        }
        let birth = NaiveDate::parse_from_str(birthdate.trim(), "%Y-%m-%d").map_err(|e| {
            ServiceError::Validation(format!("invalid birthdate '{birthdate}': {e}"))
        })?;
        let age = age_on(birth, Utc::now().date_naive());
        validate_age(age)?;

        let id = self.db.transaction(|tx| -> Result<UserId> {
            if users::name_taken(tx, name)? {
                return Err(ServiceError::DuplicateName(name.to_string()));
            }
            let id = sequence::next_id(tx, IdKind::User)?;
            users::insert(
                tx,
                &NewUser {
                    id,
                    name,
                    password,
                    gender: gender.unwrap_or(Gender::Unknown),
                    age,
                },
            )?;
            Ok(id)
        })?;

        info!("Registered user {} ({})", id, name);
        Ok(id)
    }

    /// `Some(id)` when the account is active and the password matches.
    pub fn login(&self, id: UserId, password: &str) -> Result<Option<UserId>> {
        if password.is_empty() {
            return Ok(None);
        }
        let row = self.db.with_conn(|conn| users::by_id(conn, id))?;
        Ok(row
            .filter(|row| !row.is_deleted && row.password == password)
            .map(|row| row.id))
    }

    /// Any account, soft-deleted ones included, with its follow counts.
    pub fn get_user(&self, id: UserId) -> Result<User> {
        let found = self.db.with_conn(|conn| {
            let Some(row) = users::by_id(conn, id)? else {
                return Ok(None);
            };
            let followers = follows::follower_count(conn, id)?;
            let following = follows::following_count(conn, id)?;
            Ok(Some(row.into_user(followers, following)))
        })?;
        guard::require_exists(found, Entity::User, id)
    }

    /// Change the caller's gender and/or age. Omitted fields are left as they are.
    pub fn update_profile(
        &self,
        auth: Option<AuthInfo>,
        gender: Option<Gender>,
        age: Option<i32>,
    ) -> Result<()> {
        self.db.transaction(|tx| {
            let caller = guard::require_active_user(tx, auth)?;
            if let Some(age) = age {
                validate_age(age)?;
            }
            if gender.is_some() || age.is_some() {
                users::update_profile(tx, caller, gender, age)?;
            }
            Ok(())
        })
    }

    /// Soft-delete the caller's own account and drop every follow edge touching it.
    pub fn delete_account(&self, auth: Option<AuthInfo>, id: UserId) -> Result<bool> {
        let removed_edges = self.db.transaction(|tx| -> Result<usize> {
            let caller = guard::require_active_user(tx, auth)?;
            guard::require_ownership(caller, id, Entity::User, id)?;
            users::soft_delete(tx, id)?;
            Ok(follows::delete_all_for(tx, id)?)
        })?;

        info!("Deleted account {} ({} follow edges removed)", id, removed_edges);
        Ok(true)
    }
}
