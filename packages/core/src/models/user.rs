//! User (employee) records
//!
//! Users reference at most one position and at most one photo. Neither
//! reference is owned by the user: removing a user leaves its photo alone,
//! while the position cascade (see `PositionService::delete_position`)
//! destroys both.

use super::validation::{
    deserialize_optional_field, require_text, validate_email, validate_phone,
};
use super::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest page size accepted by [`UserQuery`]
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    /// Single-letter code stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Gender::Male),
            "F" => Ok(Gender::Female),
            other => Err(format!("Unknown gender code: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub hire_date: NaiveDate,
    pub gender: Gender,
    pub position_id: Option<String>,
    pub photo_id: Option<i64>,
}

impl User {
    /// Apply a partial update in place
    pub fn apply_update(&mut self, update: UserUpdate) {
        if let Some(full_name) = update.full_name {
            self.full_name = full_name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(birth_date) = update.birth_date {
            self.birth_date = birth_date;
        }
        if let Some(hire_date) = update.hire_date {
            self.hire_date = hire_date;
        }
        if let Some(gender) = update.gender {
            self.gender = gender;
        }
        if let Some(position_id) = update.position_id {
            self.position_id = position_id;
        }
        if let Some(photo_id) = update.photo_id {
            self.photo_id = photo_id;
        }
    }
}

/// Input for creating a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub hire_date: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub position_id: Option<String>,
    #[serde(default)]
    pub photo_id: Option<i64>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("fullName", &self.full_name)?;
        validate_email(&self.email)?;
        validate_phone(&self.phone)?;
        Ok(())
    }
}

/// Partial user update
///
/// `position_id` and `photo_id` use the double-Option pattern, so `null`
/// clears the reference while a missing field leaves it unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub position_id: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub photo_id: Option<Option<i64>>,
}

impl UserUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn with_position(mut self, position_id: Option<String>) -> Self {
        self.position_id = Some(position_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.birth_date.is_none()
            && self.hire_date.is_none()
            && self.gender.is_none()
            && self.position_id.is_none()
            && self.photo_id.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(full_name) = &self.full_name {
            require_text("fullName", full_name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        Ok(())
    }
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

/// Paginated user listing with an optional name filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuery {
    /// Case-insensitive substring matched against `full_name`
    #[serde(default)]
    pub q: String,
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            q: String::new(),
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl UserQuery {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page == 0 {
            return Err(ValidationError::InvalidPagination(
                "page must be at least 1".to_string(),
            ));
        }
        if self.limit == 0 || self.limit > MAX_PAGE_LIMIT {
            return Err(ValidationError::InvalidPagination(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        Ok(())
    }

    /// Number of rows to skip
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPage {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
    pub results: Vec<User>,
}

impl UserPage {
    pub fn new(query: &UserQuery, total: u64, results: Vec<User>) -> Self {
        let limit = u64::from(query.limit.max(1));
        Self {
            page: query.page,
            limit: query.limit,
            total,
            pages: total.div_ceil(limit),
            results,
        }
    }
}
