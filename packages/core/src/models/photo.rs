//! Photo metadata
//!
//! Only metadata lives here; the image bytes are stored elsewhere and
//! referenced by `filename`.

use super::validation::require_text;
use super::ValidationError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub filename: String,
    /// View counter, only ever incremented
    pub views: i64,
    pub is_published: bool,
}

impl Photo {
    pub fn apply_update(&mut self, update: PhotoUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(filename) = update.filename {
            self.filename = filename;
        }
        if let Some(is_published) = update.is_published {
            self.is_published = is_published;
        }
    }
}

/// Input for registering a photo; `views` always starts at 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPhoto {
    pub name: String,
    pub description: String,
    pub filename: String,
    #[serde(default)]
    pub is_published: bool,
}

impl NewPhoto {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            filename: filename.into(),
            is_published: false,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("description", &self.description)?;
        require_text("filename", &self.filename)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
}

impl PhotoUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(description) = &self.description {
            require_text("description", description)?;
        }
        if let Some(filename) = &self.filename {
            require_text("filename", filename)?;
        }
        Ok(())
    }
}
