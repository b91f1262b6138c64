//! Small immutable value objects shared across the identity entities.

use crate::types::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// A validated IP address, compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress(String);

impl IpAddress {
    pub fn new(value: &str) -> Result<Self, DomainError> {
        if value.trim().is_empty() || value.parse::<IpAddr>().is_err() {
            return Err(DomainError::Validation("Invalid IP address.".to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Browser or device details for a session, compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device(String);

impl Device {
    pub fn new(value: &str) -> Result<Self, DomainError> {
        if value.trim().is_empty() {
            return Err(DomainError::Validation(
                "Device information cannot be empty.".to_string(),
            ));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored media file reference (path, web path, extension, byte size).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    file_path: String,
    web_path: String,
    extension: String,
    size: u64,
}

impl Media {
    pub fn new(
        file_path: &str,
        web_path: &str,
        extension: &str,
        size: u64,
    ) -> Result<Self, DomainError> {
        if file_path.trim().is_empty() {
            return Err(DomainError::Validation(
                "File path cannot be null or empty.".to_string(),
            ));
        }
        if web_path.trim().is_empty() {
            return Err(DomainError::Validation(
                "Web path cannot be null or empty.".to_string(),
            ));
        }
        if extension.trim().is_empty() || !extension.starts_with('.') {
            return Err(DomainError::Validation(
                "Invalid file extension.".to_string(),
            ));
        }
        if size == 0 {
            return Err(DomainError::Validation(
                "Size must be greater than zero.".to_string(),
            ));
        }

        Ok(Self {
            file_path: normalize_path(file_path),
            web_path: normalize_path(web_path),
            extension: extension.to_lowercase(),
            size,
        })
    }

    /// Fixed system default used when a user has no avatar.
    pub fn default_avatar() -> Self {
        Self {
            file_path: "/default/avatar.jpg".to_string(),
            web_path: "/default/avatar.jpg".to_string(),
            extension: ".jpg".to_string(),
            size: 8007,
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn web_path(&self) -> &str {
        &self.web_path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn file_name(&self) -> &str {
        self.file_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.file_path)
    }

    pub fn size_in_kb(&self) -> f64 {
        (self.size as f64 / 1024.0 * 100.0).round() / 100.0
    }

    pub fn is_valid_extension(&self, allowed: &[&str]) -> bool {
        allowed
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

/// Web-style path normalization: trim and forward slashes only.
fn normalize_path(path: &str) -> String {
    path.trim().replace('\\', "/")
}
