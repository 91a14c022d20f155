use crate::config::validate_url;
use crate::error::{AppError, Result};
use crate::store::Service;

/// Add-service form contents, all plain strings as typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddServiceForm {
    pub name: String,
    pub url: String,
    pub description: String,
    pub image_url: String,
    pub click_url: String,
    pub password: String,
}

impl AddServiceForm {
    /// Field constraints a browser form would enforce: name required, url
    /// required and URL-typed, click URL URL-typed when filled in
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::InvalidService("Name is required".to_string()));
        }
        validate_url(&self.url, "Service").map_err(AppError::InvalidService)?;
        if !self.click_url.is_empty() {
            validate_url(&self.click_url, "Click").map_err(AppError::InvalidService)?;
        }
        Ok(())
    }

    /// Build the record to submit; empty optional fields are left out
    pub fn to_service(&self) -> Service {
        let optional = |value: &str| (!value.is_empty()).then(|| value.to_string());

        Service {
            description: optional(&self.description),
            image_url: optional(&self.image_url),
            click_url: optional(&self.click_url),
            password: optional(&self.password),
            ..Service::new(self.name.clone(), self.url.clone())
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
