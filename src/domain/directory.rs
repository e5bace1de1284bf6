//! Customer directory entries

use super::ids::CustomerId;
use serde::{Deserialize, Serialize};

/// A customer as held by the external directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: CustomerId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl DirectoryEntry {
    /// Creates an entry with only an id and display name
    pub fn new(id: CustomerId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            company_name: None,
            email: None,
            phone: None,
            address: None,
        }
    }

    /// Sets the company name
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company_name = Some(company.into());
        self
    }

    /// Sets the email address
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the phone number
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Display name followed by the company name, when different
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.display_name.as_str()).chain(
            self.company_name
                .as_deref()
                .filter(|c| !c.eq_ignore_ascii_case(&self.display_name)),
        )
    }
}
