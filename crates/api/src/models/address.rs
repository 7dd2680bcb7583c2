//! Shipping addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{AddressId, DomainError, UserId};

use super::{optional_text, required_text};

/// A saved address in a user's address book.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Address fields supplied by clients, also used as the order snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub postal_code: String,
    pub country: String,
}

impl AddressInput {
    /// Trim every field and check the required ones.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Invalid` naming the first blank required field.
    pub fn normalized(&self) -> Result<Self, DomainError> {
        Ok(Self {
            full_name: required_text(&self.full_name, "Full name")?,
            phone: required_text(&self.phone, "Phone")?,
            line1: required_text(&self.line1, "Address line")?,
            line2: optional_text(self.line2.as_deref()),
            city: required_text(&self.city, "City")?,
            province: self.province.trim().to_owned(),
            postal_code: self.postal_code.trim().to_owned(),
            country: required_text(&self.country, "Country")?,
        })
    }
}

impl From<&Address> for AddressInput {
    fn from(address: &Address) -> Self {
        Self {
            full_name: address.full_name.clone(),
            phone: address.phone.clone(),
            line1: address.line1.clone(),
            line2: address.line2.clone(),
            city: address.city.clone(),
            province: address.province.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
        }
    }
}

/// Create-address request body.
#[derive(Debug, Deserialize)]
pub struct NewAddress {
    #[serde(flatten)]
    pub address: AddressInput,
    #[serde(default)]
    pub is_default: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> AddressInput {
        AddressInput {
            full_name: " Linh Tran ".to_owned(),
            phone: "0901234567".to_owned(),
            line1: "12 Nguyen Hue".to_owned(),
            line2: Some("  ".to_owned()),
            city: "Ho Chi Minh City".to_owned(),
            province: String::new(),
            postal_code: " 700000 ".to_owned(),
            country: "VN".to_owned(),
        }
    }

    #[test]
    fn test_normalized_trims_and_drops_blank_optional() {
        let address = input().normalized().unwrap();
        assert_eq!(address.full_name, "Linh Tran");
        assert_eq!(address.line2, None);
        assert_eq!(address.postal_code, "700000");
    }

    #[test]
    fn test_normalized_rejects_blank_required() {
        let mut bad = input();
        bad.city = "   ".to_owned();
        assert_eq!(
            bad.normalized(),
            Err(DomainError::Invalid("City is required".to_owned()))
        );
    }

    #[test]
    fn test_new_address_flattens_fields() {
        let body = r#"{"full_name":"A","phone":"1","line1":"x","city":"c","country":"VN","is_default":true}"#;
        let parsed: NewAddress = serde_json::from_str(body).unwrap();
        assert!(parsed.is_default);
        assert_eq!(parsed.address.province, "");
    }
}
