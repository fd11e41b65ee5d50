// 👤 Customer - profile fields attached 1:1 to an Account

use serde::{Deserialize, Serialize};

/// Customer profile. Has no identity of its own; it lives and dies with its
/// Account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl Customer {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Customer {
            name: name.into(),
            address: address.into(),
            phone: phone.into(),
        }
    }

    /// Name of the first empty field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("name")
        } else if self.address.trim().is_empty() {
            Some("address")
        } else if self.phone.trim().is_empty() {
            Some("phone")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field() {
        assert_eq!(Customer::new("John", "LA", "555").missing_field(), None);
        assert_eq!(Customer::new("", "LA", "555").missing_field(), Some("name"));
        assert_eq!(Customer::new("John", " ", "555").missing_field(), Some("address"));
        assert_eq!(Customer::new("John", "LA", "").missing_field(), Some("phone"));
    }
}
