use serde::{Deserialize, Serialize};

use super::lenient;
use super::Record;

/// An emergency phone number shown alongside the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct EmergencyContact {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub label: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub number: String,
    /// Upazila or union the contact serves; empty for national services
    #[serde(default, deserialize_with = "lenient::string")]
    pub area: String,
}

impl EmergencyContact {
    pub fn is_national(&self) -> bool {
        self.area.is_empty()
    }
}

impl Record for EmergencyContact {
    const COLLECTION: &'static str = "emergency";

    fn adopt_remote_key(&mut self, key: &str) {
        if self.id.is_empty() {
            self.id = key.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_emergency_contact() {
        let json = r#"{"label": "National emergency service", "number": 999}"#;
        let contact: EmergencyContact = serde_json::from_str(json).unwrap();
        assert_eq!(contact.number, "999");
        assert!(contact.is_national());
        assert_eq!(contact.id, "");
    }
}
