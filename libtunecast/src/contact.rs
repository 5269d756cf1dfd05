//! Conversation identity
//!
//! A two-party conversation is named by its participants' ids, sorted and
//! joined with `_`. Both sides compute the same id no matter who sends.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
    pub fn between(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{low}_{high}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContactId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ContactId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<String> for ContactId {
    fn eq(&self, other: &String) -> bool {
        &self.0 == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commutative() {
        let pairs = [
            ("u1", "u2"),
            ("6281f0c2", "61aa09be"),
            ("same", "same"),
            ("", "x"),
            ("b", "a"),
        ];
        for (a, b) in pairs {
            assert_eq!(ContactId::between(a, b), ContactId::between(b, a));
        }
    }

    #[test]
    fn test_format() {
        assert_eq!(ContactId::between("zed", "amy").as_str(), "amy_zed");
        assert_eq!(ContactId::between("amy", "zed").to_string(), "amy_zed");
    }

    #[test]
    fn test_matches_plain_strings() {
        let id = ContactId::between("u2", "u1");
        assert!(id == *"u1_u2");
        assert!(id == "u1_u2".to_string());
    }
}
