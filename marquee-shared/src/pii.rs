use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Wrapper for personal data (booking holder emails) that never prints its value
/// through `Debug`/`Display`. Serialization still writes the real value, since the
/// record store and the email sink need it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Masked(value)
    }
}

impl Masked<String> {
    /// Partially redacted form for log lines: `j***@example.com`.
    pub fn hint(&self) -> String {
        match self.0.split_once('@') {
            Some((local, domain)) => {
                let first = local.chars().next().unwrap_or('*');
                format!("{}***@{}", first, domain)
            }
            None => "********".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_never_leaks() {
        let email = Masked("jane@example.com".to_string());
        assert_eq!(format!("{:?}", email), "********");
        assert_eq!(email.to_string(), "********");
        assert_eq!(email.hint(), "j***@example.com");
    }

    #[test]
    fn test_serializes_real_value() {
        let email = Masked("jane@example.com".to_string());
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"jane@example.com\"");

        let back: Masked<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.expose(), "jane@example.com");
    }
}
