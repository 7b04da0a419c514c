//! GitHub username validation

use crate::{FetchError, Result};
use std::fmt;
use std::str::FromStr;

const MAX_LEN: usize = 39;

/// A validated GitHub username
///
/// Construction goes through [`Username::parse`], so holding one means the
/// value already satisfies GitHub's rules: 1 to 39 ASCII alphanumerics or
/// hyphens, no leading, trailing, or consecutive hyphens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validate a candidate username
    pub fn parse(candidate: &str) -> Result<Self> {
        if candidate.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if candidate.len() > MAX_LEN {
            return Err(invalid(format!(
                "must be at most {} characters, got {}",
                MAX_LEN,
                candidate.len()
            )));
        }
        if let Some(bad) = candidate
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-')
        {
            return Err(invalid(format!(
                "contains {:?}, only alphanumerics and hyphens are allowed",
                bad
            )));
        }
        if candidate.starts_with('-') || candidate.ends_with('-') {
            return Err(invalid("must not start or end with a hyphen"));
        }
        if candidate.contains("--") {
            return Err(invalid("must not contain consecutive hyphens"));
        }
        Ok(Self(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn invalid(reason: impl Into<String>) -> FetchError {
    FetchError::InvalidUsername {
        reason: reason.into(),
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Username {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_usernames() {
        let long = "a".repeat(39);
        for name in ["octocat", "a", "0", "mona-lisa", "a-b-c", long.as_str()] {
            assert!(
                Username::parse(name).is_ok(),
                "expected {} to be accepted",
                name
            );
        }
    }

    #[test]
    fn test_rejects_invalid_usernames() {
        let too_long = "a".repeat(40);
        for name in [
            "",
            "-octocat",
            "octocat-",
            "mona--lisa",
            "mona lisa",
            "mona_lisa",
            "héllo",
            too_long.as_str(),
        ] {
            assert!(
                matches!(
                    Username::parse(name),
                    Err(FetchError::InvalidUsername { .. })
                ),
                "expected {:?} to be rejected",
                name
            );
        }
    }

    #[test]
    fn test_reason_names_the_rule() {
        let error = Username::parse("-octocat").unwrap_err();
        match error {
            FetchError::InvalidUsername { reason } => {
                assert!(reason.contains("hyphen"), "unexpected reason: {}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_from_str_round_trip() {
        let username: Username = "octocat".parse().unwrap();
        assert_eq!(username.as_str(), "octocat");
        assert_eq!(username.to_string(), "octocat");
    }
}
