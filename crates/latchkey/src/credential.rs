use core::fmt;
use std::time::SystemTime;

/// A minted username/password pair and the moment it stops being valid.
///
/// The canonical copy lives in the [`CredentialStore`](crate::CredentialStore);
/// this value is what gets handed to the client. `Debug` output redacts the
/// password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub expires_at: SystemTime,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The result of a successful issuance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issued {
    pub credential: Credential,
    pub endpoint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let credential = Credential {
            username: "alice".into(),
            password: "hunter2".into(),
            expires_at: SystemTime::UNIX_EPOCH,
        };
        let out = format!("{credential:?}");
        assert!(out.contains("alice"));
        assert!(!out.contains("hunter2"));
    }
}
