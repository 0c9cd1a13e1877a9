use serde::{Deserialize, Serialize};

/// Resolved identity handed to us by the login collaborator.
///
/// `(provider, uid)` is the sole authorization key; email and display name
/// are informational only and never consulted by access checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub provider: String,
    pub uid: String,
    pub email: String,
    pub name: String,
}

impl UserIdentity {
    pub fn new(
        provider: impl Into<String>,
        uid: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            uid: uid.into(),
            email: email.into(),
            name: name.into(),
        }
    }

    /// Stable, globally unique key: `provider:uid`.
    #[must_use]
    pub fn user_id(&self) -> String {
        format!("{}:{}", self.provider, self.uid)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_is_provider_colon_uid() {
        let user = UserIdentity::new("google", "110248495921238986420", "a@b.com", "A");
        assert_eq!(user.user_id(), "google:110248495921238986420");
    }
}
