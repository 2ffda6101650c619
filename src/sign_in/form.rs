use std::fmt;

use serde::{Deserialize, Serialize};

pub const MIN_IDENTIFIER_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Which identifier the user signs in with.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoginMode {
    #[default]
    Username,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Identifier,
    Password,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Identifier => f.write_str("identifier"),
            Field::Password => f.write_str("password"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The sign-in form as submitted.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct SignInForm {
    pub mode: LoginMode,
    pub identifier: String,
    pub password: String,
}

impl fmt::Debug for SignInForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInForm")
            .field("mode", &self.mode)
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What the server receives: exactly one identifier kind and the password.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Credentials {
    Username { username: String, password: String },
    Email { email: String, password: String },
}

impl SignInForm {
    pub fn username(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        SignInForm {
            mode: LoginMode::Username,
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    pub fn email(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        SignInForm {
            mode: LoginMode::Email,
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    /// Local checks that must pass before anything goes over the network.
    /// Returns every failing field, not just the first.
    pub fn validate(&self) -> Result<Credentials, Vec<FieldError>> {
        let mut errors = Vec::new();
        let identifier = self.identifier.as_str();

        if identifier.chars().count() < MIN_IDENTIFIER_LEN {
            errors.push(FieldError {
                field: Field::Identifier,
                message: format!("Must be at least {} characters", MIN_IDENTIFIER_LEN),
            });
        } else if self.mode == LoginMode::Email && !looks_like_email(identifier) {
            errors.push(FieldError {
                field: Field::Identifier,
                message: "Please enter a valid email address".to_string(),
            });
        }

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError {
                field: Field::Password,
                message: format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            });
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(match self.mode {
            LoginMode::Username => Credentials::Username {
                username: identifier.to_string(),
                password: self.password.clone(),
            },
            LoginMode::Email => Credentials::Email {
                email: identifier.to_string(),
                password: self.password.clone(),
            },
        })
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_username_payload_has_no_email() {
        let creds = SignInForm::username("alice", "secret1").validate().unwrap();
        assert_eq!(
            serde_json::to_value(&creds).unwrap(),
            json!({"username": "alice", "password": "secret1"})
        );
    }

    #[test]
    fn test_email_payload_has_no_username() {
        let creds = SignInForm::email("alice@example.com", "secret1")
            .validate()
            .unwrap();
        assert_eq!(
            serde_json::to_value(&creds).unwrap(),
            json!({"email": "alice@example.com", "password": "secret1"})
        );
    }

    #[test]
    fn test_short_fields_are_all_reported() {
        let errors = SignInForm::username("al", "12345").validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, Field::Identifier);
        assert_eq!(errors[0].message, "Must be at least 3 characters");
        assert_eq!(errors[1].field, Field::Password);
        assert_eq!(errors[1].message, "Password must be at least 6 characters");
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(SignInForm::username("alice", "ééééé").validate().is_err());
        assert!(SignInForm::username("alice", "éééééé").validate().is_ok());
    }

    #[test]
    fn test_email_mode_requires_an_address() {
        let errors = SignInForm::email("alice", "secret1").validate().unwrap_err();
        assert_eq!(errors[0].message, "Please enter a valid email address");
        assert!(SignInForm::email("a b@c.io", "secret1").validate().is_err());
        assert!(SignInForm::email("alice@", "secret1").validate().is_err());
        assert!(SignInForm::email("admin@localhost", "secret1").validate().is_ok());
    }

    #[test]
    fn test_identifier_is_checked_and_sent_as_typed() {
        let creds = SignInForm::username("  al", "secret1").validate().unwrap();
        assert_eq!(
            creds,
            Credentials::Username {
                username: "  al".to_string(),
                password: "secret1".to_string(),
            }
        );
        assert!(SignInForm::username("al", "secret1").validate().is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let form = SignInForm::username("alice", "secret1");
        assert!(!format!("{:?}", form).contains("secret1"));
    }
}
