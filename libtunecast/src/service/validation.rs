//! Form input and validation for account and post edits
//!
//! Every form validates to [`FieldErrors`] keyed by the field name the
//! server expects. A form with errors is never sent.

use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};

use crate::api::Part;
use crate::error::{FieldErrors, ValidationError};

pub const REQUIRED_EMAIL: &str = "Email is required";
pub const INVALID_EMAIL: &str = "Email is not valid";
pub const REQUIRED_PASSWORD: &str = "Password is required";
pub const MIN_LENGTH_PASSWORD: &str = "Password must be at least 8 characters";
pub const ALPHANUMERIC_PASSWORD: &str =
    "Password must contain only letters and digits, with at least one of each";
pub const PASSWORDS_DIFFER: &str = "Passwords do not match";
pub const REQUIRED_FIELD: &str = "This field is required";

const MIN_PASSWORD_LEN: usize = 8;

/// `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2,
        None => false,
    }
}

fn check_email(errors: &mut FieldErrors, field: &str, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        errors.add(field, REQUIRED_EMAIL);
    } else if !is_valid_email(email) {
        errors.add(field, INVALID_EMAIL);
    }
}

/// At least 8 ASCII letters/digits with at least one of each
fn check_password(errors: &mut FieldErrors, field: &str, password: &str) {
    if password.is_empty() {
        errors.add(field, REQUIRED_PASSWORD);
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(field, MIN_LENGTH_PASSWORD);
    } else if !password.chars().all(|c| c.is_ascii_alphanumeric())
        || !password.chars().any(|c| c.is_ascii_digit())
        || !password.chars().any(|c| c.is_ascii_alphabetic())
    {
        errors.add(field, ALPHANUMERIC_PASSWORD);
    }
}

/// A local file attached to a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub path: PathBuf,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<kind>/<extension>`, e.g. `audio/mp3`
    pub fn mime(&self, kind: &str) -> String {
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("octet-stream")
            .to_ascii_lowercase();
        format!("{kind}/{ext}")
    }

    fn part(&self, name: &str, kind: &str) -> Part {
        Part::file(name, self.path.clone(), self.mime(kind))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForgotPasswordForm {
    pub email: String,
}

impl ForgotPasswordForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, "email", &self.email);
        errors.into_result()
    }
}

#[derive(Debug)]
pub struct ResetPasswordForm {
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl ResetPasswordForm {
    pub fn new(password: impl Into<String>, confirm_password: impl Into<String>) -> Self {
        Self {
            password: SecretString::from(password.into()),
            confirm_password: SecretString::from(confirm_password.into()),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        let password = self.password.expose_secret().trim();
        check_password(&mut errors, "password", password);
        if password != self.confirm_password.expose_secret().trim() {
            errors.add("confirmPassword", PASSWORDS_DIFFER);
        }
        errors.into_result()
    }
}

#[derive(Debug)]
pub struct ChangePasswordForm {
    pub old_password: SecretString,
    pub new_password: SecretString,
    pub confirm_password: SecretString,
}

impl ChangePasswordForm {
    pub fn new(
        old_password: impl Into<String>,
        new_password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            old_password: SecretString::from(old_password.into()),
            new_password: SecretString::from(new_password.into()),
            confirm_password: SecretString::from(confirm_password.into()),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        for (field, value) in [
            ("oldPassword", &self.old_password),
            ("newPassword", &self.new_password),
            ("confirmPassword", &self.confirm_password),
        ] {
            if value.expose_secret().is_empty() {
                errors.add(field, REQUIRED_FIELD);
            }
        }
        check_password(
            &mut errors,
            "newPassword",
            self.new_password.expose_secret(),
        );
        if self.new_password.expose_secret() != self.confirm_password.expose_secret() {
            errors.add("confirmPassword", PASSWORDS_DIFFER);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub email: String,
    pub bio: String,
    pub phone_number: String,
    pub address: String,
    pub birthday: String,
    /// `Male` or `Female`
    pub sex: String,
    pub avatar: Option<MediaFile>,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, "email", &self.email);
        errors.into_result()
    }

    /// Multipart fields in the server's naming
    pub fn to_parts(&self) -> Vec<Part> {
        let mut parts = Vec::new();
        if let Some(avatar) = &self.avatar {
            parts.push(avatar.part("avatar", "image"));
        }
        let is_male = self.sex.trim().eq_ignore_ascii_case("male");
        parts.extend([
            Part::text("email", self.email.trim()),
            Part::text("phone_number", self.phone_number.trim()),
            Part::text("address", self.address.trim()),
            Part::text("sex", is_male.to_string()),
            Part::text("birthday", self.birthday.trim()),
            Part::text("bio", self.bio.trim()),
        ]);
        parts
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub title: String,
    pub caption: String,
    pub genre_id: String,
    pub sound: Option<MediaFile>,
    pub thumbnail: Option<MediaFile>,
}

impl PostForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = FieldErrors::new();
        if self.title.trim().is_empty() {
            errors.add("title", REQUIRED_FIELD);
        }
        if self.genre_id.trim().is_empty() {
            errors.add("genre_id", REQUIRED_FIELD);
        }
        errors.into_result()
    }

    pub fn to_parts(&self) -> Vec<Part> {
        let mut parts = vec![
            Part::text("caption", self.caption.trim()),
            Part::text("title", self.title.trim()),
        ];
        if let Some(sound) = &self.sound {
            parts.push(sound.part("sound", "audio"));
        }
        if let Some(thumbnail) = &self.thumbnail {
            parts.push(thumbnail.part("thumbnail", "image"));
        }
        parts.push(Part::text("genre_id", self.genre_id.trim()));
        parts
    }
}
