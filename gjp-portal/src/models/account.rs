//! Account models: login, registration, profile

use super::{opt_string_or_number, string_or_number};
use serde::{Deserialize, Serialize};

/// Login form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// User block of a successful login response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginUser {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Successful `login.php` response body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginGrant {
    pub user: LoginUser,
    /// Raw expiry as sent by the backend; parsed by the session layer
    pub expires_at: String,
    /// Opaque bearer string, when the backend issues one
    #[serde(default)]
    pub token: Option<String>,
}

/// Sign-up form as entered by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    pub given_name: String,
    pub family_name: String,
    pub affiliation: String,
    pub country: String,
    pub phone_number: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub orcid_id: Option<String>,
    pub areas_of_interest: Option<String>,
    pub agree_to_privacy: bool,
}

/// `register.php` request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub name: String,
    pub affiliation: String,
    pub country: String,
    #[serde(rename = "phonenumber")]
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orcid_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub areas_of_interest: Option<String>,
    pub agree_to_privacy: bool,
}

impl Registration {
    pub fn to_request(&self) -> RegisterRequest {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        RegisterRequest {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            name: format!("{} {}", self.given_name.trim(), self.family_name.trim())
                .trim()
                .to_string(),
            affiliation: self.affiliation.clone(),
            country: self.country.clone(),
            phone_number: self.phone_number.clone(),
            orcid_id: non_empty(&self.orcid_id),
            areas_of_interest: non_empty(&self.areas_of_interest),
            agree_to_privacy: self.agree_to_privacy,
        }
    }
}

/// Profile as returned by `get_profile.php`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "firstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", default)]
    pub last_name: Option<String>,
    #[serde(rename = "preferredName", default)]
    pub preferred_name: Option<String>,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(rename = "orcidID", alias = "orcidId", default)]
    pub orcid_id: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub phonenumber: Option<String>,
}

/// Edit-profile form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub given_name: String,
    pub family_name: String,
    pub email: String,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

impl ProfileUpdate {
    /// True when the form asks for a password change
    pub fn changes_password(&self) -> bool {
        self.new_password
            .as_deref()
            .map(|p| !p.is_empty())
            .unwrap_or(false)
    }

    pub fn to_request(&self, user_id: &str) -> ProfileUpdateRequest {
        let (current_password, new_password) = if self.changes_password() {
            (self.current_password.clone(), self.new_password.clone())
        } else {
            (None, None)
        };
        ProfileUpdateRequest {
            user_id: user_id.to_string(),
            name: format!("{} {}", self.given_name.trim(), self.family_name.trim())
                .trim()
                .to_string(),
            email: self.email.trim().to_string(),
            current_password,
            new_password,
        }
    }
}

/// `update_profile.php` request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdateRequest {
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "currentPassword", skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(rename = "newPassword", skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}
