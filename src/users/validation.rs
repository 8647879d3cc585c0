use crate::{
    auth::password::{is_valid_email, validate_password, PasswordContext},
    error::AppError,
    repo::{NewUser, UserChanges, UserRepo},
};

use super::dto::{CreateUserRequest, UpdateUserRequest};

pub const MAX_NAME_LENGTH: usize = 150;
pub const EMAIL_TAKEN: &str = "Email has already been taken";

/// Registration input that passed the cheap checks. The password is still plain text.
#[derive(Debug)]
pub struct ValidSignUp {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl ValidSignUp {
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash,
        }
    }
}

/// Validate a registration request and collect every problem in one pass.
pub async fn validate_create_user(
    users: &dyn UserRepo,
    request: CreateUserRequest,
) -> Result<ValidSignUp, AppError> {
    let email = request
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_default();
    let password = request.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::missing_input());
    }

    let first_name = request.first_name.unwrap_or_default().trim().to_string();
    let last_name = request.last_name.unwrap_or_default().trim().to_string();

    let mut messages = Vec::new();

    if !is_valid_email(&email) {
        messages.push("Enter a valid email address.".to_string());
    }

    if users.find_by_email(&email).await?.is_some() {
        messages.push(EMAIL_TAKEN.to_string());
    }

    messages.extend(check_name_length("first_name", &first_name));
    messages.extend(check_name_length("last_name", &last_name));

    messages.extend(validate_password(
        &password,
        PasswordContext {
            email: &email,
            first_name: &first_name,
            last_name: &last_name,
        },
    ));

    if !messages.is_empty() {
        return Err(AppError::Validation(messages));
    }

    Ok(ValidSignUp {
        email,
        password,
        first_name,
        last_name,
    })
}

pub fn validate_update_user(request: UpdateUserRequest) -> Result<UserChanges, AppError> {
    let changes = UserChanges {
        first_name: request.first_name.map(|v| v.trim().to_string()),
        last_name: request.last_name.map(|v| v.trim().to_string()),
    };

    let messages: Vec<String> = [
        ("first_name", changes.first_name.as_deref()),
        ("last_name", changes.last_name.as_deref()),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.and_then(|v| check_name_length(field, v)))
    .collect();

    if !messages.is_empty() {
        return Err(AppError::Validation(messages));
    }
    Ok(changes)
}

fn check_name_length(field: &str, value: &str) -> Option<String> {
    (value.chars().count() > MAX_NAME_LENGTH).then(|| {
        format!("{field}: Ensure this field has no more than {MAX_NAME_LENGTH} characters.")
    })
}
