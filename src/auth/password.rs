use std::collections::HashMap;

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use tracing::error;
use zxcvbn::{feedback::Feedback, zxcvbn, Score};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Passwords at or above this similarity ratio to a user attribute are refused.
pub const MAX_SIMILARITY: f64 = 0.7;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
    }
    EMAIL_RE.is_match(email)
}

/// Argon2id PHC string for a new account password.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow::anyhow!("password hashing failed: {e}")
        })
}

/// `Ok(false)` for a wrong password. Errors only when the stored hash itself is unusable.
pub fn verify_password(plain: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        anyhow::anyhow!("malformed password hash: {e}")
    })?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("password verification failed: {e}")),
    }
}

/// The user attributes a password is compared against.
#[derive(Debug, Clone, Copy)]
pub struct PasswordContext<'a> {
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Check a candidate password and return every rule it breaks. An empty list means it is acceptable.
pub fn validate_password(password: &str, context: PasswordContext<'_>) -> Vec<String> {
    let mut messages = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        messages.push(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }

    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        messages.push("This password is entirely numeric.".to_string());
    }

    let attributes = [
        ("email", context.email),
        ("name", context.first_name),
        ("surname", context.last_name),
    ];
    for (label, value) in attributes {
        if is_too_similar(password, value) {
            messages.push(format!("The password is too similar to the {label}."));
        }
    }

    let user_inputs: Vec<&str> = attributes
        .iter()
        .map(|(_, value)| *value)
        .chain(context.email.split('@').next())
        .filter(|value| !value.is_empty())
        .collect();
    let analysis = zxcvbn(password, &user_inputs);
    match analysis.score() {
        Score::Three | Score::Four => {}
        _ => {
            let feedback = analysis
                .feedback()
                .unwrap_or(&Feedback::default())
                .to_string();
            let feedback = feedback.trim();
            if feedback.is_empty() {
                messages.push("This password is too weak.".to_string());
            } else {
                messages.push(format!("This password is too weak. {feedback}"));
            }
        }
    }

    messages
}

/// Compares the whole password with the attribute and with each of its word parts.
///
/// Parts much shorter than the password are skipped, so a long password that
/// merely contains a common fragment such as a mail domain is not "similar".
fn is_too_similar(password: &str, attribute: &str) -> bool {
    let password: Vec<char> = password.to_lowercase().chars().collect();
    let attribute = attribute.trim().to_lowercase();
    if password.is_empty() || attribute.is_empty() {
        return false;
    }

    attribute
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .chain(std::iter::once(attribute.as_str()))
        .filter(|part| !part.is_empty())
        .map(|part| part.chars().collect::<Vec<_>>())
        .filter(|part| !exceeds_length_ratio(password.len(), part.len()))
        .any(|part| quick_ratio(&password, &part) >= MAX_SIMILARITY)
}

fn exceeds_length_ratio(password_len: usize, part_len: usize) -> bool {
    password_len >= 10 * part_len && (part_len as f64) < MAX_SIMILARITY / 2.0 * password_len as f64
}

/// Upper bound on sequence similarity: twice the shared characters (as multisets)
/// over the combined length.
fn quick_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let mut available: HashMap<char, usize> = HashMap::new();
    for c in b {
        *available.entry(*c).or_default() += 1;
    }
    let shared = a
        .iter()
        .filter(|c| match available.get_mut(*c) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        })
        .count();
    2.0 * shared as f64 / total as f64
}
