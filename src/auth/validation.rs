use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::SignupRequest;

/// Symbols a password may (and must, at least once) contain.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()_+.";

/// Why a signup payload was turned away. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignupRejection {
    #[error("All fields are required")]
    MissingFields,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Invalid mobile number format")]
    InvalidMobile,
    #[error(
        "Password should be between 6 and 9 characters long and contain at least one \
         uppercase letter, one digit, and one symbol (!@#$%^&*()_+.)."
    )]
    InvalidPassword,
    #[error("Username must be between 7 and 20 characters")]
    InvalidUsernameLength,
}

/// A signup payload that passed every check.
#[derive(Debug, Clone)]
pub struct ValidSignup {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub mobile: String,
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Sri Lankan mobile numbers: a network prefix followed by seven digits.
pub fn is_valid_mobile(mobile: &str) -> bool {
    lazy_static! {
        static ref MOBILE_RE: Regex =
            Regex::new(r"^(071|076|077|075|078|070|074|072)[0-9]{7}$").unwrap();
    }
    MOBILE_RE.is_match(mobile)
}

pub fn is_valid_password(password: &str) -> bool {
    lazy_static! {
        static ref PASSWORD_RE: Regex =
            Regex::new(r"^[A-Za-z0-9!@#$%^&*()_+.]{6,9}$").unwrap();
    }
    PASSWORD_RE.is_match(password)
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

pub fn is_valid_username(username: &str) -> bool {
    (7..=20).contains(&username.chars().count())
}

fn required(field: Option<String>) -> Result<String, SignupRejection> {
    field
        .filter(|v| !v.is_empty())
        .ok_or(SignupRejection::MissingFields)
}

/// Check a raw signup payload. The first failing rule wins.
pub fn validate_signup(req: SignupRequest) -> Result<ValidSignup, SignupRejection> {
    let signup = ValidSignup {
        username: required(req.username)?,
        first_name: required(req.first_name)?,
        last_name: required(req.last_name)?,
        email: required(req.email)?,
        password: required(req.password)?,
        mobile: required(req.mobile)?,
    };

    if !is_valid_email(&signup.email) {
        return Err(SignupRejection::InvalidEmail);
    }
    if !is_valid_mobile(&signup.mobile) {
        return Err(SignupRejection::InvalidMobile);
    }
    if !is_valid_password(&signup.password) {
        return Err(SignupRejection::InvalidPassword);
    }
    if !is_valid_username(&signup.username) {
        return Err(SignupRejection::InvalidUsernameLength);
    }
    Ok(signup)
}
