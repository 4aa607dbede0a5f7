use rand::{distributions::Alphanumeric, Rng};
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{GoogleRequest, SigninRequest, SignupRequest},
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
        validation::{is_valid_email, validate_signup, SignupRejection},
    },
    error::AppError,
    users::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
};

/// Validate, hash and persist a locally registered user.
pub async fn signup(users: &dyn UserStore, req: SignupRequest) -> Result<User, AppError> {
    let signup = validate_signup(req).map_err(|rejection| {
        warn!(%rejection, "signup rejected");
        AppError::from(rejection)
    })?;

    let password_hash = hash_password_blocking(signup.password).await?;
    let user = users
        .create(NewUser {
            username: signup.username,
            first_name: signup.first_name,
            last_name: signup.last_name,
            email: signup.email,
            password_hash,
            mobile: Some(signup.mobile),
            profile_picture: None,
            is_admin: false,
        })
        .await?;

    info!(user_id = %user.id, "user registered");
    Ok(user)
}

/// Check credentials and issue a token for the matching user.
pub async fn signin(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: SigninRequest,
) -> Result<(User, String), AppError> {
    let email = req.email.as_deref().map(str::trim).unwrap_or_default();
    let password = req.password.as_deref().map(str::trim).unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(SignupRejection::MissingFields.into());
    }

    let user = users.find_by_email(email).await?.ok_or_else(|| {
        warn!("signin for unknown email");
        AppError::NotFound("User not found!".into())
    })?;

    let ok = verify_password_blocking(password.to_string(), user.password_hash.clone()).await?;
    if !ok {
        warn!(user_id = %user.id, "signin with invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.sign(user.id, user.is_admin)?;
    info!(user_id = %user.id, "user signed in");
    Ok((user, token))
}

/// Sign in with an identity asserted by Google, creating the account on first use.
pub async fn google(
    users: &dyn UserStore,
    keys: &JwtKeys,
    req: GoogleRequest,
) -> Result<(User, String), AppError> {
    let email = req.email.as_deref().map(str::trim).unwrap_or_default();
    let name = req.name.as_deref().map(str::trim).unwrap_or_default();
    if email.is_empty() || name.is_empty() {
        return Err(AppError::Validation("Name and email are required".into()));
    }
    if !is_valid_email(email) {
        return Err(SignupRejection::InvalidEmail.into());
    }

    if let Some(user) = users.find_by_email(email).await? {
        let token = keys.sign(user.id, user.is_admin)?;
        info!(user_id = %user.id, "federated signin");
        return Ok((user, token));
    }

    let (first_name, last_name) = split_name(name);
    let password_hash = hash_password_blocking(random_base36(16)).await?;
    let user = users
        .create(NewUser {
            username: federated_username(name),
            first_name,
            last_name,
            email: email.to_string(),
            password_hash,
            mobile: None,
            profile_picture: req.photo.filter(|p| !p.trim().is_empty()),
            is_admin: false,
        })
        .await?;

    let token = keys.sign(user.id, user.is_admin)?;
    info!(user_id = %user.id, "federated signup");
    Ok((user, token))
}

fn random_base36(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(|c| (c as char).to_ascii_lowercase())
        .take(len)
        .collect()
}

/// Display name squashed to lowercase plus a random suffix.
fn federated_username(name: &str) -> String {
    let base: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    format!("{base}{}", random_base36(8))
}

fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let last = parts.collect::<Vec<_>>().join(" ");
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::JwtConfig, users::memory::MemoryUserStore};

    fn keys() -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 60,
        })
    }

    fn signup_req(username: &str, email: &str, mobile: &str) -> SignupRequest {
        SignupRequest {
            username: Some(username.into()),
            first_name: Some("Dilshan".into()),
            last_name: Some("Test".into()),
            email: Some(email.into()),
            password: Some("ADWx2001@".into()),
            mobile: Some(mobile.into()),
        }
    }

    #[tokio::test]
    async fn signup_stores_hashed_password() {
        let store = MemoryUserStore::new();
        let user = signup(&store, signup_req("dilu1234", "dilu@example.com", "0711234567"))
            .await
            .unwrap();
        assert_ne!(user.password_hash, "ADWx2001@");
        assert!(!user.is_admin);
        assert!(store.find_by_id(user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn invalid_signup_creates_nothing() {
        let store = MemoryUserStore::new();
        let err = signup(&store, signup_req("dilu1234", "dilu@example.com", "0811234567"))
            .await
            .unwrap_err();
        assert!(matches!(&err, AppError::Validation(m) if m == "Invalid mobile number format"));
        assert!(store.find_by_email("dilu@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_signup_conflicts() {
        let store = MemoryUserStore::new();
        let first = signup(&store, signup_req("dilu1234", "dilu@example.com", "0711234567"))
            .await
            .unwrap();
        let err = signup(&store, signup_req("other123", "dilu@example.com", "0721234567"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let stored = store.find_by_email("dilu@example.com").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
    }

    #[tokio::test]
    async fn signin_issues_token_for_stored_id() {
        let store = MemoryUserStore::new();
        let keys = keys();
        let created = signup(&store, signup_req("dilu1234", "dilu@example.com", "0711234567"))
            .await
            .unwrap();

        let (user, token) = signin(
            &store,
            &keys,
            SigninRequest {
                email: Some("  dilu@example.com ".into()),
                password: Some("ADWx2001@".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(user.id, created.id);
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, created.id);
        assert!(!claims.is_admin);
    }

    #[tokio::test]
    async fn signin_failures_are_distinct() {
        let store = MemoryUserStore::new();
        let keys = keys();
        signup(&store, signup_req("dilu1234", "dilu@example.com", "0711234567"))
            .await
            .unwrap();

        let wrong = signin(
            &store,
            &keys,
            SigninRequest {
                email: Some("dilu@example.com".into()),
                password: Some("WrongPassword".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(wrong, AppError::InvalidCredentials));

        let unknown = signin(
            &store,
            &keys,
            SigninRequest {
                email: Some("ghost@example.com".into()),
                password: Some("ADWx2001@".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(&unknown, AppError::NotFound(m) if m == "User not found!"));

        let blank = signin(&store, &keys, SigninRequest::default()).await.unwrap_err();
        assert!(matches!(&blank, AppError::Validation(m) if m == "All fields are required"));
    }

    #[tokio::test]
    async fn google_creates_then_reuses_account() {
        let store = MemoryUserStore::new();
        let keys = keys();
        let req = || GoogleRequest {
            name: Some("Nimal Perera".into()),
            email: Some("nimal@gmail.com".into()),
            photo: Some("https://lh3.example.com/photo.jpg".into()),
        };

        let (created, token) = google(&store, &keys, req()).await.unwrap();
        assert!(created.username.starts_with("nimalperera"));
        assert_eq!(created.username.len(), "nimalperera".len() + 8);
        assert_eq!(created.first_name, "Nimal");
        assert_eq!(created.last_name, "Perera");
        assert_eq!(created.profile_picture, "https://lh3.example.com/photo.jpg");
        assert!(created.mobile.is_none());
        assert_eq!(keys.verify(&token).unwrap().sub, created.id);

        let (again, _) = google(&store, &keys, req()).await.unwrap();
        assert_eq!(again.id, created.id);
    }

    #[tokio::test]
    async fn google_requires_identity() {
        let store = MemoryUserStore::new();
        let err = google(&store, &keys(), GoogleRequest::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn random_suffix_is_base36() {
        let s = random_base36(32);
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn names_split_on_first_space() {
        assert_eq!(split_name("Madonna"), ("Madonna".into(), String::new()));
        assert_eq!(
            split_name("Ana de Silva"),
            ("Ana".into(), "de Silva".into())
        );
    }
}
