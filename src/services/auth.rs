//! Credentials and sessions.
//!
//! Passwords are bcrypt-hashed on the blocking pool. Sessions are stateless
//! HS256 JWTs; logging out records the token's SHA-256 in the `sessions`
//! table, which the request guard consults on every call.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::JwtConfig,
    error::{AppError, AppResult},
    models::{
        session::RevokedToken,
        user::{NewUser, ProfileUpdate, Role, User},
    },
};

pub const BCRYPT_COST: u32 = 10;

/// How long a logged-out token stays on the blacklist.
pub const REVOCATION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_owned();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST)).await??;
    Ok(hash)
}

pub async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let (password, hash) = (password.to_owned(), hash.to_owned());
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(ok)
}

pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            lifetime: Duration::days(config.expires_in_days),
        }
    }

    pub fn issue(&self, user_id: i64) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Signature and expiry check. `None` for anything that does not verify.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .ok()
    }
}

fn email_taken() -> AppError {
    AppError::Conflict("User with this email already exists".into())
}

/// Inserts a user. A concurrent insert of the same email that slipped past
/// the lookup hits the UNIQUE index and is reported as a conflict.
async fn create_account(pool: &SqlitePool, new: NewUser<'_>) -> AppResult<User> {
    User::create(pool, new).await.map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => email_taken(),
        other => other.into(),
    })
}

pub async fn register(pool: &SqlitePool, tokens: &TokenService, req: RegisterRequest) -> AppResult<AuthSession> {
    req.validate()?;
    let email = req.email.trim().to_lowercase();

    if User::find_by_email(pool, &email).await?.is_some() {
        return Err(email_taken());
    }

    let password_hash = hash_password(&req.password).await?;
    let user = create_account(
        pool,
        NewUser {
            email: &email,
            password_hash: &password_hash,
            first_name: req.first_name.as_deref().filter(|s| !s.is_empty()),
            last_name: req.last_name.as_deref().filter(|s| !s.is_empty()),
            phone: req.phone.as_deref().filter(|s| !s.is_empty()),
            role: Role::User,
        },
    )
    .await?;

    info!("Registered user {} ({})", user.id, user.email);
    let token = tokens.issue(user.id)?;
    Ok(AuthSession { user, token })
}

pub async fn login(pool: &SqlitePool, tokens: &TokenService, email: &str, password: &str) -> AppResult<AuthSession> {
    let invalid = || AppError::Unauthorized("Invalid email or password".into());

    let email = email.trim().to_lowercase();
    let user = User::find_by_email(pool, &email).await?.ok_or_else(invalid)?;
    if !verify_password(password, &user.password).await? {
        warn!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    let token = tokens.issue(user.id)?;
    Ok(AuthSession { user, token })
}

/// Puts `token` on the blacklist. Tokens that no longer verify are ignored.
pub async fn logout(pool: &SqlitePool, tokens: &TokenService, token: &str) -> AppResult<()> {
    if let Some(claims) = tokens.verify(token) {
        let expires_at = Utc::now() + Duration::days(REVOCATION_TTL_DAYS);
        RevokedToken::insert(pool, claims.sub, &token_fingerprint(token), expires_at).await?;
        info!("User {} logged out", claims.sub);
    }
    Ok(())
}

pub async fn is_revoked(pool: &SqlitePool, token: &str) -> AppResult<bool> {
    Ok(RevokedToken::is_revoked(pool, &token_fingerprint(token)).await?)
}

pub async fn get_user(pool: &SqlitePool, user_id: i64) -> AppResult<User> {
    User::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn update_profile(pool: &SqlitePool, user_id: i64, update: ProfileUpdate) -> AppResult<User> {
    if update.is_empty() {
        return Err(AppError::validation("No valid fields to update"));
    }
    User::update_profile(pool, user_id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// Whether [`ensure_admin`] created a new account or promoted an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminProvision {
    Created,
    Promoted,
}

/// Creates an admin account, or promotes the user already registered under `email`.
/// The password is only used for new accounts.
pub async fn ensure_admin(
    pool: &SqlitePool,
    email: &str,
    password: &str,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> AppResult<(User, AdminProvision)> {
    let email = email.trim().to_lowercase();
    if let Some(existing) = User::find_by_email(pool, &email).await? {
        let user = User::set_role(pool, existing.id, Role::Admin)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        return Ok((user, AdminProvision::Promoted));
    }

    RegisterRequest {
        email: email.clone(),
        password: password.to_owned(),
        first_name: None,
        last_name: None,
        phone: None,
    }
    .validate()?;
    let password_hash = hash_password(password).await?;
    let user = create_account(
        pool,
        NewUser { email: &email, password_hash: &password_hash, first_name, last_name, phone: None, role: Role::Admin },
    )
    .await?;
    info!("Created admin {} ({})", user.id, user.email);
    Ok((user, AdminProvision::Created))
}

pub async fn promote_to_admin(pool: &SqlitePool, email: &str) -> AppResult<User> {
    let email = email.trim().to_lowercase();
    let user = User::find_by_email(pool, &email)
        .await?
        .ok_or_else(|| AppError::not_found(format!("No user registered with {email}")))?;
    User::set_role(pool, user.id, Role::Admin)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    fn tokens() -> TokenService {
        TokenService::new(&JwtConfig { secret: "test-secret".into(), expires_in_days: 7 })
    }

    fn register_req(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: password.into(),
            first_name: Some("Juan".into()),
            last_name: None,
            phone: Some(String::new()),
        }
    }

    #[test]
    fn tokens_verify_and_carry_the_user() {
        let svc = tokens();
        let token = svc.issue(42).unwrap();
        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert!(claims.exp > claims.iat);
        assert!(svc.verify("not.a.token").is_none());
        let other = TokenService::new(&JwtConfig { secret: "other".into(), expires_in_days: 7 });
        assert!(other.verify(&token).is_none());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let svc = TokenService::new(&JwtConfig { secret: "s".into(), expires_in_days: -1 });
        let token = svc.issue(1).unwrap();
        assert!(svc.verify(&token).is_none());
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() {
        let db = Database::in_memory().await.unwrap();
        let new = || NewUser {
            email: "race@example.com",
            password_hash: "h",
            first_name: None,
            last_name: None,
            phone: None,
            role: Role::User,
        };
        create_account(&db.pool, new()).await.unwrap();
        let err = create_account(&db.pool, new()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "User with this email already exists");
    }

    #[tokio::test]
    async fn concurrent_registrations_yield_one_account() {
        let db = Database::in_memory().await.unwrap();
        let svc = tokens();
        let (a, b) = tokio::join!(
            register(&db.pool, &svc, register_req("twin@example.com", "secret1")),
            register(&db.pool, &svc, register_req("twin@example.com", "secret2")),
        );
        assert!(a.is_ok() != b.is_ok());
        let err = a.err().or(b.err()).unwrap();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(User::count(&db.pool, None).await.unwrap(), 1);
    }

    #[test]
    fn tokens_issued_together_differ() {
        let svc = tokens();
        assert_ne!(svc.issue(1).unwrap(), svc.issue(1).unwrap());
    }

    #[tokio::test]
    async fn register_then_login() {
        let db = Database::in_memory().await.unwrap();
        let svc = tokens();
        let session = register(&db.pool, &svc, register_req("Juan@Example.com", "secret1")).await.unwrap();
        assert_eq!(session.user.email, "juan@example.com");
        assert_eq!(session.user.phone, None);
        assert_ne!(session.user.password, "secret1");

        let again = login(&db.pool, &svc, "juan@example.com", "secret1").await.unwrap();
        assert_eq!(again.user.id, session.user.id);

        let wrong = login(&db.pool, &svc, "juan@example.com", "nope").await.unwrap_err();
        assert!(matches!(wrong, AppError::Unauthorized(_)));
        let unknown = login(&db.pool, &svc, "ghost@example.com", "secret1").await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn register_validates_and_rejects_duplicates() {
        let db = Database::in_memory().await.unwrap();
        let svc = tokens();
        let bad_email = register(&db.pool, &svc, register_req("not-an-email", "secret1")).await.unwrap_err();
        assert!(matches!(bad_email, AppError::Validation(_)));
        let short = register(&db.pool, &svc, register_req("a@example.com", "123")).await.unwrap_err();
        assert!(matches!(short, AppError::Validation(_)));

        register(&db.pool, &svc, register_req("a@example.com", "secret1")).await.unwrap();
        let dup = register(&db.pool, &svc, register_req("a@example.com", "secret2")).await.unwrap_err();
        assert!(matches!(dup, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn logout_revokes_only_that_token() {
        let db = Database::in_memory().await.unwrap();
        let svc = tokens();
        let session = register(&db.pool, &svc, register_req("l@example.com", "secret1")).await.unwrap();
        let second = svc.issue(session.user.id).unwrap();

        logout(&db.pool, &svc, &session.token).await.unwrap();
        assert!(is_revoked(&db.pool, &session.token).await.unwrap());
        assert!(!is_revoked(&db.pool, &second).await.unwrap());
    }

    #[tokio::test]
    async fn ensure_admin_creates_then_promotes() {
        let db = Database::in_memory().await.unwrap();
        let (admin, how) = ensure_admin(&db.pool, "Root@Example.com", "secret1", Some("Root"), None).await.unwrap();
        assert_eq!(how, AdminProvision::Created);
        assert!(admin.is_admin());
        assert!(verify_password("secret1", &admin.password).await.unwrap());

        let svc = tokens();
        let session = register(&db.pool, &svc, register_req("staff@example.com", "secret1")).await.unwrap();
        assert!(!session.user.is_admin());
        let (promoted, how) = ensure_admin(&db.pool, "staff@example.com", "ignored", None, None).await.unwrap();
        assert_eq!(how, AdminProvision::Promoted);
        assert_eq!(promoted.id, session.user.id);
        assert!(verify_password("secret1", &promoted.password).await.unwrap());
    }

    #[tokio::test]
    async fn promote_requires_existing_user() {
        let db = Database::in_memory().await.unwrap();
        assert!(matches!(promote_to_admin(&db.pool, "none@example.com").await, Err(AppError::NotFound(_))));
        let svc = tokens();
        register(&db.pool, &svc, register_req("p@example.com", "secret1")).await.unwrap();
        assert!(promote_to_admin(&db.pool, "P@example.com").await.unwrap().is_admin());
    }

    #[tokio::test]
    async fn empty_profile_update_is_rejected() {
        let db = Database::in_memory().await.unwrap();
        let svc = tokens();
        let session = register(&db.pool, &svc, register_req("u@example.com", "secret1")).await.unwrap();
        let err = update_profile(&db.pool, session.user.id, ProfileUpdate::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let user = update_profile(
            &db.pool,
            session.user.id,
            ProfileUpdate { last_name: Some("Cruz".into()), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(user.last_name.as_deref(), Some("Cruz"));
    }
}
