use serde::Serialize;

use crate::{
    auth::{
        TokenError, TokenService,
        password::{hash_password, verify_password},
    },
    db::dao::NewUser,
    db::entities::user,
    error::AppError,
    mail::{MailJob, MailKind, MailQueue},
    routes::API_PREFIX,
    services::{
        avatar::gravatar_url,
        user_service::{ACCOUNT_EXISTS, UserService},
    },
};

const INVALID_CREDENTIALS: &str = "Could not validate credentials";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    AlreadyConfirmed,
}

/// Account lifecycle: Unconfirmed -> Confirmed, plus token issuance and password reset.
pub struct AuthService<'a> {
    users: UserService,
    tokens: &'a TokenService,
    mailer: &'a MailQueue,
    public_url: &'a str,
}

impl<'a> AuthService<'a> {
    pub fn new(
        users: UserService,
        tokens: &'a TokenService,
        mailer: &'a MailQueue,
        public_url: &'a str,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            public_url,
        }
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<user::Model, AppError> {
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::conflict(ACCOUNT_EXISTS));
        }

        // Sign first: nothing is written if token issuance fails.
        let confirmation = self.confirmation_job(&request.email, &request.username)?;
        let password_hash = hash_password(&request.password)?;
        let avatar = gravatar_url(&request.email);
        let user = self
            .users
            .create_user(NewUser {
                username: request.username,
                email: request.email,
                password_hash,
                avatar,
            })
            .await?;
        tracing::info!(user_id = %user.id, "user signed up");

        self.mailer.enqueue(confirmation);
        Ok(user)
    }

    /// Checks existence, then confirmation, then password.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid email"))?;

        if !user.confirmed {
            return Err(AppError::unauthorized("Email is not confirmed"));
        }

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::unauthorized("Invalid password"));
        }

        let pair = self.issue_pair(&user).await?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(pair)
    }

    /// Rotates the pair. A token that no longer matches the stored one logs the user out.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let email = self
            .tokens
            .decode_refresh_token(refresh_token)
            .map_err(|err| {
                tracing::debug!(error = %err, "refresh token rejected");
                AppError::unauthorized(INVALID_CREDENTIALS)
            })?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            self.users.update_refresh_token(&user.id, None).await?;
            tracing::warn!(user_id = %user.id, "refresh token mismatch, stored token cleared");
            return Err(AppError::unauthorized("Invalid refresh token"));
        }

        self.issue_pair(&user).await
    }

    pub async fn confirm_email(&self, token: &str) -> Result<ConfirmOutcome, AppError> {
        let email = self
            .tokens
            .email_from_confirmation_token(token)
            .map_err(|err| bad_token("Verification error", err))?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::bad_request("Verification error"))?;

        if user.confirmed {
            return Ok(ConfirmOutcome::AlreadyConfirmed);
        }

        self.users.confirm_email(&user.id).await?;
        tracing::info!(user_id = %user.id, "email confirmed");
        Ok(ConfirmOutcome::Confirmed)
    }

    /// Resends the confirmation email. `Some(AlreadyConfirmed)` means nothing was sent.
    pub async fn request_email(&self, email: &str) -> Result<Option<ConfirmOutcome>, AppError> {
        match self.users.find_by_email(email).await? {
            Some(user) if user.confirmed => Ok(Some(ConfirmOutcome::AlreadyConfirmed)),
            Some(user) => {
                let job = self.confirmation_job(&user.email, &user.username)?;
                self.mailer.enqueue(job);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Ok(());
        };

        let token = self
            .tokens
            .create_password_reset_token(&user.email)
            .map_err(token_issue_error)?;
        self.mailer.enqueue(MailJob {
            kind: MailKind::PasswordReset,
            to: user.email.clone(),
            username: user.username.clone(),
            link: self.link(&format!("/auth/reset/{token}")),
        });
        tracing::info!(user_id = %user.id, "password reset requested");
        Ok(())
    }

    /// Overwrites the password hash. Outstanding refresh tokens stay valid.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let email = self
            .tokens
            .email_from_reset_token(token)
            .map_err(|err| bad_token("Reset password error", err))?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::bad_request("Reset password error"))?;

        let password_hash = hash_password(new_password)?;
        self.users
            .update_password_hash(&user.id, &password_hash)
            .await?;
        tracing::info!(user_id = %user.id, "password reset");
        Ok(())
    }

    /// Resolves an access token to its user, re-reading the row rather than trusting claims.
    pub async fn current_user(&self, access_token: &str) -> Result<user::Model, AppError> {
        let claims = self
            .tokens
            .decode_access_token(access_token)
            .map_err(|err| {
                tracing::debug!(error = %err, "access token rejected");
                AppError::unauthorized(INVALID_CREDENTIALS)
            })?;

        self.users
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))
    }

    async fn issue_pair(&self, user: &user::Model) -> Result<TokenPair, AppError> {
        let access_token = self
            .tokens
            .create_access_token(&user.email)
            .map_err(token_issue_error)?;
        let refresh_token = self
            .tokens
            .create_refresh_token(&user.email)
            .map_err(token_issue_error)?;

        self.users
            .update_refresh_token(&user.id, Some(refresh_token.clone()))
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer",
            expires_in: self.tokens.access_ttl_secs(),
        })
    }

    fn confirmation_job(&self, email: &str, username: &str) -> Result<MailJob, AppError> {
        let token = self
            .tokens
            .create_email_confirmation_token(email)
            .map_err(token_issue_error)?;
        Ok(MailJob {
            kind: MailKind::EmailConfirmation,
            to: email.to_string(),
            username: username.to_string(),
            link: self.link(&format!("/auth/confirmed_email/{token}")),
        })
    }

    fn link(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.public_url.trim_end_matches('/'))
    }
}

fn bad_token(message: &str, err: TokenError) -> AppError {
    tracing::debug!(error = %err, "{message}");
    AppError::bad_request(message)
}

fn token_issue_error(err: TokenError) -> AppError {
    AppError::internal(format!("Token issuance failed: {err}"))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use uuid::Uuid;

    use super::{AuthService, ConfirmOutcome, SignupRequest};
    use crate::{
        auth::{TokenService, TokenTtls, password::hash_password},
        db::dao::{DaoBase, UserDao},
        db::entities::user,
        error::AppError,
        mail::{EmailTransport, MailQueue, RenderedEmail},
        services::user_service::UserService,
    };

    #[derive(Default)]
    struct Outbox(Mutex<Vec<RenderedEmail>>);

    #[async_trait]
    impl EmailTransport for Outbox {
        fn name(&self) -> &'static str {
            "outbox"
        }

        async fn send(&self, email: &RenderedEmail) -> anyhow::Result<()> {
            self.0.lock().expect("lock poisoned").push(email.clone());
            Ok(())
        }
    }

    struct Fixture {
        tokens: TokenService,
        mailer: MailQueue,
    }

    impl Fixture {
        fn new() -> Self {
            let tokens = TokenService::new(
                b"auth-service-test",
                TokenTtls {
                    access_secs: 900,
                    refresh_secs: 3600,
                    confirmation_secs: 3600,
                    reset_secs: 3600,
                },
            )
            .expect("keys should derive");
            Self {
                tokens,
                mailer: MailQueue::spawn(Arc::new(Outbox::default()), 8),
            }
        }

        fn service(&self, db: &DatabaseConnection) -> AuthService<'_> {
            AuthService::new(
                UserService::new(UserDao::new(db)),
                &self.tokens,
                &self.mailer,
                "http://localhost:3000/",
            )
        }
    }

    fn executed_sql(db: DatabaseConnection) -> Vec<String> {
        db.into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements().iter().map(ToString::to_string))
            .collect()
    }

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn user_model(email: &str, password_hash: &str, confirmed: bool) -> user::Model {
        let now = ts();
        user::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            username: "alice".to_string(),
            password_hash: password_hash.to_string(),
            confirmed,
            refresh_token: None,
            avatar: String::new(),
        }
    }

    #[tokio::test]
    async fn signup_conflicts_on_existing_email() {
        let fixture = Fixture::new();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user_model("alice@example.com", "hash", false)]])
            .into_connection();

        let err = fixture
            .service(&db)
            .signup(SignupRequest {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .expect_err("signup should conflict");
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Account already exists!"));
    }

    #[tokio::test]
    async fn signup_creates_unconfirmed_user() {
        let fixture = Fixture::new();
        let created = user_model("alice@example.com", "hash", false);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[created.clone()]])
            .into_connection();

        let user = fixture
            .service(&db)
            .signup(SignupRequest {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .expect("signup should succeed");
        assert_eq!(user.id, created.id);
        assert!(!user.confirmed);
    }

    #[tokio::test]
    async fn login_reports_unknown_email_first() {
        let fixture = Fixture::new();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let err = fixture
            .service(&db)
            .login("nobody@example.com", "secret1")
            .await
            .expect_err("login should fail");
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid email"));
    }

    #[tokio::test]
    async fn login_rejects_unconfirmed_even_with_right_password() {
        let fixture = Fixture::new();
        let hash = hash_password("secret1").expect("hash should succeed");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user_model("alice@example.com", &hash, false)]])
            .into_connection();

        let err = fixture
            .service(&db)
            .login("alice@example.com", "secret1")
            .await
            .expect_err("login should fail");
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Email is not confirmed"));
    }

    #[tokio::test]
    async fn login_rejects_bad_password() {
        let fixture = Fixture::new();
        let hash = hash_password("secret1").expect("hash should succeed");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user_model("alice@example.com", &hash, true)]])
            .into_connection();

        let err = fixture
            .service(&db)
            .login("alice@example.com", "wrong-password")
            .await
            .expect_err("login should fail");
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid password"));
    }

    #[tokio::test]
    async fn login_issues_and_stores_refresh_token() {
        let fixture = Fixture::new();
        let hash = hash_password("secret1").expect("hash should succeed");
        let user = user_model("alice@example.com", &hash, true);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user.clone()], [user.clone()], [user]])
            .into_connection();

        let pair = fixture
            .service(&db)
            .login("alice@example.com", "secret1")
            .await
            .expect("login should succeed");
        assert_eq!(pair.token_type, "bearer");
        assert_eq!(
            fixture.tokens.decode_refresh_token(&pair.refresh_token),
            Ok("alice@example.com".to_string())
        );
    }

    #[tokio::test]
    async fn refresh_mismatch_clears_stored_token() {
        let fixture = Fixture::new();
        let presented = fixture
            .tokens
            .create_refresh_token("alice@example.com")
            .expect("token should encode");
        let mut stored = user_model("alice@example.com", "hash", true);
        stored.refresh_token = Some("a-newer-token".to_string());
        let mut cleared = stored.clone();
        cleared.refresh_token = None;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[stored.clone()], [stored], [cleared]])
            .into_connection();

        let err = fixture
            .service(&db)
            .refresh(&presented)
            .await
            .expect_err("refresh should fail");
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid refresh token"));

        let updates: Vec<String> = executed_sql(db)
            .into_iter()
            .filter(|sql| sql.starts_with("UPDATE"))
            .collect();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].contains(r#""refresh_token" = NULL"#));
    }

    #[tokio::test]
    async fn refresh_overwrites_stored_token_with_new_one() {
        let fixture = Fixture::new();
        let current = fixture
            .tokens
            .create_refresh_token("alice@example.com")
            .expect("token should encode");
        let mut stored = user_model("alice@example.com", "hash", true);
        stored.refresh_token = Some(current.clone());
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[stored.clone()], [stored.clone()], [stored]])
            .into_connection();

        let pair = fixture
            .service(&db)
            .refresh(&current)
            .await
            .expect("refresh should succeed");

        let updates: Vec<String> = executed_sql(db)
            .into_iter()
            .filter(|sql| sql.starts_with("UPDATE"))
            .collect();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].contains(&format!(r#""refresh_token" = '{}'"#, pair.refresh_token)));
    }

    #[tokio::test]
    async fn refresh_rejects_access_token() {
        let fixture = Fixture::new();
        let access = fixture
            .tokens
            .create_access_token("alice@example.com")
            .expect("token should encode");
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = fixture
            .service(&db)
            .refresh(&access)
            .await
            .expect_err("refresh should fail");
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn confirm_email_is_idempotent() {
        let fixture = Fixture::new();
        let token = fixture
            .tokens
            .create_email_confirmation_token("alice@example.com")
            .expect("token should encode");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user_model("alice@example.com", "hash", true)]])
            .into_connection();

        let outcome = fixture
            .service(&db)
            .confirm_email(&token)
            .await
            .expect("confirm should succeed");
        assert_eq!(outcome, ConfirmOutcome::AlreadyConfirmed);
    }

    #[tokio::test]
    async fn confirm_email_rejects_reset_token() {
        let fixture = Fixture::new();
        let token = fixture
            .tokens
            .create_password_reset_token("alice@example.com")
            .expect("token should encode");
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = fixture
            .service(&db)
            .confirm_email(&token)
            .await
            .expect_err("confirm should fail");
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Verification error"));
    }

    #[tokio::test]
    async fn reset_password_for_unknown_user_is_bad_request() {
        let fixture = Fixture::new();
        let token = fixture
            .tokens
            .create_password_reset_token("ghost@example.com")
            .expect("token should encode");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let err = fixture
            .service(&db)
            .reset_password(&token, "new-secret")
            .await
            .expect_err("reset should fail");
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Reset password error"));
    }

    #[tokio::test]
    async fn current_user_requires_existing_subject() {
        let fixture = Fixture::new();
        let token = fixture
            .tokens
            .create_access_token("gone@example.com")
            .expect("token should encode");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let err = fixture
            .service(&db)
            .current_user(&token)
            .await
            .expect_err("lookup should fail");
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn links_join_public_url_and_api_prefix() {
        let fixture = Fixture::new();
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        assert_eq!(
            fixture.service(&db).link("/auth/reset/abc"),
            "http://localhost:3000/api/auth/reset/abc"
        );
    }
}
