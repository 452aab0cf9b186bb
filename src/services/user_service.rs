use uuid::Uuid;

use crate::{
    db::dao::{DaoLayerError, NewUser, UserDao},
    db::entities::user,
    error::AppError,
};

pub const ACCOUNT_EXISTS: &str = "Account already exists!";

#[derive(Clone)]
pub struct UserService {
    user_dao: UserDao,
}

impl UserService {
    pub fn new(user_dao: UserDao) -> Self {
        Self { user_dao }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AppError> {
        Ok(self.user_dao.find_by_email(email).await?)
    }

    /// A concurrent signup that wins the race on the email index surfaces as a conflict.
    pub async fn create_user(&self, new_user: NewUser) -> Result<user::Model, AppError> {
        self.user_dao
            .create_user(new_user)
            .await
            .map_err(|err| match err {
                DaoLayerError::UniqueViolation(_) => AppError::conflict(ACCOUNT_EXISTS),
                other => other.into(),
            })
    }

    pub async fn update_refresh_token(
        &self,
        user_id: &Uuid,
        token: Option<String>,
    ) -> Result<user::Model, AppError> {
        Ok(self.user_dao.set_refresh_token(user_id, token).await?)
    }

    pub async fn confirm_email(&self, user_id: &Uuid) -> Result<user::Model, AppError> {
        Ok(self.user_dao.mark_confirmed(user_id).await?)
    }

    pub async fn update_avatar(&self, user_id: &Uuid, url: &str) -> Result<user::Model, AppError> {
        let user = self.user_dao.set_avatar(user_id, url).await?;
        tracing::info!(user_id = %user.id, "avatar updated");
        Ok(user)
    }

    pub async fn update_password_hash(
        &self,
        user_id: &Uuid,
        password_hash: &str,
    ) -> Result<user::Model, AppError> {
        Ok(self.user_dao.set_password_hash(user_id, password_hash).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::{ACCOUNT_EXISTS, UserService};
    use crate::{
        config::DatabaseConfig,
        db::{
            connection,
            dao::{DaoBase, NewUser, UserDao},
        },
        error::AppError,
    };

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            avatar: "https://www.gravatar.com/avatar/abc".to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_insert_is_a_conflict() {
        let db = connection::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_idle: 1,
        })
        .await
        .expect("in-memory database should open");
        let service = UserService::new(UserDao::new(&db));

        service
            .create_user(new_user("alice"))
            .await
            .expect("first insert should succeed");
        let err = service
            .create_user(new_user("alice-again"))
            .await
            .expect_err("second insert should hit the email index");

        assert!(matches!(err, AppError::Conflict(ref m) if m == ACCOUNT_EXISTS));
    }
}
