use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::{prelude::User, user};

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: String,
}

impl DaoBase for UserDao {
    type Entity = User;
    const ENTITY_NAME: &'static str = "user";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl UserDao {
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        let email = email.to_string();
        self.find_first(move |query| query.filter(user::Column::Email.eq(email)))
            .await
    }

    /// Inserts an unconfirmed user with no refresh token.
    pub async fn create_user(&self, new_user: NewUser) -> DaoResult<user::Model> {
        let model = user::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            avatar: Set(new_user.avatar),
            confirmed: Set(false),
            refresh_token: Set(None),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn set_refresh_token(
        &self,
        id: &Uuid,
        token: Option<String>,
    ) -> DaoResult<user::Model> {
        self.update(*id, move |active| {
            active.refresh_token = Set(token);
        })
        .await
    }

    pub async fn mark_confirmed(&self, id: &Uuid) -> DaoResult<user::Model> {
        self.update(*id, |active| {
            active.confirmed = Set(true);
        })
        .await
    }

    pub async fn set_avatar(&self, id: &Uuid, url: &str) -> DaoResult<user::Model> {
        let url = url.to_string();
        self.update(*id, move |active| {
            active.avatar = Set(url);
        })
        .await
    }

    pub async fn set_password_hash(&self, id: &Uuid, hash: &str) -> DaoResult<user::Model> {
        let hash = hash.to_string();
        self.update(*id, move |active| {
            active.password_hash = Set(hash);
        })
        .await
    }
}
