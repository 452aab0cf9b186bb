use sea_orm::DatabaseConnection;

use crate::{
    db::dao::DaoContext,
    services::{
        auth_service::AuthService, contact_service::ContactService, user_service::UserService,
    },
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            daos: DaoContext::new(db),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db)
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.daos.user())
    }

    pub fn contact(&self) -> ContactService {
        ContactService::new(self.daos.contact())
    }

    pub fn auth<'a>(&self, state: &'a AppState) -> AuthService<'a> {
        AuthService::new(
            self.user(),
            &state.tokens,
            &state.mailer,
            &state.config.general.public_url,
        )
    }
}
