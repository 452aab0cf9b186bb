use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::{contact, prelude::Contact};

#[derive(Clone)]
pub struct ContactDao {
    db: DatabaseConnection,
}

/// Every writable contact column. Updates overwrite all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFields {
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub phone_number: String,
    pub birthday: NaiveDate,
}

impl ContactFields {
    fn apply(self, active: &mut contact::ActiveModel) {
        active.first_name = Set(self.first_name);
        active.surname = Set(self.surname);
        active.email = Set(self.email);
        active.phone_number = Set(self.phone_number);
        active.birthday = Set(self.birthday);
    }
}

impl DaoBase for ContactDao {
    type Entity = Contact;
    const ENTITY_NAME: &'static str = "contact";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Every query below carries the owner filter.
impl ContactDao {
    pub async fn create_contact(
        &self,
        owner_id: &Uuid,
        fields: ContactFields,
    ) -> DaoResult<contact::Model> {
        let mut active = contact::ActiveModel {
            user_id: Set(*owner_id),
            ..Default::default()
        };
        fields.apply(&mut active);
        self.create(active).await
    }

    pub async fn find_owned(&self, owner_id: &Uuid, id: &Uuid) -> DaoResult<Option<contact::Model>> {
        let (owner_id, id) = (*owner_id, *id);
        self.find_first(move |query| {
            query
                .filter(contact::Column::Id.eq(id))
                .filter(contact::Column::UserId.eq(owner_id))
        })
        .await
    }

    pub async fn find_by_email(
        &self,
        owner_id: &Uuid,
        email: &str,
    ) -> DaoResult<Option<contact::Model>> {
        let (owner_id, email) = (*owner_id, email.to_string());
        self.find_first(move |query| {
            query
                .filter(contact::Column::Email.eq(email))
                .filter(contact::Column::UserId.eq(owner_id))
        })
        .await
    }

    pub async fn find_by_phone(
        &self,
        owner_id: &Uuid,
        phone_number: &str,
    ) -> DaoResult<Option<contact::Model>> {
        let (owner_id, phone_number) = (*owner_id, phone_number.to_string());
        self.find_first(move |query| {
            query
                .filter(contact::Column::PhoneNumber.eq(phone_number))
                .filter(contact::Column::UserId.eq(owner_id))
        })
        .await
    }

    pub async fn find_by_first_name(
        &self,
        owner_id: &Uuid,
        first_name: &str,
    ) -> DaoResult<Vec<contact::Model>> {
        let (owner_id, first_name) = (*owner_id, first_name.to_string());
        self.find_all(move |query| {
            query
                .filter(contact::Column::FirstName.eq(first_name))
                .filter(contact::Column::UserId.eq(owner_id))
        })
        .await
    }

    pub async fn find_by_surname(
        &self,
        owner_id: &Uuid,
        surname: &str,
    ) -> DaoResult<Vec<contact::Model>> {
        let (owner_id, surname) = (*owner_id, surname.to_string());
        self.find_all(move |query| {
            query
                .filter(contact::Column::Surname.eq(surname))
                .filter(contact::Column::UserId.eq(owner_id))
        })
        .await
    }

    pub async fn list_owned(
        &self,
        owner_id: &Uuid,
        limit: u64,
        offset: u64,
    ) -> DaoResult<Vec<contact::Model>> {
        let owner_id = *owner_id;
        self.find(limit, offset, move |query| {
            query.filter(contact::Column::UserId.eq(owner_id))
        })
        .await
    }

    pub async fn all_owned(&self, owner_id: &Uuid) -> DaoResult<Vec<contact::Model>> {
        let owner_id = *owner_id;
        self.find_all(move |query| query.filter(contact::Column::UserId.eq(owner_id)))
            .await
    }

    /// Returns `None` when the contact is missing or owned by someone else.
    pub async fn update_owned(
        &self,
        owner_id: &Uuid,
        id: &Uuid,
        fields: ContactFields,
    ) -> DaoResult<Option<contact::Model>> {
        if self.find_owned(owner_id, id).await?.is_none() {
            return Ok(None);
        }

        let updated = self.update(*id, move |active| fields.apply(active)).await?;
        Ok(Some(updated))
    }

    /// Returns the removed row, or `None` when the contact is missing or owned by someone else.
    pub async fn delete_owned(
        &self,
        owner_id: &Uuid,
        id: &Uuid,
    ) -> DaoResult<Option<contact::Model>> {
        let Some(existing) = self.find_owned(owner_id, id).await? else {
            return Ok(None);
        };

        self.delete(existing.id).await?;
        Ok(Some(existing))
    }
}
