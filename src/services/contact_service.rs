use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    db::dao::{ContactDao, ContactFields},
    db::entities::contact,
    error::AppError,
    services::birthdays,
};

pub const DEFAULT_PAGE_LIMIT: u64 = 10;
pub const MAX_PAGE_LIMIT: u64 = 50;

const NOT_FOUND: &str = "Not found!";
const DUPLICATE_PHONE: &str = "Contact with this number already exists!";

/// Contact operations for one owning user. Foreign contacts behave exactly like missing ones.
#[derive(Clone)]
pub struct ContactService {
    contact_dao: ContactDao,
}

impl ContactService {
    pub fn new(contact_dao: ContactDao) -> Self {
        Self { contact_dao }
    }

    pub async fn list(
        &self,
        owner_id: &Uuid,
        limit: u64,
        skip: u64,
    ) -> Result<Vec<contact::Model>, AppError> {
        let limit = limit.clamp(1, MAX_PAGE_LIMIT);
        Ok(self.contact_dao.list_owned(owner_id, limit, skip).await?)
    }

    pub async fn get(&self, owner_id: &Uuid, id: &Uuid) -> Result<contact::Model, AppError> {
        self.contact_dao
            .find_owned(owner_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }

    pub async fn find_by_email(
        &self,
        owner_id: &Uuid,
        email: &str,
    ) -> Result<contact::Model, AppError> {
        self.contact_dao
            .find_by_email(owner_id, email)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }

    pub async fn find_by_phone(
        &self,
        owner_id: &Uuid,
        phone_number: &str,
    ) -> Result<contact::Model, AppError> {
        self.contact_dao
            .find_by_phone(owner_id, phone_number)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }

    pub async fn search_by_first_name(
        &self,
        owner_id: &Uuid,
        first_name: &str,
    ) -> Result<Vec<contact::Model>, AppError> {
        Ok(self.contact_dao.find_by_first_name(owner_id, first_name).await?)
    }

    pub async fn search_by_surname(
        &self,
        owner_id: &Uuid,
        surname: &str,
    ) -> Result<Vec<contact::Model>, AppError> {
        Ok(self.contact_dao.find_by_surname(owner_id, surname).await?)
    }

    pub async fn upcoming_birthdays(
        &self,
        owner_id: &Uuid,
        today: NaiveDate,
    ) -> Result<Option<Vec<contact::Model>>, AppError> {
        let contacts = self.contact_dao.all_owned(owner_id).await?;
        Ok(birthdays::upcoming_birthdays(contacts, today))
    }

    pub async fn create(
        &self,
        owner_id: &Uuid,
        fields: ContactFields,
    ) -> Result<contact::Model, AppError> {
        if self
            .contact_dao
            .find_by_phone(owner_id, &fields.phone_number)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(DUPLICATE_PHONE));
        }

        let created = self.contact_dao.create_contact(owner_id, fields).await?;
        tracing::debug!(user_id = %owner_id, contact_id = %created.id, "contact created");
        Ok(created)
    }

    pub async fn update(
        &self,
        owner_id: &Uuid,
        id: &Uuid,
        fields: ContactFields,
    ) -> Result<contact::Model, AppError> {
        self.contact_dao
            .update_owned(owner_id, id, fields)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))
    }

    pub async fn remove(&self, owner_id: &Uuid, id: &Uuid) -> Result<contact::Model, AppError> {
        let removed = self
            .contact_dao
            .delete_owned(owner_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
        tracing::debug!(user_id = %owner_id, contact_id = %removed.id, "contact removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::ContactService;
    use crate::{
        db::dao::{ContactDao, ContactFields, DaoBase},
        db::entities::contact,
        error::AppError,
    };

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date should be valid")
    }

    fn contact_model(owner_id: Uuid, phone: &str, birthday: NaiveDate) -> contact::Model {
        let now = ts();
        contact::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            first_name: "Grace".to_string(),
            surname: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            phone_number: phone.to_string(),
            birthday,
            user_id: owner_id,
        }
    }

    fn fields(phone: &str) -> ContactFields {
        ContactFields {
            first_name: "Grace".to_string(),
            surname: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            phone_number: phone.to_string(),
            birthday: date(1906, 12, 9),
        }
    }

    fn service(db: &sea_orm::DatabaseConnection) -> ContactService {
        ContactService::new(ContactDao::new(db))
    }

    #[tokio::test]
    async fn create_rejects_duplicate_phone_for_same_owner() {
        let owner = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[contact_model(owner, "123", date(1906, 12, 9))]])
            .into_connection();

        let err = service(&db)
            .create(&owner, fields("123"))
            .await
            .expect_err("duplicate phone should conflict");
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Contact with this number already exists!"));
    }

    #[tokio::test]
    async fn create_inserts_when_phone_is_free() {
        let owner = Uuid::new_v4();
        let created = contact_model(owner, "123", date(1906, 12, 9));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<contact::Model>::new()])
            .append_query_results([[created.clone()]])
            .into_connection();

        let result = service(&db)
            .create(&owner, fields("123"))
            .await
            .expect("create should succeed");
        assert_eq!(result.id, created.id);
        assert_eq!(result.user_id, owner);
    }

    #[tokio::test]
    async fn get_of_foreign_contact_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<contact::Model>::new()])
            .into_connection();

        let err = service(&db)
            .get(&Uuid::new_v4(), &Uuid::new_v4())
            .await
            .expect_err("lookup should fail");
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Not found!"));
    }

    #[tokio::test]
    async fn remove_missing_contact_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<contact::Model>::new()])
            .into_connection();

        let err = service(&db)
            .remove(&Uuid::new_v4(), &Uuid::new_v4())
            .await
            .expect_err("remove should fail");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn remove_returns_deleted_contact() {
        let owner = Uuid::new_v4();
        let existing = contact_model(owner, "123", date(1906, 12, 9));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let removed = service(&db)
            .remove(&owner, &existing.id)
            .await
            .expect("remove should succeed");
        assert_eq!(removed, existing);
    }

    #[tokio::test]
    async fn upcoming_birthdays_filters_owned_contacts() {
        let owner = Uuid::new_v4();
        let soon = contact_model(owner, "1", date(1990, 6, 3));
        let later = contact_model(owner, "2", date(1990, 9, 3));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[soon.clone(), later]])
            .into_connection();

        let upcoming = service(&db)
            .upcoming_birthdays(&owner, date(2024, 6, 1))
            .await
            .expect("query should succeed");
        assert_eq!(upcoming, Some(vec![soon]));
    }

    #[tokio::test]
    async fn list_clamps_limit() {
        let owner = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<contact::Model>::new()])
            .into_connection();

        let contacts = service(&db)
            .list(&owner, 500, 0)
            .await
            .expect("oversized limit should be clamped");
        assert!(contacts.is_empty());
    }
}
