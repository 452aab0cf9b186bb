use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{dao::ContactFields, entities::contact},
    middleware::{CurrentUser, RateLimitLayer, RouteClass, ValidatedJson, ValidatedQuery},
    response::{ApiResult, JsonApiResponse},
    services::{
        ContactService, ServiceContext,
        contact_service::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT},
    },
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
pub struct ContactBody {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub surname: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 20))]
    pub phone_number: String,
    pub birthday: NaiveDate,
}

impl From<ContactBody> for ContactFields {
    fn from(body: ContactBody) -> Self {
        Self {
            first_name: body.first_name,
            surname: body.surname,
            email: body.email,
            phone_number: body.phone_number,
            birthday: body.birthday,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub id: Uuid,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub phone_number: String,
    pub birthday: NaiveDate,
}

impl From<contact::Model> for ContactResponse {
    fn from(contact: contact::Model) -> Self {
        Self {
            id: contact.id,
            first_name: contact.first_name,
            surname: contact.surname,
            email: contact.email,
            phone_number: contact.phone_number,
            birthday: contact.birthday,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = MAX_PAGE_LIMIT))]
    pub limit: u64,
    #[serde(default)]
    pub skip: u64,
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmailQuery {
    #[validate(length(min = 1))]
    pub contact_email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PhoneQuery {
    #[validate(length(min = 1))]
    pub phone_number: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NameQuery {
    #[validate(length(min = 1))]
    pub contact_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SurnameQuery {
    #[validate(length(min = 1))]
    pub contact_surname: String,
}

type ContactList = Vec<ContactResponse>;

/// Reads and writes carry separate per-client limits.
pub fn router(state: Arc<AppState>) -> Router {
    let limits = &state.config.rate_limit;

    let reads = Router::new()
        .route("/contacts", get(list_contacts))
        .route("/contacts/search_by_email", get(search_by_email))
        .route("/contacts/search_by_phone", get(search_by_phone))
        .route("/contacts/search_by_name", get(search_by_name))
        .route("/contacts/search_by_surname", get(search_by_surname))
        .route("/contacts/birthday", get(upcoming_birthdays))
        .route("/contacts/{contact_id}", get(get_contact))
        .route_layer(RateLimitLayer::from_config(limits, RouteClass::Read));

    let writes = Router::new()
        .route("/contacts", post(create_contact))
        .route("/contacts/{contact_id}", put(update_contact).delete(remove_contact))
        .route_layer(RateLimitLayer::from_config(limits, RouteClass::Write));

    reads.merge(writes).with_state(state)
}

fn contact_service(state: &AppState) -> ContactService {
    ServiceContext::from_state(state).contact()
}

fn to_list(contacts: Vec<contact::Model>) -> ContactList {
    contacts.into_iter().map(ContactResponse::from).collect()
}

async fn list_contacts(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidatedQuery(page): ValidatedQuery<PageQuery>,
) -> ApiResult<ContactList> {
    let contacts = contact_service(&state)
        .list(&user.id, page.limit, page.skip)
        .await?;
    JsonApiResponse::ok(to_list(contacts))
}

async fn search_by_email(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidatedQuery(query): ValidatedQuery<EmailQuery>,
) -> ApiResult<ContactResponse> {
    let contact = contact_service(&state)
        .find_by_email(&user.id, &query.contact_email)
        .await?;
    JsonApiResponse::ok(contact.into())
}

async fn search_by_phone(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidatedQuery(query): ValidatedQuery<PhoneQuery>,
) -> ApiResult<ContactResponse> {
    let contact = contact_service(&state)
        .find_by_phone(&user.id, &query.phone_number)
        .await?;
    JsonApiResponse::ok(contact.into())
}

async fn search_by_name(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidatedQuery(query): ValidatedQuery<NameQuery>,
) -> ApiResult<ContactList> {
    let contacts = contact_service(&state)
        .search_by_first_name(&user.id, &query.contact_name)
        .await?;
    JsonApiResponse::ok(to_list(contacts))
}

async fn search_by_surname(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidatedQuery(query): ValidatedQuery<SurnameQuery>,
) -> ApiResult<ContactList> {
    let contacts = contact_service(&state)
        .search_by_surname(&user.id, &query.contact_surname)
        .await?;
    JsonApiResponse::ok(to_list(contacts))
}

async fn upcoming_birthdays(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<ContactList> {
    let today = chrono::Local::now().date_naive();
    match contact_service(&state)
        .upcoming_birthdays(&user.id, today)
        .await?
    {
        Some(contacts) => JsonApiResponse::ok(to_list(contacts)),
        None => JsonApiResponse::with_message("no upcoming birthdays", Vec::new()),
    }
}

async fn get_contact(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(contact_id): Path<Uuid>,
) -> ApiResult<ContactResponse> {
    let contact = contact_service(&state).get(&user.id, &contact_id).await?;
    JsonApiResponse::ok(contact.into())
}

async fn create_contact(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(body): ValidatedJson<ContactBody>,
) -> ApiResult<ContactResponse> {
    let contact = contact_service(&state)
        .create(&user.id, body.into())
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "created", contact.into())
}

async fn update_contact(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(contact_id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<ContactBody>,
) -> ApiResult<ContactResponse> {
    let contact = contact_service(&state)
        .update(&user.id, &contact_id, body.into())
        .await?;
    JsonApiResponse::ok(contact.into())
}

async fn remove_contact(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(contact_id): Path<Uuid>,
) -> ApiResult<ContactResponse> {
    let contact = contact_service(&state).remove(&user.id, &contact_id).await?;
    JsonApiResponse::ok(contact.into())
}
