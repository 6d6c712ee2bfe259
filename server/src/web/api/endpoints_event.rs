use crate::data_store::list_query::{
    EventFilters, EventListParams, SortDirection, SortField,
};
use crate::data_store::models::{EventField, EventInfoChangeset, NewEvent};
use crate::web::api::{validation, APIError, SessionTokenHeader};
use crate::web::AppState;
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

#[get("/events")]
async fn list_events(
    query: web::Query<EventListQuery>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let params: EventListParams = query.into_inner().into();
    let page = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.list_events(&auth, &params)?)
    })
    .await??;

    Ok(web::Json(evently_api_types::EventPage {
        count: page.count,
        count_filtered: page.count_filtered,
        rows: page.rows.into_iter().map(|e| e.into()).collect(),
    }))
}

/// Query parameters of the listing endpoint. The bracketed filter keys follow the convention of
/// the client-side table widget this API was originally built for.
#[derive(Deserialize, Default)]
struct EventListQuery {
    #[serde(default, rename = "filters[id]")]
    filter_id: Option<i32>,
    #[serde(default, rename = "filters[name]")]
    filter_name: Option<String>,
    #[serde(default, rename = "filters[notes]")]
    filter_notes: Option<String>,
    #[serde(default, rename = "filters[info]")]
    filter_info: Option<String>,
    #[serde(default)]
    sort: Option<String>,
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    page: Option<i64>,
    #[serde(default)]
    size: Option<i64>,
}

impl From<EventListQuery> for EventListParams {
    fn from(value: EventListQuery) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            filters: EventFilters {
                id: value.filter_id,
                name: non_empty(value.filter_name),
                notes: non_empty(value.filter_notes),
                info: non_empty(value.filter_info),
            },
            sort: value
                .sort
                .as_deref()
                .map(SortField::parse)
                .unwrap_or_default(),
            direction: value
                .direction
                .as_deref()
                .map(SortDirection::parse)
                .unwrap_or_default(),
            page: value.page.unwrap_or(0),
            size: value.size.unwrap_or(0),
        }
    }
}

#[post("/events")]
async fn create_event(
    data: web::Json<evently_api_types::NewEvent>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let event = data.into_inner();
    validation::validate_new_event(&event)?;

    let created: evently_api_types::Event = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.create_event(&auth, NewEvent::from_api(event, auth.user_id()))?)
    })
    .await??
    .into();

    Ok(web::Json(created))
}

#[derive(Deserialize)]
struct CheckNameQuery {
    name: String,
}

#[get("/events/check-name")]
async fn check_name(
    req: HttpRequest,
    query: web::Query<CheckNameQuery>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let client_address = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_owned();
    let name = query.into_inner().name;
    if name.is_empty() {
        return Err(APIError::Validation(vec![validation::FieldError {
            field: "name".to_owned(),
            message: "Name must not be empty.".to_owned(),
        }]));
    }

    let availability = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        store.check_name_check_throttle(&client_address)?;
        let exists = store.event_name_exists(&auth, &name)?;
        Ok(evently_api_types::NameAvailability {
            name,
            available: !exists,
        })
    })
    .await??;

    Ok(web::Json(availability))
}

#[get("/events/{event_id}")]
async fn get_event_info(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let event: evently_api_types::Event = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.get_event(&auth, event_id)?)
    })
    .await??
    .into();
    Ok(web::Json(event))
}

#[put("/events/{event_id}")]
async fn update_event_info(
    path: web::Path<i32>,
    data: web::Json<evently_api_types::EventInfoUpdate>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let update = data.into_inner();
    validation::validate_info_update(&update)?;

    let updated: evently_api_types::Event = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.update_event_info(&auth, event_id, EventInfoChangeset::from(update))?)
    })
    .await??
    .into();
    Ok(web::Json(updated))
}

#[derive(Deserialize)]
struct FieldUpdateBody {
    value: serde_json::Value,
}

#[put("/events/{event_id}/{field}")]
async fn update_event_field(
    path: web::Path<(i32, String)>,
    data: web::Json<FieldUpdateBody>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let (event_id, field_name) = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let field = EventField::parse(&field_name).ok_or(APIError::NotExisting)?;
    let value = validation::parse_field_value(field, &data.into_inner().value)?;

    let updated: evently_api_types::Event = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        Ok(store.update_event_field(&auth, event_id, value)?)
    })
    .await??
    .into();
    Ok(web::Json(updated))
}

#[delete("/events/{event_id}")]
async fn delete_event(
    path: web::Path<i32>,
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let auth = store.get_auth_token_for_session(&session_token)?;
        store.delete_event(&auth, event_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::Ok().finish())
}
