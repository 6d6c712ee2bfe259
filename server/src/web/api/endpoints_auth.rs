use crate::auth_session::SessionToken;
use crate::web::api::{APIError, SessionTokenHeader};
use crate::web::AppState;
use actix_web::{get, post, web, Responder};

#[post("/sessions")]
async fn login(
    data: web::Json<evently_api_types::LoginRequest>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let credentials = data.into_inner();
    let store = state.store.clone();
    let user = web::block(move || -> Result<_, APIError> {
        let mut store = store.get_facade()?;
        Ok(store.verify_credentials(&credentials.user_name, &credentials.password)?)
    })
    .await??;

    let token = SessionToken::new(user.id);
    Ok(web::Json(evently_api_types::LoginResponse {
        session_token: token.as_string(&state.secret),
        user: user.into(),
    }))
}

#[get("/sessions/current")]
async fn get_current_session(
    state: web::Data<AppState>,
    session_token_header: Option<web::Header<SessionTokenHeader>>,
) -> Result<impl Responder, APIError> {
    let session_token = session_token_header
        .ok_or(APIError::NoSessionToken)?
        .into_inner()
        .session_token(&state.secret)?;
    let user: evently_api_types::UserInfo = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_session_user(&session_token)?)
    })
    .await??
    .into();
    Ok(web::Json(user))
}
