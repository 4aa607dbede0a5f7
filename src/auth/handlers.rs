use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar, WithRejection,
};
use time::{Duration, OffsetDateTime};
use tracing::instrument;

use crate::{
    auth::{
        dto::{GoogleRequest, MessageResponse, PublicUser, SigninRequest, SigninResponse, SignupRequest},
        extractors::ACCESS_TOKEN_COOKIE,
        services,
    },
    config::CookieConfig,
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/auth/google", post(google))
}

fn access_cookie(token: String, cfg: &CookieConfig) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(cfg.secure)
        .same_site(SameSite::Strict)
        .expires(OffsetDateTime::now_utc() + Duration::minutes(cfg.ttl_minutes))
        .build()
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<SignupRequest>, AppError>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    services::signup(state.users.as_ref(), payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created successfully".into(),
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<SigninRequest>, AppError>,
) -> Result<(CookieJar, Json<SigninResponse>), AppError> {
    let (user, token) = services::signin(state.users.as_ref(), &state.keys, payload).await?;
    let jar = jar.add(access_cookie(token.clone(), &state.config.cookie));
    Ok((
        jar,
        Json(SigninResponse {
            user: PublicUser::from(user),
            token,
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn google(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<GoogleRequest>, AppError>,
) -> Result<(CookieJar, Json<PublicUser>), AppError> {
    let (user, token) = services::google(state.users.as_ref(), &state.keys, payload).await?;
    let jar = jar.add(access_cookie(token, &state.config.cookie));
    Ok((jar, Json(PublicUser::from(user))))
}
