use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Json, Router,
};
use axum_extra::extract::{cookie::Cookie, CookieJar, WithRejection};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::{
        dto::PublicUser,
        extractors::{AuthUser, ACCESS_TOKEN_COOKIE},
    },
    error::AppError,
    state::AppState,
    users::{dto::UpdateUserRequest, services},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/signout", get(signout))
        .route("/user/:id", put(update_user).delete(delete_user))
        .route("/user/delete/:id", delete(delete_user))
}

/// Tokens are stateless; this only drops the signin cookie.
#[instrument(skip(jar))]
pub async fn signout(jar: CookieJar) -> (CookieJar, Json<&'static str>) {
    let jar = jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"));
    (jar, Json("User has been signed out"))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateUserRequest>, AppError>,
) -> Result<Json<PublicUser>, AppError> {
    let user = services::update_user(state.users.as_ref(), &caller, id, payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<&'static str>, AppError> {
    services::delete_user(state.users.as_ref(), &caller, id).await?;
    Ok(Json("User has been Deleted..."))
}
