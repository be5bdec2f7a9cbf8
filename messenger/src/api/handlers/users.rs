use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState,
    api::models::users::{CurrentUser, UserResponse},
    errors::Error,
    types::UserId,
};

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/messenger/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, description = "Non-numeric user ID"),
        (status = 401, description = "Not logged in"),
        (status = 404, description = "User not found"),
    ),
    security(("SessionCookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = id))]
pub async fn get_user(State(state): State<AppState>, _current_user: CurrentUser, Path(id): Path<UserId>) -> Result<Json<UserResponse>, Error> {
    let user = state.messenger.get_user_by_id(id).await?;
    Ok(Json(UserResponse::from(user)))
}
