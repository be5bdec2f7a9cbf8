//! Conference and message endpoints.
//!
//! Every route here needs a session. Reading or posting messages additionally requires
//! membership of the conference; anyone else gets 403, including for conferences that
//! don't exist.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;

use crate::{
    AppState,
    api::models::{
        conferences::{ConferenceCreate, ConferenceResponse},
        messages::{MessageCreate, MessageResponse},
        users::CurrentUser,
    },
    errors::Error,
    messenger,
    types::ConferenceId,
};

/// List the conferences the current user belongs to
#[utoipa::path(
    get,
    path = "/messenger/conferences",
    tag = "conferences",
    responses(
        (status = 200, description = "Conferences of the current user", body = [ConferenceResponse]),
        (status = 401, description = "Not logged in"),
    ),
    security(("SessionCookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn list_conferences(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<ConferenceResponse>>, Error> {
    let conferences = state.messenger.get_conferences_by_user(current_user.id).await?;
    Ok(Json(conferences.into_iter().map(ConferenceResponse::from).collect()))
}

/// Create a conference with its initial members
#[utoipa::path(
    post,
    path = "/messenger/conferences",
    request_body = ConferenceCreate,
    tag = "conferences",
    responses(
        (status = 201, description = "Conference created", body = ConferenceResponse),
        (status = 400, description = "Unknown member id"),
        (status = 401, description = "Not logged in"),
    ),
    security(("SessionCookie" = []))
)]
#[tracing::instrument(skip_all, fields(user_id = current_user.id))]
pub async fn create_conference(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ConferenceCreate>,
) -> Result<(StatusCode, Json<ConferenceResponse>), Error> {
    let conference = state
        .messenger
        .create_conference(messenger::ConferenceCreate {
            member_ids: request.member_ids,
            name: request.name,
            created_by: current_user.id,
            created_at: Utc::now(),
            add_creator: request.add_creator,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ConferenceResponse::from(conference))))
}

/// List the messages of a conference, oldest first
#[utoipa::path(
    get,
    path = "/messenger/conferences/{id}",
    tag = "conferences",
    params(
        ("id" = i64, Path, description = "Conference ID"),
    ),
    responses(
        (status = 200, description = "Messages of the conference", body = [MessageResponse]),
        (status = 400, description = "Non-numeric conference ID"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not a member of the conference"),
    ),
    security(("SessionCookie" = []))
)]
#[tracing::instrument(skip_all, fields(conference_id = id, user_id = current_user.id))]
pub async fn list_messages(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ConferenceId>,
) -> Result<Json<Vec<MessageResponse>>, Error> {
    state.messenger.require_member(current_user.id, id).await?;

    let messages = state.messenger.list_messages(id).await?;
    Ok(Json(messages.into_iter().map(MessageResponse::from).collect()))
}

/// Post a message to a conference as the current user
#[utoipa::path(
    post,
    path = "/messenger/conferences/{id}",
    request_body = MessageCreate,
    tag = "conferences",
    params(
        ("id" = i64, Path, description = "Conference ID"),
    ),
    responses(
        (status = 201, description = "Message stored", body = MessageResponse),
        (status = 400, description = "Non-numeric conference ID"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not a member of the conference"),
    ),
    security(("SessionCookie" = []))
)]
#[tracing::instrument(skip_all, fields(conference_id = id, user_id = current_user.id))]
pub async fn post_message(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ConferenceId>,
    Json(request): Json<MessageCreate>,
) -> Result<(StatusCode, Json<MessageResponse>), Error> {
    state.messenger.require_member(current_user.id, id).await?;

    let message = state
        .messenger
        .post_message(messenger::MessageCreate {
            conference_id: id,
            user_id: current_user.id,
            text: request.text,
            sent_at: Utc::now(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}
