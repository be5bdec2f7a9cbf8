//! OpenAPI documentation, served at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;

/// Session cookie issued by `/login` and `/signUp`.
struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "SessionCookie".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "messenger_session",
                    "Signed session token set by `POST /login` or `POST /signUp`. The cookie name is configurable.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Messenger API",
        description = "Accounts, conferences and messages."
    ),
    modifiers(&SessionCookieAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::users::get_user,
        api::handlers::conferences::list_conferences,
        api::handlers::conferences::create_conference,
        api::handlers::conferences::list_messages,
        api::handlers::conferences::post_message,
    ),
    components(
        schemas(
            api::models::auth::LoginRequest,
            api::models::auth::RegisterRequest,
            api::models::auth::AuthResponse,
            api::models::auth::AuthSuccessResponse,
            api::models::users::UserResponse,
            api::models::conferences::ConferenceCreate,
            api::models::conferences::ConferenceResponse,
            api::models::messages::MessageCreate,
            api::models::messages::MessageResponse,
        )
    ),
    tags(
        (name = "authentication", description = "Registration and sessions"),
        (name = "users", description = "User lookup"),
        (name = "conferences", description = "Conferences and their messages"),
    )
)]
pub struct ApiDoc;
