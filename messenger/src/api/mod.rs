//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Authentication** (`/login`, `/signUp`, `/logout`): credential checks and session cookies
//! - **Conferences** (`/messenger/conferences/*`): conference creation, listing and messages
//! - **Users** (`/messenger/users/*`): user profiles
//!
//! # OpenAPI Documentation
//!
//! Every endpoint is annotated with `utoipa`; the rendered documentation is served
//! at `/docs`.

pub mod handlers;
pub mod models;
