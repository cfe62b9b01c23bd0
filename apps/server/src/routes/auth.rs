//! Account routes: register, login, current user, profile picture.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use justcani_core::validation::{
    validate_email, validate_password, validate_username, validate_whatsapp,
};
use justcani_core::{NewUser, Role, User};

use super::{ApiJson, Success};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::images::{check_upload, save_profile_picture};
use crate::password::{hash_password_blocking, verify_password_blocking};
use crate::state::AppState;
use crate::PROFILE_PICS_PATH;

pub fn router(upload_body_limit: usize) -> axum::Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/me", get(me))
        .route(
            "/api/profile/picture",
            post(upload_profile_picture).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub whatsapp: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct UserBody {
    user: User,
}

async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Success<UserBody>>)> {
    validate_username(&req.username)?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;
    let whatsapp = validate_whatsapp(req.whatsapp.as_deref())?;

    let password_hash = hash_password_blocking(req.password).await?;

    let user = state
        .db
        .users()
        .register(&NewUser {
            username: req.username.trim().to_string(),
            email: req.email.trim().to_string(),
            whatsapp,
            password_hash,
            // decided by the repository: first account is admin
            role: Role::Cashier,
        })
        .await?;

    let message = match user.role {
        Role::Admin => "Registration successful. First account has admin access.",
        Role::Cashier => "Registration successful. Please log in.",
    };

    Ok((StatusCode::CREATED, Success::new(message, UserBody { user })))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct LoginBody {
    token: String,
    token_type: &'static str,
    expires_in: i64,
    user: User,
}

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<Success<LoginBody>>> {
    let invalid = || ApiError::unauthorized("Invalid username/email or password");

    if req.login.trim().is_empty() || req.password.is_empty() {
        return Err(invalid());
    }

    let Some(user) = state.db.users().find_by_login(&req.login).await? else {
        warn!(login = %req.login.trim(), "Login for unknown account");
        return Err(invalid());
    };

    if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
        warn!(user_id = user.id, "Login with wrong password");
        return Err(invalid());
    }

    let token = state.jwt.issue(&user)?;
    info!(user_id = user.id, role = user.role.as_str(), "User logged in");

    Ok(Success::new(
        format!("Welcome, {}", user.username),
        LoginBody {
            token,
            token_type: "Bearer",
            expires_in: state.jwt.lifetime_secs(),
            user,
        },
    ))
}

async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

#[derive(Debug, Serialize)]
struct PictureBody {
    url: String,
}

async fn upload_profile_picture(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<Success<PictureBody>>> {
    let multipart_err = |e: axum::extract::multipart::MultipartError| {
        ApiError::validation(format!("Invalid upload: {}", e.body_text()))
    };

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
        if field.name() != Some("photo") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_err)?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| ApiError::validation("No file uploaded"))?;
    check_upload(&file_name, bytes.len(), state.config.max_upload_bytes)?;

    let stored = save_profile_picture(&state.config.upload_dir, user.id, bytes.to_vec()).await?;
    let url = format!("{}/{}", PROFILE_PICS_PATH, stored);
    state.db.users().update_profile_pic(user.id, &url).await?;

    info!(user_id = user.id, url = %url, "Profile picture updated");
    Ok(Success::new("Profile picture updated", PictureBody { url }))
}
