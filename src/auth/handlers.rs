use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, PublicUser, SignupRequest, SignupResponse},
        password::PasswordService,
        repo_types::NewUser,
    },
    error::AppError,
    payload::Payload,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Payload(payload): Payload<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let email = payload.email.trim().to_lowercase();
    let username = payload.username.trim().to_string();

    let password_hash = hash_off_thread(&state.passwords, payload.password).await?;

    let user = state
        .store
        .create_user(&NewUser {
            name: payload.name.trim().to_string(),
            username,
            email,
            password_hash,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "create user failed");
            AppError::from_store(e, "user")
        })?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully",
            user: PublicUser::from(user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Payload(payload): Payload<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = payload.username().map(str::to_string);
    let email = payload.email().map(str::to_lowercase);

    let credential = state
        .store
        .find_credential(username.as_deref(), email.as_deref())
        .await?;
    let hash = match &credential {
        Some(c) => c.password_hash.clone(),
        None => state.passwords.decoy_hash().to_string(),
    };
    let ok = verify_off_thread(&state.passwords, hash, payload.password).await?;

    let credential = match credential {
        None => {
            warn!(?username, ?email, "login unknown user");
            return Err(AppError::InvalidCredentials);
        }
        Some(c) if !ok => {
            warn!(user_id = %c.user_id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }
        Some(c) => c,
    };

    let token = state
        .tokens
        .issue(credential.user_id, &credential.email)
        .map_err(anyhow::Error::from)?;

    info!(user_id = %credential.user_id, "user logged in");
    Ok(Json(LoginResponse {
        message: "Login successful",
        token,
    }))
}

async fn hash_off_thread(passwords: &PasswordService, plain: String) -> Result<String, AppError> {
    let passwords = passwords.clone();
    let hash = tokio::task::spawn_blocking(move || passwords.hash(&plain))
        .await
        .map_err(anyhow::Error::from)?
        .map_err(anyhow::Error::from)?;
    Ok(hash)
}

async fn verify_off_thread(
    passwords: &PasswordService,
    hash: String,
    plain: String,
) -> Result<bool, AppError> {
    let passwords = passwords.clone();
    let ok = tokio::task::spawn_blocking(move || passwords.verify(&hash, &plain))
        .await
        .map_err(anyhow::Error::from)?
        .map_err(anyhow::Error::from)?;
    Ok(ok)
}
