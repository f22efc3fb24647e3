use axum::{extract::State, Json};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{SigninRequest, SigninResponse, SignupRequest, StatusResponse, VerifyEmailRequest},
        repo_types::NewUser,
        services::{
            generate_token, generate_user_id, hash_password, is_valid_email, validate_password,
            verify_credentials, DEFAULT_TOKEN_BYTES,
        },
    },
    db::StoreError,
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const VERIFY_BEFORE_SIGNIN: &str =
    "Please verify your email before signing in. A new verification email has been sent.";
const INVALID_TOKEN: &str = "Invalid or expired verification token";

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Json<StatusResponse> {
    match register(&state, payload).await {
        Ok(resp) => Json(resp),
        Err(e) => {
            error!(error = %e, "signup failed");
            Json(StatusResponse::fail("Registration failed. Please try again."))
        }
    }
}

async fn register(state: &AppState, payload: SignupRequest) -> anyhow::Result<StatusResponse> {
    if !is_valid_email(&payload.email) {
        return Ok(StatusResponse::fail("Invalid email format"));
    }

    let check = validate_password(&payload.password);
    if !check.is_valid {
        return Ok(StatusResponse::fail(format!(
            "Password validation failed: {}",
            check.errors.join(", ")
        )));
    }

    if state.users.find_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Ok(StatusResponse::fail("Email already exists"));
    }
    if state.users.find_by_username(&payload.username).await?.is_some() {
        warn!(username = %payload.username, "username already registered");
        return Ok(StatusResponse::fail("Username already exists"));
    }

    let verification_token = state
        .config
        .email_verification
        .is_required()
        .then(|| generate_token(DEFAULT_TOKEN_BYTES));

    let new_user = NewUser {
        id: generate_user_id(),
        email: payload.email,
        username: payload.username,
        password_hash: hash_password(&payload.password)?,
        verification_token: verification_token.clone(),
    };

    let user = match state.users.create(new_user).await {
        Ok(u) => u,
        Err(StoreError::UniqueViolation { field }) if field == "email" => {
            warn!("signup lost an email uniqueness race");
            return Ok(StatusResponse::fail("Email already exists"));
        }
        Err(StoreError::UniqueViolation { field }) if field == "username" => {
            warn!("signup lost a username uniqueness race");
            return Ok(StatusResponse::fail("Username already exists"));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(token) = verification_token {
        send_verification(state, &user.email, &token).await;
    }

    info!(user_id = %user.id, "user registered");
    Ok(StatusResponse::ok("User registered successfully"))
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<SigninRequest>,
) -> Json<SigninResponse> {
    match authenticate(&state, payload).await {
        Ok(resp) => Json(resp),
        Err(e) => {
            error!(error = %e, "signin failed");
            Json(SigninResponse::fail("Login failed. Please try again."))
        }
    }
}

async fn authenticate(state: &AppState, payload: SigninRequest) -> anyhow::Result<SigninResponse> {
    let mut user = None;
    if !payload.email.trim().is_empty() {
        user = state.users.find_by_email(&payload.email).await?;
    }
    if user.is_none() {
        if let Some(username) = payload.username.as_deref().filter(|u| !u.trim().is_empty()) {
            user = state.users.find_by_username(username).await?;
        }
    }

    // Unknown accounts still pay for a hash verification.
    let password_ok = verify_credentials(
        &payload.password,
        user.as_ref().and_then(|u| u.password.as_deref()),
    );
    let user = match user {
        Some(user) if password_ok => user,
        Some(user) => {
            warn!(user_id = %user.id, "signin invalid password");
            return Ok(SigninResponse::fail(INVALID_CREDENTIALS));
        }
        None => {
            warn!("signin for unknown account");
            return Ok(SigninResponse::fail(INVALID_CREDENTIALS));
        }
    };

    if state.config.email_verification.is_required() && !user.email_verified {
        let token = match user.email_verification_token.clone() {
            Some(t) => t,
            None => {
                let t = generate_token(DEFAULT_TOKEN_BYTES);
                state.users.set_verification_token(&user.id, &t).await?;
                t
            }
        };
        send_verification(state, &user.email, &token).await;
        info!(user_id = %user.id, "signin blocked until email is verified");
        return Ok(SigninResponse::fail(VERIFY_BEFORE_SIGNIN));
    }

    state.users.touch_last_login(&user.id).await?;

    info!(user_id = %user.id, "user signed in");
    Ok(SigninResponse::ok(generate_token(DEFAULT_TOKEN_BYTES), user.id))
}

#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Json<StatusResponse> {
    match confirm_email(&state, payload).await {
        Ok(resp) => Json(resp),
        Err(e) => {
            error!(error = %e, "email verification failed");
            Json(StatusResponse::fail("Email verification failed. Please try again."))
        }
    }
}

async fn confirm_email(state: &AppState, payload: VerifyEmailRequest) -> anyhow::Result<StatusResponse> {
    if payload.token.trim().is_empty() {
        return Ok(StatusResponse::fail(INVALID_TOKEN));
    }
    let Some(user) = state.users.find_by_verification_token(&payload.token).await? else {
        return Ok(StatusResponse::fail(INVALID_TOKEN));
    };

    state.users.mark_verified(&user.id).await?;

    info!(user_id = %user.id, "email verified");
    Ok(StatusResponse::ok("Email verified successfully"))
}

/// Delivery problems never fail the calling procedure.
async fn send_verification(state: &AppState, email: &str, token: &str) {
    if let Err(e) = state.mailer.send_verification(email, token).await {
        error!(error = %e, "failed to send verification email");
    }
}
