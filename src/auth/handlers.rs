use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginData, LoginRequest, RegisterRequest, ResendOtpRequest, UserSummary,
            VerifyOtpRequest,
        },
        jwt::{AuthUser, JwtKeys},
        otp, password, repo,
        repo_types::User,
        validate,
    },
    errors::AppError,
    response::{ApiResponse, FieldError},
    state::AppState,
};

const CONFIRM_SUBJECT: &str = "Confirm Account";
const EMAIL_IN_USE: &str = "E-mail already in use";
const WRONG_CREDENTIALS: &str = "Email or Password wrong.";
const EMAIL_NOT_FOUND: &str = "Specified email not found.";
const ALREADY_CONFIRMED: &str = "Account already confirmed.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/resend-verify-otp", post(resend_verify_otp))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn confirm_email_body(code: i32) -> String {
    format!("<p>Please Confirm your Account.</p><p>OTP: {code}</p>")
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserSummary>>, AppError> {
    let input = payload.normalized();

    let mut errors = validate::register_fields(&input);
    // Uniqueness joins the same error list as the format checks, but only
    // once the email itself is plausible.
    if !errors.iter().any(|e| e.field == "email")
        && User::find_by_email(&state.db, &validate::sanitize(&input.email))
            .await?
            .is_some()
    {
        warn!(email = %input.email, "email already registered");
        errors.push(FieldError::new("email", EMAIL_IN_USE));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let input = input.sanitized();
    let password_hash = password::hash_password(&input.password)?;
    let code = otp::generate();

    // Email goes out first: if delivery fails, no user record is created.
    state
        .mailer
        .send(&input.email, CONFIRM_SUBJECT, &confirm_email_body(code))
        .await
        .map_err(AppError::Delivery)?;

    let user = User::create(
        &state.db,
        &input.first_name,
        &input.last_name,
        &input.email,
        &password_hash,
        code,
    )
    .await
    .map_err(map_create_error)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(ApiResponse::with_data(
        "Registration Success.",
        UserSummary::from(&user),
    )))
}

/// Classify an insert failure: losing a race against a concurrent
/// registration for the same address surfaces exactly like the pre-check
/// would have, anything else is a server error.
fn map_create_error(e: anyhow::Error) -> AppError {
    if repo::is_unique_violation(&e) {
        AppError::Validation(vec![FieldError::new("email", EMAIL_IN_USE)])
    } else {
        AppError::Internal(e)
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginData>>, AppError> {
    let input = payload.normalized();

    let errors = validate::login_fields(&input);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let input = input.sanitized();

    // Absent user and wrong password collapse into one generic rejection
    // so the endpoint cannot be used to enumerate addresses.
    let user = match User::find_by_email(&state.db, &input.email).await? {
        Some(user) => user,
        None => {
            warn!(email = %input.email, "login unknown email");
            return Err(AppError::unauthorized(WRONG_CREDENTIALS));
        }
    };
    if !password::verify_password(&input.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::unauthorized(WRONG_CREDENTIALS));
    }

    login_gate(&user)?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(ApiResponse::with_data(
        "Login Success.",
        LoginData {
            user: UserSummary::from(&user),
            token,
        },
    )))
}

/// Account-state checks after the credentials themselves have passed.
/// Confirmation is checked before the active flag.
fn login_gate(user: &User) -> Result<(), AppError> {
    if !user.is_confirmed {
        return Err(AppError::unauthorized(
            "Account is not confirmed. Please confirm your account.",
        ));
    }
    if !user.status {
        return Err(AppError::unauthorized(
            "Account is not active. Please contact admin.",
        ));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    let input = payload.normalized();

    let errors = validate::verify_fields(&input);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let input = input.sanitized();

    // Unlike login, the confirmation flow does tell the caller when the
    // address is unknown.
    let user = User::find_by_email(&state.db, &input.email)
        .await?
        .ok_or_else(|| AppError::unauthorized(EMAIL_NOT_FOUND))?;

    confirm_gate(&user, &input.otp)?;

    User::confirm(&state.db, user.id).await?;
    info!(user_id = %user.id, "account confirmed");
    Ok(Json(ApiResponse::success("Account confirmed success.")))
}

fn confirm_gate(user: &User, submitted: &str) -> Result<(), AppError> {
    if user.is_confirmed {
        return Err(AppError::unauthorized(ALREADY_CONFIRMED));
    }
    if !otp::matches(user.confirm_otp, submitted) {
        return Err(AppError::unauthorized("Otp does not match"));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn resend_verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<ResendOtpRequest>,
) -> Result<Json<ApiResponse>, AppError> {
    let input = payload.normalized();

    let errors = validate::resend_fields(&input);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let input = input.sanitized();

    let user = User::find_by_email(&state.db, &input.email)
        .await?
        .ok_or_else(|| AppError::unauthorized(EMAIL_NOT_FOUND))?;
    if user.is_confirmed {
        return Err(AppError::unauthorized(ALREADY_CONFIRMED));
    }

    let code = otp::generate();
    state
        .mailer
        .send(&user.email, CONFIRM_SUBJECT, &confirm_email_body(code))
        .await
        .map_err(AppError::Delivery)?;

    // Only after the email went out: store the new code and drop the
    // account back to unconfirmed.
    User::reset_otp(&state.db, user.id, code).await?;
    info!(user_id = %user.id, "confirmation otp resent");
    Ok(Json(ApiResponse::success("Confirm otp sent.")))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<UserSummary>>, AppError> {
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("User not found"))?;

    Ok(Json(ApiResponse::with_data(
        "Profile fetched.",
        UserSummary::from(&user),
    )))
}
