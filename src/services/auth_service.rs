use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest, SetupResult};
use crate::{
    audit::log_audit,
    db::DbPool,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Profile,
    response::{ApiResponse, Meta},
};

pub async fn register_user(
    pool: &DbPool,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<Profile>> {
    let RegisterRequest {
        email,
        password,
        full_name,
    } = payload;

    if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    if password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM profiles WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;

    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;
    let id = Uuid::new_v4();

    let profile: Profile = sqlx::query_as(
        "INSERT INTO profiles (id, email, password_hash, full_name) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(id)
    .bind(email.as_str())
    .bind(password_hash)
    .bind(full_name)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(profile.id),
        "user_register",
        Some("profiles"),
        Some(serde_json::json!({ "user_id": profile.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
    Ok(ApiResponse::success("User created", profile, None))
}

pub async fn login_user(
    pool: &DbPool,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let profile: Option<Profile> =
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(pool)
            .await?;

    let profile = match profile {
        Some(p) => p,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    let parsed_hash = PasswordHash::new(&profile.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: profile.id.to_string(),
        email: profile.email.clone(),
        role: profile.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    let resp = LoginResponse {
        token: format!("Bearer {}", token),
    };

    if let Err(err) = log_audit(
        pool,
        Some(profile.id),
        "user_login",
        Some("profiles"),
        Some(serde_json::json!({ "user_id": profile.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Logged in",
        resp,
        Some(Meta::empty()),
    ))
}

/// One-time setup helper. Safe to call repeatedly: it creates a missing
/// profile as admin, promotes an existing non-admin, and otherwise reports
/// that nothing was left to do.
pub async fn bootstrap_admin(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<SetupResult>> {
    let profile: Option<Profile> =
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(user.user_id)
            .fetch_optional(pool)
            .await?;

    let result = match profile {
        None => {
            // The token outlived its profile row. Recreate it as admin with a
            // throwaway password; a real one arrives via the normal reset path.
            let placeholder = hash_password(&Uuid::new_v4().to_string())?;
            let created: Profile = sqlx::query_as(
                "INSERT INTO profiles (id, email, password_hash, role) VALUES ($1, $2, $3, 'admin') RETURNING *",
            )
            .bind(user.user_id)
            .bind(user.email.as_str())
            .bind(placeholder)
            .fetch_one(pool)
            .await?;
            SetupResult {
                action: "created_admin".to_string(),
                email: created.email,
            }
        }
        Some(p) if p.role == "admin" => SetupResult {
            action: "already_admin".to_string(),
            email: p.email,
        },
        Some(p) => {
            let promoted: Profile =
                sqlx::query_as("UPDATE profiles SET role = 'admin' WHERE id = $1 RETURNING *")
                    .bind(p.id)
                    .fetch_one(pool)
                    .await?;
            SetupResult {
                action: "promoted".to_string(),
                email: promoted.email,
            }
        }
    };

    if let Err(err) = log_audit(
        pool,
        Some(user.user_id),
        "admin_bootstrap",
        Some("profiles"),
        Some(serde_json::json!({ "action": result.action })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Setup complete",
        result,
        Some(Meta::empty()),
    ))
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}
