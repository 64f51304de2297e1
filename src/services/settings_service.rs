use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::settings::{SettingsDto, UpdateSettingsRequest},
    entity::cafe_settings::{
        ActiveModel as SettingsActive, Entity as CafeSettings, Model as SettingsModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

const DEFAULT_CAFE_NAME: &str = "The Brew";

/// Read-through: cache first, then the store, then built-in defaults when the
/// singleton row has never been written.
pub async fn get_settings(state: &AppState) -> AppResult<ApiResponse<SettingsDto>> {
    if let Some(cached) = state.settings.get().await {
        return Ok(ApiResponse::success(
            "Settings",
            settings_dto(&cached),
            Some(Meta::empty()),
        ));
    }

    let row = CafeSettings::find().one(&state.orm).await?;
    let dto = match row {
        Some(model) => {
            let dto = settings_dto(&model);
            state.settings.store(model).await;
            dto
        }
        None => SettingsDto {
            cafe_name: DEFAULT_CAFE_NAME.to_string(),
            logo_url: None,
        },
    };

    Ok(ApiResponse::success("Settings", dto, Some(Meta::empty())))
}

pub async fn update_settings(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSettingsRequest,
) -> AppResult<ApiResponse<SettingsDto>> {
    ensure_admin(user)?;

    if let Some(name) = &payload.cafe_name {
        if name.trim().is_empty() {
            return Err(AppError::BadRequest("cafe_name cannot be empty".into()));
        }
    }

    let existing = CafeSettings::find().one(&state.orm).await?;
    let model = match existing {
        Some(row) => {
            let cafe_name = payload
                .cafe_name
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| row.cafe_name.clone());
            let logo_url = match payload.logo_url {
                Some(url) => Some(url),
                None => row.logo_url.clone(),
            };
            let mut active: SettingsActive = row.into();
            active.cafe_name = Set(cafe_name);
            active.logo_url = Set(logo_url);
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?
        }
        None => SettingsActive {
            id: Set(Uuid::new_v4()),
            cafe_name: Set(payload
                .cafe_name
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| DEFAULT_CAFE_NAME.to_string())),
            logo_url: Set(payload.logo_url),
            singleton: Set(true),
            updated_at: Set(Utc::now().into()),
        }
        .insert(&state.orm)
        .await?,
    };

    let dto = settings_dto(&model);
    state.settings.store(model).await;
    state.feed.publish("settings", "update", None);

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "settings_update",
        Some("cafe_settings"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Settings updated",
        dto,
        Some(Meta::empty()),
    ))
}

fn settings_dto(model: &SettingsModel) -> SettingsDto {
    SettingsDto {
        cafe_name: model.cafe_name.clone(),
        logo_url: model.logo_url.clone(),
    }
}
