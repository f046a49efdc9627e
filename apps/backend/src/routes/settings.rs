//! Settings endpoints

use axum::{extract::State, Extension, Json};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// GET /api/settings
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SettingsResponse>> {
    let settings = state.db.get_settings(auth.user_id).await?;
    Ok(Json(settings.to_api_settings()))
}

/// PUT /api/settings
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>> {
    let current = state.db.get_settings(auth.user_id).await?;
    let updated =
        apply_update(current.to_review_settings(), &request).map_err(ApiError::Validation)?;

    let saved = state
        .db
        .upsert_settings(auth.user_id, updated.retention, updated.params.as_ref())
        .await?;

    Ok(Json(saved.to_api_settings()))
}

/// Merge a settings update, validating before anything is stored.
///
/// `reset_params` drops custom weights, a full `fsrs_params` vector replaces
/// them, and `initial_easy_stability` is applied last on top of either.
fn apply_update(
    mut settings: ReviewSettings,
    request: &UpdateSettingsRequest,
) -> std::result::Result<ReviewSettings, String> {
    if let Some(retention) = request.fsrs_retention {
        if !(retention > 0.0 && retention < 1.0) {
            return Err(format!(
                "fsrs_retention must be between 0 and 1 (exclusive), got {}",
                retention
            ));
        }
        settings.retention = retention;
    }

    if request.reset_params {
        settings.params = None;
    }

    if let Some(params) = &request.fsrs_params {
        if params.w.iter().any(|w| !w.is_finite()) {
            return Err("fsrs_params must contain only finite weights".to_string());
        }
        if params.initial_easy_stability() <= 0.0 {
            return Err("initial easy stability must be positive".to_string());
        }
        settings.params = Some(params.clone());
    }

    if let Some(value) = request.initial_easy_stability {
        if !(value.is_finite() && value > 0.0) {
            return Err(format!(
                "initial_easy_stability must be a positive number, got {}",
                value
            ));
        }
        settings.params = Some(settings.effective_params().with_initial_easy_stability(value));
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn retention_is_updated() {
        let request = UpdateSettingsRequest {
            fsrs_retention: Some(0.85),
            ..Default::default()
        };
        let settings = apply_update(ReviewSettings::default(), &request).unwrap();
        assert_eq!(settings.retention, 0.85);
        assert_eq!(settings.params, None);
    }

    #[test]
    fn retention_bounds_are_exclusive() {
        for retention in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            let request = UpdateSettingsRequest {
                fsrs_retention: Some(retention),
                ..Default::default()
            };
            assert!(apply_update(ReviewSettings::default(), &request).is_err());
        }
    }

    #[test]
    fn easy_stability_overrides_default_weights() {
        let request = UpdateSettingsRequest {
            initial_easy_stability: Some(8.0),
            ..Default::default()
        };
        let settings = apply_update(ReviewSettings::default(), &request).unwrap();
        let params = settings.params.unwrap();
        assert_eq!(params.initial_easy_stability(), 8.0);
        assert_eq!(params.w[0], FsrsParams::default().w[0]);
    }

    #[test]
    fn non_positive_easy_stability_is_rejected() {
        let request = UpdateSettingsRequest {
            initial_easy_stability: Some(0.0),
            ..Default::default()
        };
        assert!(apply_update(ReviewSettings::default(), &request).is_err());
    }

    #[test]
    fn reset_drops_custom_weights() {
        let current = ReviewSettings {
            retention: 0.9,
            params: Some(FsrsParams::default().with_initial_easy_stability(9.0)),
        };
        let request = UpdateSettingsRequest {
            reset_params: true,
            ..Default::default()
        };
        assert_eq!(apply_update(current, &request).unwrap().params, None);
    }

    #[test]
    fn non_finite_weights_are_rejected() {
        let mut params = FsrsParams::default();
        params.w[8] = f64::INFINITY;
        let request = UpdateSettingsRequest {
            fsrs_params: Some(params),
            ..Default::default()
        };
        assert!(apply_update(ReviewSettings::default(), &request).is_err());
    }
}
