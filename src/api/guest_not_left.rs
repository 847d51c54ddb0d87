//! Guest-not-left API handlers

use crate::api::SuccessResponse;
use crate::domain::{GeoPoint, StringUuid};
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::state::HasGuestNotLeft;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for reporting a guest who has not left
#[derive(Debug, Deserialize)]
pub struct ReportGuestNotLeftRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub notes: Option<String>,
}

impl ReportGuestNotLeftRequest {
    fn location(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

/// Report that the previous guest has not left the property
pub async fn report<S: HasGuestNotLeft>(
    State(state): State<S>,
    auth: AuthUser,
    Path(assignment_id): Path<Uuid>,
    Json(request): Json<ReportGuestNotLeftRequest>,
) -> Result<impl IntoResponse> {
    let outcome = state
        .guest_not_left_service()
        .report(
            StringUuid::from(assignment_id),
            auth.id(),
            request.location(),
            request.notes,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(outcome))))
}

#[derive(Debug, Serialize)]
pub struct ClearFlagResponse {
    pub resolved_reports: u64,
}

/// Clear the guest-not-left flag when the job proceeds
pub async fn clear<S: HasGuestNotLeft>(
    State(state): State<S>,
    _auth: AuthUser,
    Path(assignment_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let resolved_reports = state
        .guest_not_left_service()
        .clear_flag(StringUuid::from(assignment_id))
        .await?;

    Ok(Json(SuccessResponse::new(ClearFlagResponse {
        resolved_reports,
    })))
}
