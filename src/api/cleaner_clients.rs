//! Cleaner-clients API handlers
//!
//! Cleaner-facing invitation management plus the public token routes
//! the invited client hits from the emailed link. All mutating cleaner
//! routes are scoped to the authenticated cleaner; rows owned by
//! someone else answer 404.

use crate::api::{MessageResponse, SuccessResponse};
use crate::domain::{
    AcceptInvitationInput, AddressInput, CreateInvitationInput, Home, InviteDisposition,
    RelationshipResponse, RelationshipStatus, StringUuid, UserResponse,
};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::service::RemoveOutcome;
use crate::state::HasInvitations;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query parameters for the relationship list
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<RelationshipStatus>,
}

/// List the authenticated cleaner's clients and invitations
pub async fn list<S: HasInvitations>(
    State(state): State<S>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    auth.require_cleaner()?;

    let relationships = state
        .invitation_service()
        .list_for_cleaner(auth.id(), query.status)
        .await?;

    let responses: Vec<RelationshipResponse> =
        relationships.into_iter().map(Into::into).collect();

    Ok(Json(SuccessResponse::new(responses)))
}

/// Create a new invitation and send the invitation email
pub async fn create<S: HasInvitations>(
    State(state): State<S>,
    auth: AuthUser,
    Json(input): Json<CreateInvitationInput>,
) -> Result<impl IntoResponse> {
    auth.require_cleaner()?;

    let created = state.invitation_service().create(auth.id(), input).await?;

    // Email delivery is best-effort; the invitation row is already in
    let cleaner_name = cleaner_display_name(&state, auth.id()).await;
    state
        .notification_service()
        .send_invitation_email(&created, &cleaner_name)
        .await;

    let response: RelationshipResponse = created.into();
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(response))))
}

/// Response for the public token validation route
#[derive(Debug, Serialize)]
pub struct ValidateTokenResponse {
    pub valid: bool,
    pub is_cancelled: bool,
    pub cleaner_name: String,
    pub invited_name: String,
    pub invited_email: String,
    pub invited_address: Option<String>,
    pub invited_beds: Option<i32>,
    pub invited_baths: Option<i32>,
}

/// Validate an invite token (public; hit from the emailed link)
pub async fn validate_token<S: HasInvitations>(
    State(state): State<S>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse> {
    let validated = state
        .invitation_service()
        .validate_token(&token)
        .await?
        .ok_or(AppError::InvalidToken)?;

    match validated.disposition {
        InviteDisposition::AlreadyAccepted => return Err(AppError::AlreadyAccepted),
        InviteDisposition::Declined => return Err(AppError::InviteDeclined),
        InviteDisposition::Redeemable | InviteDisposition::Cancelled => {}
    }

    let invite = &validated.invite;
    let cleaner_name = cleaner_display_name(&state, invite.cleaner_id).await;

    Ok(Json(ValidateTokenResponse {
        valid: true,
        is_cancelled: validated.is_cancelled(),
        cleaner_name,
        invited_name: invite.invited_name.clone(),
        invited_email: invite.invited_email.clone(),
        invited_address: invite
            .invited_address
            .as_deref()
            .and_then(|stored| AddressInput::from_stored(stored).formatted()),
        invited_beds: invite.invited_beds,
        invited_baths: invite.invited_baths,
    }))
}

/// Request body for accepting an invitation
#[derive(Debug, Deserialize)]
pub struct AcceptInvitationRequest {
    pub token: String,
    pub password: String,
    pub phone: Option<String>,
    pub address_corrections: Option<AddressInput>,
}

/// Response for a successful acceptance
#[derive(Debug, Serialize)]
pub struct AcceptInvitationResponse {
    pub user: UserResponse,
    pub home: Option<Home>,
    pub relationship: RelationshipResponse,
}

/// Accept an invitation and create the homeowner account (public)
pub async fn accept<S: HasInvitations>(
    State(state): State<S>,
    Json(request): Json<AcceptInvitationRequest>,
) -> Result<impl IntoResponse> {
    let accepted = state
        .invitation_service()
        .accept(
            &request.token,
            AcceptInvitationInput {
                password: request.password,
                phone: request.phone,
                address_corrections: request.address_corrections,
            },
        )
        .await?;

    let response = AcceptInvitationResponse {
        user: accepted.user.into(),
        home: accepted.home,
        relationship: accepted.relationship.into(),
    };

    Ok((StatusCode::CREATED, Json(SuccessResponse::new(response))))
}

/// Decline an invitation (public)
pub async fn decline<S: HasInvitations>(
    State(state): State<S>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse> {
    state.invitation_service().decline(&token).await?;
    Ok(Json(MessageResponse::new("Invitation declined")))
}

/// Resend a pending invitation's email
pub async fn resend<S: HasInvitations>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    auth.require_cleaner()?;

    let relationship = state
        .invitation_service()
        .resend(StringUuid::from(id), auth.id())
        .await?;

    let cleaner_name = cleaner_display_name(&state, auth.id()).await;
    state
        .notification_service()
        .send_invitation_reminder(&relationship, &cleaner_name)
        .await;

    let response: RelationshipResponse = relationship.into();
    Ok(Json(SuccessResponse::new(response)))
}

/// Response for deactivating an active relationship
#[derive(Debug, Serialize)]
pub struct DeactivateResponse {
    pub success: bool,
    pub message: String,
    pub cancelled_appointments: u64,
}

/// Cancel a pending invitation or deactivate an active relationship
pub async fn remove<S: HasInvitations>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response> {
    auth.require_cleaner()?;

    let outcome = state
        .invitation_service()
        .remove(StringUuid::from(id), auth.id())
        .await?;

    let response = match outcome {
        RemoveOutcome::InvitationCancelled => {
            Json(MessageResponse::new("Invitation cancelled")).into_response()
        }
        RemoveOutcome::RelationshipDeactivated {
            cancelled_appointments,
        } => Json(DeactivateResponse {
            success: true,
            message: "Client deactivated".to_string(),
            cancelled_appointments,
        })
        .into_response(),
    };

    Ok(response)
}

/// Inviter's display name for emails and the public validate route
async fn cleaner_display_name<S: HasInvitations>(state: &S, cleaner_id: StringUuid) -> String {
    use crate::repository::UserRepository;

    match state.user_repo().find_by_id(cleaner_id).await {
        Ok(Some(cleaner)) => cleaner.display_name(),
        _ => "Your cleaner".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_invitation_input_deserialization() {
        let json = r#"{
            "email": "client@example.com",
            "name": "Jane Doe",
            "phone": "555-0100",
            "address": {"line1": "12 Elm St", "city": "Springfield"},
            "beds": 3,
            "baths": 2
        }"#;

        let input: CreateInvitationInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.email, "client@example.com");
        assert_eq!(input.beds, Some(3));
        assert_eq!(
            input.address.unwrap().line1.as_deref(),
            Some("12 Elm St")
        );
    }

    #[test]
    fn test_accept_request_minimal() {
        let json = r#"{"token": "abc", "password": "long-enough-password"}"#;
        let request: AcceptInvitationRequest = serde_json::from_str(json).unwrap();
        assert!(request.phone.is_none());
        assert!(request.address_corrections.is_none());
    }

    #[test]
    fn test_validate_response_serialization() {
        let response = ValidateTokenResponse {
            valid: true,
            is_cancelled: false,
            cleaner_name: "Maria Lopez".to_string(),
            invited_name: "Jane Doe".to_string(),
            invited_email: "client@example.com".to_string(),
            invited_address: Some("12 Elm St, Springfield".to_string()),
            invited_beds: Some(3),
            invited_baths: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"valid\":true"));
        assert!(json.contains("\"is_cancelled\":false"));
        assert!(json.contains("Maria Lopez"));
    }

    #[test]
    fn test_deactivate_response_serialization() {
        let response = DeactivateResponse {
            success: true,
            message: "Client deactivated".to_string(),
            cancelled_appointments: 4,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"cancelled_appointments\":4"));
    }

    #[test]
    fn test_list_query_status_filter() {
        let query: ListQuery = serde_json::from_str(r#"{"status": "active"}"#).unwrap();
        assert_eq!(query.status, Some(RelationshipStatus::Active));

        let query: ListQuery = serde_json::from_str(r#"{}"#).unwrap();
        assert!(query.status.is_none());
    }
}
