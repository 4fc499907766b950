//! Member registration and confirmation endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domains::member::{
    ConfirmOutcome, MemberData, MembershipError, MembershipRegistry, NewMember,
    NotificationStatus, Resend, StudentId,
};

#[derive(Debug, Deserialize)]
pub struct RegisterMemberRequest {
    pub student_id: StudentId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterMemberResponse {
    pub member: MemberData,
    pub created: bool,
    pub notification: NotificationStatus,
}

/// Query string carried by confirmation links
#[derive(Debug, Deserialize)]
pub struct ConfirmParams {
    pub id: StudentId,
    pub confirmation_token: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResponse {
    pub success: bool,
    pub message: String,
    pub status: ConfirmOutcome,
}

#[derive(Debug, Serialize)]
pub struct ResendResponse {
    pub already_confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationStatus>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for MembershipError {
    fn into_response(self) -> Response {
        let status = match &self {
            MembershipError::NotFound(_) => StatusCode::NOT_FOUND,
            MembershipError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            MembershipError::Store(e) => {
                tracing::error!(error = %e, "Member store failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let error = match &self {
            MembershipError::Store(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// POST /api/members
///
/// 201 for a new registration, 200 when the student was already registered.
pub async fn register_member_handler(
    State(registry): State<Arc<MembershipRegistry>>,
    Json(request): Json<RegisterMemberRequest>,
) -> Result<(StatusCode, Json<RegisterMemberResponse>), MembershipError> {
    let new_member = NewMember::builder()
        .student_id(request.student_id)
        .email(request.email.trim())
        .first_name(request.first_name.trim())
        .last_name(request.last_name.trim())
        .build();

    let registration = registry.register_or_fetch(new_member).await?;
    let status = if registration.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(RegisterMemberResponse {
            member: registration.member.into(),
            created: registration.created,
            notification: registration.notification,
        }),
    ))
}

/// GET /api/members/:student_id
pub async fn get_member_handler(
    State(registry): State<Arc<MembershipRegistry>>,
    Path(student_id): Path<StudentId>,
) -> Result<Json<MemberData>, MembershipError> {
    let member = registry
        .get(student_id)
        .await?
        .ok_or(MembershipError::NotFound(student_id))?;

    Ok(Json(member.into()))
}

/// POST /api/members/:student_id/resend
pub async fn resend_confirmation_handler(
    State(registry): State<Arc<MembershipRegistry>>,
    Path(student_id): Path<StudentId>,
) -> Result<Json<ResendResponse>, MembershipError> {
    let response = match registry.resend_confirmation(student_id).await? {
        Resend::AlreadyConfirmed => ResendResponse {
            already_confirmed: true,
            notification: None,
        },
        Resend::Reissued { notification } => ResendResponse {
            already_confirmed: false,
            notification: Some(notification),
        },
    };

    Ok(Json(response))
}

/// GET /confirm?id=..&confirmation_token=..
pub async fn confirm_handler(
    State(registry): State<Arc<MembershipRegistry>>,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<ConfirmResponse>, MembershipError> {
    let outcome = registry
        .confirm_by_id(params.id, &params.confirmation_token)
        .await?;

    Ok(Json(ConfirmResponse {
        success: outcome.success(),
        message: outcome.message().to_string(),
        status: outcome,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::member::RegistryConfig;
    use crate::kernel::test_dependencies::{MockEmailService, TestDependencies};
    use chrono::{TimeZone, Utc};
    use url::Url;

    fn setup() -> (TestDependencies, Arc<MembershipRegistry>) {
        let deps = TestDependencies::new(Utc.with_ymd_and_hms(2024, 9, 3, 17, 0, 0).unwrap());
        let registry = Arc::new(MembershipRegistry::new(
            deps.server_deps(),
            RegistryConfig::new(Url::parse("http://localhost:8080").unwrap()),
        ));
        (deps, registry)
    }

    fn request(student_id: StudentId) -> RegisterMemberRequest {
        RegisterMemberRequest {
            student_id,
            email: " ada@my.vcccd.edu ".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_fetch_status_codes() {
        let (deps, registry) = setup();

        let (status, Json(body)) =
            register_member_handler(State(registry.clone()), Json(request(900111111)))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.created);
        assert_eq!(body.member.email, "ada@my.vcccd.edu");
        assert_eq!(body.notification, NotificationStatus::Sent);

        let (status, Json(body)) =
            register_member_handler(State(registry.clone()), Json(request(900111111)))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(!body.created);
        assert_eq!(body.notification, NotificationStatus::Skipped);
        assert_eq!(deps.email.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_register_reports_failed_notification() {
        let (deps, _) = setup();
        let deps = deps.with_email(MockEmailService::new().failing("sendgrid 500"));
        let registry = Arc::new(MembershipRegistry::new(
            deps.server_deps(),
            RegistryConfig::new(Url::parse("http://localhost:8080").unwrap()),
        ));

        let (status, Json(body)) =
            register_member_handler(State(registry), Json(request(900333333)))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert!(matches!(body.notification, NotificationStatus::Failed { .. }));
    }

    #[tokio::test]
    async fn test_confirm_flow() {
        let (deps, registry) = setup();

        register_member_handler(State(registry.clone()), Json(request(900111111)))
            .await
            .unwrap();
        let token = deps.email.last_token().unwrap();

        let Json(body) = confirm_handler(
            State(registry.clone()),
            Query(ConfirmParams {
                id: 900111111,
                confirmation_token: "wrong".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(!body.success);
        assert_eq!(body.status, ConfirmOutcome::InvalidToken);

        let Json(body) = confirm_handler(
            State(registry.clone()),
            Query(ConfirmParams {
                id: 900111111,
                confirmation_token: token,
            }),
        )
        .await
        .unwrap();
        assert!(body.success);
        assert_eq!(body.message, "Your membership has been confirmed");

        let Json(member) = get_member_handler(State(registry), Path(900111111))
            .await
            .unwrap();
        assert!(member.is_confirmed);
    }

    #[tokio::test]
    async fn test_unknown_member_is_404() {
        let (_deps, registry) = setup();

        let err = confirm_handler(
            State(registry.clone()),
            Query(ConfirmParams {
                id: 1,
                confirmation_token: "x".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let err = get_member_handler(State(registry.clone()), Path(1))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

        let err = resend_confirmation_handler(State(registry), Path(1))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_registration_is_400() {
        let (_deps, registry) = setup();

        let mut bad = request(900111111);
        bad.first_name = "   ".to_string();
        let err = register_member_handler(State(registry), Json(bad))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_overlong_fields_are_400() {
        let (deps, registry) = setup();

        let mut long_name = request(900111111);
        long_name.first_name = "A".repeat(65);
        let err = register_member_handler(State(registry.clone()), Json(long_name))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let mut long_email = request(900111111);
        long_email.email = format!("{}@my.vcccd.edu", "a".repeat(120));
        let err = register_member_handler(State(registry), Json(long_email))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert!(deps.member_store.is_empty());
    }

    #[tokio::test]
    async fn test_reregister_ignores_invalid_details() {
        let (_deps, registry) = setup();

        register_member_handler(State(registry.clone()), Json(request(900111111)))
            .await
            .unwrap();

        let mut bad = request(900111111);
        bad.email = "x".to_string();
        bad.first_name = String::new();
        let (status, Json(body)) = register_member_handler(State(registry), Json(bad))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(!body.created);
        assert_eq!(body.member.email, "ada@my.vcccd.edu");
        assert_eq!(body.member.first_name, "Ada");
    }

    #[tokio::test]
    async fn test_resend_handler() {
        let (deps, registry) = setup();

        register_member_handler(State(registry.clone()), Json(request(900111111)))
            .await
            .unwrap();

        let Json(body) = resend_confirmation_handler(State(registry), Path(900111111))
            .await
            .unwrap();
        assert!(!body.already_confirmed);
        assert_eq!(body.notification, Some(NotificationStatus::Sent));
        assert_eq!(deps.email.sent_count(), 2);
    }

    #[test]
    fn test_store_error_is_500_without_details() {
        let err = MembershipError::Store(anyhow::anyhow!("connection refused"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
