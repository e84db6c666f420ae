use utoipa::OpenApi;

use crate::handlers;
use crate::models::{
    DiagnosticsResponse, ErrorResponse, HealthResponse, NotifyRequest, NotifyResponse,
    PresenceResponse, UserSummary,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::health::ready_check,
        handlers::presence::note_presence,
        handlers::notify::notify_user,
        handlers::diagnostics::diagnostics,
    ),
    components(
        schemas(
            HealthResponse,
            PresenceResponse,
            UserSummary,
            NotifyRequest,
            NotifyResponse,
            DiagnosticsResponse,
            ErrorResponse
        )
    ),
    tags(
        (name = "api", description = "Realtime collaboration API endpoints")
    )
)]
pub struct ApiDoc;
