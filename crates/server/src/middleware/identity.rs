use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// The caller's identity as established by the upstream auth layer. The JWT
/// guard chain in front of this service resolves the session and forwards
/// the ids; this service trusts them and re-derives resource permissions
/// itself.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub user_id: Uuid,
    pub organization_id: Uuid,
}

fn header_uuid(headers: &HeaderMap, name: &str) -> Option<Uuid> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
}

pub async fn require_identity(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let user_id = header_uuid(request.headers(), "x-user-id");
    let organization_id = header_uuid(request.headers(), "x-organization-id");

    let (Some(user_id), Some(organization_id)) = (user_id, organization_id) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(Identity {
        user_id,
        organization_id,
    });
    Ok(next.run(request).await)
}
