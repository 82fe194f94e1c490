//! Role HTTP Routes
//!
//! The registry operations as a request/response API. Callers are trusted:
//! there is no authentication on this surface.
//!
//! Status mapping:
//! - 404: role not found
//! - 400: invalid group, role or member, or an empty member list
//! - 503: the snapshot could not be saved; nothing changed

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::model::{GroupId, Member, ModelError, RoleName};
use crate::observability::{Event, Logger};
use crate::registry::{DeleteOutcome, RegistryError, RemoveOutcome, RoleRegistry};

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct MembersRequest {
    pub members: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleView {
    pub role: RoleName,
    pub members: Vec<Member>,
}

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub group: GroupId,
    pub roles: Vec<RoleView>,
}

#[derive(Debug, Serialize)]
pub struct MembersResponse {
    pub group: GroupId,
    pub role: RoleName,
    pub members: Vec<Member>,
}

#[derive(Debug, Serialize)]
pub struct AddedResponse {
    pub added: Vec<Member>,
}

#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub removed: Vec<Member>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

// ==================
// Role Routes
// ==================

pub fn role_routes(registry: RoleRegistry) -> Router {
    Router::new()
        .route("/groups/:group/roles", get(list_roles_handler))
        .route(
            "/groups/:group/roles/:role",
            get(members_handler).delete(delete_role_handler),
        )
        .route(
            "/groups/:group/roles/:role/members",
            post(add_members_handler).delete(remove_members_handler),
        )
        .with_state(registry)
}

// ==================
// Helper Functions
// ==================

fn bad_request(err: ModelError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code(),
        }),
    )
}

fn role_not_found(role: &RoleName) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("role '{}' not found", role),
            code: "ROLECALL_ROLE_NOT_FOUND",
        }),
    )
}

fn registry_failure(err: RegistryError) -> ApiError {
    let status = match &err {
        e if e.is_invalid_input() => StatusCode::BAD_REQUEST,
        RegistryError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let detail = err.to_string();
    Logger::warn(
        Event::RequestRejected,
        &[
            ("code", err.code()),
            ("error", detail.as_str()),
            ("status", status.as_str()),
        ],
    );
    (
        status,
        Json(ErrorResponse {
            error: detail,
            code: err.code(),
        }),
    )
}

fn parse_group(group: &str) -> ApiResult<GroupId> {
    GroupId::parse(group).map_err(bad_request)
}

fn parse_target(group: &str, role: &str) -> ApiResult<(GroupId, RoleName)> {
    Ok((parse_group(group)?, RoleName::parse(role).map_err(bad_request)?))
}

fn parse_members(raw: &[String]) -> ApiResult<Vec<Member>> {
    raw.iter()
        .map(|m| Member::parse(m).map_err(bad_request))
        .collect()
}

// ==================
// Handlers
// ==================

async fn list_roles_handler(
    State(registry): State<RoleRegistry>,
    Path(group): Path<String>,
) -> ApiResult<Json<RolesResponse>> {
    let group = parse_group(&group)?;
    let roles = registry
        .list_roles(&group)
        .await
        .into_iter()
        .map(|(role, members)| RoleView { role, members })
        .collect();
    Ok(Json(RolesResponse { group, roles }))
}

async fn members_handler(
    State(registry): State<RoleRegistry>,
    Path((group, role)): Path<(String, String)>,
) -> ApiResult<Json<MembersResponse>> {
    let (group, role) = parse_target(&group, &role)?;
    match registry.members_of(&group, &role).await {
        Some(members) => Ok(Json(MembersResponse {
            group,
            role,
            members,
        })),
        None => Err(role_not_found(&role)),
    }
}

async fn add_members_handler(
    State(registry): State<RoleRegistry>,
    Path((group, role)): Path<(String, String)>,
    Json(request): Json<MembersRequest>,
) -> ApiResult<Json<AddedResponse>> {
    let (group, role) = parse_target(&group, &role)?;
    let members = parse_members(&request.members)?;
    let added = registry
        .add_members(&group, &role, members)
        .await
        .map_err(registry_failure)?;
    Ok(Json(AddedResponse { added }))
}

async fn remove_members_handler(
    State(registry): State<RoleRegistry>,
    Path((group, role)): Path<(String, String)>,
    Json(request): Json<MembersRequest>,
) -> ApiResult<Json<RemovedResponse>> {
    let (group, role) = parse_target(&group, &role)?;
    let members = parse_members(&request.members)?;
    match registry
        .remove_members(&group, &role, members)
        .await
        .map_err(registry_failure)?
    {
        RemoveOutcome::Removed(removed) => Ok(Json(RemovedResponse { removed })),
        RemoveOutcome::RoleNotFound => Err(role_not_found(&role)),
    }
}

async fn delete_role_handler(
    State(registry): State<RoleRegistry>,
    Path((group, role)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let (group, role) = parse_target(&group, &role)?;
    match registry
        .delete_role(&group, &role)
        .await
        .map_err(registry_failure)?
    {
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        DeleteOutcome::RoleNotFound => Err(role_not_found(&role)),
    }
}
