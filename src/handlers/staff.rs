use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::str::FromStr;

use crate::auth::{policy, AccountResponse, AuthUser, StaffGroup};
use crate::errors::ServiceError;
use crate::handlers::common::{created_message_response, message_response, success_response};
use crate::services::staff::GroupMemberInput;
use crate::AppState;

fn parse_group(segment: &str) -> Result<StaffGroup, ServiceError> {
    StaffGroup::from_str(segment)
        .map_err(|_| ServiceError::NotFound(format!("unknown staff group '{segment}'")))
}

/// GET /groups/:group/users
pub async fn list_group_members(
    State(state): State<AppState>,
    Path(group): Path<String>,
    user: AuthUser,
) -> Result<impl IntoResponse, ServiceError> {
    let group = parse_group(&group)?;
    policy::authorize_group_list(&user, group)?;

    let members = state.services.staff.list_members(group).await?;
    let members: Vec<AccountResponse> = members.into_iter().map(AccountResponse::from).collect();
    Ok(success_response(members))
}

/// POST /groups/:group/users — grants the group role to the named user.
pub async fn add_group_member(
    State(state): State<AppState>,
    Path(group): Path<String>,
    user: AuthUser,
    Json(input): Json<GroupMemberInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let group = parse_group(&group)?;
    policy::authorize_group_mutate(&user, group)?;
    let username = input.username()?;

    state.services.staff.add_member(group, username).await?;
    Ok(created_message_response(format!(
        "user added to {group} group"
    )))
}

/// DELETE /groups/:group/users — revokes the group role.
pub async fn remove_group_member(
    State(state): State<AppState>,
    Path(group): Path<String>,
    user: AuthUser,
    Json(input): Json<GroupMemberInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let group = parse_group(&group)?;
    policy::authorize_group_mutate(&user, group)?;
    let username = input.username()?;

    state.services.staff.remove_member(group, username).await?;
    Ok(message_response(format!(
        "user removed from {group} group"
    )))
}
