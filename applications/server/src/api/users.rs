/// Users API routes
use crate::{
    error::{Result, ServerError},
    state::AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use iseng_core::{
    CreateUserRequest, IsengError, ListUserRequest, UpdateUserRequest, User, UserId, UserPage,
    WriteFailure,
};
use serde::Deserialize;

/// Body of `PUT /v1/users/:id`; the id comes from the path
#[derive(Debug, Deserialize)]
pub struct UpdateUserBody {
    pub name: String,
    #[serde(alias = "dob")]
    pub date_of_birth: NaiveDate,
}

/// POST /v1/users
pub async fn create_user(
    State(app_state): State<AppState>,
    request: std::result::Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>)> {
    let Json(request) = request?;
    let user = app_state.users.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /v1/users?name=&page=&limit=
pub async fn list_users(
    State(app_state): State<AppState>,
    query: std::result::Result<Query<ListUserRequest>, QueryRejection>,
) -> Result<Json<UserPage>> {
    let Query(query) = query?;
    let page = app_state.users.list_users(&query).await?;
    Ok(Json(page))
}

/// GET /v1/users/:id
pub async fn get_user(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<Json<User>> {
    let user = app_state.users.detail_user(&UserId::new(id)).await?;
    Ok(Json(user))
}

/// PUT /v1/users/:id
pub async fn update_user(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
    body: std::result::Result<Json<UpdateUserBody>, JsonRejection>,
) -> Result<Json<User>> {
    let Json(body) = body?;
    let user = app_state
        .users
        .update_user(UpdateUserRequest {
            id: UserId::new(id),
            name: body.name,
            date_of_birth: body.date_of_birth,
        })
        .await?;
    Ok(Json(user))
}

/// DELETE /v1/users/:id
pub async fn delete_user(
    Path(id): Path<String>,
    State(app_state): State<AppState>,
) -> Result<StatusCode> {
    let id = UserId::new(id);
    app_state
        .users
        .delete_user(&id)
        .await
        .map_err(|e| missing_row_as_not_found(e, &id))?;
    Ok(StatusCode::NO_CONTENT)
}

fn missing_row_as_not_found(err: IsengError, id: &UserId) -> ServerError {
    match err.write_failure() {
        Some(WriteFailure::NoMatchingRow) => ServerError::NotFound(format!("User not found: {}", id)),
        _ => err.into(),
    }
}
