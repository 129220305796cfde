use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use radlink_core::tasks::{self, NewTask, TaskUpdate};
use radlink_types::api::{
    AdminTaskUpdateRequest, BulkReassignRequest, BulkResponse, BulkStatusRequest,
    CreateTaskRequest, TaskResponse, UpdateStatusRequest,
};
use radlink_types::models::{Principal, Task};
use radlink_types::time;

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::run_blocking;

fn task_response(task: Task) -> TaskResponse {
    TaskResponse {
        id: task.id,
        title: task.title,
        description: task.description,
        status: task.status,
        priority: task.priority,
        doctor_id: task.doctor_id,
        physicist_id: task.physicist_id,
        created_at: time::display_full(task.created_at),
        updated_at: time::display_full(task.updated_at),
        completed_at: task.completed_at.map(time::display_full),
    }
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    let tasks = run_blocking(state, move |db| tasks::list_tasks(db, &principal)).await?;
    Ok(Json(
        tasks.into_iter().map(task_response).collect::<Vec<_>>(),
    ))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<impl IntoResponse> {
    let task = run_blocking(state, move |db| {
        tasks::create_task(
            db,
            &principal,
            NewTask {
                title: req.title,
                description: req.description,
                physicist_id: req.physicist_id,
                priority: req.priority,
            },
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(task_response(task))))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    let task = run_blocking(state, move |db| {
        tasks::update_status(db, &principal, task_id, req.status)
    })
    .await?;
    Ok(Json(task_response(task)))
}

pub async fn admin_update(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<AdminTaskUpdateRequest>,
) -> ApiResult<impl IntoResponse> {
    let task = run_blocking(state, move |db| {
        tasks::admin_update(
            db,
            &principal,
            task_id,
            TaskUpdate {
                title: req.title,
                description: req.description,
                status: req.status,
                priority: req.priority,
                doctor_id: req.doctor_id,
                physicist_id: req.physicist_id,
            },
        )
    })
    .await?;
    Ok(Json(task_response(task)))
}

pub async fn admin_delete(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    run_blocking(state, move |db| tasks::delete_task(db, &principal, task_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<BulkStatusRequest>,
) -> ApiResult<impl IntoResponse> {
    let updated = run_blocking(state, move |db| {
        tasks::bulk_update_status(db, &principal, &req.task_ids, req.status)
    })
    .await?;
    Ok(Json(BulkResponse { updated }))
}

pub async fn bulk_reassign(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<BulkReassignRequest>,
) -> ApiResult<impl IntoResponse> {
    let updated = run_blocking(state, move |db| {
        tasks::bulk_reassign_physicist(db, &principal, &req.task_ids, req.physicist_id)
    })
    .await?;
    Ok(Json(BulkResponse { updated }))
}
