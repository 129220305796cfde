use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use radlink_core::chat;
use radlink_types::api::{
    ChatPartnerResponse, MessageResponse, SendMessageRequest, ThreadResponse, ThreadTaskResponse,
    UnreadSummaryResponse, UnreadTaskResponse,
};
use radlink_types::models::{ChatMessage, Principal};
use radlink_types::time;

use crate::auth::AppState;
use crate::error::ApiResult;
use crate::run_blocking;

fn message_response(msg: ChatMessage, viewer_id: Uuid) -> MessageResponse {
    MessageResponse {
        id: msg.id,
        content: msg.content,
        sender: msg.sender_username,
        sender_id: msg.sender_id,
        created_at: time::display_full(msg.created_at),
        is_own: msg.sender_id == viewer_id,
        is_read: msg.is_read,
    }
}

/// Polling endpoint: the full thread plus partner presence. Loading it
/// marks the viewer's unread messages read.
pub async fn get_messages(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    let viewer_id = principal.id;
    let thread = run_blocking(state, move |db| {
        chat::list_messages(db, &principal, task_id)
    })
    .await?;

    Ok(Json(ThreadResponse {
        messages: thread
            .messages
            .into_iter()
            .map(|m| message_response(m, viewer_id))
            .collect(),
        chat_partner: ChatPartnerResponse {
            id: thread.partner.id,
            username: thread.partner.username,
            role: thread.partner.role,
            is_online: thread.partner_online,
        },
        task: ThreadTaskResponse {
            id: thread.task.id,
            title: thread.task.title,
            status: thread.task.status,
        },
    }))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let viewer_id = principal.id;
    let msg = run_blocking(state, move |db| {
        chat::send_message(db, &principal, task_id, &req.content)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(message_response(msg, viewer_id))))
}

pub async fn unread_summary(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    let summary = run_blocking(state, move |db| chat::unread_summary(db, &principal)).await?;
    Ok(Json(UnreadSummaryResponse {
        tasks_with_unread: summary
            .tasks
            .into_iter()
            .map(|t| UnreadTaskResponse {
                task_id: t.task_id,
                task_title: t.task_title,
                unread_count: t.unread_count,
                last_sender: t.last_sender,
                last_message_time: t.last_message_at.map(time::display_clock),
            })
            .collect(),
        total_unread: summary.total_unread,
    }))
}
