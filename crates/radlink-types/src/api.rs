use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, TaskPriority, TaskStatus};

// -- JWT Claims --

/// JWT claims shared between token issuing (login) and the auth
/// middleware. Canonical definition lives here in radlink-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub token: String,
}

// -- Tasks --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
    pub physicist_id: Uuid,
    #[serde(default)]
    pub priority: TaskPriority,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

/// Full-field overwrite used by the admin edit form.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminTaskUpdateRequest {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub doctor_id: Uuid,
    pub physicist_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulkStatusRequest {
    pub task_ids: Vec<Uuid>,
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulkReassignRequest {
    pub task_ids: Vec<Uuid>,
    pub physicist_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub updated: usize,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub doctor_id: Uuid,
    pub physicist_id: Uuid,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

// -- Chat --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub content: String,
    pub sender: String,
    pub sender_id: Uuid,
    pub created_at: String,
    pub is_own: bool,
    pub is_read: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatPartnerResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub is_online: bool,
}

#[derive(Debug, Serialize)]
pub struct ThreadTaskResponse {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
}

/// Payload of the chat polling endpoint: the full ordered thread plus
/// the other party's identity and presence.
#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub messages: Vec<MessageResponse>,
    pub chat_partner: ChatPartnerResponse,
    pub task: ThreadTaskResponse,
}

#[derive(Debug, Serialize)]
pub struct UnreadTaskResponse {
    pub task_id: Uuid,
    pub task_title: String,
    pub unread_count: u32,
    pub last_sender: Option<String>,
    pub last_message_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UnreadSummaryResponse {
    pub tasks_with_unread: Vec<UnreadTaskResponse>,
    pub total_unread: u32,
}

// -- Users / admin --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub is_online: bool,
    pub last_seen: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_users: u32,
    pub total_tasks: u32,
    pub total_messages: u32,
    pub active_chats: u32,
    pub active_users_today: u32,
}
