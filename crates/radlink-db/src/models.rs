/// Database row types — these map directly to SQLite rows.
/// Distinct from radlink-types domain models to keep the DB layer
/// independent; timestamps stay as stored TEXT here.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
    pub last_seen: String,
}

pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub doctor_id: String,
    pub physicist_id: String,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
}

/// Exactly the columns the admin edit overwrites; `completed_at` is
/// derived from `status` inside the update statement.
pub struct TaskUpdateRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub doctor_id: String,
    pub physicist_id: String,
    pub updated_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub task_id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub receiver_id: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
}

/// One row of the unread aggregation: a task with at least one unread
/// message for the receiver, plus the latest message in that thread.
pub struct UnreadTaskRow {
    pub task_id: String,
    pub task_title: String,
    pub unread_count: u32,
    pub last_sender: Option<String>,
    pub last_created_at: Option<String>,
}
