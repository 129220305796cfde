//! Paired chat threads: one conversation per task between its doctor and
//! physicist, with per-receiver read tracking and cross-task unread
//! aggregation.

use chrono::{DateTime, Utc};
use radlink_db::models::MessageRow;
use radlink_db::Database;
use radlink_types::error::CoreError;
use radlink_types::models::{ChatMessage, Principal, Role, Task, UserView};
use radlink_types::time;
use tracing::warn;
use uuid::Uuid;

use crate::access;
use crate::presence;
use crate::tasks::{fetch_task, parse_id};

/// Result of loading a thread: the ordered messages, the other party
/// with live presence, the owning task, and how many messages this load
/// flipped from unread to read.
#[derive(Debug)]
pub struct Thread {
    pub messages: Vec<ChatMessage>,
    pub partner: UserView,
    pub partner_online: bool,
    pub task: Task,
    pub newly_read: usize,
}

#[derive(Debug)]
pub struct UnreadTask {
    pub task_id: Uuid,
    pub task_title: String,
    pub unread_count: u32,
    pub last_sender: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct UnreadSummary {
    pub tasks: Vec<UnreadTask>,
    pub total_unread: u32,
}

pub fn send_message(
    db: &Database,
    principal: &Principal,
    task_id: Uuid,
    content: &str,
) -> Result<ChatMessage, CoreError> {
    let task = fetch_task(db, task_id)?;
    if !access::can_send_message(principal, &task) {
        return Err(CoreError::ForbiddenAccess);
    }
    let content = content.trim();
    if content.is_empty() {
        return Err(CoreError::EmptyContent);
    }

    // The receiver is always the task's other party.
    let receiver_id = if principal.id == task.doctor_id {
        task.physicist_id
    } else {
        task.doctor_id
    };

    let row = MessageRow {
        id: Uuid::new_v4().to_string(),
        task_id: task_id.to_string(),
        sender_id: principal.id.to_string(),
        sender_username: principal.username.clone(),
        receiver_id: receiver_id.to_string(),
        content: content.to_string(),
        is_read: false,
        created_at: time::now_ts(),
    };
    db.insert_message(&row)?;
    Ok(message_from_row(row))
}

/// Load a thread for a viewer. Side effect: the viewer's unread received
/// messages in this thread are flipped to read in one bulk update before
/// the rows are read back (monotonic, idempotent; a no-op for an admin
/// viewer, who is never a receiver).
pub fn list_messages(
    db: &Database,
    principal: &Principal,
    task_id: Uuid,
) -> Result<Thread, CoreError> {
    let task = fetch_task(db, task_id)?;
    if !access::can_access_chat(principal, &task) {
        return Err(CoreError::ForbiddenAccess);
    }

    let newly_read = db.mark_thread_read(&task_id.to_string(), &principal.id.to_string())?;

    let messages = db
        .get_messages(&task_id.to_string())?
        .into_iter()
        .map(message_from_row)
        .collect();

    // The doctor chats with the physicist and vice versa; an admin viewer
    // is shown the doctor's side.
    let partner_id = if principal.id == task.doctor_id {
        task.physicist_id
    } else {
        task.doctor_id
    };
    let partner = fetch_user_view(db, partner_id)?;
    let partner_online = presence::is_online(partner.last_seen, Utc::now());

    Ok(Thread {
        messages,
        partner,
        partner_online,
        task,
        newly_read,
    })
}

/// Unread counts for every task where the principal has at least one
/// unread received message. Membership is decided solely by receiver_id
/// on message rows, not by current task ownership.
pub fn unread_summary(db: &Database, principal: &Principal) -> Result<UnreadSummary, CoreError> {
    let rows = db.unread_tasks(&principal.id.to_string())?;
    let tasks: Vec<UnreadTask> = rows
        .into_iter()
        .map(|row| UnreadTask {
            task_id: parse_id(&row.task_id, "unread task"),
            task_title: row.task_title,
            unread_count: row.unread_count,
            last_sender: row.last_sender,
            last_message_at: row.last_created_at.as_deref().map(time::parse_ts),
        })
        .collect();
    let total_unread = tasks.iter().map(|t| t.unread_count).sum();
    Ok(UnreadSummary {
        tasks,
        total_unread,
    })
}

fn fetch_user_view(db: &Database, user_id: Uuid) -> Result<UserView, CoreError> {
    let row = db
        .get_user_by_id(&user_id.to_string())?
        .ok_or(CoreError::NotFound("user"))?;
    Ok(UserView {
        id: parse_id(&row.id, "user"),
        role: row.role.parse::<Role>().unwrap_or_else(|e| {
            warn!("Corrupt role on user '{}': {}", row.id, e);
            Role::Physicist
        }),
        username: row.username,
        created_at: time::parse_ts(&row.created_at),
        last_seen: time::parse_ts(&row.last_seen),
    })
}

fn message_from_row(row: MessageRow) -> ChatMessage {
    ChatMessage {
        id: parse_id(&row.id, "message"),
        task_id: parse_id(&row.task_id, "message task"),
        sender_id: parse_id(&row.sender_id, "message sender"),
        receiver_id: parse_id(&row.receiver_id, "message receiver"),
        sender_username: row.sender_username,
        content: row.content,
        is_read: row.is_read,
        created_at: time::parse_ts(&row.created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks;
    use crate::testutil::{seed, TestEnv};
    use radlink_types::models::TaskStatus;

    #[test]
    fn receiver_is_always_the_other_party() {
        let env = TestEnv::new();
        let task = seed::task(&env.db, &env.doctor, &env.physicist);

        let from_doctor = send_message(&env.db, &env.doctor, task.id, "please review").unwrap();
        assert_eq!(from_doctor.sender_id, env.doctor.id);
        assert_eq!(from_doctor.receiver_id, env.physicist.id);

        let from_physicist = send_message(&env.db, &env.physicist, task.id, "on it").unwrap();
        assert_eq!(from_physicist.sender_id, env.physicist.id);
        assert_eq!(from_physicist.receiver_id, env.doctor.id);

        assert_ne!(from_doctor.sender_id, from_doctor.receiver_id);
        assert_ne!(from_physicist.sender_id, from_physicist.receiver_id);
    }

    #[test]
    fn content_is_trimmed_and_must_not_be_blank() {
        let env = TestEnv::new();
        let task = seed::task(&env.db, &env.doctor, &env.physicist);

        let err = send_message(&env.db, &env.doctor, task.id, "   \n\t").unwrap_err();
        assert!(matches!(err, CoreError::EmptyContent));

        let msg = send_message(&env.db, &env.doctor, task.id, "  dose report attached  ").unwrap();
        assert_eq!(msg.content, "dose report attached");
        assert!(!msg.is_read);
    }

    #[test]
    fn admin_may_read_but_not_send() {
        let env = TestEnv::new();
        let outsider = seed::user(&env.db, "dr-outsider", Role::Doctor);
        let task = seed::task(&env.db, &env.doctor, &env.physicist);
        send_message(&env.db, &env.doctor, task.id, "hello").unwrap();

        let err = send_message(&env.db, &env.admin, task.id, "admin here").unwrap_err();
        assert!(matches!(err, CoreError::ForbiddenAccess));
        let err = send_message(&env.db, &outsider, task.id, "hi").unwrap_err();
        assert!(matches!(err, CoreError::ForbiddenAccess));
        let err = list_messages(&env.db, &outsider, task.id).unwrap_err();
        assert!(matches!(err, CoreError::ForbiddenAccess));

        // admin view is read-only and flips nothing
        let thread = list_messages(&env.db, &env.admin, task.id).unwrap();
        assert_eq!(thread.messages.len(), 1);
        assert_eq!(thread.newly_read, 0);
        assert!(!thread.messages[0].is_read);
    }

    #[test]
    fn viewing_marks_received_unread_once() {
        let env = TestEnv::new();
        let task = seed::task(&env.db, &env.doctor, &env.physicist);
        send_message(&env.db, &env.physicist, task.id, "first").unwrap();
        send_message(&env.db, &env.physicist, task.id, "second").unwrap();
        send_message(&env.db, &env.doctor, task.id, "reply").unwrap();

        // the sender's own view flips nothing of their sent messages
        let thread = list_messages(&env.db, &env.physicist, task.id).unwrap();
        assert_eq!(thread.newly_read, 1); // only the doctor's reply

        let thread = list_messages(&env.db, &env.doctor, task.id).unwrap();
        assert_eq!(thread.newly_read, 2);
        assert!(thread.messages.iter().all(|m| m.is_read));

        // idempotent: a second view flips zero rows
        let thread = list_messages(&env.db, &env.doctor, task.id).unwrap();
        assert_eq!(thread.newly_read, 0);

        let summary = unread_summary(&env.db, &env.doctor).unwrap();
        assert_eq!(summary.total_unread, 0);
        assert!(summary.tasks.is_empty());
    }

    #[test]
    fn messages_are_ordered_by_creation() {
        let env = TestEnv::new();
        let task = seed::task(&env.db, &env.doctor, &env.physicist);
        for text in ["one", "two", "three"] {
            send_message(&env.db, &env.doctor, task.id, text).unwrap();
        }

        let thread = list_messages(&env.db, &env.physicist, task.id).unwrap();
        let contents: Vec<_> = thread.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert!(thread.messages.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn unread_summary_aggregates_across_tasks() {
        let env = TestEnv::new();
        let task_a = seed::task(&env.db, &env.doctor, &env.physicist);
        let task_b = seed::task(&env.db, &env.doctor, &env.physicist);
        send_message(&env.db, &env.physicist, task_a.id, "a1").unwrap();
        send_message(&env.db, &env.physicist, task_a.id, "a2").unwrap();
        send_message(&env.db, &env.physicist, task_b.id, "b1").unwrap();

        let summary = unread_summary(&env.db, &env.doctor).unwrap();
        assert_eq!(summary.tasks.len(), 2);
        assert_eq!(summary.total_unread, 3);
        assert_eq!(
            summary.total_unread,
            summary.tasks.iter().map(|t| t.unread_count).sum::<u32>()
        );
        let a = summary.tasks.iter().find(|t| t.task_id == task_a.id).unwrap();
        assert_eq!(a.unread_count, 2);
        assert_eq!(a.last_sender.as_deref(), Some("ph-curie"));
        assert!(a.last_message_at.is_some());

        // the physicist received nothing unread
        let summary = unread_summary(&env.db, &env.physicist).unwrap();
        assert_eq!(summary.total_unread, 0);

        // reading one thread leaves the other untouched
        list_messages(&env.db, &env.doctor, task_a.id).unwrap();
        let summary = unread_summary(&env.db, &env.doctor).unwrap();
        assert_eq!(summary.total_unread, 1);
        assert_eq!(summary.tasks[0].task_id, task_b.id);
    }

    #[test]
    fn reassignment_does_not_move_unread_membership() {
        let env = TestEnv::new();
        let replacement = seed::user(&env.db, "ph-new", Role::Physicist);
        let task = seed::task(&env.db, &env.doctor, &env.physicist);
        send_message(&env.db, &env.doctor, task.id, "for the original assignee").unwrap();

        tasks::bulk_reassign_physicist(&env.db, &env.admin, &[task.id], replacement.id).unwrap();

        // unread still belongs to the prior physicist, by receiver_id
        let summary = unread_summary(&env.db, &env.physicist).unwrap();
        assert_eq!(summary.total_unread, 1);
        let summary = unread_summary(&env.db, &replacement).unwrap();
        assert_eq!(summary.total_unread, 0);
    }

    #[test]
    fn deleting_a_task_cascades_to_its_thread() {
        let env = TestEnv::new();
        let task = seed::task(&env.db, &env.doctor, &env.physicist);
        send_message(&env.db, &env.doctor, task.id, "soon to vanish").unwrap();
        send_message(&env.db, &env.physicist, task.id, "likewise").unwrap();

        tasks::delete_task(&env.db, &env.admin, task.id).unwrap();

        let err = list_messages(&env.db, &env.doctor, task.id).unwrap_err();
        assert!(matches!(err, CoreError::NotFound("task")));
        assert_eq!(env.db.count_messages().unwrap(), 0);

        let summary = unread_summary(&env.db, &env.physicist).unwrap();
        assert_eq!(summary.total_unread, 0);
    }

    /// End-to-end walk: create, message, read, complete, admin re-open.
    #[test]
    fn task_and_chat_lifecycle() {
        let env = TestEnv::new();
        let task = tasks::create_task(
            &env.db,
            &env.doctor,
            tasks::NewTask {
                title: "Calibrate beam".into(),
                description: "output factors, field 10x10".into(),
                physicist_id: env.physicist.id,
                priority: radlink_types::TaskPriority::High,
            },
        )
        .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.completed_at.is_none());

        let msg = send_message(&env.db, &env.physicist, task.id, "Starting now").unwrap();
        assert_eq!(msg.receiver_id, env.doctor.id);

        let summary = unread_summary(&env.db, &env.doctor).unwrap();
        assert_eq!(summary.total_unread, 1);

        // doctor polls the thread: their unread drops, physicist unaffected
        let thread = list_messages(&env.db, &env.doctor, task.id).unwrap();
        assert_eq!(thread.newly_read, 1);
        assert_eq!(thread.task.title, "Calibrate beam");
        assert_eq!(thread.partner.id, env.physicist.id);
        assert_eq!(unread_summary(&env.db, &env.doctor).unwrap().total_unread, 0);
        assert_eq!(
            unread_summary(&env.db, &env.physicist).unwrap().total_unread,
            0
        );

        let task = tasks::update_status(&env.db, &env.physicist, task.id, TaskStatus::Completed)
            .unwrap();
        assert!(task.completed_at.is_some());

        let task = tasks::admin_update(
            &env.db,
            &env.admin,
            task.id,
            tasks::TaskUpdate {
                title: task.title.clone(),
                description: task.description.clone(),
                status: TaskStatus::Pending,
                priority: task.priority,
                doctor_id: task.doctor_id,
                physicist_id: task.physicist_id,
            },
        )
        .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.completed_at.is_none());
    }
}
