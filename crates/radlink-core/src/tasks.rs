//! Task lifecycle: creation by doctors, status flow by the assigned
//! physicist, unrestricted edits and bulk operations by admins.
//!
//! The status machine is deliberately permissive (any status may follow
//! any other). The one structural rule, applied on every write path, is
//! the `completed_at` derivation: entering `completed` sets it, any other
//! status clears it.

use radlink_db::models::{TaskRow, TaskUpdateRow};
use radlink_db::Database;
use radlink_types::error::CoreError;
use radlink_types::models::{Principal, Role, Task, TaskPriority, TaskStatus};
use radlink_types::time;
use tracing::warn;
use uuid::Uuid;

use crate::access::{self, TaskScope};

#[derive(Debug)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub physicist_id: Uuid,
    pub priority: TaskPriority,
}

/// Full-field overwrite used by the admin edit path.
#[derive(Debug)]
pub struct TaskUpdate {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub doctor_id: Uuid,
    pub physicist_id: Uuid,
}

pub fn create_task(db: &Database, principal: &Principal, new: NewTask) -> Result<Task, CoreError> {
    if principal.role != Role::Doctor {
        return Err(CoreError::ForbiddenRole);
    }
    if new.title.trim().is_empty() {
        return Err(CoreError::validation("title must not be empty"));
    }
    // A task's two parties are its chat participants; they must be
    // distinct users or message receivers degenerate to the sender.
    if new.physicist_id == principal.id {
        return Err(CoreError::validation(
            "doctor and physicist must be different users",
        ));
    }
    check_physicist(db, new.physicist_id)?;

    let now = time::now_ts();
    let row = TaskRow {
        id: Uuid::new_v4().to_string(),
        title: new.title,
        description: new.description,
        status: TaskStatus::Pending.as_str().to_string(),
        priority: new.priority.as_str().to_string(),
        doctor_id: principal.id.to_string(),
        physicist_id: new.physicist_id.to_string(),
        created_at: now.clone(),
        updated_at: now,
        completed_at: None,
    };
    db.insert_task(&row)?;
    Ok(task_from_row(row))
}

pub fn list_tasks(db: &Database, principal: &Principal) -> Result<Vec<Task>, CoreError> {
    let rows = match access::task_scope(principal) {
        TaskScope::All => db.list_tasks_all()?,
        TaskScope::AsDoctor(id) => db.list_tasks_by_doctor(&id.to_string())?,
        TaskScope::AsPhysicist(id) => db.list_tasks_by_physicist(&id.to_string())?,
    };
    Ok(rows.into_iter().map(task_from_row).collect())
}

pub fn get_task(db: &Database, principal: &Principal, task_id: Uuid) -> Result<Task, CoreError> {
    let task = fetch_task(db, task_id)?;
    let visible = match access::task_scope(principal) {
        TaskScope::All => true,
        TaskScope::AsDoctor(id) => task.doctor_id == id,
        TaskScope::AsPhysicist(id) => task.physicist_id == id,
    };
    if !visible {
        return Err(CoreError::ForbiddenAccess);
    }
    Ok(task)
}

pub fn update_status(
    db: &Database,
    principal: &Principal,
    task_id: Uuid,
    new_status: TaskStatus,
) -> Result<Task, CoreError> {
    let task = fetch_task(db, task_id)?;
    if !access::can_mutate_status(principal, &task) {
        return Err(CoreError::ForbiddenRole);
    }
    db.set_task_status(&task_id.to_string(), new_status.as_str(), &time::now_ts())?;
    fetch_task(db, task_id)
}

pub fn admin_update(
    db: &Database,
    principal: &Principal,
    task_id: Uuid,
    update: TaskUpdate,
) -> Result<Task, CoreError> {
    if !access::can_administer(principal) {
        return Err(CoreError::ForbiddenRole);
    }
    fetch_task(db, task_id)?;
    if update.doctor_id == update.physicist_id {
        return Err(CoreError::validation(
            "doctor and physicist must be different users",
        ));
    }
    let doctor = db
        .get_user_by_id(&update.doctor_id.to_string())?
        .ok_or(CoreError::NotFound("user"))?;
    if doctor.role != Role::Doctor.as_str() {
        return Err(CoreError::validation("originator must be a doctor"));
    }
    check_physicist(db, update.physicist_id)?;

    db.admin_update_task(&TaskUpdateRow {
        id: task_id.to_string(),
        title: update.title,
        description: update.description,
        status: update.status.as_str().to_string(),
        priority: update.priority.as_str().to_string(),
        doctor_id: update.doctor_id.to_string(),
        physicist_id: update.physicist_id.to_string(),
        updated_at: time::now_ts(),
    })?;
    fetch_task(db, task_id)
}

pub fn bulk_update_status(
    db: &Database,
    principal: &Principal,
    task_ids: &[Uuid],
    new_status: TaskStatus,
) -> Result<usize, CoreError> {
    if !access::can_administer(principal) {
        return Err(CoreError::ForbiddenRole);
    }
    let ids: Vec<String> = task_ids.iter().map(Uuid::to_string).collect();
    Ok(db.bulk_update_status(&ids, new_status.as_str(), &time::now_ts())?)
}

pub fn bulk_reassign_physicist(
    db: &Database,
    principal: &Principal,
    task_ids: &[Uuid],
    physicist_id: Uuid,
) -> Result<usize, CoreError> {
    if !access::can_administer(principal) {
        return Err(CoreError::ForbiddenRole);
    }
    check_physicist(db, physicist_id)?;
    // single aggregate rejection keeps the bulk unit all-or-nothing
    for id in task_ids {
        if let Some(row) = db.get_task(&id.to_string())? {
            if row.doctor_id == physicist_id.to_string() {
                return Err(CoreError::validation(
                    "doctor and physicist must be different users",
                ));
            }
        }
    }
    let ids: Vec<String> = task_ids.iter().map(Uuid::to_string).collect();
    Ok(db.bulk_reassign_physicist(&ids, &physicist_id.to_string(), &time::now_ts())?)
}

/// The assignee referenced by a task must exist and hold the physicist
/// role.
fn check_physicist(db: &Database, physicist_id: Uuid) -> Result<(), CoreError> {
    let assignee = db
        .get_user_by_id(&physicist_id.to_string())?
        .ok_or(CoreError::NotFound("user"))?;
    if assignee.role != Role::Physicist.as_str() {
        return Err(CoreError::validation("assignee must be a physicist"));
    }
    Ok(())
}

pub fn delete_task(db: &Database, principal: &Principal, task_id: Uuid) -> Result<(), CoreError> {
    if !access::can_administer(principal) {
        return Err(CoreError::ForbiddenRole);
    }
    if !db.delete_task_cascade(&task_id.to_string())? {
        return Err(CoreError::NotFound("task"));
    }
    Ok(())
}

pub(crate) fn fetch_task(db: &Database, task_id: Uuid) -> Result<Task, CoreError> {
    let row = db
        .get_task(&task_id.to_string())?
        .ok_or(CoreError::NotFound("task"))?;
    Ok(task_from_row(row))
}

pub(crate) fn parse_id(raw: &str, context: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}' ({}): {}", raw, context, e);
        Uuid::default()
    })
}

pub(crate) fn task_from_row(row: TaskRow) -> Task {
    Task {
        id: parse_id(&row.id, "task"),
        status: row.status.parse().unwrap_or_else(|e| {
            warn!("Corrupt status on task '{}': {}", row.id, e);
            TaskStatus::Pending
        }),
        priority: row.priority.parse().unwrap_or_else(|e| {
            warn!("Corrupt priority on task '{}': {}", row.id, e);
            TaskPriority::Medium
        }),
        doctor_id: parse_id(&row.doctor_id, "task doctor"),
        physicist_id: parse_id(&row.physicist_id, "task physicist"),
        created_at: time::parse_ts(&row.created_at),
        updated_at: time::parse_ts(&row.updated_at),
        completed_at: row.completed_at.as_deref().map(time::parse_ts),
        title: row.title,
        description: row.description,
    }
}
