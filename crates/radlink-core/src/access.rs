//! Pure authorization predicates. No side effects, no storage access;
//! absence of records is the caller's concern, never signalled here.

use radlink_types::models::{Principal, Role, Task};
use uuid::Uuid;

/// Which slice of the task list a principal may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    All,
    AsDoctor(Uuid),
    AsPhysicist(Uuid),
}

pub fn task_scope(principal: &Principal) -> TaskScope {
    match principal.role {
        Role::Admin => TaskScope::All,
        Role::Doctor => TaskScope::AsDoctor(principal.id),
        Role::Physicist => TaskScope::AsPhysicist(principal.id),
    }
}

fn is_party(principal: &Principal, task: &Task) -> bool {
    principal.id == task.doctor_id || principal.id == task.physicist_id
}

/// Parties may read their thread; admin may read any thread (view-only,
/// sending is gated separately by [`can_send_message`]).
pub fn can_access_chat(principal: &Principal, task: &Task) -> bool {
    match principal.role {
        Role::Admin => true,
        Role::Doctor | Role::Physicist => is_party(principal, task),
    }
}

/// Only the task's two parties may speak; admin is excluded.
pub fn can_send_message(principal: &Principal, task: &Task) -> bool {
    is_party(principal, task)
}

/// Only the assigned physicist moves a task through its workflow.
pub fn can_mutate_status(principal: &Principal, task: &Task) -> bool {
    principal.role == Role::Physicist && principal.id == task.physicist_id
}

pub fn can_administer(principal: &Principal) -> bool {
    principal.role == Role::Admin
}
