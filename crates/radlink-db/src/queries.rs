use crate::models::{MessageRow, TaskRow, TaskUpdateRow, UnreadTaskRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        role: &str,
        now: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, role, created_at, last_seen)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![id, username, password_hash, role, now],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.prepare(
                "SELECT id, username, password, role, created_at, last_seen
                 FROM users WHERE username = ?1",
            )?
            .query_row([username], user_from_row)
            .optional()
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.prepare(
                "SELECT id, username, password, role, created_at, last_seen
                 FROM users WHERE id = ?1",
            )?
            .query_row([id], user_from_row)
            .optional()
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password, role, created_at, last_seen
                 FROM users ORDER BY username",
            )?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_password(&self, id: &str, password_hash: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE users SET password = ?1 WHERE id = ?2",
                rusqlite::params![password_hash, id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn update_username(&self, id: &str, username: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE users SET username = ?1 WHERE id = ?2",
                rusqlite::params![username, id],
            )?;
            Ok(n > 0)
        })
    }

    /// Identity-context write: stamp activity time on an authenticated request.
    pub fn touch_last_seen(&self, id: &str, now: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE users SET last_seen = ?1 WHERE id = ?2",
                rusqlite::params![now, id],
            )?;
            Ok(())
        })
    }

    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    pub fn count_admins(&self) -> Result<u32> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE role = 'admin'",
                [],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    pub fn count_users(&self) -> Result<u32> {
        self.with_conn(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            Ok(n)
        })
    }

    pub fn count_users_active_since(&self, since: &str) -> Result<u32> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE last_seen >= ?1",
                [since],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    // -- Tasks --

    pub fn insert_task(&self, task: &TaskRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO tasks (id, title, description, status, priority,
                                    doctor_id, physicist_id, created_at, updated_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    task.id,
                    task.title,
                    task.description,
                    task.status,
                    task.priority,
                    task.doctor_id,
                    task.physicist_id,
                    task.created_at,
                    task.updated_at,
                    task.completed_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_task(&self, id: &str) -> Result<Option<TaskRow>> {
        self.with_conn(|conn| {
            conn.prepare(&format!("{TASK_SELECT} WHERE id = ?1"))?
                .query_row([id], task_from_row)
                .optional()
        })
    }

    pub fn list_tasks_all(&self) -> Result<Vec<TaskRow>> {
        self.with_conn(|conn| query_tasks(conn, &format!("{TASK_SELECT} {TASK_ORDER}"), &[]))
    }

    pub fn list_tasks_by_doctor(&self, doctor_id: &str) -> Result<Vec<TaskRow>> {
        self.with_conn(|conn| {
            query_tasks(
                conn,
                &format!("{TASK_SELECT} WHERE doctor_id = ?1 {TASK_ORDER}"),
                &[doctor_id],
            )
        })
    }

    pub fn list_tasks_by_physicist(&self, physicist_id: &str) -> Result<Vec<TaskRow>> {
        self.with_conn(|conn| {
            query_tasks(
                conn,
                &format!("{TASK_SELECT} WHERE physicist_id = ?1 {TASK_ORDER}"),
                &[physicist_id],
            )
        })
    }

    /// Write a new status with the uniform `completed_at` derivation:
    /// entering `completed` sets it (keeping an earlier value), any other
    /// status clears it. Returns the number of affected rows.
    pub fn set_task_status(&self, id: &str, status: &str, now: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(COMPLETED_AT_UPDATE, rusqlite::params![status, now, id])?;
            Ok(n)
        })
    }

    pub fn admin_update_task(&self, task: &TaskUpdateRow) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE tasks SET title = ?1, description = ?2, priority = ?3,
                        doctor_id = ?4, physicist_id = ?5, status = ?6, updated_at = ?7,
                        completed_at = CASE WHEN ?6 = 'completed'
                                            THEN COALESCE(completed_at, ?7)
                                            ELSE NULL END
                 WHERE id = ?8",
                rusqlite::params![
                    task.title,
                    task.description,
                    task.priority,
                    task.doctor_id,
                    task.physicist_id,
                    task.status,
                    task.updated_at,
                    task.id,
                ],
            )?;
            Ok(n)
        })
    }

    /// Apply one status to a set of tasks in a single transaction.
    pub fn bulk_update_status(&self, ids: &[String], status: &str, now: &str) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut updated = 0;
            for id in ids {
                updated += tx.execute(COMPLETED_AT_UPDATE, rusqlite::params![status, now, id])?;
            }
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Reassign a set of tasks to a physicist in a single transaction.
    /// Existing messages keep their historical sender/receiver.
    pub fn bulk_reassign_physicist(
        &self,
        ids: &[String],
        physicist_id: &str,
        now: &str,
    ) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut updated = 0;
            for id in ids {
                updated += tx.execute(
                    "UPDATE tasks SET physicist_id = ?1, updated_at = ?2 WHERE id = ?3",
                    rusqlite::params![physicist_id, now, id],
                )?;
            }
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Delete a task and its whole thread as one unit.
    pub fn delete_task_cascade(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM messages WHERE task_id = ?1", [id])?;
            let n = tx.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(n > 0)
        })
    }

    pub fn count_tasks(&self) -> Result<u32> {
        self.with_conn(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
            Ok(n)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, msg: &MessageRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO messages (id, task_id, sender_id, receiver_id, content, is_read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    msg.id,
                    msg.task_id,
                    msg.sender_id,
                    msg.receiver_id,
                    msg.content,
                    msg.is_read,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_messages(&self, task_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            // JOIN users to fetch sender_username in a single query (eliminates N+1)
            let mut stmt = conn.prepare(
                "SELECT m.id, m.task_id, m.sender_id, u.username, m.receiver_id,
                        m.content, m.is_read, m.created_at
                 FROM messages m
                 LEFT JOIN users u ON m.sender_id = u.id
                 WHERE m.task_id = ?1
                 ORDER BY m.created_at ASC, m.rowid ASC",
            )?;
            let rows = stmt
                .query_map([task_id], |row| {
                    Ok(MessageRow {
                        id: row.get(0)?,
                        task_id: row.get(1)?,
                        sender_id: row.get(2)?,
                        sender_username: row
                            .get::<_, Option<String>>(3)?
                            .unwrap_or_else(|| "unknown".to_string()),
                        receiver_id: row.get(4)?,
                        content: row.get(5)?,
                        is_read: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Flip the viewer's unread messages in one thread to read.
    /// Monotonic: only 0 -> 1, re-running is a no-op. Returns rows flipped.
    pub fn mark_thread_read(&self, task_id: &str, receiver_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE messages SET is_read = 1
                 WHERE task_id = ?1 AND receiver_id = ?2 AND is_read = 0",
                rusqlite::params![task_id, receiver_id],
            )?;
            Ok(n)
        })
    }

    /// Tasks holding at least one unread message for the receiver, with
    /// the per-task unread count and the latest message of each thread.
    pub fn unread_tasks(&self, receiver_id: &str) -> Result<Vec<UnreadTaskRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.title,
                        (SELECT COUNT(*) FROM messages m2
                          WHERE m2.task_id = t.id AND m2.receiver_id = ?1 AND m2.is_read = 0),
                        (SELECT u.username FROM messages m3
                          LEFT JOIN users u ON u.id = m3.sender_id
                          WHERE m3.task_id = t.id
                          ORDER BY m3.created_at DESC, m3.rowid DESC LIMIT 1),
                        (SELECT m4.created_at FROM messages m4
                          WHERE m4.task_id = t.id
                          ORDER BY m4.created_at DESC, m4.rowid DESC LIMIT 1)
                 FROM tasks t
                 WHERE EXISTS (SELECT 1 FROM messages m
                               WHERE m.task_id = t.id AND m.receiver_id = ?1 AND m.is_read = 0)
                 ORDER BY t.created_at DESC, t.rowid DESC",
            )?;
            let rows = stmt
                .query_map([receiver_id], |row| {
                    Ok(UnreadTaskRow {
                        task_id: row.get(0)?,
                        task_title: row.get(1)?,
                        unread_count: row.get(2)?,
                        last_sender: row.get(3)?,
                        last_created_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_messages(&self) -> Result<u32> {
        self.with_conn(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
            Ok(n)
        })
    }

    /// Distinct tasks that have at least one message.
    pub fn count_active_chats(&self) -> Result<u32> {
        self.with_conn(|conn| {
            let n = conn.query_row(
                "SELECT COUNT(DISTINCT task_id) FROM messages",
                [],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}

const TASK_SELECT: &str = "SELECT id, title, description, status, priority,
        doctor_id, physicist_id, created_at, updated_at, completed_at FROM tasks";
const TASK_ORDER: &str = "ORDER BY created_at DESC, rowid DESC";

const COMPLETED_AT_UPDATE: &str = "UPDATE tasks SET status = ?1, updated_at = ?2,
        completed_at = CASE WHEN ?1 = 'completed'
                            THEN COALESCE(completed_at, ?2)
                            ELSE NULL END
 WHERE id = ?3";

fn user_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<UserRow, rusqlite::Error> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        role: row.get(3)?,
        created_at: row.get(4)?,
        last_seen: row.get(5)?,
    })
}

fn task_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<TaskRow, rusqlite::Error> {
    Ok(TaskRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        priority: row.get(4)?,
        doctor_id: row.get(5)?,
        physicist_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        completed_at: row.get(9)?,
    })
}

fn query_tasks(conn: &Connection, sql: &str, params: &[&str]) -> Result<Vec<TaskRow>> {
    let mut stmt = conn.prepare(sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = params
        .iter()
        .map(|p| p as &dyn rusqlite::types::ToSql)
        .collect();
    let rows = stmt
        .query_map(params.as_slice(), task_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
