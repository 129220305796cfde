use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            last_seen   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id              TEXT PRIMARY KEY,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'pending',
            priority        TEXT NOT NULL DEFAULT 'medium',
            doctor_id       TEXT NOT NULL REFERENCES users(id),
            physicist_id    TEXT NOT NULL REFERENCES users(id),
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL,
            completed_at    TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_doctor
            ON tasks(doctor_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_tasks_physicist
            ON tasks(physicist_id, created_at);

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            task_id         TEXT NOT NULL REFERENCES tasks(id),
            sender_id       TEXT NOT NULL REFERENCES users(id),
            receiver_id     TEXT NOT NULL REFERENCES users(id),
            content         TEXT NOT NULL,
            is_read         INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_task
            ON messages(task_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_messages_unread
            ON messages(receiver_id, is_read);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
