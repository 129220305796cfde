//! Shared fixtures for the core test suites: an in-memory store seeded
//! with one user per role.

use radlink_db::Database;
use radlink_types::models::{Principal, Role, Task, TaskPriority};
use radlink_types::time;
use uuid::Uuid;

pub struct TestEnv {
    pub db: Database,
    pub admin: Principal,
    pub doctor: Principal,
    pub physicist: Principal,
}

impl TestEnv {
    pub fn new() -> Self {
        let db = Database::open_in_memory().expect("in-memory db");
        let admin = seed::user(&db, "admin", Role::Admin);
        let doctor = seed::user(&db, "dr-house", Role::Doctor);
        let physicist = seed::user(&db, "ph-curie", Role::Physicist);
        TestEnv {
            db,
            admin,
            doctor,
            physicist,
        }
    }
}

pub mod seed {
    use super::*;

    pub fn user(db: &Database, username: &str, role: Role) -> Principal {
        let id = Uuid::new_v4();
        db.create_user(
            &id.to_string(),
            username,
            "not-a-real-hash",
            role.as_str(),
            &time::now_ts(),
        )
        .expect("seed user");
        Principal {
            id,
            username: username.to_string(),
            role,
        }
    }

    pub fn task(db: &Database, doctor: &Principal, physicist: &Principal) -> Task {
        crate::tasks::create_task(
            db,
            doctor,
            crate::tasks::NewTask {
                title: "Calibrate beam".into(),
                description: "Monthly output check, machine 2".into(),
                physicist_id: physicist.id,
                priority: TaskPriority::Medium,
            },
        )
        .expect("seed task")
    }
}
