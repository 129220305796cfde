//! User administration: account creation, password resets, profile
//! edits, deletion with the last-admin guard, and instance stats.
//!
//! Password hashing happens at the API boundary; this module only ever
//! sees the finished hash.

use chrono::Utc;
use radlink_db::Database;
use radlink_types::error::CoreError;
use radlink_types::models::{Principal, Role, UserView};
use radlink_types::time;
use tracing::warn;
use uuid::Uuid;

use crate::access;
use crate::tasks::parse_id;

#[derive(Debug)]
pub struct Stats {
    pub total_users: u32,
    pub total_tasks: u32,
    pub total_messages: u32,
    pub active_chats: u32,
    pub active_users_today: u32,
}

pub fn create_user(
    db: &Database,
    principal: &Principal,
    username: &str,
    role: Role,
    password_hash: &str,
) -> Result<UserView, CoreError> {
    if !access::can_administer(principal) {
        return Err(CoreError::ForbiddenRole);
    }
    let username = username.trim();
    if username.is_empty() {
        return Err(CoreError::validation("username must not be empty"));
    }
    if db.get_user_by_username(username)?.is_some() {
        return Err(CoreError::validation("username already taken"));
    }

    let id = Uuid::new_v4();
    let now = time::now_ts();
    db.create_user(&id.to_string(), username, password_hash, role.as_str(), &now)?;
    Ok(UserView {
        id,
        username: username.to_string(),
        role,
        created_at: time::parse_ts(&now),
        last_seen: time::parse_ts(&now),
    })
}

/// Directory listing with presence; available to every authenticated
/// principal (doctors pick physicists from it when creating tasks).
pub fn list_users(db: &Database, _principal: &Principal) -> Result<Vec<UserView>, CoreError> {
    let rows = db.list_users()?;
    Ok(rows
        .into_iter()
        .map(|row| UserView {
            id: parse_id(&row.id, "user"),
            role: row.role.parse::<Role>().unwrap_or_else(|e| {
                warn!("Corrupt role on user '{}': {}", row.id, e);
                Role::Physicist
            }),
            username: row.username,
            created_at: time::parse_ts(&row.created_at),
            last_seen: time::parse_ts(&row.last_seen),
        })
        .collect())
}

pub fn reset_password(
    db: &Database,
    principal: &Principal,
    user_id: Uuid,
    password_hash: &str,
) -> Result<(), CoreError> {
    if !access::can_administer(principal) {
        return Err(CoreError::ForbiddenRole);
    }
    if !db.update_password(&user_id.to_string(), password_hash)? {
        return Err(CoreError::NotFound("user"));
    }
    Ok(())
}

/// Self-service profile edit: rename and/or replace the credential.
pub fn update_profile(
    db: &Database,
    principal: &Principal,
    new_username: Option<&str>,
    password_hash: Option<&str>,
) -> Result<(), CoreError> {
    if let Some(username) = new_username {
        let username = username.trim();
        if username.is_empty() {
            return Err(CoreError::validation("username must not be empty"));
        }
        if let Some(existing) = db.get_user_by_username(username)? {
            if existing.id != principal.id.to_string() {
                return Err(CoreError::validation("username already taken"));
            }
        }
        db.update_username(&principal.id.to_string(), username)?;
    }
    if let Some(hash) = password_hash {
        db.update_password(&principal.id.to_string(), hash)?;
    }
    Ok(())
}

/// Admin-only deletion. Self-deletion is always rejected, and the sole
/// remaining admin can never be removed.
pub fn delete_user(db: &Database, principal: &Principal, user_id: Uuid) -> Result<(), CoreError> {
    if !access::can_administer(principal) {
        return Err(CoreError::ForbiddenRole);
    }
    if user_id == principal.id {
        return Err(CoreError::LastAdminGuard);
    }
    let target = db
        .get_user_by_id(&user_id.to_string())?
        .ok_or(CoreError::NotFound("user"))?;
    if target.role == Role::Admin.as_str() && db.count_admins()? <= 1 {
        return Err(CoreError::LastAdminGuard);
    }
    db.delete_user(&user_id.to_string())?;
    Ok(())
}

pub fn stats(db: &Database, principal: &Principal) -> Result<Stats, CoreError> {
    if !access::can_administer(principal) {
        return Err(CoreError::ForbiddenRole);
    }
    let midnight = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|ndt| ndt.and_utc())
        .unwrap_or_else(Utc::now);
    Ok(Stats {
        total_users: db.count_users()?,
        total_tasks: db.count_tasks()?,
        total_messages: db.count_messages()?,
        active_chats: db.count_active_chats()?,
        active_users_today: db.count_users_active_since(&time::to_ts(midnight))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat;
    use crate::testutil::{seed, TestEnv};

    #[test]
    fn only_admin_creates_users_and_names_are_unique() {
        let env = TestEnv::new();
        let err = create_user(&env.db, &env.doctor, "new-user", Role::Doctor, "h").unwrap_err();
        assert!(matches!(err, CoreError::ForbiddenRole));

        let user = create_user(&env.db, &env.admin, "dr-wilson", Role::Doctor, "h").unwrap();
        assert_eq!(user.role, Role::Doctor);

        let err = create_user(&env.db, &env.admin, "dr-wilson", Role::Doctor, "h").unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        let err = create_user(&env.db, &env.admin, "   ", Role::Doctor, "h").unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn last_admin_cannot_be_removed() {
        let env = TestEnv::new();

        // self-deletion rejected regardless of admin count
        let err = delete_user(&env.db, &env.admin, env.admin.id).unwrap_err();
        assert!(matches!(err, CoreError::LastAdminGuard));

        // with two admins, the other one is deletable
        let second = seed::user(&env.db, "admin-2", Role::Admin);
        delete_user(&env.db, &env.admin, second.id).unwrap();

        // a fresh admin may remove the original, then becomes the sole
        // admin and is itself protected
        let third = seed::user(&env.db, "admin-3", Role::Admin);
        delete_user(&env.db, &third, env.admin.id).unwrap();
        let err = delete_user(&env.db, &third, third.id).unwrap_err();
        assert!(matches!(err, CoreError::LastAdminGuard));

        // non-admin targets are unaffected by the guard
        delete_user(&env.db, &third, env.doctor.id).unwrap();
    }

    #[test]
    fn deleting_users_requires_admin() {
        let env = TestEnv::new();
        let err = delete_user(&env.db, &env.doctor, env.physicist.id).unwrap_err();
        assert!(matches!(err, CoreError::ForbiddenRole));
        let err = delete_user(&env.db, &env.admin, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound("user")));
    }

    #[test]
    fn password_reset_and_profile_updates() {
        let env = TestEnv::new();
        reset_password(&env.db, &env.admin, env.doctor.id, "new-hash").unwrap();
        assert_eq!(
            env.db
                .get_user_by_id(&env.doctor.id.to_string())
                .unwrap()
                .unwrap()
                .password,
            "new-hash"
        );

        let err = reset_password(&env.db, &env.doctor, env.doctor.id, "h").unwrap_err();
        assert!(matches!(err, CoreError::ForbiddenRole));
        let err = reset_password(&env.db, &env.admin, Uuid::new_v4(), "h").unwrap_err();
        assert!(matches!(err, CoreError::NotFound("user")));

        // renaming to one's own current name is a no-op, not a conflict
        update_profile(&env.db, &env.doctor, Some("dr-house"), None).unwrap();
        let err = update_profile(&env.db, &env.doctor, Some("ph-curie"), None).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        update_profile(&env.db, &env.doctor, Some("dr-gregory"), Some("h2")).unwrap();
        let row = env
            .db
            .get_user_by_id(&env.doctor.id.to_string())
            .unwrap()
            .unwrap();
        assert_eq!(row.username, "dr-gregory");
        assert_eq!(row.password, "h2");
    }

    #[test]
    fn stats_count_the_whole_instance() {
        let env = TestEnv::new();
        let task_a = seed::task(&env.db, &env.doctor, &env.physicist);
        let _task_b = seed::task(&env.db, &env.doctor, &env.physicist);
        chat::send_message(&env.db, &env.doctor, task_a.id, "one").unwrap();
        chat::send_message(&env.db, &env.physicist, task_a.id, "two").unwrap();

        let s = stats(&env.db, &env.admin).unwrap();
        assert_eq!(s.total_users, 3);
        assert_eq!(s.total_tasks, 2);
        assert_eq!(s.total_messages, 2);
        assert_eq!(s.active_chats, 1);
        assert_eq!(s.active_users_today, 3);

        let err = stats(&env.db, &env.doctor).unwrap_err();
        assert!(matches!(err, CoreError::ForbiddenRole));
    }
}
