//! Task lifecycle, access control, chat threads and presence.
//!
//! Every operation takes the acting [`Principal`] explicitly and a
//! [`Database`] handle; there is no ambient session state in this crate.
//!
//! [`Principal`]: radlink_types::Principal
//! [`Database`]: radlink_db::Database

pub mod access;
pub mod chat;
pub mod presence;
pub mod tasks;
pub mod users;

#[cfg(test)]
mod testutil;
