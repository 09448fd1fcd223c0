// SPDX-FileCopyrightText: 2026 Hackportal Authors
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use chrono::{DateTime, Utc};
use diesel::associations::Identifiable;
use diesel::prelude::*;
use juniper::GraphQLEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::schema::*;

/// The stored role is a cache of "is this email on the admin allow-list?".
/// It is recomputed on every sign-in and overwritten when it drifts; never
/// trust it for an authorization decision without reconciling first.
#[derive(
    diesel_derive_enum::DbEnum,
    Debug,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    Ord,
    PartialOrd,
    GraphQLEnum,
)]
#[DbValueStyle = "snake_case"]
#[ExistingTypePath = "crate::db::schema::sql_types::UserRole"]
pub enum UserRole {
    Student,
    Admin,
}

/// Review status of an application. The vocabulary is closed; transitions are
/// unconstrained (any status is reachable from any other, self included).
#[derive(
    diesel_derive_enum::DbEnum, Debug, PartialEq, Eq, Clone, Copy, GraphQLEnum,
)]
#[DbValueStyle = "snake_case"]
#[ExistingTypePath = "crate::db::schema::sql_types::ApplicationStatus"]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Waitlisted,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Waitlisted => "waitlisted",
        }
    }
}

/* =========================
 * USERS
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    // Federated-only accounts have no password.
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: UserRole,
}

/* =========================
 * SESSIONS
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Associations, Debug)]
#[diesel(table_name = sessions)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Session {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: Option<ipnet::IpNet>,
    pub session_token: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = sessions)]
pub struct NewSession {
    pub user_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: Option<ipnet::IpNet>,
    pub session_token: String,
}

/* =========================
 * APPLICATIONS
 * ========================= */

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone)]
#[diesel(table_name = applications)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub college: String,
    pub degree: String,
    pub graduation_year: i32,
    pub team_name: String,
    pub team_size: i32,
    pub skills: Vec<String>,
    pub github: String,
    pub linked_in: Option<String>,
    pub why_participate: String,
    pub mlh_accepted: bool,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = applications)]
pub struct NewApplication {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub college: String,
    pub degree: String,
    pub graduation_year: i32,
    pub team_name: String,
    pub team_size: i32,
    pub skills: Vec<String>,
    pub github: String,
    pub linked_in: Option<String>,
    pub why_participate: String,
    pub mlh_accepted: bool,
    pub status: ApplicationStatus,
}
