// SPDX-FileCopyrightText: 2026 Hackportal Authors
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Identity resolution: who a principal is, and whether they are an admin.
//!
//! The admin allow-list is the single source of truth for the role. The
//! stored `users.role` column is a cache of it: recomputed on every sign-in
//! and overwritten whenever it disagrees with the fresh computation, so an
//! allow-list change between two sign-ins takes effect on the second one.

use std::collections::HashSet;

use argon2::{
    Argon2, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString},
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use juniper::{FieldResult, graphql_object};
use rand_core::OsRng;
use serde::Deserialize;

use crate::{
    db::{
        models::{NewUser, User, UserRole},
        schema::users,
    },
    graphql::{Context, handlers::sessions::SessionCredentials},
};

/// Computes the role an email resolves to right now. Exact, case-sensitive
/// membership test against the configured allow-list.
pub fn candidate_role(email: &str, admin_emails: &HashSet<String>) -> UserRole {
    if admin_emails.contains(email) {
        UserRole::Admin
    } else {
        UserRole::Student
    }
}

/// Returns the role to write back, or `None` when the stored role already
/// agrees with the freshly computed one. Agreement means no write at all, so
/// repeating the correction is a no-op.
pub fn corrected_role(stored: UserRole, resolved: UserRole) -> Option<UserRole> {
    (stored != resolved).then_some(resolved)
}

/// Drift correction: overwrites the stored role iff it disagrees with the
/// freshly computed one. At most one write per sign-in. Returns the fresh
/// role; on any persistence failure the caller must fail closed and issue no
/// session.
pub async fn reconcile_role(context: &Context, user: &User) -> FieldResult<UserRole> {
    let resolved = candidate_role(&user.email, context.admin_emails());
    if let Some(corrected) = corrected_role(user.role, resolved) {
        tracing::info!(
            user_id = %user.id,
            stored = ?user.role,
            resolved = ?corrected,
            "correcting stored role after allow-list change"
        );
        diesel::update(users::table.filter(users::id.eq(user.id)))
            .set(users::role.eq(corrected))
            .execute(&mut context.get_db_conn().await?)
            .await?;
    }
    Ok(resolved)
}

pub async fn create_user(
    name: String,
    email: String,
    password: String,
    context: &Context,
) -> FieldResult<SessionCredentials> {
    let role = candidate_role(&email, context.admin_emails());

    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    let new_user = NewUser {
        name,
        email,
        password_hash: Some(
            argon2
                .hash_password(password.as_bytes(), &salt)?
                .to_string(),
        ),
        role,
    };

    let user = match diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result::<User>(&mut context.get_db_conn().await?)
        .await
    {
        Ok(user) => user,
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return Err(juniper::FieldError::new(
                "An account with this email already exists",
                juniper::Value::null(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, ?role, "registered new account");
    let signing_key = context.get_signing_key().clone();
    crate::graphql::handlers::sessions::create_session(context, &user, role, &signing_key).await
}

pub async fn login_user(
    email: String,
    password: String,
    context: &Context,
) -> FieldResult<SessionCredentials> {
    let user = users::table
        .filter(users::email.eq(&email))
        .select(User::as_select())
        .first(&mut context.get_db_conn().await?)
        .await
        .optional()?;

    let Some(user) = user else {
        return Err(invalid_credentials());
    };
    // Accounts created through federated sign-in have no password to verify.
    let Some(password_hash) = &user.password_hash else {
        return Err(invalid_credentials());
    };

    let parsed_hash = argon2::PasswordHash::new(password_hash)?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid_credentials());
    }

    let role = reconcile_role(context, &user).await?;
    let signing_key = context.get_signing_key().clone();
    crate::graphql::handlers::sessions::create_session(context, &user, role, &signing_key).await
}

fn invalid_credentials() -> juniper::FieldError {
    juniper::FieldError::new("Invalid email or password", juniper::Value::null())
}

#[derive(Deserialize, Debug)]
struct GoogleTokenInfo {
    aud: String,
    email: String,
    // tokeninfo serializes booleans as the strings "true"/"false".
    #[serde(default, deserialize_with = "deserialize_stringly_bool")]
    email_verified: bool,
    #[serde(default)]
    name: Option<String>,
}

fn deserialize_stringly_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringlyBool {
        Bool(bool),
        String(String),
    }
    match StringlyBool::deserialize(deserializer)? {
        StringlyBool::Bool(b) => Ok(b),
        StringlyBool::String(s) => Ok(s == "true"),
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
enum GoogleTokenError {
    #[error("Google token was issued for a different application")]
    AudienceMismatch,
    #[error("Google account email is not verified")]
    UnverifiedEmail,
}

/// The email claim may only be trusted when Google reports it verified: it
/// is both the allow-list input and the account lookup key, so an
/// unverified alias must not get past this point.
fn validate_token_claims(
    info: &GoogleTokenInfo,
    expected_aud: Option<&str>,
) -> Result<(), GoogleTokenError> {
    if expected_aud.is_some_and(|aud| info.aud != aud) {
        return Err(GoogleTokenError::AudienceMismatch);
    }
    if !info.email_verified {
        return Err(GoogleTokenError::UnverifiedEmail);
    }
    Ok(())
}

async fn verify_google_token(context: &Context, id_token: &str) -> FieldResult<GoogleTokenInfo> {
    let response = context
        .http_client()
        .get("https://oauth2.googleapis.com/tokeninfo")
        .query(&[("id_token", id_token)])
        .send()
        .await?;

    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), "Google rejected an ID token");
        return Err(juniper::FieldError::new(
            "Google sign-in was rejected",
            juniper::Value::null(),
        ));
    }

    let info: GoogleTokenInfo = response.json().await?;
    validate_token_claims(&info, context.google_client_id())?;
    Ok(info)
}

/// Federated sign-in. A first-time Google user gets a user record created
/// with the freshly computed role; a returning one is only drift-corrected.
pub async fn login_with_google(id_token: String, context: &Context) -> FieldResult<SessionCredentials> {
    let info = verify_google_token(context, &id_token).await?;

    let existing = users::table
        .filter(users::email.eq(&info.email))
        .select(User::as_select())
        .first(&mut context.get_db_conn().await?)
        .await
        .optional()?;

    let (user, role) = match existing {
        Some(user) => {
            let role = reconcile_role(context, &user).await?;
            (user, role)
        }
        None => {
            let role = candidate_role(&info.email, context.admin_emails());
            let user = diesel::insert_into(users::table)
                .values(&NewUser {
                    name: info.name.unwrap_or_else(|| "User".to_string()),
                    email: info.email,
                    password_hash: None,
                    role,
                })
                .returning(User::as_returning())
                .get_result::<User>(&mut context.get_db_conn().await?)
                .await?;
            tracing::info!(user_id = %user.id, ?role, "created account from federated sign-in");
            (user, role)
        }
    };

    let signing_key = context.get_signing_key().clone();
    crate::graphql::handlers::sessions::create_session(context, &user, role, &signing_key).await
}

pub async fn get_current_user(context: &Context) -> FieldResult<Option<User>> {
    let Some(auth) = &context.user else {
        return Ok(None);
    };
    let user = users::table
        .filter(users::id.eq(auth.user_id))
        .select(User::as_select())
        .first(&mut context.get_db_conn().await?)
        .await
        .optional()?;
    Ok(user)
}

#[graphql_object]
#[graphql(context = Context)]
impl User {
    pub fn id(&self) -> String {
        self.id.to_string()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self, ctx: &Context) -> FieldResult<String> {
        if ctx
            .user
            .as_ref()
            .is_some_and(|u| u.user_id == self.id || u.role == UserRole::Admin)
        {
            Ok(self.email.clone())
        } else {
            Err(juniper::FieldError::new(
                "Permission denied to view email",
                juniper::Value::null(),
            ))
        }
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn created_at(&self) -> String {
        self.created_at.to_rfc3339()
    }
}
