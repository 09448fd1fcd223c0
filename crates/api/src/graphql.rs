// SPDX-FileCopyrightText: 2026 Hackportal Authors
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;

use juniper::EmptySubscription;
pub use mutation::Mutation;
pub use query::Query;

use crate::{config::Config, db::models::UserRole};

pub mod auth;
mod handlers;
mod mutation;
mod query;

#[derive(Clone)]
pub struct BaseContext {
    pub db_pool: diesel_async::pooled_connection::bb8::Pool<diesel_async::AsyncPgConnection>,
    pub keypair: ed25519_dalek::SigningKey,
    pub config: Arc<Config>,
    pub http_client: reqwest::Client,
}

pub struct Context {
    base: BaseContext,
    ip: IpAddr,
    user_agent: String,
    user: Option<AuthenticatedUser>,
}

impl juniper::Context for Context {}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: uuid::Uuid,
    pub role: UserRole,
    pub name: String,
    pub email: String,
}

impl Context {
    pub fn new(
        base: BaseContext,
        ip: IpAddr,
        user_agent: String,
        user_details: Option<AuthenticatedUser>,
    ) -> Self {
        Self {
            base,
            ip,
            user_agent,
            user: user_details,
        }
    }

    async fn get_db_conn(
        &self,
    ) -> juniper::FieldResult<
        diesel_async::pooled_connection::bb8::PooledConnection<'_, diesel_async::AsyncPgConnection>,
    > {
        self.base.db_pool.get().await.map_err(|e| {
            tracing::error!("Failed to get DB connection: {e}");
            juniper::FieldError::new("Database unavailable", juniper::Value::null())
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn role(&self) -> Option<UserRole> {
        self.user.as_ref().map(|u| u.role)
    }

    /// Authorization is enforced here, at the data layer; route gating in a
    /// frontend is presentation only.
    pub fn require_admin(&self) -> juniper::FieldResult<()> {
        match self.role() {
            Some(UserRole::Admin) => Ok(()),
            _ => Err(juniper::FieldError::new(
                "Insufficient permissions",
                juniper::Value::null(),
            )),
        }
    }

    pub fn require_authentication(&self) -> juniper::FieldResult<AuthenticatedUser> {
        if let Some(user) = &self.user {
            Ok(user.clone())
        } else {
            Err(juniper::FieldError::new(
                "Authentication required",
                juniper::Value::null(),
            ))
        }
    }

    pub fn admin_emails(&self) -> &HashSet<String> {
        &self.base.config.admin_emails
    }

    pub fn google_client_id(&self) -> Option<&str> {
        self.base.config.google_client_id.as_deref()
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.base.http_client
    }

    pub fn get_ip(&self) -> &IpAddr {
        &self.ip
    }

    pub fn get_user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn get_signing_key(&self) -> &ed25519_dalek::SigningKey {
        &self.base.keypair
    }
}

pub type Schema = juniper::RootNode<Query, Mutation, EmptySubscription<Context>>;
