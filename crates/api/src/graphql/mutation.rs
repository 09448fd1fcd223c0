// SPDX-FileCopyrightText: 2026 Hackportal Authors
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::{FieldResult, graphql_object};

use crate::db::models::{Application, ApplicationStatus};
use crate::graphql::handlers::{
    self,
    applications::ApplicationInput,
    sessions::SessionCredentials,
};

use super::Context;

pub struct Mutation;

#[graphql_object]
#[graphql(
    context = Context,
)]
impl Mutation {
    async fn sign_up(
        context: &Context,
        name: String,
        email: String,
        password: String,
    ) -> FieldResult<SessionCredentials> {
        handlers::users::create_user(name, email, password, context).await
    }

    async fn login(
        context: &Context,
        email: String,
        password: String,
    ) -> FieldResult<SessionCredentials> {
        handlers::users::login_user(email, password, context).await
    }

    async fn login_with_google(
        context: &Context,
        id_token: String,
    ) -> FieldResult<SessionCredentials> {
        handlers::users::login_with_google(id_token, context).await
    }

    async fn refresh_session(
        context: &Context,
        refresh_token: String,
    ) -> FieldResult<SessionCredentials> {
        handlers::sessions::refresh_session(context, refresh_token).await
    }

    async fn end_session(context: &Context, refresh_token: String) -> FieldResult<bool> {
        handlers::sessions::end_session(context, refresh_token).await
    }

    async fn submit_application(
        context: &Context,
        input: ApplicationInput,
    ) -> FieldResult<Application> {
        handlers::applications::submit_application(input, context).await
    }

    async fn set_application_status(
        context: &Context,
        application_id: String,
        status: ApplicationStatus,
    ) -> FieldResult<Application> {
        let application_id = uuid::Uuid::parse_str(&application_id)?;
        handlers::applications::set_application_status(application_id, status, context).await
    }
}
