// SPDX-FileCopyrightText: 2026 Hackportal Authors
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use juniper::graphql_object;

use crate::db::models::ApplicationStatus;

use super::Context;

pub struct Query;

#[graphql_object]
#[graphql(context = Context)]
impl Query {
    fn is_authenticated(context: &Context) -> bool {
        context.is_authenticated()
    }

    async fn me(context: &Context) -> juniper::FieldResult<Option<crate::db::models::User>> {
        crate::graphql::handlers::users::get_current_user(context).await
    }

    async fn has_applied(context: &Context) -> juniper::FieldResult<bool> {
        crate::graphql::handlers::applications::has_applied(context).await
    }

    async fn my_application(
        context: &Context,
    ) -> juniper::FieldResult<Option<crate::db::models::Application>> {
        crate::graphql::handlers::applications::my_application(context).await
    }

    async fn application(
        context: &Context,
        application_id: String,
    ) -> juniper::FieldResult<Option<crate::db::models::Application>> {
        let application_id = uuid::Uuid::parse_str(&application_id)?;
        crate::graphql::handlers::applications::get_application(application_id, context).await
    }

    async fn applications(
        context: &Context,
        status: Option<ApplicationStatus>,
        search: Option<String>,
    ) -> juniper::FieldResult<Vec<crate::db::models::Application>> {
        crate::graphql::handlers::review::list_applications(context, status, search).await
    }

    async fn application_stats(
        context: &Context,
    ) -> juniper::FieldResult<crate::graphql::handlers::review::ApplicationStats> {
        crate::graphql::handlers::review::application_stats(context).await
    }

    async fn top_colleges(
        context: &Context,
        limit: Option<i32>,
    ) -> juniper::FieldResult<Vec<crate::graphql::handlers::review::CollegeCount>> {
        crate::graphql::handlers::review::get_top_colleges(context, limit.unwrap_or(10)).await
    }

    async fn export_applications(
        context: &Context,
        status: Option<ApplicationStatus>,
        search: Option<String>,
    ) -> juniper::FieldResult<Vec<crate::graphql::handlers::review::ExportRow>> {
        crate::graphql::handlers::review::export_applications(context, status, search).await
    }
}
