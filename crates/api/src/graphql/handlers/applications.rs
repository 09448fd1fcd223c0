// SPDX-FileCopyrightText: 2026 Hackportal Authors
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Application lifecycle: one record per user, created through the apply
//! flow and mutated afterwards only through admin status transitions.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use juniper::{FieldResult, GraphQLInputObject, graphql_object};
use uuid::Uuid;

use crate::{
    db::{
        models::{Application, ApplicationStatus, NewApplication, UserRole},
        schema::applications,
    },
    graphql::Context,
};

/// Skills offered by the application form. Submissions may only pick from
/// this list.
pub const SKILL_OPTIONS: &[&str] = &[
    "JavaScript",
    "Python",
    "Java",
    "C++",
    "React",
    "Node.js",
    "Machine Learning",
    "AI",
    "Blockchain",
    "Mobile Development",
    "UI/UX Design",
    "DevOps",
    "Cloud Computing",
    "Cybersecurity",
];

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("You have already submitted an application")]
    AlreadyApplied,
    #[error("The MLH Code of Conduct must be accepted")]
    MlhNotAccepted,
    #[error("Select at least one skill")]
    NoSkills,
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),
}

#[derive(GraphQLInputObject, Debug, Clone)]
pub struct ApplicationInput {
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
}

/// Form-level preconditions, checked in a fixed order so each failure mode
/// surfaces as its own message. Team size is constrained by the form itself
/// and is deliberately not range-checked here.
pub fn validate_submission(input: &ApplicationInput) -> Result<(), SubmissionError> {
    if !input.mlh_accepted {
        return Err(SubmissionError::MlhNotAccepted);
    }
    if input.skills.is_empty() {
        return Err(SubmissionError::NoSkills);
    }
    if let Some(unknown) = input
        .skills
        .iter()
        .find(|s| !SKILL_OPTIONS.contains(&s.as_str()))
    {
        return Err(SubmissionError::UnknownSkill(unknown.clone()));
    }
    Ok(())
}

pub async fn has_applied(context: &Context) -> FieldResult<bool> {
    let current_user = context.require_authentication()?;
    let count: i64 = applications::table
        .filter(applications::user_id.eq(current_user.user_id))
        .count()
        .get_result(&mut context.get_db_conn().await?)
        .await?;
    Ok(count > 0)
}

pub async fn my_application(context: &Context) -> FieldResult<Option<Application>> {
    let current_user = context.require_authentication()?;
    let application = applications::table
        .filter(applications::user_id.eq(current_user.user_id))
        .select(Application::as_select())
        .first(&mut context.get_db_conn().await?)
        .await
        .optional()?;
    Ok(application)
}

pub async fn submit_application(
    input: ApplicationInput,
    context: &Context,
) -> FieldResult<Application> {
    let current_user = context.require_authentication()?;

    if has_applied(context).await? {
        return Err(SubmissionError::AlreadyApplied.into());
    }
    validate_submission(&input)?;

    let new_application = NewApplication {
        user_id: current_user.user_id,
        full_name: input.full_name,
        email: input.email,
        phone: input.phone,
        college: input.college,
        degree: input.degree,
        graduation_year: input.graduation_year,
        team_name: input.team_name,
        team_size: input.team_size,
        skills: input.skills,
        github: input.github,
        linked_in: input.linked_in,
        why_participate: input.why_participate,
        mlh_accepted: input.mlh_accepted,
        status: ApplicationStatus::Pending,
    };

    let application = diesel::insert_into(applications::table)
        .values(&new_application)
        .returning(Application::as_returning())
        .get_result::<Application>(&mut context.get_db_conn().await?)
        .await
        .map_err(map_insert_error)?;

    tracing::info!(
        application_id = %application.id,
        user_id = %current_user.user_id,
        "application submitted"
    );
    Ok(application)
}

/// Two in-flight submissions can both pass the existence check; the unique
/// index on user_id decides the loser, which gets the same duplicate error
/// as the sequential case. Everything else passes through untouched.
fn map_insert_error(error: diesel::result::Error) -> juniper::FieldError {
    match error {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        ) => SubmissionError::AlreadyApplied.into(),
        e => e.into(),
    }
}

/// Admin-only. Overwrites the status unconditionally: every status is
/// reachable from every other, self-transitions included.
pub async fn set_application_status(
    application_id: Uuid,
    new_status: ApplicationStatus,
    context: &Context,
) -> FieldResult<Application> {
    context.require_admin()?;

    let updated = diesel::update(applications::table.filter(applications::id.eq(application_id)))
        .set(applications::status.eq(new_status))
        .returning(Application::as_returning())
        .get_result::<Application>(&mut context.get_db_conn().await?)
        .await
        .optional()?;

    match updated {
        Some(application) => {
            tracing::info!(
                application_id = %application.id,
                status = application.status.as_str(),
                "application status updated"
            );
            Ok(application)
        }
        None => Err(juniper::FieldError::new(
            "Application not found",
            juniper::Value::null(),
        )),
    }
}

pub async fn get_application(
    application_id: Uuid,
    context: &Context,
) -> FieldResult<Option<Application>> {
    context.require_admin()?;
    let application = applications::table
        .filter(applications::id.eq(application_id))
        .select(Application::as_select())
        .first(&mut context.get_db_conn().await?)
        .await
        .optional()?;
    Ok(application)
}

#[graphql_object]
#[graphql(context = Context)]
impl Application {
    pub fn id(&self) -> String {
        self.id.to_string()
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn email(&self, ctx: &Context) -> FieldResult<String> {
        self.require_owner_or_admin(ctx)?;
        Ok(self.email.clone())
    }

    pub fn phone(&self, ctx: &Context) -> FieldResult<String> {
        self.require_owner_or_admin(ctx)?;
        Ok(self.phone.clone())
    }

    pub fn college(&self) -> &str {
        &self.college
    }

    pub fn degree(&self) -> &str {
        &self.degree
    }

    pub fn graduation_year(&self) -> i32 {
        self.graduation_year
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    pub fn team_size(&self) -> i32 {
        self.team_size
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    pub fn github(&self) -> &str {
        &self.github
    }

    pub fn linked_in(&self) -> Option<&str> {
        self.linked_in.as_deref()
    }

    pub fn why_participate(&self) -> &str {
        &self.why_participate
    }

    pub fn mlh_accepted(&self) -> bool {
        self.mlh_accepted
    }

    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    pub fn created_at(&self) -> String {
        self.created_at.to_rfc3339()
    }
}

impl Application {
    fn require_owner_or_admin(&self, ctx: &Context) -> FieldResult<()> {
        if ctx
            .user
            .as_ref()
            .is_some_and(|u| u.user_id == self.user_id || u.role == UserRole::Admin)
        {
            Ok(())
        } else {
            Err(juniper::FieldError::new(
                "Permission denied to view applicant contact details",
                juniper::Value::null(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> ApplicationInput {
        ApplicationInput {
            full_name: "Asha Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone: "+91 9000000000".to_string(),
            college: "BVRIT".to_string(),
            degree: "B.Tech CSE".to_string(),
            graduation_year: 2027,
            team_name: "Null Pointers".to_string(),
            team_size: 3,
            skills: vec!["Python".to_string(), "Machine Learning".to_string()],
            github: "https://github.com/asharao".to_string(),
            linked_in: None,
            why_participate: "I want to build things.".to_string(),
            mlh_accepted: true,
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        assert_eq!(validate_submission(&valid_input()), Ok(()));
    }

    #[test]
    fn test_mlh_consent_checked_first() {
        let mut input = valid_input();
        input.mlh_accepted = false;
        input.skills.clear();
        // Both preconditions fail, consent is reported first.
        assert_eq!(
            validate_submission(&input),
            Err(SubmissionError::MlhNotAccepted)
        );
    }

    #[test]
    fn test_empty_skills_rejected() {
        let mut input = valid_input();
        input.skills.clear();
        assert_eq!(validate_submission(&input), Err(SubmissionError::NoSkills));
    }

    #[test]
    fn test_unknown_skill_rejected() {
        let mut input = valid_input();
        input.skills.push("Underwater Basket Weaving".to_string());
        assert_eq!(
            validate_submission(&input),
            Err(SubmissionError::UnknownSkill(
                "Underwater Basket Weaving".to_string()
            ))
        );
    }

    #[test]
    fn test_team_size_not_range_checked() {
        // The form constrains team size to 1-4; the server does not.
        let mut input = valid_input();
        input.team_size = 9;
        assert_eq!(validate_submission(&input), Ok(()));
    }

    #[test]
    fn test_concurrent_duplicate_maps_to_already_applied() {
        // The loser of a racing double-submit hits the unique index instead
        // of the existence check and must see the same message.
        let error = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint".to_string()),
        );
        assert_eq!(
            map_insert_error(error).message(),
            SubmissionError::AlreadyApplied.to_string()
        );
    }

    #[test]
    fn test_other_insert_errors_pass_through() {
        let error = diesel::result::Error::NotFound;
        assert_eq!(
            map_insert_error(error).message(),
            diesel::result::Error::NotFound.to_string()
        );
    }
}
