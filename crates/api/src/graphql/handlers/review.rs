// SPDX-FileCopyrightText: 2026 Hackportal Authors
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Admin review surface: the full application collection, fetched newest
//! first, with filtering, aggregation and export projection done in memory.
//! The pure parts are plain functions over slices so they can be tested
//! without a database.

use std::collections::BTreeMap;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use juniper::{FieldResult, GraphQLObject};

use crate::{
    db::models::{Application, ApplicationStatus},
    graphql::Context,
};

#[derive(GraphQLObject, Debug, Clone, PartialEq, Eq)]
pub struct ApplicationStats {
    pub total: i32,
    pub pending: i32,
    pub accepted: i32,
    pub rejected: i32,
    pub waitlisted: i32,
}

#[derive(GraphQLObject, Debug, Clone, PartialEq, Eq)]
pub struct CollegeCount {
    pub college: String,
    pub count: i32,
}

/// One application flattened for delimited-text export. The byte-level CSV
/// encoding is the consumer's job; this is just the row projection.
#[derive(GraphQLObject, Debug, Clone)]
pub struct ExportRow {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub college: String,
    pub degree: String,
    pub graduation_year: i32,
    pub team_name: String,
    pub team_size: i32,
    pub skills: String,
    pub github: String,
    pub status: String,
    pub applied_on: String,
}

async fn fetch_all(context: &Context) -> FieldResult<Vec<Application>> {
    context.require_admin()?;
    use crate::db::schema::applications::dsl::*;
    let mut records = applications
        .select(Application::as_select())
        .load::<Application>(&mut context.get_db_conn().await?)
        .await?;
    sort_newest_first(&mut records);
    Ok(records)
}

/// Newest submission first. The sort is stable, so records sharing a
/// timestamp keep their fetch order.
pub fn sort_newest_first(records: &mut [Application]) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Status filter (exact match, `None` means all) and case-insensitive
/// substring search over full name, email and college, composed by AND.
pub fn filter_applications(
    records: Vec<Application>,
    status_filter: Option<ApplicationStatus>,
    search_term: &str,
) -> Vec<Application> {
    let needle = search_term.to_lowercase();
    records
        .into_iter()
        .filter(|app| status_filter.is_none_or(|s| app.status == s))
        .filter(|app| {
            needle.is_empty()
                || app.full_name.to_lowercase().contains(&needle)
                || app.email.to_lowercase().contains(&needle)
                || app.college.to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn aggregate(records: &[Application]) -> ApplicationStats {
    let mut stats = ApplicationStats {
        total: records.len() as i32,
        pending: 0,
        accepted: 0,
        rejected: 0,
        waitlisted: 0,
    };
    for app in records {
        match app.status {
            ApplicationStatus::Pending => stats.pending += 1,
            ApplicationStatus::Accepted => stats.accepted += 1,
            ApplicationStatus::Rejected => stats.rejected += 1,
            ApplicationStatus::Waitlisted => stats.waitlisted += 1,
        }
    }
    stats
}

/// Groups by the literal college string ("BVRIT" and "bvrit" are distinct
/// groups), counts, sorts by count descending and truncates. Ties break
/// alphabetically: the groups come out of a BTreeMap name-ascending and the
/// sort by count is stable.
pub fn top_colleges(records: &[Application], limit: usize) -> Vec<CollegeCount> {
    let mut counts: BTreeMap<&str, i32> = BTreeMap::new();
    for app in records {
        *counts.entry(app.college.as_str()).or_insert(0) += 1;
    }
    let mut ranked: Vec<CollegeCount> = counts
        .into_iter()
        .map(|(college, count)| CollegeCount {
            college: college.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

pub fn export_rows(records: &[Application]) -> Vec<ExportRow> {
    records
        .iter()
        .map(|app| ExportRow {
            name: app.full_name.clone(),
            email: app.email.clone(),
            phone: app.phone.clone(),
            college: app.college.clone(),
            degree: app.degree.clone(),
            graduation_year: app.graduation_year,
            team_name: app.team_name.clone(),
            team_size: app.team_size,
            skills: app.skills.join(", "),
            github: app.github.clone(),
            status: app.status.as_str().to_string(),
            applied_on: app.created_at.format("%Y-%m-%d").to_string(),
        })
        .collect()
}

pub async fn list_applications(
    context: &Context,
    status_filter: Option<ApplicationStatus>,
    search_term: Option<String>,
) -> FieldResult<Vec<Application>> {
    let records = fetch_all(context).await?;
    Ok(filter_applications(
        records,
        status_filter,
        search_term.as_deref().unwrap_or(""),
    ))
}

pub async fn application_stats(context: &Context) -> FieldResult<ApplicationStats> {
    let records = fetch_all(context).await?;
    Ok(aggregate(&records))
}

pub async fn get_top_colleges(context: &Context, limit: i32) -> FieldResult<Vec<CollegeCount>> {
    let records = fetch_all(context).await?;
    Ok(top_colleges(&records, usize::try_from(limit).unwrap_or(0)))
}

pub async fn export_applications(
    context: &Context,
    status_filter: Option<ApplicationStatus>,
    search_term: Option<String>,
) -> FieldResult<Vec<ExportRow>> {
    let records = list_applications(context, status_filter, search_term).await?;
    Ok(export_rows(&records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn app(
        name: &str,
        email: &str,
        college: &str,
        status: ApplicationStatus,
        age_secs: i64,
    ) -> Application {
        Application {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            full_name: name.to_string(),
            email: email.to_string(),
            phone: "+91 9000000000".to_string(),
            college: college.to_string(),
            degree: "B.Tech CSE".to_string(),
            graduation_year: 2027,
            team_name: "Null Pointers".to_string(),
            team_size: 2,
            skills: vec!["Python".to_string(), "React".to_string()],
            github: "https://github.com/example".to_string(),
            linked_in: None,
            why_participate: "To build things.".to_string(),
            mlh_accepted: true,
            status,
            created_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    fn sample_set() -> Vec<Application> {
        vec![
            app(
                "Asha Rao",
                "asha@bvrit.ac.in",
                "BVRIT",
                ApplicationStatus::Pending,
                30,
            ),
            app(
                "Ravi Kumar",
                "ravi@example.com",
                "BVRIT",
                ApplicationStatus::Accepted,
                20,
            ),
            app(
                "Meera Iyer",
                "meera@example.com",
                "IIT Hyderabad",
                ApplicationStatus::Rejected,
                10,
            ),
            app(
                "John Doe",
                "john@example.com",
                "bvrit",
                ApplicationStatus::Waitlisted,
                5,
            ),
        ]
    }

    #[test]
    fn test_sort_newest_first_orders_by_descending_created_at() {
        let mut records = vec![
            app("Oldest", "a@x.com", "BVRIT", ApplicationStatus::Pending, 300),
            app("Newest", "b@x.com", "BVRIT", ApplicationStatus::Pending, 5),
            app("Middle", "c@x.com", "BVRIT", ApplicationStatus::Pending, 60),
        ];
        sort_newest_first(&mut records);
        let names: Vec<&str> = records.iter().map(|a| a.full_name.as_str()).collect();
        assert_eq!(names, ["Newest", "Middle", "Oldest"]);
    }

    #[test]
    fn test_status_filter_exact_subset() {
        let filtered =
            filter_applications(sample_set(), Some(ApplicationStatus::Accepted), "");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].full_name, "Ravi Kumar");
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        // "bvrit" matches the BVRIT college records and the bvrit one, plus
        // Asha through her email domain.
        let filtered = filter_applications(sample_set(), None, "bvrit");
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_filters_compose_with_and() {
        let filtered =
            filter_applications(sample_set(), Some(ApplicationStatus::Accepted), "bvrit");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].full_name, "Ravi Kumar");

        let none = filter_applications(
            sample_set(),
            Some(ApplicationStatus::Accepted),
            "hyderabad",
        );
        assert!(none.is_empty());
    }

    #[test]
    fn test_search_matches_name_field() {
        let filtered = filter_applications(sample_set(), None, "meera");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].college, "IIT Hyderabad");
    }

    #[test]
    fn test_aggregate_partitions_total() {
        let records = sample_set();
        let stats = aggregate(&records);
        assert_eq!(stats.total, records.len() as i32);
        assert_eq!(
            stats.pending + stats.accepted + stats.rejected + stats.waitlisted,
            stats.total
        );
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.waitlisted, 1);
    }

    #[test]
    fn test_aggregate_empty_set() {
        let stats = aggregate(&[]);
        assert_eq!(
            stats,
            ApplicationStats {
                total: 0,
                pending: 0,
                accepted: 0,
                rejected: 0,
                waitlisted: 0,
            }
        );
    }

    #[test]
    fn test_top_colleges_counts_literal_strings() {
        let ranked = top_colleges(&sample_set(), 10);
        // "BVRIT" and "bvrit" are distinct groups.
        assert_eq!(ranked[0], CollegeCount { college: "BVRIT".to_string(), count: 2 });
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn test_top_colleges_respects_limit() {
        let ranked = top_colleges(&sample_set(), 2);
        assert_eq!(ranked.len(), 2);
        assert!(top_colleges(&sample_set(), 0).is_empty());
    }

    #[test]
    fn test_top_colleges_ties_break_alphabetically() {
        let records = vec![
            app("A", "a@x.com", "Zeta College", ApplicationStatus::Pending, 1),
            app("B", "b@x.com", "Alpha College", ApplicationStatus::Pending, 2),
            app("C", "c@x.com", "Midway College", ApplicationStatus::Pending, 3),
        ];
        let ranked = top_colleges(&records, 10);
        let names: Vec<&str> = ranked.iter().map(|c| c.college.as_str()).collect();
        assert_eq!(names, ["Alpha College", "Midway College", "Zeta College"]);
    }

    #[test]
    fn test_export_rows_projection() {
        let records = vec![app(
            "Asha Rao",
            "asha@bvrit.ac.in",
            "BVRIT",
            ApplicationStatus::Accepted,
            0,
        )];
        let rows = export_rows(&records);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.name, "Asha Rao");
        assert_eq!(row.skills, "Python, React");
        assert_eq!(row.status, "accepted");
        assert_eq!(row.applied_on, Utc::now().format("%Y-%m-%d").to_string());
    }

    #[test]
    fn test_review_scenario_two_bvrit_records() {
        let records = vec![
            app("New", "new@x.com", "BVRIT", ApplicationStatus::Accepted, 10),
            app("Old", "old@x.com", "BVRIT", ApplicationStatus::Pending, 100),
        ];
        let stats = aggregate(&records);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.waitlisted, 0);

        let ranked = top_colleges(&records, 10);
        assert_eq!(
            ranked,
            vec![CollegeCount { college: "BVRIT".to_string(), count: 2 }]
        );
    }
}
