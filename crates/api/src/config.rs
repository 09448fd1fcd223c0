// SPDX-FileCopyrightText: 2026 Hackportal Authors
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Startup configuration. Everything is read from the environment exactly
//! once and carried in the GraphQL base context afterwards; no handler reads
//! an environment variable at call time.

use std::collections::HashSet;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub signing_key_file: String,
    /// Emails that resolve to the admin role. Exact, case-sensitive match.
    pub admin_emails: HashSet<String>,
    /// Expected `aud` of Google ID tokens; when unset, the audience is not
    /// checked (local development).
    pub google_client_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    MissingVar(&'static str),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?;
        let signing_key_file =
            std::env::var("SIGNING_KEY_FILE").unwrap_or_else(|_| "key.json".to_string());
        let admin_emails = parse_admin_emails(&std::env::var("ADMIN_EMAILS").unwrap_or_default());
        if admin_emails.is_empty() {
            tracing::warn!("ADMIN_EMAILS is not set; no account will resolve to the admin role");
        }
        let google_client_id = std::env::var("GOOGLE_CLIENT_ID")
            .ok()
            .filter(|v| !v.is_empty());

        Ok(Config {
            database_url,
            signing_key_file,
            admin_emails,
            google_client_id,
        })
    }
}

/// Splits the comma-separated allow-list, trimming whitespace around each
/// entry. Case is preserved; matching against it is exact.
pub fn parse_admin_emails(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_emails_trims_entries() {
        let emails = parse_admin_emails(" alice@example.com , bob@example.com,carol@example.com ");
        assert_eq!(emails.len(), 3);
        assert!(emails.contains("alice@example.com"));
        assert!(emails.contains("bob@example.com"));
        assert!(emails.contains("carol@example.com"));
    }

    #[test]
    fn test_parse_admin_emails_empty_input() {
        assert!(parse_admin_emails("").is_empty());
        assert!(parse_admin_emails(" , ,").is_empty());
    }

    #[test]
    fn test_parse_admin_emails_preserves_case() {
        let emails = parse_admin_emails("Admin@Example.com");
        assert!(emails.contains("Admin@Example.com"));
        assert!(!emails.contains("admin@example.com"));
    }
}
