use regex::Regex;
use std::collections::HashSet;

use crate::config::Config;
use crate::error::AuditError;

/// Immutable audit configuration: what to skip, what to trust, where to look
#[derive(Debug, Clone)]
pub struct ExclusionPolicy {
    excluded_topics: HashSet<String>,
    excluded_repos: HashSet<String>,
    excluded_changes: HashSet<u64>,
    passthrough_repos: HashSet<String>,
    namespace_prefix: String,
    target_branch: String,
    bulletin_pattern: Regex,
}

impl ExclusionPolicy {
    /// Build the policy once from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, AuditError> {
        let pattern = &config.audit.topic_pattern;
        let bulletin_pattern =
            Regex::new(pattern).map_err(|e| AuditError::InvalidTopicPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;

        let exclusions = &config.exclusions;
        Ok(ExclusionPolicy {
            excluded_topics: exclusions.topics.iter().cloned().collect(),
            excluded_repos: exclusions.repos.iter().cloned().collect(),
            excluded_changes: exclusions.changes.iter().copied().collect(),
            passthrough_repos: exclusions.passthrough_repos.iter().cloned().collect(),
            namespace_prefix: config.audit.namespace_prefix.clone(),
            target_branch: config.audit.target_branch.clone(),
            bulletin_pattern,
        })
    }

    pub fn is_excluded_topic(&self, topic: &str) -> bool {
        self.excluded_topics.contains(topic)
    }

    pub fn is_excluded_repo(&self, repo: &str) -> bool {
        self.excluded_repos.contains(repo)
    }

    pub fn is_excluded_change(&self, number: u64) -> bool {
        self.excluded_changes.contains(&number)
    }

    pub fn is_passthrough(&self, repo: &str) -> bool {
        self.passthrough_repos.contains(repo)
    }

    pub fn target_branch(&self) -> &str {
        &self.target_branch
    }

    pub fn bulletin_pattern(&self) -> &Regex {
        &self.bulletin_pattern
    }

    /// Repo name of a Gerrit project, without the hosting namespace
    pub fn repo_name<'a>(&self, project: &'a str) -> &'a str {
        project
            .strip_prefix(self.namespace_prefix.as_str())
            .unwrap_or(project)
    }
}
