//! Test utilities for asb-audit
#![cfg(test)]

use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::gerrit::{Change, ChangeStatus};
use crate::policy::ExclusionPolicy;
use crate::presence::{Vcs, VcsRepo};

/// Create a change; an empty `topic` still produces `Some("")`
pub fn create_test_change(number: u64, project: &str, topic: &str, status: ChangeStatus) -> Change {
    Change {
        number,
        project: project.to_string(),
        change_id: format!("I{:040x}", number),
        status,
        topic: Some(topic.to_string()),
        more_changes: false,
    }
}

/// Policy with the built-in defaults
pub fn test_policy() -> ExclusionPolicy {
    ExclusionPolicy::from_config(&Config::default()).unwrap()
}

/// In-memory commit graph keyed by string ids
#[derive(Debug, Clone, Default)]
pub struct FakeRepo {
    commits: HashMap<String, (String, Vec<String>)>,
    branches: HashMap<String, String>,
    pub reads: RefCell<Vec<String>>,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit(mut self, id: &str, message: &str, parents: &[&str]) -> Self {
        let parents = parents.iter().map(|p| p.to_string()).collect();
        self.commits
            .insert(id.to_string(), (message.to_string(), parents));
        self
    }

    pub fn branch(mut self, name: &str, id: &str) -> Self {
        self.branches.insert(name.to_string(), id.to_string());
        self
    }
}

impl VcsRepo for FakeRepo {
    type Id = String;

    fn branch_head(&self, name: &str) -> Result<Option<String>> {
        Ok(self.branches.get(name).cloned())
    }

    fn message(&self, id: &String) -> Result<String> {
        self.reads.borrow_mut().push(id.clone());
        self.commits
            .get(id)
            .map(|(message, _)| message.clone())
            .ok_or_else(|| anyhow!("unknown commit {}", id))
    }

    fn parents(&self, id: &String) -> Result<Vec<String>> {
        self.commits
            .get(id)
            .map(|(_, parents)| parents.clone())
            .ok_or_else(|| anyhow!("unknown commit {}", id))
    }
}

/// Repositories by checkout path; every open is recorded
#[derive(Debug, Default)]
pub struct FakeVcs {
    repos: HashMap<PathBuf, FakeRepo>,
    pub opened: RefCell<Vec<PathBuf>>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo(mut self, path: impl Into<PathBuf>, repo: FakeRepo) -> Self {
        self.repos.insert(path.into(), repo);
        self
    }
}

impl Vcs for FakeVcs {
    type Repo = FakeRepo;

    fn open(&self, path: &Path) -> Result<Option<FakeRepo>> {
        self.opened.borrow_mut().push(path.to_path_buf());
        Ok(self.repos.get(path).cloned())
    }
}
