//! Decide whether a change has landed in the downstream branch.
//!
//! Passthrough repos trust the review server's status. Everything else is
//! checked by walking the history of the target branch in a local checkout,
//! looking for the change's `Change-Id:` trailer.

use anyhow::Result;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::config::AuditSettings;
use crate::error::AuditError;
use crate::policy::ExclusionPolicy;

pub mod git;

pub use git::GitBackend;

/// Opens local repositories
pub trait Vcs {
    type Repo: VcsRepo;

    /// Open the repository at `path`, or `Ok(None)` if there is none
    fn open(&self, path: &Path) -> Result<Option<Self::Repo>>;
}

/// Read access to one repository's commit graph
pub trait VcsRepo {
    type Id: Clone + Eq + Hash + Debug;

    /// Head commit of the local branch called `name`
    fn branch_head(&self, name: &str) -> Result<Option<Self::Id>>;

    fn message(&self, id: &Self::Id) -> Result<String>;

    fn parents(&self, id: &Self::Id) -> Result<Vec<Self::Id>>;
}

/// Maps repo names to checkout directories
#[derive(Debug, Clone)]
pub struct RepoPathMapper {
    root: PathBuf,
    strip_marker: String,
    overrides: BTreeMap<String, PathBuf>,
}

impl RepoPathMapper {
    pub fn new(
        root: impl Into<PathBuf>,
        strip_marker: impl Into<String>,
        overrides: BTreeMap<String, PathBuf>,
    ) -> Self {
        RepoPathMapper {
            root: root.into(),
            strip_marker: strip_marker.into(),
            overrides,
        }
    }

    pub fn from_settings(settings: &AuditSettings) -> Self {
        Self::new(
            settings.checkout_root.clone(),
            settings.repo_name_prefix.clone(),
            settings.path_overrides.clone(),
        )
    }

    /// Checkout directory relative to the root, e.g.
    /// `android_frameworks_base` -> `frameworks/base`
    pub fn relative_path(&self, repo: &str) -> PathBuf {
        if let Some(path) = self.overrides.get(repo) {
            return path.clone();
        }
        let stripped = if self.strip_marker.is_empty() {
            repo.to_string()
        } else {
            repo.replace(self.strip_marker.as_str(), "")
        };
        PathBuf::from(stripped.replace('_', "/"))
    }

    pub fn local_path(&self, repo: &str) -> PathBuf {
        self.root.join(self.relative_path(repo))
    }
}

/// Answers "is this change in the target branch?" one change at a time
pub struct PresenceChecker<'a, V: Vcs> {
    policy: &'a ExclusionPolicy,
    mapper: RepoPathMapper,
    vcs: V,
    warnings: Vec<AuditError>,
}

impl<'a, V: Vcs> PresenceChecker<'a, V> {
    pub fn new(policy: &'a ExclusionPolicy, mapper: RepoPathMapper, vcs: V) -> Self {
        PresenceChecker {
            policy,
            mapper,
            vcs,
            warnings: Vec::new(),
        }
    }

    /// Missing repositories seen so far
    pub fn warnings(&self) -> &[AuditError] {
        &self.warnings
    }

    /// Whether `change_id` is reachable from the target branch of `repo`.
    ///
    /// A missing local repository yields `false` and a recorded warning. A
    /// repository without the target branch is a fatal error.
    pub fn present(&mut self, repo: &str, change_id: &str, upstream_merged: bool) -> Result<bool> {
        if self.policy.is_passthrough(repo) {
            return Ok(upstream_merged);
        }

        let path = self.mapper.local_path(repo);
        let handle = match self.vcs.open(&path).map_err(|e| vcs_error(repo, e))? {
            Some(handle) => handle,
            None => {
                warn!(
                    "Failed to find repository: {} which is needed for applying this ASB! ({:?})",
                    repo, path
                );
                self.warnings.push(AuditError::RepoNotFound {
                    repo: repo.to_string(),
                    path,
                });
                return Ok(false);
            }
        };

        let branch = self.policy.target_branch();
        let head = handle
            .branch_head(branch)
            .map_err(|e| vcs_error(repo, e))?
            .ok_or_else(|| AuditError::BranchNotFound {
                repo: repo.to_string(),
                branch: branch.to_string(),
            })?;

        let found = find_trailer(&handle, head, change_id).map_err(|e| vcs_error(repo, e))?;
        debug!(
            "{} {} in {}",
            change_id,
            if found { "found" } else { "not found" },
            repo
        );
        Ok(found)
    }
}

/// Walk everything reachable from `head`, head included, looking for the
/// `Change-Id` trailer. Shared history behind merges is visited once.
fn find_trailer<R: VcsRepo>(repo: &R, head: R::Id, change_id: &str) -> Result<bool> {
    let needle = format!("Change-Id: {}", change_id);
    let mut pending = vec![head];
    let mut visited = HashSet::new();

    while let Some(id) = pending.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }
        if repo.message(&id)?.contains(&needle) {
            return Ok(true);
        }
        for parent in repo.parents(&id)? {
            if !visited.contains(&parent) {
                pending.push(parent);
            }
        }
    }

    Ok(false)
}

fn vcs_error(repo: &str, error: anyhow::Error) -> anyhow::Error {
    anyhow::Error::new(AuditError::Vcs {
        repo: repo.to_string(),
        message: format!("{:#}", error),
    })
}
