use anyhow::{Context, Result};
use git2::{BranchType, ErrorCode, Oid, Repository};
use std::path::Path;

use super::{Vcs, VcsRepo};

/// Presence backend over libgit2
#[derive(Debug, Default, Clone, Copy)]
pub struct GitBackend;

impl Vcs for GitBackend {
    type Repo = GitRepo;

    /// Only a path that does not exist counts as a missing repository; a
    /// directory that is not a git repository is an error.
    fn open(&self, path: &Path) -> Result<Option<GitRepo>> {
        match Repository::open(path) {
            Ok(repo) => Ok(Some(GitRepo { repo })),
            Err(e) if e.code() == ErrorCode::NotFound && !path.exists() => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to open repository at {:?}", path)),
        }
    }
}

/// An opened git repository
pub struct GitRepo {
    repo: Repository,
}

impl VcsRepo for GitRepo {
    type Id = Oid;

    fn branch_head(&self, name: &str) -> Result<Option<Oid>> {
        let branch = match self.repo.find_branch(name, BranchType::Local) {
            Ok(branch) => branch,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to look up branch {}", name)),
        };

        let commit = branch
            .get()
            .peel_to_commit()
            .with_context(|| format!("Branch {} does not point at a commit", name))?;

        Ok(Some(commit.id()))
    }

    fn message(&self, id: &Oid) -> Result<String> {
        let commit = self
            .repo
            .find_commit(*id)
            .with_context(|| format!("Failed to read commit {}", id))?;

        Ok(String::from_utf8_lossy(commit.message_bytes()).into_owned())
    }

    fn parents(&self, id: &Oid) -> Result<Vec<Oid>> {
        let commit = self
            .repo
            .find_commit(*id)
            .with_context(|| format!("Failed to read commit {}", id))?;

        Ok(commit.parent_ids().collect())
    }
}
