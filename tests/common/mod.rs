use git2::{Oid, Repository, Signature};
use std::path::Path;

/// Build a linear history in a fresh repository at `path`.
///
/// Each message becomes one commit on top of the previous one. The last
/// commit becomes the head of `branch`.
pub fn init_repo_with_history(path: &Path, branch: &str, messages: &[&str]) -> Repository {
    std::fs::create_dir_all(path).expect("create repo dir");
    let repo = Repository::init(path).expect("init repo");

    let mut parent: Option<Oid> = None;
    for message in messages {
        parent = Some(commit(&repo, message, parent));
    }

    if let Some(head) = parent {
        let commit = repo.find_commit(head).expect("find head");
        repo.branch(branch, &commit, true).expect("create branch");
    }
    repo
}

/// Create a commit with an empty tree, detached from any ref
pub fn commit(repo: &Repository, message: &str, parent: Option<Oid>) -> Oid {
    let sig = Signature::now("Test", "test@example.com").expect("signature");
    let tree_id = repo.index().expect("index").write_tree().expect("write tree");
    let tree = repo.find_tree(tree_id).expect("find tree");

    let parents = parent
        .map(|id| vec![repo.find_commit(id).expect("find parent")])
        .unwrap_or_default();
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

    repo.commit(None, &sig, &sig, message, &tree, &parent_refs)
        .expect("commit")
}
