use regex::Regex;
use std::collections::BTreeMap;

use crate::gerrit::Change;

/// Changes of one bulletin, keyed by the literal topic string
pub type BulletinGroups = BTreeMap<String, Vec<Change>>;

/// Group changes by bulletin topic.
///
/// Only changes with a topic matching `pattern` are kept. Keys are the topic
/// text exactly as returned by the server, so naming variants of the same
/// bulletin end up in separate groups. Within a group, fetch order is kept.
pub fn classify(changes: &[Change], pattern: &Regex) -> BulletinGroups {
    let mut groups = BulletinGroups::new();

    for change in changes {
        let Some(topic) = change.topic.as_deref() else {
            continue;
        };
        if topic.is_empty() || !pattern.is_match(topic) {
            continue;
        }
        groups
            .entry(topic.to_string())
            .or_default()
            .push(change.clone());
    }

    groups
}
