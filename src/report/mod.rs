use anyhow::{Context, Result};
use std::io::Write;
use tracing::debug;

use crate::classify::BulletinGroups;
use crate::gerrit::{Change, ChangeStatus};
use crate::policy::ExclusionPolicy;
use crate::presence::{PresenceChecker, Vcs};

/// Appended to changes still open upstream; their state may flip once merged
const NOT_MERGED_WARNING: &str = " (warning: not merged yet)";

/// Running counters of an audit
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AuditSummary {
    pub merged: usize,
    pub total: usize,
}

/// A fully rendered report
#[derive(Debug, Clone)]
pub struct Report {
    pub text: String,
    pub summary: AuditSummary,
}

/// Renders the bulletin checklist, writing each line as soon as it is known
pub struct ReportBuilder<'a, W: Write> {
    policy: &'a ExclusionPolicy,
    out: W,
    summary: AuditSummary,
}

impl<'a, W: Write> ReportBuilder<'a, W> {
    pub fn new(policy: &'a ExclusionPolicy, out: W) -> Self {
        ReportBuilder {
            policy,
            out,
            summary: AuditSummary::default(),
        }
    }

    /// Check every surfaced change and write the report, ending with the summary line
    pub fn build<V: Vcs>(
        mut self,
        groups: &BulletinGroups,
        checker: &mut PresenceChecker<'_, V>,
    ) -> Result<AuditSummary> {
        debug!("Rendering {} bulletin topics", groups.len());

        // BTreeMap iteration is sorted by topic
        for (topic, changes) in groups {
            if self.policy.is_excluded_topic(topic) {
                debug!("Skipping excluded topic {}", topic);
                continue;
            }

            writeln!(self.out, "*{}*\n", topic).context("Failed to write report")?;
            for change in changes {
                self.write_change(change, checker)?;
            }
            writeln!(self.out).context("Failed to write report")?;
        }

        writeln!(
            self.out,
            "Merged: {} - Total: {}",
            self.summary.merged, self.summary.total
        )
        .context("Failed to write report")?;
        self.out.flush().context("Failed to flush report")?;

        Ok(self.summary)
    }

    fn write_change<V: Vcs>(
        &mut self,
        change: &Change,
        checker: &mut PresenceChecker<'_, V>,
    ) -> Result<()> {
        if change.status == ChangeStatus::Abandoned {
            return Ok(());
        }

        let repo = self.policy.repo_name(&change.project);
        if self.policy.is_excluded_repo(repo) || self.policy.is_excluded_change(change.number) {
            return Ok(());
        }

        let present = checker.present(repo, &change.change_id, change.is_merged())?;
        let mark = if present { "- [x]" } else { "- [ ]" };
        let warning = if change.status == ChangeStatus::New {
            NOT_MERGED_WARNING
        } else {
            ""
        };

        self.summary.total += 1;
        if present {
            self.summary.merged += 1;
        }

        writeln!(self.out, "{} {} {}{}", mark, change.number, repo, warning)
            .context("Failed to write report")
    }
}

/// Render the whole report into memory
pub fn build_report<V: Vcs>(
    groups: &BulletinGroups,
    policy: &ExclusionPolicy,
    checker: &mut PresenceChecker<'_, V>,
) -> Result<Report> {
    let mut buffer = Vec::new();
    let summary = ReportBuilder::new(policy, &mut buffer).build(groups, checker)?;
    let text = String::from_utf8(buffer).context("Report is not valid UTF-8")?;

    Ok(Report { text, summary })
}

/// One line per bulletin topic with its change count, excluded topics marked
pub fn write_topic_list<W: Write>(
    groups: &BulletinGroups,
    policy: &ExclusionPolicy,
    mut out: W,
) -> Result<()> {
    for (topic, changes) in groups {
        let marker = if policy.is_excluded_topic(topic) {
            " (excluded)"
        } else {
            ""
        };
        writeln!(out, "{}\t{}{}", topic, changes.len(), marker)
            .context("Failed to write topic list")?;
    }
    out.flush().context("Failed to flush topic list")
}
