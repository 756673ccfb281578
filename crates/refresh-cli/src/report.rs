use std::fmt::Write;
use std::path::Path;

use comfy_table::{Cell, Color, Table};
use console::style;
use refresh_engine::dedup::{AccountCleanup, CleanupMode, CleanupReport, Disposition};
use refresh_engine::refresh::RefreshReport;
use refresh_reconcile::SkipCounts;

fn skip_table(skipped: &SkipCounts) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["SKIPPED", "PROJECTS"]);
    let rows = [
        ("gitlab (no re-import id)", skipped.gitlab),
        ("non-SCM origin", skipped.non_scm),
        ("integration filter", skipped.filtered),
        ("no matching integration", skipped.missing_connector),
        ("unparseable name", skipped.unparseable),
        ("duplicate target", skipped.duplicate),
    ];
    for (reason, count) in rows.into_iter().filter(|(_, n)| *n > 0) {
        table.add_row(vec![Cell::new(reason).fg(Color::Yellow), Cell::new(count)]);
    }
    table
}

pub fn render_refresh_summary(report: &RefreshReport, output: &Path) -> String {
    let mut out = String::new();
    if report.skipped.total() > 0 {
        let _ = writeln!(out, "\n{}", skip_table(&report.skipped));
    }

    let _ = write!(
        out,
        "\nTotal: {} target(s) across {} org(s)",
        report.target_count(),
        report.processed_accounts
    );
    if !report.failed_accounts.is_empty() {
        let _ = write!(out, " ({} org(s) failed)", report.failed_accounts.len());
    }
    let _ = writeln!(out, "\nOutput written to: {}", output.display());
    let _ = writeln!(out, "\nTo import, run:");
    let _ = writeln!(out, "  snyk-api-import import --file={}", output.display());
    out
}

fn disposition_label(d: &Disposition) -> String {
    match d {
        Disposition::WouldDelete => "delete: ".to_string(),
        Disposition::Deleted => style("deleted:").green().to_string(),
        Disposition::Failed(_) => style("FAILED: ").red().bold().to_string(),
    }
}

fn render_account(out: &mut String, label: &str, cleanup: &AccountCleanup) {
    let _ = writeln!(out, "\nOrg: {}", style(label).cyan());

    for group in &cleanup.groups {
        let o = &group.original;
        let _ = writeln!(out, "  DUPLICATE  {}", group.key);
        let _ = writeln!(out, "    keep:    {}  origin={}  created {}", o.id, o.origin, o.created);
        for leaf in &group.duplicates {
            let p = &leaf.project;
            let _ = write!(
                out,
                "    {} {}  origin={}  created {}",
                disposition_label(&leaf.disposition),
                p.id,
                p.origin,
                p.created
            );
            if let Disposition::Failed(error) = &leaf.disposition {
                let _ = write!(out, "  error: {error}");
            }
            out.push('\n');
        }
    }

    for orphan in &cleanup.orphans {
        let t = &orphan.target;
        let status = match &orphan.disposition {
            Disposition::WouldDelete => "empty, would be deleted".to_string(),
            Disposition::Deleted => style("deleted").green().to_string(),
            Disposition::Failed(error) => format!("{}: {error}", style("failed to delete").red()),
        };
        let _ = writeln!(
            out,
            "  target {} ({}, {}): {status}",
            t.id, t.display_name, t.integration_type
        );
    }

    if let Some(error) = &cleanup.parent_scan_error {
        let _ = writeln!(out, "  {} could not check targets: {error}", style("WARNING:").yellow());
    }
}

pub fn render_cleanup(report: &CleanupReport) -> String {
    let mut out = String::new();

    for (account, cleanup) in &report.accounts {
        if !cleanup.is_clean() || cleanup.parent_scan_error.is_some() {
            render_account(&mut out, &account.label(), cleanup);
        }
    }

    let duplicates = report.total_duplicates();
    let orphans = report.orphans_removed();
    let affected = report.affected_accounts();

    out.push('\n');
    if duplicates == 0 && orphans == 0 && report.orphans_failed() == 0 {
        out.push_str("No duplicates found.");
    } else if report.mode == CleanupMode::Delete {
        let _ = write!(
            out,
            "Summary: {duplicates} duplicate project(s) across {affected} org(s). {} deleted, {} failed.",
            report.total_removed(),
            report.total_failed()
        );
        if orphans > 0 || report.orphans_failed() > 0 {
            let _ = write!(
                out,
                "\n         {orphans} empty target(s) cleaned up, {} failed.",
                report.orphans_failed()
            );
        }
    } else {
        let _ = write!(
            out,
            "Summary: {duplicates} duplicate project(s) across {affected} org(s)."
        );
        if orphans > 0 {
            let _ = write!(
                out,
                "\n         {orphans} empty duplicate target(s) would be removed."
            );
        }
        out.push_str("\nRun with --delete to remove them.");
    }
    if !report.failed_accounts.is_empty() {
        let _ = write!(
            out,
            " ({} org(s) failed to scan)",
            report.failed_accounts.len()
        );
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use refresh_core::models::account::Account;
    use refresh_core::models::api_target::ApiTarget;
    use refresh_core::models::manifest::RefreshManifest;
    use refresh_core::models::project::Project;
    use refresh_engine::dedup::{GroupResolution, LeafResolution, ParentResolution};

    fn project(id: &str, created: &str) -> Project {
        Project {
            id: id.into(),
            name: "ws/repo:pom.xml".into(),
            origin: "bitbucket-cloud".into(),
            branch: String::new(),
            target_reference: String::new(),
            created: created.into(),
            target_id: format!("t-{id}"),
        }
    }

    fn cleanup(second: Disposition) -> AccountCleanup {
        AccountCleanup {
            project_count: 3,
            groups: vec![GroupResolution {
                key: "ws/repo:pom.xml".into(),
                original: project("p1", "2024-01-01T00:00:00Z"),
                duplicates: vec![
                    LeafResolution {
                        project: project("p2", "2024-02-01T00:00:00Z"),
                        disposition: Disposition::Deleted,
                    },
                    LeafResolution {
                        project: project("p3", "2024-03-01T00:00:00Z"),
                        disposition: second,
                    },
                ],
            }],
            orphans: vec![ParentResolution {
                target: ApiTarget {
                    id: "t-p2".into(),
                    display_name: "ws/repo".into(),
                    integration_id: "int-1".into(),
                    integration_type: "bitbucket-cloud".into(),
                    created_at: "2024-02-01T00:00:00Z".into(),
                },
                disposition: Disposition::Deleted,
            }],
            parent_scan_error: None,
        }
    }

    #[test]
    fn test_delete_summary_counts_failures() {
        let report = CleanupReport {
            mode: CleanupMode::Delete,
            accounts: vec![(
                Account::from_id("org-1"),
                cleanup(Disposition::Failed("API error (500): boom".into())),
            )],
            failed_accounts: vec![("org-2".into(), "fetch projects: timeout".into())],
        };
        let text = render_cleanup(&report);
        assert!(text.contains("DUPLICATE  ws/repo:pom.xml"));
        assert!(text.contains("keep:    p1  origin=bitbucket-cloud"));
        assert!(text.contains("error: API error (500): boom"));
        assert!(text.contains("target t-p2 (ws/repo, bitbucket-cloud)"));
        assert!(text.contains(
            "Summary: 2 duplicate project(s) across 1 org(s). 1 deleted, 1 failed."
        ));
        assert!(text.contains("1 empty target(s) cleaned up, 0 failed."));
        assert!(text.trim_end().ends_with("(1 org(s) failed to scan)"));
    }

    #[test]
    fn test_dry_run_summary_suggests_delete() {
        let mut c = cleanup(Disposition::WouldDelete);
        c.groups[0].duplicates[0].disposition = Disposition::WouldDelete;
        c.orphans[0].disposition = Disposition::WouldDelete;
        let report = CleanupReport {
            mode: CleanupMode::DryRun,
            accounts: vec![(Account::from_id("org-1"), c)],
            failed_accounts: Vec::new(),
        };
        let text = render_cleanup(&report);
        assert!(text.contains("delete:  p2"));
        assert!(text.contains("empty, would be deleted"));
        assert!(text.contains("1 empty duplicate target(s) would be removed."));
        assert!(text.contains("Run with --delete to remove them."));
    }

    #[test]
    fn test_clean_accounts_report_nothing() {
        let report = CleanupReport {
            mode: CleanupMode::DryRun,
            accounts: vec![(Account::from_id("org-1"), AccountCleanup::default())],
            failed_accounts: Vec::new(),
        };
        let text = render_cleanup(&report);
        assert!(!text.contains("Org:"));
        assert_eq!(text.trim(), "No duplicates found.");
    }

    #[test]
    fn test_refresh_summary_names_importer_command() {
        let report = RefreshReport {
            manifest: RefreshManifest::new(None),
            processed_accounts: 2,
            failed_accounts: vec![("org-3".into(), "boom".into())],
            skipped: SkipCounts {
                gitlab: 4,
                ..SkipCounts::default()
            },
        };
        let text = render_refresh_summary(&report, Path::new("/work/out.json"));
        assert!(text.contains("Total: 0 target(s) across 2 org(s) (1 org(s) failed)"));
        assert!(text.contains("gitlab (no re-import id)"));
        assert!(text.contains("snyk-api-import import --file=/work/out.json"));
    }
}
