//! Migrate command: normalize a task file in place.

use crate::store::{MigrationReport, TaskStore};
use anyhow::Result;
use clap::Args;

/// Arguments for the migrate command.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Show what would change without writing the file.
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the migration command.
pub fn run_migrate(store: &TaskStore, args: &MigrateArgs) -> Result<()> {
    if !store.path().exists() {
        println!("No migration needed: '{}' does not exist.", store.path().display());
        return Ok(());
    }

    let report = store.migrate_file(args.dry_run)?;
    print_report(store, &report, args.dry_run);
    Ok(())
}

fn print_report(store: &TaskStore, report: &MigrationReport, dry_run: bool) {
    println!("Task file: {}", store.path().display());
    if report.was_legacy {
        println!("  Legacy format: tasks will be moved under the 'master' tag");
    }
    for tag in &report.tags {
        let summary = &tag.report.summary;
        println!(
            "  [{}] {} tasks, {} subtasks, {} with parent issues, {} orphaned (integrity {})",
            tag.tag,
            summary.total_tasks,
            summary.total_subtasks,
            summary.subtasks_with_issues,
            summary.orphaned_subtasks,
            summary.integrity_score
        );
        for issue in &tag.report.issues {
            println!("    - {}", issue);
        }
    }
    println!();

    if !report.changed {
        println!("Already up to date.");
    } else if dry_run {
        println!("Dry run: No changes made.");
    } else {
        println!("Migration complete.");
    }
}
