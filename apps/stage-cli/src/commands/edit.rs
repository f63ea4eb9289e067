// edit.rs — Mutating subcommands: set, unset.
//
// Each edit is staged in the working tree, checked with changed(), and
// committed (which saves the whole document) unless --dry-run is given.

use stage_store::Namespace;

use super::{parent_and_key, parse_value, Project};

pub fn set(project: &Project, id: &str, path: &str, raw: &str, dry_run: bool) -> anyhow::Result<()> {
    let store = project.open(id)?;
    let (parent, key) = parent_and_key(&store, path)?;
    parent.set(key, parse_value(raw))?;
    finish(&store, path, dry_run)
}

pub fn unset(project: &Project, id: &str, path: &str, dry_run: bool) -> anyhow::Result<()> {
    let store = project.open(id)?;
    let (parent, key) = parent_and_key(&store, path)?;
    parent.unset(key)?;
    finish(&store, path, dry_run)
}

fn finish(store: &Namespace, path: &str, dry_run: bool) -> anyhow::Result<()> {
    if !store.changed()? {
        println!("No change at '{}'.", path);
        return Ok(());
    }
    if dry_run {
        println!("Would change '{}' (dry run, not committed).", path);
        return Ok(());
    }
    store.commit(true)?;
    tracing::info!(id = %store.id(), path, "edit committed");
    println!("Changed '{}'.", path);
    Ok(())
}
