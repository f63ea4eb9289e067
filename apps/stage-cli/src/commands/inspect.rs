// inspect.rs — Read-only subcommands: show, keys, free-key.

use super::{namespace_at, Project};

pub fn show(project: &Project, id: &str, path: &str) -> anyhow::Result<()> {
    let store = project.open(id)?;
    let ns = namespace_at(&store, path)?;
    println!("{}", project.render(&ns.committed_data()?)?);
    Ok(())
}

pub fn keys(project: &Project, id: &str, path: &str) -> anyhow::Result<()> {
    let store = project.open(id)?;
    let ns = namespace_at(&store, path)?;
    let keys = ns.keys()?;
    if keys.is_empty() {
        println!("No keys at {}.", ns.path());
        return Ok(());
    }
    for key in keys {
        println!("{}", key);
    }
    Ok(())
}

pub fn free_key(
    project: &Project,
    id: &str,
    path: &str,
    base: &str,
    separator: &str,
    first_clean: bool,
) -> anyhow::Result<()> {
    let store = project.open(id)?;
    let ns = namespace_at(&store, path)?;
    println!("{}", ns.find_free_key(base, separator, first_clean)?);
    Ok(())
}
