use std::path::{Path, PathBuf};

/// Locate an executable on `PATH`
pub fn find_tool(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// True when `stamp` exists and is newer than every source
pub fn stamp_is_fresh<'a, I>(stamp: &Path, sources: I) -> std::io::Result<bool>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    if !stamp.exists() {
        return Ok(false);
    }
    let built = stamp.metadata()?.modified()?;
    for source in sources {
        if source.metadata()?.modified()? > built {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Decide whether the build step has to run, logging when it is skipped
pub(crate) fn needs_rebuild<'a, I>(always: bool, stamp: &Path, sources: I, toplevel: &str) -> std::io::Result<bool>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    if always {
        return Ok(true);
    }
    if stamp_is_fresh(stamp, sources)? {
        log::warn!("Build for {} is up-to-date, skipping", toplevel);
        return Ok(false);
    }
    Ok(true)
}
