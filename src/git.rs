//! Repository provisioning: make sure the checkout exists, optionally
//! bring it up to date. Every operation takes an explicit path; the
//! process working directory is never touched.

use anyhow::{Context, Result};
use std::path::Path;

/// Clone the repository (submodules included) if the checkout is not
/// already present. Idempotent.
pub fn ensure_repo(url: &str, target: &Path) -> Result<()> {
    if target.join(".git").exists() {
        return Ok(());
    }
    if url.is_empty() {
        anyhow::bail!(
            "no checkout at {} and no repository URL configured",
            target.display()
        );
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    tracing::info!("Cloning {} into {}", url, target.display());
    git2::Repository::clone_recurse(url, target)
        .with_context(|| format!("Failed to clone {url}"))?;
    tracing::info!("Clone complete: {}", target.display());
    Ok(())
}

/// Fetch origin and fast-forward the current branch, then update
/// submodules. Anything but a fast-forward is left alone: a diverged
/// checkout is the operator's problem, not ours to merge.
pub fn update_repo(target: &Path) -> Result<()> {
    let repo = git2::Repository::open(target)
        .with_context(|| format!("Failed to open repository at {}", target.display()))?;

    {
        let mut remote = repo
            .find_remote("origin")
            .context("Repository has no 'origin' remote")?;
        // Empty refspec list = the remote's configured refspecs
        remote
            .fetch(&[] as &[&str], None, None)
            .context("Failed to fetch from origin")?;
    }

    let fetch_head = repo
        .find_reference("FETCH_HEAD")
        .context("No FETCH_HEAD after fetch")?;
    let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;
    let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

    if analysis.is_up_to_date() {
        tracing::info!("Checkout already up to date: {}", target.display());
    } else if analysis.is_fast_forward() {
        let head_name = repo
            .head()?
            .name()
            .map(str::to_owned)
            .context("HEAD is not a named reference")?;
        let mut reference = repo.find_reference(&head_name)?;
        reference.set_target(fetch_commit.id(), "fast-forward")?;
        repo.set_head(&head_name)?;
        repo.checkout_head(Some(git2::build::CheckoutBuilder::default().force()))?;
        tracing::info!("Fast-forwarded {} to {}", head_name, fetch_commit.id());
    } else {
        tracing::warn!(
            "Checkout at {} has diverged from origin, leaving it as is",
            target.display()
        );
    }

    for mut submodule in repo.submodules()? {
        submodule
            .update(true, None)
            .with_context(|| format!("Failed to update submodule {:?}", submodule.name()))?;
    }

    Ok(())
}
