//! Direct access to the archive repository.

use std::{collections::BTreeMap, path::Path};

use {
    anyhow::{Context, Result, bail},
    pagekeep_config::PagekeepConfig,
    pagekeep_repository::{GitHubRepository, RepositoryStore},
};

fn open(config: &PagekeepConfig) -> Result<GitHubRepository> {
    GitHubRepository::new(&config.repository).context("opening repository")
}

pub async fn get(config: &PagekeepConfig, path: &str) -> Result<()> {
    match open(config)?.get(path).await? {
        Some(content) => {
            print!("{content}");
            Ok(())
        },
        None => bail!("{path} does not exist"),
    }
}

pub async fn put(
    config: &PagekeepConfig,
    path: &str,
    file: &Path,
    message: Option<String>,
    sha: Option<String>,
) -> Result<()> {
    let content = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let message = message.unwrap_or_else(|| format!("Update {path}"));
    let store = open(config)?;
    let confirmation = match sha {
        Some(sha) => store.put_file(path, &content, &message, Some(&sha)).await?,
        None => store.create_or_update(path, &content, &message).await?,
    };
    println!("{confirmation}");
    Ok(())
}

pub async fn delete(config: &PagekeepConfig, path: &str, message: Option<String>) -> Result<()> {
    let message = message.unwrap_or_else(|| format!("Delete {path}"));
    let confirmation = open(config)?.delete(path, &message).await?;
    println!("{confirmation}");
    Ok(())
}

/// Split a `repo/path=local/file` argument.
fn parse_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((repo_path, local)) if !repo_path.is_empty() && !local.is_empty() => {
            Ok((repo_path, local))
        },
        _ => bail!("expected repo/path=local/file, got {pair:?}"),
    }
}

pub async fn commit(config: &PagekeepConfig, message: &str, pairs: &[String]) -> Result<()> {
    let mut files = BTreeMap::new();
    for pair in pairs {
        let (repo_path, local) = parse_pair(pair)?;
        let content = tokio::fs::read(local)
            .await
            .with_context(|| format!("reading {local}"))?;
        files.insert(repo_path.to_string(), content);
    }
    let confirmation = open(config)?.commit_multiple(&files, message).await?;
    println!("{confirmation}");
    Ok(())
}
