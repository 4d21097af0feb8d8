//! Prompt document lookup with an embedded fallback
//!
//! The template archive ships a `PROMPT.md`. Archives produced by code hosts
//! wrap everything in a single top-level folder, so the file is searched at
//! the template root and one directory below.

use crate::error::{ScaffoldError, ScaffoldResult};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the prompt document inside the template
pub const PROMPT_FILE_NAME: &str = "PROMPT.md";

/// Prompt served when the template is unavailable
pub const EMBEDDED_PROMPT: &str = include_str!("../assets/default_prompt.md");

/// Locate the prompt document in an extracted template
pub async fn find_prompt_file(template_dir: &Path) -> Option<PathBuf> {
    let direct = template_dir.join(PROMPT_FILE_NAME);
    if is_file(&direct).await {
        return Some(direct);
    }

    let mut entries = fs::read_dir(template_dir).await.ok()?;
    let mut subdirs = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            subdirs.push(entry.path());
        }
    }
    subdirs.sort();

    for dir in subdirs {
        let candidate = dir.join(PROMPT_FILE_NAME);
        if is_file(&candidate).await {
            return Some(candidate);
        }
    }
    None
}

/// Read the prompt document from an extracted template
pub async fn read_prompt(template_dir: &Path) -> ScaffoldResult<String> {
    let path = find_prompt_file(template_dir).await.ok_or_else(|| {
        ScaffoldError::io(
            format!("locating {} in {}", PROMPT_FILE_NAME, template_dir.display()),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        )
    })?;

    fs::read_to_string(&path)
        .await
        .map_err(|e| ScaffoldError::io(format!("reading {}", path.display()), e))
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn embedded_prompt_is_present() {
        assert!(EMBEDDED_PROMPT.starts_with("# "));
    }

    #[tokio::test]
    async fn finds_prompt_at_root() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(PROMPT_FILE_NAME), "root").unwrap();

        assert_eq!(read_prompt(temp.path()).await.unwrap(), "root");
    }

    #[tokio::test]
    async fn finds_prompt_one_level_down() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("web-template-main");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join(PROMPT_FILE_NAME), "nested").unwrap();

        assert_eq!(
            find_prompt_file(temp.path()).await,
            Some(nested.join(PROMPT_FILE_NAME))
        );
    }

    #[tokio::test]
    async fn ignores_deeper_prompts() {
        let temp = TempDir::new().unwrap();
        let deep = temp.path().join("a").join("b");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(deep.join(PROMPT_FILE_NAME), "too deep").unwrap();

        assert!(find_prompt_file(temp.path()).await.is_none());
        assert!(read_prompt(temp.path()).await.is_err());
    }

    #[tokio::test]
    async fn missing_template_dir_has_no_prompt() {
        let temp = TempDir::new().unwrap();
        assert!(find_prompt_file(&temp.path().join("absent")).await.is_none());
    }
}
