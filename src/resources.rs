//! Static table of API documents and the shapes returned to callers

use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A remote API document to mirror into the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Stable identifier, also used to name the cached file
    pub id: &'static str,

    /// Human readable description shown to consumers
    pub description: &'static str,

    /// Where the document is downloaded from
    pub source_url: &'static str,
}

impl ResourceSpec {
    /// File name under the `openapi/` directory
    ///
    /// The extension follows the source URL (`json`, `yaml` or `yml`) and
    /// defaults to `json`.
    pub fn file_name(&self) -> String {
        let path = self
            .source_url
            .split(['?', '#'])
            .next()
            .unwrap_or(self.source_url);
        let last = path.rsplit('/').next().unwrap_or(path);

        let ext = match last.rsplit_once('.') {
            Some((_, ext)) if matches!(ext, "json" | "yaml" | "yml") => ext,
            _ => "json",
        };
        format!("{}.{}", self.id, ext)
    }
}

/// OpenAPI documents for the platform services
pub const OPENAPI_SPECS: &[ResourceSpec] = &[
    ResourceSpec {
        id: "auth",
        description: "Authentication API: sign-up, sessions, tokens and OAuth providers",
        source_url: "https://raw.githubusercontent.com/scaffold-dev/api-specs/main/auth.json",
    },
    ResourceSpec {
        id: "database",
        description: "Database API: collections, records, queries and indexes",
        source_url: "https://raw.githubusercontent.com/scaffold-dev/api-specs/main/database.json",
    },
    ResourceSpec {
        id: "storage",
        description: "Storage API: buckets, object upload, download and signed URLs",
        source_url: "https://raw.githubusercontent.com/scaffold-dev/api-specs/main/storage.json",
    },
    ResourceSpec {
        id: "functions",
        description: "Functions API: deploying and invoking serverless functions",
        source_url: "https://raw.githubusercontent.com/scaffold-dev/api-specs/main/functions.yaml",
    },
    ResourceSpec {
        id: "realtime",
        description: "Realtime API: channels, presence and event subscriptions",
        source_url: "https://raw.githubusercontent.com/scaffold-dev/api-specs/main/realtime.json",
    },
];

/// A document available on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentEntry {
    pub id: String,
    pub description: String,
    /// Absolute path; callers read the file directly
    pub path: PathBuf,
}

impl DocumentEntry {
    pub fn new(spec: &ResourceSpec, path: PathBuf) -> Self {
        Self {
            id: spec.id.to_string(),
            description: spec.description.to_string(),
            path,
        }
    }
}

/// Everything a consumer needs after a successful retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    pub template_dir: PathBuf,
    pub documents: Vec<DocumentEntry>,
}

/// Documents from `specs` that currently exist in `dir`, in table order
pub async fn collect_cached(dir: &Path, specs: &[ResourceSpec]) -> Vec<DocumentEntry> {
    let mut documents = Vec::with_capacity(specs.len());
    for spec in specs {
        let path = dir.join(spec.file_name());
        if fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            documents.push(DocumentEntry::new(spec, path));
        }
    }
    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    const SPEC: ResourceSpec = ResourceSpec {
        id: "auth",
        description: "Auth",
        source_url: "https://example.com/specs/auth.json",
    };

    #[test]
    fn file_name_follows_source_extension() {
        assert_eq!(SPEC.file_name(), "auth.json");

        let yaml = ResourceSpec {
            source_url: "https://example.com/specs/openapi.yaml?ref=main",
            ..SPEC
        };
        assert_eq!(yaml.file_name(), "auth.yaml");

        let bare = ResourceSpec {
            source_url: "https://example.com/api/v1/spec",
            ..SPEC
        };
        assert_eq!(bare.file_name(), "auth.json");
    }

    #[test]
    fn builtin_table_has_unique_file_names() {
        let names: HashSet<_> = OPENAPI_SPECS.iter().map(|s| s.file_name()).collect();
        assert_eq!(names.len(), OPENAPI_SPECS.len());
        assert!(OPENAPI_SPECS.iter().all(|s| s.source_url.starts_with("https://")));
    }

    #[tokio::test]
    async fn collect_cached_filters_missing_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("storage.json"), "{}").unwrap();
        std::fs::write(temp.path().join("auth.json"), "{}").unwrap();
        std::fs::create_dir(temp.path().join("database.json")).unwrap();

        let documents = collect_cached(temp.path(), OPENAPI_SPECS).await;
        let ids: Vec<_> = documents.iter().map(|d| d.id.as_str()).collect();

        assert_eq!(ids, ["auth", "storage"]);
        assert_eq!(documents[0].path, temp.path().join("auth.json"));
    }
}
