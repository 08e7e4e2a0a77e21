// ABOUTME: Expands configured projects and folders into the flat list of projects to scan.
// ABOUTME: Walks folder trees recursively and degrades to the folder alone when the walk fails.

use crate::cloud::ProjectDirectory;
use crate::config::{normalize_folder_id, Targets};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;

/// Deduplicate, keeping the first occurrence of each value.
pub fn unique(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Explicit projects followed by every active project under the configured
/// folders, deduplicated. Lookup failures are logged and skipped.
pub async fn resolve_projects(directory: &dyn ProjectDirectory, targets: &Targets) -> Vec<String> {
    let mut all = targets.projects.clone();
    all.extend(active_projects_in_folders(directory, &targets.folders).await);
    let resolved = unique(all);
    tracing::debug!(count = resolved.len(), "resolved projects");
    resolved
}

/// Active projects parented anywhere under `folder_ids`.
pub async fn active_projects_in_folders(
    directory: &dyn ProjectDirectory,
    folder_ids: &[String],
) -> Vec<String> {
    let mut visited = HashSet::new();
    let mut folders = Vec::new();
    for folder_id in folder_ids {
        walk_folder(
            directory,
            normalize_folder_id(folder_id).to_string(),
            &mut visited,
            &mut folders,
        )
        .await;
    }

    let mut projects = Vec::new();
    for folder_id in &folders {
        match directory.list_active_projects(folder_id).await {
            Ok(found) => {
                tracing::debug!(folder = %folder_id, count = found.len(), "listed projects in folder");
                projects.extend(found);
            }
            Err(e) => {
                tracing::warn!(folder = %folder_id, error = %e, "failed to list projects in folder");
            }
        }
    }
    projects
}

/// Push `folder_id` and, depth first, all of its descendants onto `out`.
///
/// If the sub-folders of a folder cannot be listed, that folder still counts
/// as a project parent; only its subtree is lost for this pass.
fn walk_folder<'a>(
    directory: &'a dyn ProjectDirectory,
    folder_id: String,
    visited: &'a mut HashSet<String>,
    out: &'a mut Vec<String>,
) -> BoxFuture<'a, ()> {
    async move {
        if !visited.insert(folder_id.clone()) {
            return;
        }
        out.push(folder_id.clone());

        match directory.list_sub_folders(&folder_id).await {
            Ok(children) => {
                for child in children {
                    let child = normalize_folder_id(&child).to_string();
                    walk_folder(directory, child, &mut *visited, &mut *out).await;
                }
            }
            Err(e) => {
                tracing::warn!(
                    folder = %folder_id,
                    error = %e,
                    "failed to list sub-folders, using folder alone"
                );
            }
        }
    }
    .boxed()
}
