// ABOUTME: Cloud Resource Manager lookups backing the folder walk.
// ABOUTME: v1 projects filtered by parent folder, v2 folders listed by parent.

use crate::client::GcpClient;
use async_trait::async_trait;
use hostca_core::{normalize_folder_id, CloudError, ProjectDirectory};
use serde::Deserialize;

const ACTIVE: &str = "ACTIVE";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListProjectsResponse {
    #[serde(default)]
    projects: Vec<WireProject>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProject {
    project_id: String,
    lifecycle_state: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFoldersResponse {
    #[serde(default)]
    folders: Vec<WireFolder>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireFolder {
    /// `folders/{id}`
    name: String,
}

/// Resource Manager v1 filter selecting projects directly under a folder.
pub fn parent_folder_filter(folder_id: &str) -> String {
    format!("parent.type:folder parent.id:{}", normalize_folder_id(folder_id))
}

fn active_project_ids(projects: Vec<WireProject>) -> impl Iterator<Item = String> {
    projects
        .into_iter()
        .filter(|p| p.lifecycle_state.as_deref() == Some(ACTIVE))
        .map(|p| p.project_id)
}

fn folder_ids(folders: Vec<WireFolder>) -> impl Iterator<Item = String> {
    folders
        .into_iter()
        .map(|f| normalize_folder_id(&f.name).to_string())
}

fn next_page(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

#[async_trait]
impl ProjectDirectory for GcpClient {
    async fn list_active_projects(&self, folder_id: &str) -> Result<Vec<String>, CloudError> {
        let url = format!("{}/projects", self.endpoints.resource_manager_v1);
        let filter = parent_folder_filter(folder_id);
        let mut projects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.get(&url).query(&[("filter", filter.as_str())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: ListProjectsResponse = self.send_json("projects.list", request).await?;
            page_token = next_page(page.next_page_token);
            projects.extend(active_project_ids(page.projects));
            if page_token.is_none() {
                break;
            }
        }

        Ok(projects)
    }

    async fn list_sub_folders(&self, folder_id: &str) -> Result<Vec<String>, CloudError> {
        let url = format!("{}/folders", self.endpoints.resource_manager_v2);
        let parent = format!("folders/{}", normalize_folder_id(folder_id));
        let mut folders = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.get(&url).query(&[("parent", parent.as_str())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: ListFoldersResponse = self.send_json("folders.list", request).await?;
            page_token = next_page(page.next_page_token);
            folders.extend(folder_ids(page.folders));
            if page_token.is_none() {
                break;
            }
        }

        Ok(folders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_folder_filter() {
        assert_eq!(
            parent_folder_filter("folders/1234"),
            "parent.type:folder parent.id:1234"
        );
        assert_eq!(
            parent_folder_filter("1234"),
            "parent.type:folder parent.id:1234"
        );
    }

    #[test]
    fn test_only_active_projects_are_kept() {
        let json = r#"{
            "projects": [
                {"projectId": "live", "lifecycleState": "ACTIVE"},
                {"projectId": "leaving", "lifecycleState": "DELETE_REQUESTED"},
                {"projectId": "unknown"}
            ],
            "nextPageToken": ""
        }"#;
        let page: ListProjectsResponse = serde_json::from_str(json).unwrap();
        assert!(next_page(page.next_page_token).is_none());
        assert_eq!(active_project_ids(page.projects).collect::<Vec<_>>(), vec!["live"]);
    }

    #[test]
    fn test_folder_names_are_normalized() {
        let json = r#"{
            "folders": [
                {"name": "folders/111", "displayName": "prod", "lifecycleState": "ACTIVE"},
                {"name": "folders/222", "displayName": "dev", "lifecycleState": "ACTIVE"}
            ],
            "nextPageToken": "more"
        }"#;
        let page: ListFoldersResponse = serde_json::from_str(json).unwrap();
        assert_eq!(next_page(page.next_page_token).as_deref(), Some("more"));
        assert_eq!(
            folder_ids(page.folders).collect::<Vec<_>>(),
            vec!["111", "222"]
        );
    }

    #[test]
    fn test_empty_listing() {
        let page: ListFoldersResponse = serde_json::from_str("{}").unwrap();
        assert!(page.folders.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
