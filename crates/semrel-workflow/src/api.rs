//! Release host operations.

use std::path::Path;

use crate::ApiResult;

/// A tag on the release host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagHandle {
    /// Tag name.
    pub name: String,
    /// Tagged commit, when the host reports it.
    pub commit_id: Option<String>,
    /// Release description attached to the tag.
    pub release_description: Option<String>,
}

impl TagHandle {
    /// Creates a handle with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commit_id: None,
            release_description: None,
        }
    }
}

/// A release on the release host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseHandle {
    /// Release title.
    pub name: String,
    /// Tag the release belongs to.
    pub tag_name: String,
}

/// An asset link of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkHandle {
    /// Link id used for deletion.
    pub id: u64,
    /// Link text.
    pub name: String,
    /// Target URL.
    pub url: String,
}

/// A CI pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineHandle {
    /// Pipeline id.
    pub id: u64,
    /// Page of the pipeline, if reported.
    pub web_url: Option<String>,
}

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadHandle {
    /// Markdown link to the file, e.g. `[app.zip](https://...)`.
    pub markdown: String,
    /// Absolute download URL.
    pub url: String,
}

/// A commit on the release host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitHandle {
    /// Full commit id.
    pub id: String,
    /// Full commit message.
    pub message: String,
}

/// A file to write in a remote commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Path relative to the repository root.
    pub path: String,
    /// New file content.
    pub content: String,
}

/// Operations the release host must provide.
///
/// Every method is a single remote call. Implementations report HTTP
/// failures as [`ApiError::Status`](crate::ApiError::Status) so the
/// executor can tell transient gateway errors from fatal ones.
pub trait ReleaseApi {
    /// Verifies that the host is reachable and the credentials work.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects the request.
    fn check(&self) -> ApiResult<()>;

    /// Looks up a tag; `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than not-found.
    fn get_tag(&self, name: &str) -> ApiResult<Option<TagHandle>>;

    /// Creates a tag at `git_ref`, optionally with a release description.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be created.
    fn create_tag(
        &self,
        name: &str,
        git_ref: &str,
        message: &str,
        release_description: Option<&str>,
    ) -> ApiResult<TagHandle>;

    /// Deletes a tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be deleted.
    fn delete_tag(&self, name: &str) -> ApiResult<()>;

    /// Creates a release, creating `tag_name` at `git_ref` if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the release cannot be created.
    fn create_release(
        &self,
        name: &str,
        tag_name: &str,
        git_ref: &str,
        description: &str,
    ) -> ApiResult<ReleaseHandle>;

    /// Looks up the release of `tag_name`; `Ok(None)` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than not-found.
    fn get_release(&self, tag_name: &str) -> ApiResult<Option<ReleaseHandle>>;

    /// Deletes the release of `tag_name`; the tag itself stays.
    ///
    /// # Errors
    ///
    /// Returns an error if the release cannot be deleted.
    fn delete_release(&self, tag_name: &str) -> ApiResult<()>;

    /// Adds an asset link to the release of `tag_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be created.
    fn create_release_link(&self, tag_name: &str, name: &str, url: &str)
    -> ApiResult<LinkHandle>;

    /// Removes an asset link.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be deleted.
    fn delete_release_link(&self, tag_name: &str, link_id: u64) -> ApiResult<()>;

    /// Starts a pipeline for `git_ref`; `Ok(None)` if there is nothing to run.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline cannot be created.
    fn create_pipeline(&self, git_ref: &str) -> ApiResult<Option<PipelineHandle>>;

    /// Uploads a file to the project.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or uploaded.
    fn upload_file(&self, path: &Path) -> ApiResult<UploadHandle>;

    /// Replaces the release description of a tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the description cannot be updated.
    fn update_tag_description(&self, tag_name: &str, description: &str) -> ApiResult<()>;

    /// The newest commit of `branch`.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch cannot be read.
    fn branch_head(&self, branch: &str) -> ApiResult<CommitHandle>;

    /// Commits `files` on `branch`.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit cannot be created.
    fn create_commit(
        &self,
        branch: &str,
        message: &str,
        files: &[FileChange],
    ) -> ApiResult<CommitHandle>;
}
