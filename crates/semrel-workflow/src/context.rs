//! State shared between the actions of one workflow.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::{TagHandle, UploadHandle};

/// Results published by earlier actions for later ones.
///
/// A `Commit` publishes the commit id a following `CreateTag` tags,
/// `CreateTag`/`GetTag` publish the tag, `Upload` publishes the file
/// link an `AddLink` attaches.
#[derive(Debug, Clone, Default)]
pub struct WorkflowContext {
    tag: Option<TagHandle>,
    commit_id: Option<String>,
    uploads: HashMap<PathBuf, UploadHandle>,
}

impl WorkflowContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The tag of the release.
    #[must_use]
    pub fn tag(&self) -> Option<&TagHandle> {
        self.tag.as_ref()
    }

    /// Mutable access to the tag.
    pub fn tag_mut(&mut self) -> Option<&mut TagHandle> {
        self.tag.as_mut()
    }

    /// Publishes the tag.
    pub fn set_tag(&mut self, tag: TagHandle) {
        self.tag = Some(tag);
    }

    /// The commit created in this workflow.
    #[must_use]
    pub fn commit_id(&self) -> Option<&str> {
        self.commit_id.as_deref()
    }

    /// Publishes the commit id.
    pub fn set_commit_id(&mut self, id: impl Into<String>) {
        self.commit_id = Some(id.into());
    }

    /// The upload of `path`.
    #[must_use]
    pub fn upload(&self, path: &Path) -> Option<&UploadHandle> {
        self.uploads.get(path)
    }

    /// Publishes an upload.
    pub fn add_upload(&mut self, path: impl Into<PathBuf>, upload: UploadHandle) {
        self.uploads.insert(path.into(), upload);
    }
}
