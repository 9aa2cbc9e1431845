//! Release actions.
//!
//! Each action remembers what it created, so running it again after a
//! retry is a no-op and `undo` knows what to remove.

use std::path::PathBuf;

use semrel_core::changelog::insert_download_link;
use tracing::{debug, info};

use crate::{
    ActionError, ActionResult, ApiError, FileChange, ReleaseApi, TagHandle, UndoError,
    WorkflowContext,
};

/// Where an action finds the git ref it works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefSource {
    /// A fixed branch, tag or commit.
    Fixed(String),
    /// The commit created by an earlier `Commit` action.
    Commit,
    /// The tag published by an earlier `CreateTag` or `GetTag` action.
    Tag,
}

impl RefSource {
    fn resolve(&self, action: &'static str, ctx: &WorkflowContext) -> ActionResult<String> {
        let resolved = match self {
            Self::Fixed(git_ref) => Some(git_ref.clone()),
            Self::Commit => ctx.commit_id().map(String::from),
            Self::Tag => ctx.tag().map(|t| t.name.clone()),
        };
        resolved.ok_or_else(|| ActionError::Precondition {
            action,
            reason: format!("no {} available", self.describe()),
        })
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Fixed(_) => "ref",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }
}

fn api_error(action: &'static str) -> impl FnOnce(ApiError) -> ActionError {
    move |cause| ActionError::Api { action, cause }
}

/// Creates the release tag with its release note.
#[derive(Debug, Clone)]
pub struct CreateTag {
    tag_name: String,
    git_ref: RefSource,
    note: String,
    releases_api: bool,
    created: bool,
    unconfirmed: bool,
}

impl CreateTag {
    const NAME: &'static str = "create tag";

    /// Creates the action.
    ///
    /// With `releases_api` the tag is created through a release; otherwise
    /// the note is stored as the tag's release description, and a tag that
    /// already exists is reused.
    ///
    /// After a gateway error the next attempt looks the release up before
    /// creating it, and a rollback deletes it even if it was never
    /// confirmed.
    #[must_use]
    pub fn new(
        tag_name: impl Into<String>,
        git_ref: RefSource,
        note: impl Into<String>,
        releases_api: bool,
    ) -> Self {
        Self {
            tag_name: tag_name.into(),
            git_ref,
            note: note.into(),
            releases_api,
            created: false,
            unconfirmed: false,
        }
    }

    fn apply(&mut self, api: &dyn ReleaseApi, ctx: &mut WorkflowContext) -> ActionResult<()> {
        if self.created {
            return Ok(());
        }
        let git_ref = self.git_ref.resolve(Self::NAME, ctx)?;

        let tag = match self.existing(api)? {
            Some(tag) => tag,
            None => self.create(api, &git_ref).map_err(|cause| {
                self.unconfirmed |= cause.is_retryable();
                ActionError::Api {
                    action: Self::NAME,
                    cause,
                }
            })?,
        };

        info!(tag = %tag.name, commit = ?tag.commit_id, %git_ref, "created tag");
        ctx.set_tag(tag);
        self.created = true;
        self.unconfirmed = false;
        Ok(())
    }

    fn existing(&self, api: &dyn ReleaseApi) -> ActionResult<Option<TagHandle>> {
        if !self.releases_api {
            let tag = api.get_tag(&self.tag_name).map_err(api_error(Self::NAME))?;
            if tag.is_some() {
                debug!(tag = %self.tag_name, "tag already exists");
            }
            return Ok(tag);
        }
        if !self.unconfirmed {
            return Ok(None);
        }
        let release = api
            .get_release(&self.tag_name)
            .map_err(api_error(Self::NAME))?;
        Ok(release.map(|release| {
            debug!(
                release = %release.name,
                tag = %release.tag_name,
                "release from earlier attempt exists"
            );
            self.release_tag()
        }))
    }

    fn create(&self, api: &dyn ReleaseApi, git_ref: &str) -> Result<TagHandle, ApiError> {
        let message = format!("Release {}", self.tag_name);
        if self.releases_api {
            let release = api.create_release(&message, &self.tag_name, git_ref, &self.note)?;
            debug!(release = %release.name, "created release");
            Ok(self.release_tag())
        } else {
            let description = (!self.note.is_empty()).then_some(self.note.as_str());
            api.create_tag(&self.tag_name, git_ref, &message, description)
        }
    }

    fn release_tag(&self) -> TagHandle {
        TagHandle {
            name: self.tag_name.clone(),
            commit_id: None,
            release_description: Some(self.note.clone()),
        }
    }

    fn undo(&mut self, api: &dyn ReleaseApi) -> Result<(), UndoError> {
        if !self.created && !self.unconfirmed {
            return Ok(());
        }
        let (result, resource) = if self.releases_api {
            (
                api.delete_release(&self.tag_name),
                format!("release {}", self.tag_name),
            )
        } else {
            (
                api.delete_tag(&self.tag_name),
                format!("tag {}", self.tag_name),
            )
        };
        match result {
            Ok(()) => {}
            Err(cause) if !self.created && cause.is_not_found() => {
                debug!(%resource, "nothing left by the failed attempt");
            }
            Err(cause) => return Err(UndoError::Failed { resource, cause }),
        }
        self.created = false;
        self.unconfirmed = false;
        Ok(())
    }
}

/// Fetches an existing tag.
#[derive(Debug, Clone)]
pub struct GetTag {
    tag_name: String,
}

impl GetTag {
    const NAME: &'static str = "get tag";

    /// Creates the action.
    #[must_use]
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
        }
    }

    fn apply(&self, api: &dyn ReleaseApi, ctx: &mut WorkflowContext) -> ActionResult<()> {
        let tag = api
            .get_tag(&self.tag_name)
            .map_err(api_error(Self::NAME))?
            .ok_or_else(|| ActionError::Precondition {
                action: Self::NAME,
                reason: format!("tag {} does not exist", self.tag_name),
            })?;
        debug!(tag = %tag.name, commit = ?tag.commit_id, "found tag");
        ctx.set_tag(tag);
        Ok(())
    }
}

/// Commits files on a branch.
///
/// After a gateway error the branch head is checked for the commit before
/// creating it again.
#[derive(Debug, Clone)]
pub struct Commit {
    branch: String,
    message: String,
    files: Vec<FileChange>,
    commit_id: Option<String>,
    unconfirmed: bool,
}

impl Commit {
    const NAME: &'static str = "commit";

    /// Creates the action.
    #[must_use]
    pub fn new(branch: impl Into<String>, message: impl Into<String>, files: Vec<FileChange>) -> Self {
        Self {
            branch: branch.into(),
            message: message.into(),
            files,
            commit_id: None,
            unconfirmed: false,
        }
    }

    fn apply(&mut self, api: &dyn ReleaseApi, ctx: &mut WorkflowContext) -> ActionResult<()> {
        if self.commit_id.is_none() && self.unconfirmed {
            let head = api
                .branch_head(&self.branch)
                .map_err(api_error(Self::NAME))?;
            if head.message.trim() == self.message.trim() {
                debug!(
                    id = %head.id,
                    branch = %self.branch,
                    "commit from earlier attempt is on the branch"
                );
                self.commit_id = Some(head.id);
            }
        }
        if self.commit_id.is_none() {
            let commit = api
                .create_commit(&self.branch, &self.message, &self.files)
                .map_err(|cause| {
                    self.unconfirmed |= cause.is_retryable();
                    ActionError::Api {
                        action: Self::NAME,
                        cause,
                    }
                })?;
            info!(id = %commit.id, branch = %self.branch, "created commit");
            self.commit_id = Some(commit.id);
        }
        if let Some(id) = &self.commit_id {
            ctx.set_commit_id(id.clone());
        }
        Ok(())
    }

    fn undo(&self) -> Result<(), UndoError> {
        match &self.commit_id {
            Some(id) => Err(UndoError::Irreversible {
                resource: format!("commit {id} on {}", self.branch),
            }),
            None if self.unconfirmed => Err(UndoError::Irreversible {
                resource: format!("unconfirmed commit on {}", self.branch),
            }),
            None => Ok(()),
        }
    }
}

/// Starts a CI pipeline.
#[derive(Debug, Clone)]
pub struct CreatePipeline {
    git_ref: RefSource,
    done: bool,
    pipeline_id: Option<u64>,
}

impl CreatePipeline {
    const NAME: &'static str = "create pipeline";

    /// Creates the action.
    #[must_use]
    pub fn new(git_ref: RefSource) -> Self {
        Self {
            git_ref,
            done: false,
            pipeline_id: None,
        }
    }

    fn apply(&mut self, api: &dyn ReleaseApi, ctx: &WorkflowContext) -> ActionResult<()> {
        if self.done {
            return Ok(());
        }
        let git_ref = self.git_ref.resolve(Self::NAME, ctx)?;
        match api
            .create_pipeline(&git_ref)
            .map_err(api_error(Self::NAME))?
        {
            Some(pipeline) => {
                info!(id = pipeline.id, url = ?pipeline.web_url, %git_ref, "created pipeline");
                self.pipeline_id = Some(pipeline.id);
            }
            None => info!(%git_ref, "no pipeline jobs to run"),
        }
        self.done = true;
        Ok(())
    }

    fn undo(&self) -> Result<(), UndoError> {
        match self.pipeline_id {
            Some(id) => Err(UndoError::Irreversible {
                resource: format!("pipeline {id}"),
            }),
            None => Ok(()),
        }
    }
}

/// Uploads a file to the project.
#[derive(Debug, Clone)]
pub struct Upload {
    path: PathBuf,
    url: Option<String>,
}

impl Upload {
    const NAME: &'static str = "upload";

    /// Creates the action.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            url: None,
        }
    }

    fn apply(&mut self, api: &dyn ReleaseApi, ctx: &mut WorkflowContext) -> ActionResult<()> {
        if self.url.is_some() {
            return Ok(());
        }
        let upload = api
            .upload_file(&self.path)
            .map_err(api_error(Self::NAME))?;
        info!(path = %self.path.display(), url = %upload.url, "uploaded file");
        self.url = Some(upload.url.clone());
        ctx.add_upload(self.path.clone(), upload);
        Ok(())
    }

    fn undo(&self) -> Result<(), UndoError> {
        match &self.url {
            Some(url) => Err(UndoError::Irreversible {
                resource: format!("upload {url}"),
            }),
            None => Ok(()),
        }
    }
}

/// Links an uploaded file to the release.
#[derive(Debug, Clone)]
pub struct AddLink {
    path: PathBuf,
    description: String,
    releases_api: bool,
    link_id: Option<u64>,
    original_description: Option<String>,
}

impl AddLink {
    const NAME: &'static str = "add link";

    /// Creates the action for the upload of `path`.
    ///
    /// With `releases_api` a release asset link is created; otherwise the
    /// tag's release description is patched.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, description: impl Into<String>, releases_api: bool) -> Self {
        Self {
            path: path.into(),
            description: description.into(),
            releases_api,
            link_id: None,
            original_description: None,
        }
    }

    fn apply(&mut self, api: &dyn ReleaseApi, ctx: &mut WorkflowContext) -> ActionResult<()> {
        if self.link_id.is_some() || self.original_description.is_some() {
            return Ok(());
        }
        let upload = ctx
            .upload(&self.path)
            .cloned()
            .ok_or_else(|| ActionError::Precondition {
                action: Self::NAME,
                reason: format!("{} was not uploaded", self.path.display()),
            })?;
        let tag = ctx.tag_mut().ok_or_else(|| ActionError::Precondition {
            action: Self::NAME,
            reason: "no tag available".to_string(),
        })?;

        if self.releases_api {
            let link = api
                .create_release_link(&tag.name, &self.description, &upload.url)
                .map_err(api_error(Self::NAME))?;
            info!(
                tag = %tag.name,
                id = link.id,
                name = %link.name,
                url = %link.url,
                "added release link"
            );
            self.link_id = Some(link.id);
        } else {
            let original = tag.release_description.clone().unwrap_or_default();
            let patched = insert_download_link(&original, &upload.markdown, &self.description);
            api.update_tag_description(&tag.name, &patched)
                .map_err(api_error(Self::NAME))?;
            info!(tag = %tag.name, "added download to tag description");
            tag.release_description = Some(patched);
            self.original_description = Some(original);
        }
        Ok(())
    }

    fn undo(&mut self, api: &dyn ReleaseApi, ctx: &mut WorkflowContext) -> Result<(), UndoError> {
        let Some(tag) = ctx.tag_mut() else {
            return Ok(());
        };
        if let Some(id) = self.link_id {
            api.delete_release_link(&tag.name, id)
                .map_err(|cause| UndoError::Failed {
                    resource: format!("link {:?} of release {}", self.description, tag.name),
                    cause,
                })?;
            self.link_id = None;
        }
        if let Some(original) = self.original_description.take() {
            if let Err(cause) = api.update_tag_description(&tag.name, &original) {
                let err = UndoError::DescriptionNotRestored {
                    tag: tag.name.clone(),
                    original: original.clone(),
                    cause,
                };
                self.original_description = Some(original);
                return Err(err);
            }
            tag.release_description = Some(original);
        }
        Ok(())
    }
}

/// One remote release operation.
#[derive(Debug, Clone)]
pub enum Action {
    /// Verifies API access. Nothing to undo.
    Check,
    /// Creates the release tag.
    CreateTag(CreateTag),
    /// Requires an existing tag.
    GetTag(GetTag),
    /// Commits files. Cannot be undone.
    Commit(Commit),
    /// Starts a pipeline. Cannot be undone.
    CreatePipeline(CreatePipeline),
    /// Uploads a file. Cannot be undone.
    Upload(Upload),
    /// Links an upload to the release.
    AddLink(AddLink),
}

impl Action {
    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::CreateTag(_) => CreateTag::NAME,
            Self::GetTag(_) => GetTag::NAME,
            Self::Commit(_) => Commit::NAME,
            Self::CreatePipeline(_) => CreatePipeline::NAME,
            Self::Upload(_) => Upload::NAME,
            Self::AddLink(_) => AddLink::NAME,
        }
    }

    /// Runs the action. Running an applied action again does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote operation fails or an earlier action
    /// did not publish what this one needs.
    pub fn apply(&mut self, api: &dyn ReleaseApi, ctx: &mut WorkflowContext) -> ActionResult<()> {
        match self {
            Self::Check => api.check().map_err(api_error("check")),
            Self::CreateTag(action) => action.apply(api, ctx),
            Self::GetTag(action) => action.apply(api, ctx),
            Self::Commit(action) => action.apply(api, ctx),
            Self::CreatePipeline(action) => action.apply(api, ctx),
            Self::Upload(action) => action.apply(api, ctx),
            Self::AddLink(action) => action.apply(api, ctx),
        }
    }

    /// Reverts the action. Undoing an action that was not applied does
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns an error naming the resource left behind.
    pub fn undo(&mut self, api: &dyn ReleaseApi, ctx: &mut WorkflowContext) -> Result<(), UndoError> {
        match self {
            Self::Check | Self::GetTag(_) => Ok(()),
            Self::CreateTag(action) => action.undo(api),
            Self::Commit(action) => action.undo(),
            Self::CreatePipeline(action) => action.undo(),
            Self::Upload(action) => action.undo(),
            Self::AddLink(action) => action.undo(api, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeApi;
    use std::path::Path;

    fn uploaded_ctx(description: Option<&str>) -> WorkflowContext {
        let mut ctx = WorkflowContext::new();
        ctx.set_tag(TagHandle {
            name: "v1.0.0".to_string(),
            commit_id: None,
            release_description: description.map(String::from),
        });
        ctx.add_upload(
            "a.zip",
            crate::UploadHandle {
                markdown: "[a.zip](https://x/a.zip)".to_string(),
                url: "https://x/a.zip".to_string(),
            },
        );
        ctx
    }

    #[test]
    fn test_create_tag_with_releases_api() {
        let api = FakeApi::new();
        let mut ctx = WorkflowContext::new();
        let mut action = Action::CreateTag(CreateTag::new(
            "v1.0.0",
            RefSource::Fixed("main".to_string()),
            "# 1.0.0",
            true,
        ));

        action.apply(&api, &mut ctx).unwrap();
        action.apply(&api, &mut ctx).unwrap();

        assert_eq!(api.calls(), vec!["create_release v1.0.0 main"]);
        assert_eq!(ctx.tag().unwrap().name, "v1.0.0");

        action.undo(&api, &mut ctx).unwrap();
        assert_eq!(api.calls().last().unwrap(), "delete_release v1.0.0");
    }

    #[test]
    fn test_create_tag_finds_release_created_behind_gateway_error() {
        let api = FakeApi::new();
        api.fail_after_apply("create_release", 502, 1);
        let mut ctx = WorkflowContext::new();
        let mut action = Action::CreateTag(CreateTag::new(
            "v1.0.0",
            RefSource::Fixed("main".to_string()),
            "# 1.0.0",
            true,
        ));

        assert!(action.apply(&api, &mut ctx).unwrap_err().is_retryable());
        action.apply(&api, &mut ctx).unwrap();

        assert_eq!(
            api.calls(),
            vec!["create_release v1.0.0 main", "get_release v1.0.0"]
        );
        assert_eq!(ctx.tag().unwrap().name, "v1.0.0");
        assert!(api.has_tag("v1.0.0"));

        action.undo(&api, &mut ctx).unwrap();
        assert!(!api.has_release("v1.0.0"));
    }

    #[test]
    fn test_create_tag_retries_release_that_was_not_created() {
        let api = FakeApi::new();
        api.fail("create_release", 503, 1);
        let mut ctx = WorkflowContext::new();
        let mut action = CreateTag::new("v1.0.0", RefSource::Fixed("main".to_string()), "n", true);

        assert!(action.apply(&api, &mut ctx).is_err());
        action.apply(&api, &mut ctx).unwrap();

        assert_eq!(
            api.calls(),
            vec![
                "create_release v1.0.0 main",
                "get_release v1.0.0",
                "create_release v1.0.0 main",
            ]
        );
        assert!(api.has_release("v1.0.0"));
    }

    #[test]
    fn test_create_tag_undo_after_gateway_error() {
        let api = FakeApi::new();
        api.fail_after_apply("create_release", 504, 1);
        let mut ctx = WorkflowContext::new();
        let mut action = Action::CreateTag(CreateTag::new(
            "v1.0.0",
            RefSource::Fixed("main".to_string()),
            "n",
            true,
        ));
        assert!(action.apply(&api, &mut ctx).is_err());
        action.undo(&api, &mut ctx).unwrap();
        assert!(!api.has_release("v1.0.0"));

        // the release never existed
        let api = FakeApi::new();
        api.fail("create_release", 504, 1);
        assert!(action.apply(&api, &mut ctx).is_err());
        action.undo(&api, &mut ctx).unwrap();
        assert_eq!(api.calls().last().unwrap(), "delete_release v1.0.0");
    }

    #[test]
    fn test_create_tag_conflict_is_not_undone() {
        let api = FakeApi::new();
        api.fail("create_release", 409, 1);
        let mut ctx = WorkflowContext::new();
        let mut action = Action::CreateTag(CreateTag::new(
            "v1.0.0",
            RefSource::Fixed("main".to_string()),
            "n",
            true,
        ));

        assert!(!action.apply(&api, &mut ctx).unwrap_err().is_retryable());
        action.undo(&api, &mut ctx).unwrap();
        assert_eq!(api.calls(), vec!["create_release v1.0.0 main"]);
    }

    #[test]
    fn test_create_tag_legacy_reuses_existing_tag() {
        let api = FakeApi::new().with_tag("v1.0.0", Some("old note"));
        let mut ctx = WorkflowContext::new();
        let mut action = CreateTag::new("v1.0.0", RefSource::Fixed("main".to_string()), "", false);

        action.apply(&api, &mut ctx).unwrap();

        assert_eq!(api.calls(), vec!["get_tag v1.0.0"]);
        assert_eq!(
            ctx.tag().unwrap().release_description.as_deref(),
            Some("old note")
        );
    }

    #[test]
    fn test_create_tag_legacy_creates_missing_tag() {
        let api = FakeApi::new();
        let mut ctx = WorkflowContext::new();
        let mut action = Action::CreateTag(CreateTag::new(
            "v1.0.0",
            RefSource::Fixed("abc".to_string()),
            "note",
            false,
        ));

        action.apply(&api, &mut ctx).unwrap();
        action.undo(&api, &mut ctx).unwrap();

        assert_eq!(
            api.calls(),
            vec!["get_tag v1.0.0", "create_tag v1.0.0 abc", "delete_tag v1.0.0"]
        );
    }

    #[test]
    fn test_create_tag_uses_commit_from_context() {
        let api = FakeApi::new();
        let mut ctx = WorkflowContext::new();
        let mut actions = [
            Action::Commit(Commit::new(
                "main",
                "chore: bump",
                vec![FileChange {
                    path: "CHANGELOG.md".to_string(),
                    content: "x".to_string(),
                }],
            )),
            Action::CreateTag(CreateTag::new("v1.0.0", RefSource::Commit, "n", true)),
        ];
        for action in &mut actions {
            action.apply(&api, &mut ctx).unwrap();
        }
        assert_eq!(
            api.calls(),
            vec!["create_commit main", "create_release v1.0.0 commit-1"]
        );
    }

    #[test]
    fn test_create_tag_without_commit_is_fatal() {
        let api = FakeApi::new();
        let mut ctx = WorkflowContext::new();
        let err = CreateTag::new("v1.0.0", RefSource::Commit, "n", true)
            .apply(&api, &mut ctx)
            .unwrap_err();
        assert!(matches!(err, ActionError::Precondition { .. }));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_get_tag_missing_is_fatal() {
        let api = FakeApi::new();
        let mut ctx = WorkflowContext::new();
        let err = Action::GetTag(GetTag::new("v9.9.9"))
            .apply(&api, &mut ctx)
            .unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("v9.9.9 does not exist"));
    }

    #[test]
    fn test_commit_found_on_branch_after_gateway_error() {
        let api = FakeApi::new();
        api.fail_after_apply("create_commit", 502, 1);
        let mut ctx = WorkflowContext::new();
        let mut action = Action::Commit(Commit::new("main", "chore: bump", Vec::new()));

        assert!(action.apply(&api, &mut ctx).unwrap_err().is_retryable());
        action.apply(&api, &mut ctx).unwrap();

        assert_eq!(api.calls(), vec!["create_commit main", "branch_head main"]);
        assert_eq!(ctx.commit_id(), Some("commit-1"));
    }

    #[test]
    fn test_commit_retried_when_branch_head_differs() {
        let api = FakeApi::new();
        api.fail("create_commit", 503, 1);
        let mut ctx = WorkflowContext::new();
        let mut action = Action::Commit(Commit::new("main", "chore: bump", Vec::new()));

        assert!(action.apply(&api, &mut ctx).is_err());
        let err = action.undo(&api, &mut ctx).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unconfirmed commit on main cannot be rolled back"
        );

        action.apply(&api, &mut ctx).unwrap();
        assert_eq!(api.count("create_commit"), 2);
        assert_eq!(ctx.commit_id(), Some("commit-1"));
    }

    #[test]
    fn test_irreversible_undo() {
        let api = FakeApi::new();
        let mut ctx = WorkflowContext::new();
        let mut commit = Action::Commit(Commit::new("main", "m", Vec::new()));
        let mut pipeline = Action::CreatePipeline(CreatePipeline::new(RefSource::Fixed(
            "v1.0.0".to_string(),
        )));
        let mut upload = Action::Upload(Upload::new("a.zip"));

        for action in [&mut commit, &mut pipeline, &mut upload] {
            assert!(action.undo(&api, &mut ctx).is_ok(), "not applied yet");
            action.apply(&api, &mut ctx).unwrap();
        }

        let err = commit.undo(&api, &mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "commit commit-1 on main cannot be rolled back");
        let err = pipeline.undo(&api, &mut ctx).unwrap_err();
        assert_eq!(err.to_string(), "pipeline 7 cannot be rolled back");
        let err = upload.undo(&api, &mut ctx).unwrap_err();
        assert!(matches!(err, UndoError::Irreversible { .. }));
    }

    #[test]
    fn test_pipeline_with_nothing_to_run_undoes_cleanly() {
        let api = FakeApi::new().without_pipeline_jobs();
        let mut ctx = WorkflowContext::new();
        let mut action = Action::CreatePipeline(CreatePipeline::new(RefSource::Fixed(
            "v1.0.0".to_string(),
        )));
        action.apply(&api, &mut ctx).unwrap();
        action.apply(&api, &mut ctx).unwrap();
        action.undo(&api, &mut ctx).unwrap();
        assert_eq!(api.calls(), vec!["create_pipeline v1.0.0"]);
    }

    #[test]
    fn test_add_link_with_releases_api() {
        let api = FakeApi::new();
        let mut ctx = uploaded_ctx(None);
        let mut action = Action::AddLink(AddLink::new("a.zip", "Windows build", true));

        action.apply(&api, &mut ctx).unwrap();
        action.undo(&api, &mut ctx).unwrap();

        assert_eq!(
            api.calls(),
            vec![
                "create_release_link v1.0.0 https://x/a.zip",
                "delete_release_link v1.0.0 11",
            ]
        );
    }

    #[test]
    fn test_add_link_legacy_patches_and_restores_description() {
        let api = FakeApi::new();
        let mut ctx = uploaded_ctx(Some("# 1.0.0\n\n<!--- downloads here -->"));
        let mut action = Action::AddLink(AddLink::new("a.zip", "Windows build", false));

        action.apply(&api, &mut ctx).unwrap();
        let patched = ctx.tag().unwrap().release_description.clone().unwrap();
        assert!(patched.contains("- **[a.zip](https://x/a.zip):** Windows build"));
        assert_eq!(api.description("v1.0.0").as_deref(), Some(patched.as_str()));

        action.undo(&api, &mut ctx).unwrap();
        assert_eq!(
            api.description("v1.0.0").as_deref(),
            Some("# 1.0.0\n\n<!--- downloads here -->")
        );
    }

    #[test]
    fn test_add_link_restore_failure_keeps_original_text() {
        let api = FakeApi::new();
        let mut ctx = uploaded_ctx(Some("note"));
        let mut action = Action::AddLink(AddLink::new("a.zip", "d", false));
        action.apply(&api, &mut ctx).unwrap();

        api.fail("update_tag_description", 500, 1);
        let err = action.undo(&api, &mut ctx).unwrap_err();
        match err {
            UndoError::DescriptionNotRestored { tag, original, .. } => {
                assert_eq!(tag, "v1.0.0");
                assert_eq!(original, "note");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_add_link_requires_upload() {
        let api = FakeApi::new();
        let mut ctx = uploaded_ctx(None);
        let err = AddLink::new("b.zip", "d", true)
            .apply(&api, &mut ctx)
            .unwrap_err();
        assert!(err.to_string().contains("b.zip was not uploaded"));
        assert!(ctx.upload(Path::new("b.zip")).is_none());
    }

    #[test]
    fn test_check() {
        let api = FakeApi::new();
        api.fail("check", 401, 1);
        let mut ctx = WorkflowContext::new();
        let err = Action::Check.apply(&api, &mut ctx).unwrap_err();
        assert!(!err.is_retryable());
        Action::Check.apply(&api, &mut ctx).unwrap();
    }
}
