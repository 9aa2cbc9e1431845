//! Scripted in-memory [`ReleaseApi`] for tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::{
    ApiError, ApiResult, CommitHandle, FileChange, LinkHandle, PipelineHandle, ReleaseApi,
    ReleaseHandle, TagHandle, UploadHandle,
};

#[derive(Default)]
struct State {
    calls: Vec<String>,
    failures: HashMap<&'static str, (u16, u32)>,
    late_failures: HashMap<&'static str, (u16, u32)>,
    tags: HashMap<String, TagHandle>,
    releases: HashSet<String>,
    heads: HashMap<String, CommitHandle>,
    descriptions: HashMap<String, String>,
    commits: u32,
    no_pipeline_jobs: bool,
}

/// Records every call and fails operations on demand.
#[derive(Default)]
pub struct FakeApi {
    state: RefCell<State>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(self, name: &str, description: Option<&str>) -> Self {
        self.state.borrow_mut().tags.insert(
            name.to_string(),
            TagHandle {
                name: name.to_string(),
                commit_id: Some("0000000".to_string()),
                release_description: description.map(String::from),
            },
        );
        self
    }

    pub fn without_pipeline_jobs(self) -> Self {
        self.state.borrow_mut().no_pipeline_jobs = true;
        self
    }

    /// Makes the next `times` calls of `operation` fail with `status`.
    pub fn fail(&self, operation: &'static str, status: u16, times: u32) {
        self.state
            .borrow_mut()
            .failures
            .insert(operation, (status, times));
    }

    /// Makes the next `times` calls of `operation` take effect and then
    /// fail with `status`, like a gateway timing out on a slow backend.
    pub fn fail_after_apply(&self, operation: &'static str, status: u16, times: u32) {
        self.state
            .borrow_mut()
            .late_failures
            .insert(operation, (status, times));
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.split(' ').next() == Some(operation))
            .count()
    }

    pub fn description(&self, tag: &str) -> Option<String> {
        self.state.borrow().descriptions.get(tag).cloned()
    }

    pub fn has_release(&self, tag: &str) -> bool {
        self.state.borrow().releases.contains(tag)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.state.borrow().tags.contains_key(tag)
    }

    fn record(&self, operation: &'static str, args: &[&str]) -> ApiResult<()> {
        let mut state = self.state.borrow_mut();
        let mut call = operation.to_string();
        for arg in args {
            call.push(' ');
            call.push_str(arg);
        }
        state.calls.push(call);
        scripted(&mut state.failures, operation)
    }

    /// Called once an operation took effect.
    fn settle(&self, operation: &'static str) -> ApiResult<()> {
        scripted(&mut self.state.borrow_mut().late_failures, operation)
    }
}

fn scripted(failures: &mut HashMap<&'static str, (u16, u32)>, operation: &str) -> ApiResult<()> {
    if let Some((status, remaining)) = failures.get_mut(operation) {
        if *remaining > 0 {
            *remaining -= 1;
            return Err(ApiError::Status {
                operation: operation.to_string(),
                status: *status,
                message: "scripted failure".to_string(),
            });
        }
    }
    Ok(())
}

fn not_found(operation: &str) -> ApiError {
    ApiError::Status {
        operation: operation.to_string(),
        status: 404,
        message: "404 Not Found".to_string(),
    }
}

impl ReleaseApi for FakeApi {
    fn check(&self) -> ApiResult<()> {
        self.record("check", &[])
    }

    fn get_tag(&self, name: &str) -> ApiResult<Option<TagHandle>> {
        self.record("get_tag", &[name])?;
        Ok(self.state.borrow().tags.get(name).cloned())
    }

    fn create_tag(
        &self,
        name: &str,
        git_ref: &str,
        _message: &str,
        release_description: Option<&str>,
    ) -> ApiResult<TagHandle> {
        self.record("create_tag", &[name, git_ref])?;
        let tag = TagHandle {
            name: name.to_string(),
            commit_id: Some(git_ref.to_string()),
            release_description: release_description.map(String::from),
        };
        self.state
            .borrow_mut()
            .tags
            .insert(name.to_string(), tag.clone());
        self.settle("create_tag")?;
        Ok(tag)
    }

    fn delete_tag(&self, name: &str) -> ApiResult<()> {
        self.record("delete_tag", &[name])?;
        self.state.borrow_mut().tags.remove(name);
        Ok(())
    }

    fn create_release(
        &self,
        name: &str,
        tag_name: &str,
        git_ref: &str,
        description: &str,
    ) -> ApiResult<ReleaseHandle> {
        self.record("create_release", &[tag_name, git_ref])?;
        {
            let mut state = self.state.borrow_mut();
            state.releases.insert(tag_name.to_string());
            state
                .tags
                .entry(tag_name.to_string())
                .or_insert_with(|| TagHandle {
                    name: tag_name.to_string(),
                    commit_id: Some(git_ref.to_string()),
                    release_description: Some(description.to_string()),
                });
        }
        self.settle("create_release")?;
        Ok(ReleaseHandle {
            name: name.to_string(),
            tag_name: tag_name.to_string(),
        })
    }

    fn get_release(&self, tag_name: &str) -> ApiResult<Option<ReleaseHandle>> {
        self.record("get_release", &[tag_name])?;
        Ok(self
            .state
            .borrow()
            .releases
            .contains(tag_name)
            .then(|| ReleaseHandle {
                name: format!("Release {tag_name}"),
                tag_name: tag_name.to_string(),
            }))
    }

    fn delete_release(&self, tag_name: &str) -> ApiResult<()> {
        self.record("delete_release", &[tag_name])?;
        if self.state.borrow_mut().releases.remove(tag_name) {
            Ok(())
        } else {
            Err(not_found("delete_release"))
        }
    }

    fn create_release_link(&self, tag_name: &str, name: &str, url: &str) -> ApiResult<LinkHandle> {
        self.record("create_release_link", &[tag_name, url])?;
        self.settle("create_release_link")?;
        Ok(LinkHandle {
            id: 11,
            name: name.to_string(),
            url: url.to_string(),
        })
    }

    fn delete_release_link(&self, tag_name: &str, link_id: u64) -> ApiResult<()> {
        self.record("delete_release_link", &[tag_name, &link_id.to_string()])
    }

    fn create_pipeline(&self, git_ref: &str) -> ApiResult<Option<PipelineHandle>> {
        self.record("create_pipeline", &[git_ref])?;
        if self.state.borrow().no_pipeline_jobs {
            return Ok(None);
        }
        Ok(Some(PipelineHandle {
            id: 7,
            web_url: None,
        }))
    }

    fn upload_file(&self, path: &Path) -> ApiResult<UploadHandle> {
        let name = path.display().to_string();
        self.record("upload_file", &[&name])?;
        let url = format!("https://x/{name}");
        Ok(UploadHandle {
            markdown: format!("[{name}]({url})"),
            url,
        })
    }

    fn update_tag_description(&self, tag_name: &str, description: &str) -> ApiResult<()> {
        self.record("update_tag_description", &[tag_name])?;
        self.state
            .borrow_mut()
            .descriptions
            .insert(tag_name.to_string(), description.to_string());
        Ok(())
    }

    fn branch_head(&self, branch: &str) -> ApiResult<CommitHandle> {
        self.record("branch_head", &[branch])?;
        let head = self.state.borrow().heads.get(branch).cloned();
        Ok(head.unwrap_or_else(|| CommitHandle {
            id: "commit-0".to_string(),
            message: "initial commit".to_string(),
        }))
    }

    fn create_commit(
        &self,
        branch: &str,
        message: &str,
        _files: &[FileChange],
    ) -> ApiResult<CommitHandle> {
        self.record("create_commit", &[branch])?;
        let commit = {
            let mut state = self.state.borrow_mut();
            state.commits += 1;
            let commit = CommitHandle {
                id: format!("commit-{}", state.commits),
                message: message.to_string(),
            };
            state.heads.insert(branch.to_string(), commit.clone());
            commit
        };
        self.settle("create_commit")?;
        Ok(commit)
    }
}
