//! GitLab REST v4 client.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response, multipart};
use reqwest::{Method, StatusCode, Url};
use semrel_config::GitlabConfig;
use semrel_workflow::{
    ApiError, ApiResult, CommitHandle, FileChange, LinkHandle, PipelineHandle, ReleaseApi,
    ReleaseHandle, TagHandle, UploadHandle,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::{GitlabError, GitlabResult};

const DEFAULT_API_URL: &str = "https://gitlab.com/api/v4/";

/// Marker of GitLab's answer when a ref has no pipeline jobs.
const NO_JOBS_MESSAGE: &str = "No stages / jobs";

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitlabOptions {
    /// API base URL; `/api/v4` is appended when missing.
    pub api_url: Option<String>,
    /// Personal, project or CI job token.
    pub token: String,
    /// Project id or `namespace/path`.
    pub project: String,
    /// Web URL of the project, used to absolutize upload links.
    pub project_url: Option<String>,
    /// Skip TLS certificate verification.
    pub skip_ssl_verify: bool,
    /// Timeout of each request.
    pub timeout: Duration,
}

impl GitlabOptions {
    /// Builds options from the `[gitlab]` section and a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token or project is missing.
    pub fn from_config(config: &GitlabConfig, token: Option<String>) -> GitlabResult<Self> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(GitlabError::MissingToken)?;
        let project = config
            .project
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or(GitlabError::MissingProject)?;
        Ok(Self {
            api_url: config.api_url.clone(),
            token,
            project,
            project_url: config.project_url.clone(),
            skip_ssl_verify: config.skip_ssl_verify,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

/// Appends the trailing slash and `api/v4/` when missing.
#[must_use]
pub fn normalize_api_url(url: &str) -> String {
    let mut url = url.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    if !url.ends_with("api/v4/") {
        url.push_str("api/v4/");
    }
    url
}

#[derive(Deserialize)]
struct TagResponse {
    name: String,
    commit: Option<TagCommit>,
    release: Option<TagRelease>,
}

#[derive(Deserialize)]
struct TagCommit {
    id: String,
}

#[derive(Deserialize)]
struct TagRelease {
    description: Option<String>,
}

impl From<TagResponse> for TagHandle {
    fn from(tag: TagResponse) -> Self {
        Self {
            name: tag.name,
            commit_id: tag.commit.map(|c| c.id),
            release_description: tag.release.and_then(|r| r.description),
        }
    }
}

#[derive(Deserialize)]
struct ReleaseResponse {
    name: String,
    tag_name: String,
}

impl From<ReleaseResponse> for ReleaseHandle {
    fn from(release: ReleaseResponse) -> Self {
        Self {
            name: release.name,
            tag_name: release.tag_name,
        }
    }
}

#[derive(Deserialize)]
struct LinkResponse {
    id: u64,
    name: String,
    url: String,
}

#[derive(Deserialize)]
struct PipelineResponse {
    id: u64,
    web_url: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

#[derive(Deserialize)]
struct CommitResponse {
    id: String,
    message: String,
}

impl From<CommitResponse> for CommitHandle {
    fn from(commit: CommitResponse) -> Self {
        Self {
            id: commit.id,
            message: commit.message,
        }
    }
}

#[derive(Deserialize)]
struct BranchResponse {
    commit: CommitResponse,
}

/// Blocking GitLab client for one project.
pub struct GitlabClient {
    http: Client,
    base: Url,
    project: String,
    project_url: Option<String>,
}

impl GitlabClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the API URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(options: GitlabOptions) -> GitlabResult<Self> {
        if options.token.is_empty() {
            return Err(GitlabError::MissingToken);
        }
        if options.project.is_empty() {
            return Err(GitlabError::MissingProject);
        }

        let raw = options
            .api_url
            .as_deref()
            .map_or_else(|| DEFAULT_API_URL.to_string(), normalize_api_url);
        let base = Url::parse(&raw).map_err(|e| GitlabError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(GitlabError::InvalidUrl {
                url: raw,
                reason: "not a hierarchical URL".to_string(),
            });
        }

        let mut headers = reqwest::header::HeaderMap::new();
        let mut token = reqwest::header::HeaderValue::from_str(&options.token)
            .map_err(|_| GitlabError::MissingToken)?;
        token.set_sensitive(true);
        headers.insert("private-token", token);

        let http = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .default_headers(headers)
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.skip_ssl_verify)
            .build()
            .map_err(GitlabError::Client)?;

        debug!(base = %base, project = %options.project, "created gitlab client");
        Ok(Self {
            http,
            base,
            project: options.project,
            project_url: options.project_url,
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn project_endpoint(&self, segments: &[&str]) -> Url {
        let mut all = vec!["projects", self.project.as_str()];
        all.extend_from_slice(segments);
        self.endpoint(&all)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }

    fn send(operation: &str, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().map_err(|e| ApiError::Transport {
            operation: operation.to_string(),
            message: e.to_string(),
        })?;
        let status = response.status();
        debug!(operation, %status, "gitlab response");
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().unwrap_or_default();
        Err(ApiError::Status {
            operation: operation.to_string(),
            status: status.as_u16(),
            message: message.trim().to_string(),
        })
    }

    fn json<T: DeserializeOwned>(operation: &str, response: Response) -> ApiResult<T> {
        response.json().map_err(|e| ApiError::Transport {
            operation: operation.to_string(),
            message: format!("invalid response: {e}"),
        })
    }

    fn file_exists(&self, branch: &str, path: &str) -> ApiResult<bool> {
        let mut url = self.project_endpoint(&["repository", "files", path]);
        url.query_pairs_mut().append_pair("ref", branch);
        match Self::send("check file", self.request(Method::HEAD, url)) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn absolute_upload_url(&self, relative: &str) -> String {
        match &self.project_url {
            Some(project_url) => format!("{}{relative}", project_url.trim_end_matches('/')),
            None => relative.to_string(),
        }
    }
}

impl ReleaseApi for GitlabClient {
    fn check(&self) -> ApiResult<()> {
        Self::send("get user", self.request(Method::GET, self.endpoint(&["user"])))?;
        Self::send(
            "get version",
            self.request(Method::GET, self.endpoint(&["version"])),
        )?;
        Ok(())
    }

    fn get_tag(&self, name: &str) -> ApiResult<Option<TagHandle>> {
        let url = self.project_endpoint(&["repository", "tags", name]);
        match Self::send("get tag", self.request(Method::GET, url)) {
            Ok(response) => Ok(Some(Self::json::<TagResponse>("get tag", response)?.into())),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn create_tag(
        &self,
        name: &str,
        git_ref: &str,
        message: &str,
        release_description: Option<&str>,
    ) -> ApiResult<TagHandle> {
        let mut body = json!({
            "tag_name": name,
            "ref": git_ref,
            "message": message,
        });
        if let Some(description) = release_description {
            body["release_description"] = json!(description);
        }
        let url = self.project_endpoint(&["repository", "tags"]);
        let response = Self::send(
            "create tag",
            self.request(Method::POST, url).json(&body),
        )?;
        Ok(Self::json::<TagResponse>("create tag", response)?.into())
    }

    fn delete_tag(&self, name: &str) -> ApiResult<()> {
        let url = self.project_endpoint(&["repository", "tags", name]);
        Self::send("delete tag", self.request(Method::DELETE, url))?;
        Ok(())
    }

    fn create_release(
        &self,
        name: &str,
        tag_name: &str,
        git_ref: &str,
        description: &str,
    ) -> ApiResult<ReleaseHandle> {
        let body = json!({
            "name": name,
            "tag_name": tag_name,
            "ref": git_ref,
            "description": description,
        });
        let url = self.project_endpoint(&["releases"]);
        let response = Self::send(
            "create release",
            self.request(Method::POST, url).json(&body),
        )?;
        Ok(Self::json::<ReleaseResponse>("create release", response)?.into())
    }

    fn get_release(&self, tag_name: &str) -> ApiResult<Option<ReleaseHandle>> {
        let url = self.project_endpoint(&["releases", tag_name]);
        match Self::send("get release", self.request(Method::GET, url)) {
            Ok(response) => Ok(Some(
                Self::json::<ReleaseResponse>("get release", response)?.into(),
            )),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn delete_release(&self, tag_name: &str) -> ApiResult<()> {
        let url = self.project_endpoint(&["releases", tag_name]);
        Self::send("delete release", self.request(Method::DELETE, url))?;
        Ok(())
    }

    fn create_release_link(&self, tag_name: &str, name: &str, url: &str) -> ApiResult<LinkHandle> {
        let body = json!({ "name": name, "url": url });
        let endpoint = self.project_endpoint(&["releases", tag_name, "assets", "links"]);
        let response = Self::send(
            "create release link",
            self.request(Method::POST, endpoint).json(&body),
        )?;
        let link: LinkResponse = Self::json("create release link", response)?;
        Ok(LinkHandle {
            id: link.id,
            name: link.name,
            url: link.url,
        })
    }

    fn delete_release_link(&self, tag_name: &str, link_id: u64) -> ApiResult<()> {
        let id = link_id.to_string();
        let url = self.project_endpoint(&["releases", tag_name, "assets", "links", &id]);
        Self::send("delete release link", self.request(Method::DELETE, url))?;
        Ok(())
    }

    fn create_pipeline(&self, git_ref: &str) -> ApiResult<Option<PipelineHandle>> {
        let url = self.project_endpoint(&["pipeline"]);
        let request = self
            .request(Method::POST, url)
            .json(&json!({ "ref": git_ref }));
        match Self::send("create pipeline", request) {
            Ok(response) => {
                let pipeline: PipelineResponse = Self::json("create pipeline", response)?;
                Ok(Some(PipelineHandle {
                    id: pipeline.id,
                    web_url: pipeline.web_url,
                }))
            }
            Err(ApiError::Status {
                status, message, ..
            }) if status == StatusCode::BAD_REQUEST.as_u16()
                && message.contains(NO_JOBS_MESSAGE) =>
            {
                debug!(%git_ref, "no pipeline jobs for ref");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn upload_file(&self, path: &Path) -> ApiResult<UploadHandle> {
        let form = multipart::Form::new()
            .file("file", path)
            .map_err(|source| ApiError::Io {
                operation: format!("read {}", path.display()),
                source,
            })?;
        let url = self.project_endpoint(&["uploads"]);
        let response = Self::send(
            "upload file",
            self.request(Method::POST, url).multipart(form),
        )?;
        let upload: UploadResponse = Self::json("upload file", response)?;

        let url = self.absolute_upload_url(&upload.url);
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(UploadHandle {
            markdown: format!("[{name}]({url})"),
            url,
        })
    }

    fn update_tag_description(&self, tag_name: &str, description: &str) -> ApiResult<()> {
        let url = self.project_endpoint(&["repository", "tags", tag_name, "release"]);
        Self::send(
            "update tag description",
            self.request(Method::PUT, url)
                .json(&json!({ "description": description })),
        )?;
        Ok(())
    }

    fn create_commit(
        &self,
        branch: &str,
        message: &str,
        files: &[FileChange],
    ) -> ApiResult<CommitHandle> {
        let mut actions = Vec::with_capacity(files.len());
        for file in files {
            let action = if self.file_exists(branch, &file.path)? {
                "update"
            } else {
                "create"
            };
            actions.push(json!({
                "action": action,
                "file_path": file.path,
                "content": file.content,
            }));
        }
        let body = json!({
            "branch": branch,
            "commit_message": message,
            "actions": actions,
        });
        let url = self.project_endpoint(&["repository", "commits"]);
        let response = Self::send(
            "create commit",
            self.request(Method::POST, url).json(&body),
        )?;
        Ok(Self::json::<CommitResponse>("create commit", response)?.into())
    }

    fn branch_head(&self, branch: &str) -> ApiResult<CommitHandle> {
        let url = self.project_endpoint(&["repository", "branches", branch]);
        let response = Self::send("get branch", self.request(Method::GET, url))?;
        Ok(Self::json::<BranchResponse>("get branch", response)?
            .commit
            .into())
    }
}
