//! Pre-release identifier templates and sequence resolution.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use semver::{BuildMetadata, Prerelease, Version};
use tracing::debug;

use crate::{CoreError, CoreResult, ReleaseVersion};

static EXPR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("invalid regex"));

static CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\(?\s*(?P<func>[A-Za-z_]\w*)(?:\s+"(?P<arg>[^"]*)")?\s*\)?$"#)
        .expect("invalid regex")
});

/// Values available to templates.
pub struct TemplateContext<'a> {
    lookup: Box<dyn Fn(&str) -> Option<String> + 'a>,
    commit_time: DateTime<Utc>,
}

impl<'a> TemplateContext<'a> {
    /// Context reading `env` values from the process environment.
    #[must_use]
    pub fn from_env(commit_time: DateTime<Utc>) -> Self {
        Self::with_lookup(commit_time, |name| std::env::var(name).ok())
    }

    /// Context with a custom `env` lookup.
    #[must_use]
    pub fn with_lookup(
        commit_time: DateTime<Utc>,
        lookup: impl Fn(&str) -> Option<String> + 'a,
    ) -> Self {
        Self {
            lookup: Box::new(lookup),
            commit_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Env(String),
    Seq,
    CommitTs,
}

/// A single identifier template.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    fn parse(source: &str) -> CoreResult<Self> {
        let error = |reason: String| CoreError::Template {
            template: source.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut last = 0;
        for captures in EXPR_RE.captures_iter(source) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            push_literal(&mut segments, &source[last..whole.start()]).map_err(error)?;
            last = whole.end();

            let expr = captures[1].trim();
            let call = CALL_RE
                .captures(expr)
                .ok_or_else(|| error(format!("malformed expression `{expr}`")))?;
            let arg = call.name("arg").map(|m| m.as_str());
            let segment = match (&call["func"], arg) {
                ("seq", None) => Segment::Seq,
                ("commit_ts", None) => Segment::CommitTs,
                ("env", Some(name)) => Segment::Env(name.to_string()),
                ("env", None) => return Err(error("`env` needs a variable name".to_string())),
                (func @ ("seq" | "commit_ts"), Some(_)) => {
                    return Err(error(format!("`{func}` takes no argument")));
                }
                (func, _) => return Err(error(format!("unknown function `{func}`"))),
            };
            segments.push(segment);
        }
        push_literal(&mut segments, &source[last..]).map_err(error)?;

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    fn uses_seq(&self) -> bool {
        self.segments.contains(&Segment::Seq)
    }

    fn render(&self, ctx: &TemplateContext<'_>, seq: Option<u64>) -> CoreResult<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Env(name) => out.push_str(&(ctx.lookup)(name).unwrap_or_default()),
                Segment::Seq => out.push_str(&seq.unwrap_or(1).to_string()),
                Segment::CommitTs => {
                    out.push_str(&ctx.commit_time.format("%Y%m%d%H%M%S").to_string());
                }
            }
        }

        let identifier = sanitize(&out);
        if identifier.is_empty() {
            return Err(CoreError::InvalidIdentifier {
                template: self.source.clone(),
                identifier,
            });
        }
        Ok(identifier)
    }
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) -> Result<(), String> {
    if text.contains("{{") || text.contains("}}") {
        return Err("unbalanced braces".to_string());
    }
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_string()));
    }
    Ok(())
}

/// Lowercases and replaces characters not allowed in an identifier.
fn sanitize(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Next free sequence number at `position` of the pre-release identifiers.
///
/// Only versions sharing `next`'s major.minor.patch whose identifiers
/// before `position` equal `prior` and whose identifier at `position`
/// is numeric are considered. Returns their maximum plus one, or 1, and
/// `None` once the maximum is `u64::MAX`.
#[must_use]
pub fn resolve_sequence(
    next: &Version,
    existing: &[Version],
    prior: &[String],
    position: usize,
) -> Option<u64> {
    existing
        .iter()
        .filter(|v| v.major == next.major && v.minor == next.minor && v.patch == next.patch)
        .filter_map(|v| {
            if v.pre.is_empty() {
                return None;
            }
            let ids: Vec<&str> = v.pre.as_str().split('.').collect();
            if ids.len() <= position || !ids[..position].iter().eq(prior.iter()) {
                return None;
            }
            let id = ids[position];
            if id.bytes().all(|b| b.is_ascii_digit()) {
                id.parse::<u64>().ok()
            } else {
                None
            }
        })
        .max()
        .map_or(Some(1), |max| max.checked_add(1))
}

/// Parses tag names into versions, skipping anything unparseable.
#[must_use]
pub fn versions_from_tags<S: AsRef<str>>(tags: &[S], prefix: &str) -> Vec<Version> {
    tags.iter()
        .filter_map(|tag| {
            let tag = tag.as_ref();
            let version = tag
                .strip_prefix(prefix)
                .and_then(|v| Version::parse(v).ok());
            if version.is_none() {
                debug!(%tag, "skipping tag that is not a version");
            }
            version
        })
        .collect()
}

/// Pre-release and build metadata templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrereleaseTemplates {
    pre: Vec<Template>,
    build: Vec<Template>,
}

impl PrereleaseTemplates {
    /// Parses both template lists.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoPrereleaseTemplates`] when `pre` is empty, or
    /// [`CoreError::Template`] for the first malformed template.
    pub fn parse<S: AsRef<str>>(pre: &[S], build: &[S]) -> CoreResult<Self> {
        if pre.is_empty() {
            return Err(CoreError::NoPrereleaseTemplates);
        }
        let parse_all = |list: &[S]| -> CoreResult<Vec<Template>> {
            list.iter().map(|t| Template::parse(t.as_ref())).collect()
        };
        Ok(Self {
            pre: parse_all(pre)?,
            build: parse_all(build)?,
        })
    }

    /// Renders all identifiers and stamps them onto `version.next`.
    ///
    /// Sequence numbers are resolved left to right, each scoped by the
    /// identifiers before it. Nothing is stamped if any identifier fails.
    ///
    /// # Errors
    ///
    /// Returns an error if an identifier renders empty or invalid, a
    /// sequence has no successor, or the version was already stamped.
    pub fn stamp(
        &self,
        version: &mut ReleaseVersion,
        existing: &[Version],
        ctx: &TemplateContext<'_>,
    ) -> CoreResult<()> {
        let mut pre_ids: Vec<String> = Vec::with_capacity(self.pre.len());
        for (position, template) in self.pre.iter().enumerate() {
            let seq = if template.uses_seq() {
                let seq = resolve_sequence(version.next(), existing, &pre_ids, position)
                    .ok_or_else(|| CoreError::SequenceExhausted {
                        template: template.source.clone(),
                        version: version.next().clone(),
                    })?;
                Some(seq)
            } else {
                None
            };
            pre_ids.push(template.render(ctx, seq)?);
        }

        let build_ids = self
            .build
            .iter()
            .map(|t| t.render(ctx, None))
            .collect::<CoreResult<Vec<_>>>()?;

        let pre = validated(&self.pre, &pre_ids, Prerelease::new)?;
        let build = validated(&self.build, &build_ids, BuildMetadata::new)?;
        version.stamp(pre, build)?;

        debug!(next = %version.next(), "stamped pre-release");
        Ok(())
    }
}

fn validated<T: Default>(
    templates: &[Template],
    ids: &[String],
    parse: impl Fn(&str) -> Result<T, semver::Error>,
) -> CoreResult<T> {
    for (template, id) in templates.iter().zip(ids) {
        if parse(id).is_err() {
            return Err(CoreError::InvalidIdentifier {
                template: template.source.clone(),
                identifier: id.clone(),
            });
        }
    }
    if ids.is_empty() {
        return Ok(T::default());
    }
    Ok(parse(&ids.join("."))?)
}
