//! Release note and changelog rendering.
//!
//! Release notes and changelog entries share one layout: a version
//! heading, the date, then one section per [`Category`]. Breaking changes
//! get a sub-heading each so their migration notes can follow as a
//! blockquote.

use std::fmt::Write;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{NaiveDate, Utc};
use semrel_commit::Commit;
use tracing::debug;

use crate::{Category, CoreError, CoreResult, Release};

/// Placeholder at the end of a release note where download links go.
pub const DOWNLOADS_MARKER: &str = "<!--- downloads here -->";

/// Placeholder after the last download link.
pub const LINK_MARKER: &str = "<!--- download here -->";

/// Placeholder in the changelog file above the newest entry.
pub const NEXT_ENTRY_MARKER: &str = "<!--- next entry here -->";

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Release date shown under the heading.
    pub date: NaiveDate,
    /// Render the "Other changes" section.
    pub list_other_changes: bool,
}

impl RenderOptions {
    /// Options dated today.
    #[must_use]
    pub fn today(list_other_changes: bool) -> Self {
        Self {
            date: Utc::now().date_naive(),
            list_other_changes,
        }
    }
}

/// Renders the release note, ending with [`DOWNLOADS_MARKER`].
#[must_use]
pub fn release_note(release: &Release, options: &RenderOptions) -> String {
    let mut out = render(release, options, 1);
    _ = write!(out, "\n\n{DOWNLOADS_MARKER}");
    out
}

/// Renders a changelog entry, one heading level below the release note.
#[must_use]
pub fn changelog_entry(release: &Release, options: &RenderOptions) -> String {
    render(release, options, 2)
}

fn render(release: &Release, options: &RenderOptions, depth: usize) -> String {
    let heading = |offset: usize| "#".repeat(depth + offset);
    let skip_pre_released = release.version().is_prerelease();

    let mut out = String::new();
    _ = write!(
        out,
        "{} {}\n{}",
        heading(0),
        release.version().next(),
        options.date.format("%Y-%m-%d")
    );

    for (category, commits) in release.changes() {
        if category == Category::Other && !options.list_other_changes {
            continue;
        }
        let commits: Vec<&Commit> = commits
            .iter()
            .filter(|c| !(skip_pre_released && c.pre_released))
            .collect();
        if commits.is_empty() {
            continue;
        }

        _ = write!(out, "\n\n{} {}", heading(1), category.label());
        if category == Category::Breaking {
            for commit in commits {
                _ = write!(out, "\n\n{} {}", heading(2), entry_line(commit));
                if let Some(message) = &commit.breaking_message {
                    out.push('\n');
                    for line in message.trim().lines() {
                        let line = line.trim_end();
                        _ = write!(out, "\n>{}{line}", if line.is_empty() { "" } else { " " });
                    }
                }
            }
        } else {
            out.push('\n');
            for commit in commits {
                _ = write!(out, "\n- {}", entry_line(commit));
            }
        }
    }

    out
}

fn entry_line(commit: &Commit) -> String {
    let scope = commit
        .scope
        .as_ref()
        .map(|s| format!("**{s}:** "))
        .unwrap_or_default();
    format!("{scope}{} ({})", commit.subject, commit.short_hash())
}

/// Reads a rendered note or entry back into category → subjects.
///
/// Sections with unknown headings, such as the downloads list, are skipped.
#[must_use]
pub fn parse_entry(text: &str) -> Vec<(Category, Vec<String>)> {
    let mut sections: Vec<(Category, Vec<String>)> = Vec::new();
    let mut base = None;
    let mut in_known_section = false;

    for line in text.lines() {
        let hashes = line.bytes().take_while(|b| *b == b'#').count();
        if hashes > 0 && line[hashes..].starts_with(' ') {
            let title = line[hashes..].trim();
            let base = *base.get_or_insert(hashes);
            if hashes == base + 1 {
                in_known_section = match Category::from_label(title) {
                    Some(category) => {
                        sections.push((category, Vec::new()));
                        true
                    }
                    None => false,
                };
            } else if hashes == base + 2 && in_known_section {
                if let Some((Category::Breaking, subjects)) = sections.last_mut() {
                    subjects.push(entry_subject(title).to_string());
                }
            }
            continue;
        }

        if let Some(item) = line.strip_prefix("- ") {
            if !in_known_section {
                continue;
            }
            if let Some((category, subjects)) = sections.last_mut() {
                if *category != Category::Breaking {
                    subjects.push(entry_subject(item).to_string());
                }
            }
        }
    }

    sections
}

fn entry_subject(line: &str) -> &str {
    let line = line.trim();
    let line = match line.strip_prefix("**").and_then(|s| s.split_once(":** ")) {
        Some((_, rest)) => rest,
        None => line,
    };
    match line.rfind(" (") {
        Some(idx) if line.ends_with(')') => &line[..idx],
        _ => line,
    }
}

/// Inserts `entry` below [`NEXT_ENTRY_MARKER`], or `None` if the marker is
/// missing.
#[must_use]
pub fn insert_changelog_entry(content: &str, entry: &str) -> Option<String> {
    let (head, tail) = content.split_once(NEXT_ENTRY_MARKER)?;
    let parts = [
        head.trim_end(),
        NEXT_ENTRY_MARKER,
        entry.trim(),
        tail.trim_start(),
    ];
    let mut out = parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Some(out)
}

/// The changelog at `path` with `entry` inserted, or a new changelog if
/// there is no file yet.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or an existing file has no
/// [`NEXT_ENTRY_MARKER`].
pub fn updated_changelog(path: &Path, entry: &str) -> CoreResult<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => insert_changelog_entry(&content, entry)
            .ok_or_else(|| CoreError::ChangelogFormat(path.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(?path, "creating changelog");
            Ok(format!("# CHANGELOG\n\n{NEXT_ENTRY_MARKER}\n\n{}\n", entry.trim()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Writes `entry` into the changelog at `path`, creating the file if needed.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written, or an existing
/// file has no [`NEXT_ENTRY_MARKER`].
pub fn update_changelog(path: &Path, entry: &str) -> CoreResult<()> {
    let data = updated_changelog(path, entry)?;
    std::fs::write(path, data)?;
    Ok(())
}

/// Adds a download item to a release note.
///
/// The first link turns [`DOWNLOADS_MARKER`] into a "Downloads" section;
/// later links are appended above [`LINK_MARKER`]. Notes without either
/// marker get the section appended.
#[must_use]
pub fn insert_download_link(note: &str, markdown_link: &str, description: &str) -> String {
    let item = format!("- **{markdown_link}:** {description}");
    if note.contains(DOWNLOADS_MARKER) {
        note.replacen(
            DOWNLOADS_MARKER,
            &format!("## Downloads\n\n{item}\n{LINK_MARKER}"),
            1,
        )
    } else if note.contains(LINK_MARKER) {
        note.replacen(LINK_MARKER, &format!("{item}\n{LINK_MARKER}"), 1)
    } else {
        format!(
            "{}\n\n## Downloads\n\n{item}\n{LINK_MARKER}",
            note.trim_end()
        )
    }
}

/// Renders the bump commit message, replacing `{{tag}}`.
#[must_use]
pub fn bump_commit_message(template: &str, tag: &str) -> String {
    template
        .replace("{{tag}}", tag)
        .replace("{{ tag }}", tag)
}
