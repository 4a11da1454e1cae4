//! Reading history and diffs from a repository through the `git` binary.

use error_set::error_set;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

error_set! {
    /// Errors from git command execution
    GitCommandError := {
        #[display("Failed to run git {command}: {message}")]
        SpawnFailed { command: String, message: String },
        #[display("git {command} failed: {stderr}")]
        ExitError { command: String, stderr: String },
        #[display("Invalid UTF-8 in git {command} output: {message}")]
        InvalidUtf8 { command: String, message: String },
        #[display("Unexpected git log line: '{line}'")]
        InvalidLogLine { line: String },
        #[display("'{name}' is not a commit id")]
        InvalidCommitId { name: String },
    }
}

/// Full hexadecimal object name of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Accepts SHA-1 (40) and SHA-256 (64) hex names, normalized to lowercase.
    pub fn parse(name: &str) -> Result<Self, GitCommandError> {
        let valid = matches!(name.len(), 40 | 64) && name.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(GitCommandError::InvalidCommitId {
                name: name.to_string(),
            });
        }
        Ok(Self(name.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First seven characters, as `git log --oneline` shows them.
    pub fn short(&self) -> &str {
        &self.0[..7]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Commits to read with [`Repo::log`].
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub max_count: Option<usize>,
    /// Revisions to start from; `--all` when empty.
    pub revisions: Vec<String>,
}

/// A repository worked on through `git -C <path>`.
#[derive(Debug, Clone)]
pub struct Repo {
    path: PathBuf,
}

impl Repo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `git -C <path> <args>` and return its stdout.
    fn git(&self, args: &[&str]) -> Result<Vec<u8>, GitCommandError> {
        let command = args.first().copied().unwrap_or_default().to_string();
        log::debug!("git -C {} {}", self.path.display(), args.join(" "));

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(args)
            .output()
            .map_err(|e| GitCommandError::SpawnFailed {
                command: command.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitCommandError::ExitError {
                command,
                stderr: stderr.trim_end().to_string(),
            });
        }

        Ok(output.stdout)
    }

    fn git_text(&self, args: &[&str]) -> Result<String, GitCommandError> {
        let stdout = self.git(args)?;
        String::from_utf8(stdout).map_err(|e| GitCommandError::InvalidUtf8 {
            command: args.first().copied().unwrap_or_default().to_string(),
            message: e.to_string(),
        })
    }

    /// History in topological order, children before parents, each commit
    /// with its parents in recorded order.
    pub fn log(
        &self,
        options: &LogOptions,
    ) -> Result<Vec<(CommitId, Vec<CommitId>)>, GitCommandError> {
        let max_count = options.max_count.map(|n| format!("--max-count={n}"));
        let mut args = vec!["log", "--topo-order", "--format=%H %P"];
        args.extend(max_count.as_deref());
        if options.revisions.is_empty() {
            args.push("--all");
        } else {
            args.extend(options.revisions.iter().map(String::as_str));
        }
        args.push("--");

        let history = parse_log(&self.git_text(&args)?)?;
        log::debug!("read {} commits", history.len());
        Ok(history)
    }

    /// Resolve `revision` to the commit it names.
    pub fn rev_parse(&self, revision: &str) -> Result<CommitId, GitCommandError> {
        let spec = format!("{revision}^{{commit}}");
        let output = self.git_text(&["rev-parse", "--verify", "--quiet", &spec])?;
        CommitId::parse(output.trim())
    }

    /// Unified diff of `file`: working tree against the index, or the index
    /// against `HEAD` with `cached`.
    pub fn diff(
        &self,
        file: &str,
        cached: bool,
        context_lines: usize,
    ) -> Result<Vec<u8>, GitCommandError> {
        let context = format!("-U{context_lines}");
        let mut args = vec!["diff"];
        if cached {
            args.push("--cached");
        }
        args.extend(["--no-ext-diff", "--no-color", context.as_str(), "--", file]);
        self.git(&args)
    }
}

/// Parse `git log --format='%H %P'` output.
pub fn parse_log(text: &str) -> Result<Vec<(CommitId, Vec<CommitId>)>, GitCommandError> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut names = line.split_whitespace();
            let id = names.next().ok_or_else(|| GitCommandError::InvalidLogLine {
                line: line.to_string(),
            })?;
            let id = CommitId::parse(id)?;
            let parents = names.map(CommitId::parse).collect::<Result<Vec<_>, _>>()?;
            Ok((id, parents))
        })
        .collect()
}
