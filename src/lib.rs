use error_set::error_set;
use std::ops::Range;
use std::path::PathBuf;

pub mod apply;
pub mod config;
pub mod diff;
pub mod graph;
pub mod parse;
pub mod patch;
pub mod repo;

pub use apply::{ApplyError, apply_patch};
pub use config::{ConfigError, Settings};
pub use diff::{DiffParseError, LineRecord, parse_records};
pub use graph::{GraphRow, Progress, WalkOptions, build_graph};
pub use parse::ParseError;
pub use patch::{PatchError, PatchPurpose, make_patch};
pub use repo::{CommitId, GitCommandError, LogOptions, Repo};

error_set! {
    /// Top-level error for git-weave operations
    WeaveError := {
        #[display("No changes found in {file}")]
        NoChanges { file: String },
        #[display("Nothing to patch in {file}: the selection holds no changes")]
        NothingToPatch { file: String },
        #[display("Failed to write output: {message}")]
        OutputFailed { message: String },
        ParseError(ParseError),
        DiffParseError(DiffParseError),
        PatchError(PatchError),
        ApplyError(ApplyError),
        ConfigError(ConfigError),
        GitCommandError(GitCommandError),
    }
}

/// Which commits [`Weave::graph`] lays out.
#[derive(Debug, Clone, Default)]
pub struct GraphRequest {
    pub max_count: Option<usize>,
    /// Revisions to walk from; every ref when empty.
    pub revisions: Vec<String>,
    /// Branch tips whose exclusive history is hidden.
    pub hide: Vec<String>,
    /// Revisions kept visible regardless of `hide`.
    pub show: Vec<String>,
}

/// Main interface for git-weave operations
pub struct Weave {
    repo: Repo,
    settings: Settings,
}

impl Weave {
    /// Create a new Weave for the repository at `repo_path`
    pub fn new(repo_path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            repo: Repo::new(repo_path),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Lay out the commit graph, hidden branches filtered out.
    ///
    /// # Examples
    /// ```no_run
    /// # use git_weave::{GraphRequest, Settings, Weave};
    /// let weave = Weave::new(".", Settings::default());
    /// let request = GraphRequest {
    ///     hide: vec!["old-experiment".to_string()],
    ///     ..GraphRequest::default()
    /// };
    /// for row in weave.graph(&request, |_| {}).unwrap() {
    ///     println!("{} {}", row.frame.lane, row.id);
    /// }
    /// ```
    pub fn graph<F>(
        &self,
        request: &GraphRequest,
        progress: F,
    ) -> Result<Vec<GraphRow<CommitId>>, WeaveError>
    where
        F: FnMut(Progress),
    {
        let history = self.repo.log(&LogOptions {
            max_count: request.max_count,
            revisions: request.revisions.clone(),
        })?;

        let resolve = |revisions: &[String]| {
            revisions
                .iter()
                .map(|rev| self.repo.rev_parse(rev))
                .collect::<Result<Vec<_>, _>>()
        };
        let options = WalkOptions {
            lanes: self.settings.lane_config(),
            hide: resolve(&request.hide)?,
            show: resolve(&request.show)?,
            progress_interval: self.settings.progress_interval,
        };

        Ok(build_graph(&history, &options, progress))
    }

    /// Line records of the unstaged (or, with `cached`, staged) diff of `file`.
    pub fn records(&self, file: &str, cached: bool) -> Result<Vec<LineRecord>, WeaveError> {
        let diff = self.repo.diff(file, cached, self.settings.context_lines)?;
        Ok(parse_records(&diff)?)
    }

    /// Build the patch for records `range` of `file`, taken from the diff
    /// `purpose` works on: staged changes for unstaging, unstaged otherwise.
    pub fn patch(
        &self,
        file: &str,
        range: Range<usize>,
        purpose: PatchPurpose,
    ) -> Result<Vec<u8>, WeaveError> {
        let records = self.records(file, purpose == PatchPurpose::Unstage)?;
        if records.is_empty() {
            return Err(WeaveError::NoChanges {
                file: file.to_string(),
            });
        }

        let context = self.settings.context_lines;
        make_patch(file, file, &records, range, purpose, context)?.ok_or_else(|| {
            WeaveError::NothingToPatch {
                file: file.to_string(),
            }
        })
    }

    /// Stage, unstage or discard the changes in records `range` of `file`
    ///
    /// # Examples
    /// ```no_run
    /// # use git_weave::{PatchPurpose, Settings, Weave};
    /// let weave = Weave::new(".", Settings::default());
    /// weave.apply("src/main.rs", 4..9, PatchPurpose::Stage).unwrap();
    /// ```
    pub fn apply(
        &self,
        file: &str,
        range: Range<usize>,
        purpose: PatchPurpose,
    ) -> Result<String, WeaveError> {
        let patch = self.patch(file, range, purpose)?;
        Ok(apply_patch(self.repo.path(), &patch, purpose)?)
    }
}
