use std::path::PathBuf;

/// Commitment state of a single transmitted file
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CommitOutcome {
    /// No confirmation referenced this file (yet)
    #[default]
    Unknown,
    Success,
    Failure,
}

/// One transmitted file and what the remote node said about it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileOutcome {
    pub sop_class_uid: String,
    pub sop_instance_uid: String,
    pub path: PathBuf,
    pub outcome: CommitOutcome,
}

impl FileOutcome {
    pub fn new(
        sop_class_uid: impl Into<String>,
        sop_instance_uid: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sop_class_uid: sop_class_uid.into(),
            sop_instance_uid: sop_instance_uid.into(),
            path: path.into(),
            outcome: CommitOutcome::Unknown,
        }
    }

    /// Files without both identifiers were unreadable upstream and are never referenced
    pub fn is_committable(&self) -> bool {
        !self.sop_class_uid.is_empty() && !self.sop_instance_uid.is_empty()
    }

    fn matches(&self, sop_class_uid: &str, sop_instance_uid: &str) -> bool {
        self.sop_class_uid == sop_class_uid && self.sop_instance_uid == sop_instance_uid
    }
}

/// Per-target commitment state, owned by exactly one worker while it runs
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetResult {
    /// Transaction UID of the request; empty until the request is built
    pub transaction_uid: String,
    pub files: Vec<FileOutcome>,
}

/// Outcome counts for one target
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub unknown: usize,
}

impl TargetResult {
    pub fn new(files: Vec<FileOutcome>) -> Self {
        Self {
            transaction_uid: String::new(),
            files,
        }
    }

    /// Files that will be referenced by a commitment request
    pub fn committable(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|file| file.is_committable())
    }

    pub fn has_committable_files(&self) -> bool {
        self.committable().next().is_some()
    }

    /// Set the outcome of every file with this identifier pair.
    ///
    /// Returns the number of files updated; zero means the instance was not part
    /// of the request.
    pub fn mark(&mut self, sop_class_uid: &str, sop_instance_uid: &str, outcome: CommitOutcome) -> usize {
        let mut hits = 0;
        for file in self
            .files
            .iter_mut()
            .filter(|file| file.matches(sop_class_uid, sop_instance_uid))
        {
            file.outcome = outcome;
            hits += 1;
        }
        hits
    }

    /// First file with this identifier pair
    pub fn find(&self, sop_class_uid: &str, sop_instance_uid: &str) -> Option<&FileOutcome> {
        self.files
            .iter()
            .find(|file| file.matches(sop_class_uid, sop_instance_uid))
    }

    pub fn summary(&self) -> CommitSummary {
        let mut summary = CommitSummary {
            total: self.files.len(),
            ..Default::default()
        };
        for file in &self.files {
            match file.outcome {
                CommitOutcome::Success => summary.succeeded += 1,
                CommitOutcome::Failure => summary.failed += 1,
                CommitOutcome::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    /// True when every file was confirmed as committed
    pub fn is_fully_committed(&self) -> bool {
        self.files
            .iter()
            .all(|file| file.outcome == CommitOutcome::Success)
    }
}

impl std::fmt::Display for CommitSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} file(s): {} committed, {} failed, {} unconfirmed",
            self.total, self.succeeded, self.failed, self.unknown
        )
    }
}
