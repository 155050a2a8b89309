use serde::{Deserialize, Serialize};

/// Storage commitment workflow selected for a batch of targets
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CommitStrategy {
    /// Results arrive on the association that carried the request
    #[serde(alias = "sync")]
    Synchronous,
    /// Results arrive later on an association opened by the remote node
    #[serde(alias = "async")]
    Asynchronous,
    /// Synchronous first, asynchronous if the remote does not answer in time
    #[default]
    Either,
    /// Store only, no commitment
    None,
}

impl CommitStrategy {
    /// Whether this strategy runs any commitment worker at all
    pub fn commits(&self) -> bool {
        !matches!(self, CommitStrategy::None)
    }
}

impl std::fmt::Display for CommitStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitStrategy::Synchronous => write!(f, "synchronous"),
            CommitStrategy::Asynchronous => write!(f, "asynchronous"),
            CommitStrategy::Either => write!(f, "either"),
            CommitStrategy::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for CommitStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "synchronous" | "sync" => Ok(CommitStrategy::Synchronous),
            "asynchronous" | "async" => Ok(CommitStrategy::Asynchronous),
            "either" => Ok(CommitStrategy::Either),
            "none" => Ok(CommitStrategy::None),
            _ => Err(format!("Invalid commitment strategy: {}", s)),
        }
    }
}
