use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot find stack graph {0:?}")]
    StackGraphNotFound(String),

    #[error("cannot find node {0:?}")]
    NodeNotFound(String),

    #[error("cannot find graph for parent stack {0:?}")]
    ParentStackNotFound(String),

    /// A stack name showed up twice while expanding nested stacks.
    #[error("graph for stack {0:?} exists already")]
    DuplicateStackGraph(String),

    #[error("node {0:?} exists already")]
    DuplicateNode(String),

    #[error("{identifier:?} is not a valid identifier: {reason}")]
    MalformedIdentifier { identifier: String, reason: String },

    #[error("change set {0:?} not found")]
    ChangeSetNotFound(String),

    #[error("failed to fetch change set {name:?}: {message}")]
    Fetch { name: String, message: String },

    #[error("failed to render graph: {message}")]
    Render { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(identifier: &str, reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            identifier: identifier.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
