/// A stage declared itself inconsistently. These are defects in a stage
/// module and are reported before any argument is parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    /// Two stages registered under the same name.
    #[error("stage '{0}' is registered more than once")]
    DuplicateStage(String),

    /// Two parameters of a stage share an id, a long flag or a short flag.
    #[error("stage '{stage}' uses '{param}' for more than one parameter")]
    DuplicateParam { stage: String, param: String },

    /// A stage parameter shadows the id or a flag of a root argument.
    #[error("stage '{stage}' declares parameter '{param}', which is reserved for the root command")]
    ReservedParam { stage: String, param: String },

    /// A constraint refers to a parameter the stage never declared.
    #[error("stage '{stage}' constrains undeclared parameter '{param}'")]
    UnknownParam { stage: String, param: String },

    /// The registration function never bound a handler.
    #[error("stage '{0}' has no handler bound")]
    MissingHandler(String),

    /// Parsed matches disagree with the declared schema.
    #[error("stage '{stage}': cannot read parameter '{param}': {message}")]
    Extract {
        stage: String,
        param: String,
        message: String,
    },
}

/// Everything [`Registry::parse_and_dispatch`](super::Registry::parse_and_dispatch)
/// can end with. Display is the wrapped error's own.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Bad command line; `clap` already knows how to report it.
    #[error(transparent)]
    Usage(#[from] clap::Error),

    #[error(transparent)]
    Config(#[from] StageError),

    /// Whatever the stage handler returned, untouched.
    #[error(transparent)]
    Handler(anyhow::Error),
}
