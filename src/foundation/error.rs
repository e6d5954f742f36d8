pub type FondraResult<T> = Result<T, FondraError>;

/// Pipeline stage names surfaced in [`FondraError::GenerationFailed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Field,
    Composite,
    PostProcess,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Field => "field",
            Stage::Composite => "composite",
            Stage::PostProcess => "post_process",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum FondraError {
    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("palette exhausted: requested {requested} colors, pool holds {available}")]
    PaletteExhausted { requested: usize, available: usize },

    #[error("generation failed at {stage} stage: {cause}")]
    GenerationFailed { stage: Stage, cause: String },

    #[error("batch cancelled before task {0} started")]
    Cancelled(usize),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FondraError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigInvalid(msg.into())
    }

    pub fn stage(stage: Stage, cause: impl Into<String>) -> Self {
        Self::GenerationFailed {
            stage,
            cause: cause.into(),
        }
    }
}
