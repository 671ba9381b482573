use thiserror::Error;

/// Errors that abort a planning run.
///
/// None of these are retried. A failed run leaves the inventory however far it
/// got; operators run the cleanup pass before trying again.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A derived tier count or port budget is unusable.
    #[error("sizing error: {0}")]
    Sizing(String),

    /// Rack pool exhausted, or a device ran out of open interfaces.
    #[error("capacity error: {0}")]
    Capacity(String),

    /// An inventory call failed. `call` names the operation and its parameters.
    #[error("backend error in {call}: {source}")]
    Backend {
        call: String,
        #[source]
        source: anyhow::Error,
    },

    /// Bad override file, or a model/cable type with no price.
    #[error("config error: {0}")]
    Config(String),
}

impl PlanError {
    pub fn sizing(msg: impl Into<String>) -> Self {
        Self::Sizing(msg.into())
    }

    pub fn capacity(msg: impl Into<String>) -> Self {
        Self::Capacity(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn backend(call: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Backend {
            call: call.into(),
            source,
        }
    }

    /// Stable code reported at the process boundary
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sizing(_) => "SIZING",
            Self::Capacity(_) => "CAPACITY",
            Self::Backend { .. } => "BACKEND",
            Self::Config(_) => "CONFIG",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Sizing(_) => 2,
            Self::Capacity(_) => 3,
            Self::Backend { .. } => 4,
            Self::Config(_) => 5,
        }
    }
}

pub type PlanResult<T> = std::result::Result<T, PlanError>;
