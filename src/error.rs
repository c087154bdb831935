//! Error taxonomy shared by the classifiers, the composer and the adapters.

use serde::Serialize;
use thiserror::Error;

/// Pipeline stage that failed inside a composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    BasePrice,
    Location,
    Urgency,
    Slot,
    Package,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::BasePrice => "base price",
            Stage::Location => "location",
            Stage::Urgency => "urgency",
            Stage::Slot => "slot",
            Stage::Package => "package",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PricingError {
    /// Missing or malformed caller input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// An external collaborator could not answer.
    #[error("lookup unavailable: {0}")]
    LookupUnavailable(String),
    #[error("{stage} stage failed: {source}")]
    DependencyFailure {
        stage: Stage,
        #[source]
        source: Box<PricingError>,
    },
}

impl PricingError {
    pub fn invalid(message: impl Into<String>) -> Self {
        PricingError::InvalidInput(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        PricingError::LookupUnavailable(message.into())
    }

    pub(crate) fn at(stage: Stage) -> impl FnOnce(PricingError) -> PricingError {
        move |source| PricingError::DependencyFailure {
            stage,
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through stage wrappers.
    pub fn root_cause(&self) -> &PricingError {
        match self {
            PricingError::DependencyFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Stage that aborted the composition, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PricingError::DependencyFailure { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PricingError {
    fn from(err: reqwest::Error) -> Self {
        PricingError::LookupUnavailable(format!("http request failed: {err}"))
    }
}

impl From<csv::Error> for PricingError {
    fn from(err: csv::Error) -> Self {
        PricingError::LookupUnavailable(format!("malformed sheet export: {err}"))
    }
}
