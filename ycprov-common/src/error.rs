use std::fmt;
use thiserror::Error;

/// Remote step a provisioning run was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ResolveImage,
    Submit,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::ResolveImage => "resolve-image",
            Step::Submit => "submit",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// Bad environment, descriptor or key file. Raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("[resolve-image] no published image in family '{family}' (folder {folder_id}): {message}")]
    ImageNotFound {
        family: String,
        folder_id: String,
        message: String,
    },

    #[error("[{step}] authorization rejected: {message}")]
    Authorization { step: Step, message: String },

    #[error("[{step}] transport failure: {message}")]
    Transport { step: Step, message: String },

    #[error("[{step}] request rejected by provider: {message}")]
    RequestRejected { step: Step, message: String },
}

impl ProvisioningError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn transport(step: Step, message: impl Into<String>) -> Self {
        Self::Transport {
            step,
            message: message.into(),
        }
    }

    /// `None` for configuration errors, which happen before any step starts.
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Configuration(_) => None,
            Self::ImageNotFound { .. } => Some(Step::ResolveImage),
            Self::Authorization { step, .. }
            | Self::Transport { step, .. }
            | Self::RequestRejected { step, .. } => Some(*step),
        }
    }
}
