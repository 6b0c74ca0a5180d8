use thiserror::Error;

use crate::api::ApiError;
use crate::user_config::UserConfigError;
use tfplug::{TfplugError, WaitError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{0}")]
    Wait(#[from] WaitError<ApiError>),

    #[error("user config: {0}")]
    UserConfig(#[from] UserConfigError),

    #[error("invalid resource ID {id:?}, expected {expected} components separated by '/'")]
    InvalidResourceId { id: String, expected: usize },

    #[error(transparent)]
    Sdk(#[from] TfplugError),
}

impl Error {
    /// True when the remote object is gone
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Api(e) => e.is_not_found(),
            Error::Wait(WaitError::Refresh(e)) => e.is_not_found(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_looks_through_wait_errors() {
        let api = || ApiError::Api {
            status: 404,
            message: "not found".into(),
            more_info: None,
        };
        assert!(Error::from(api()).is_not_found());
        assert!(Error::from(WaitError::Refresh(api())).is_not_found());
        assert!(!Error::from(WaitError::<ApiError>::Cancelled).is_not_found());
    }

    #[test]
    fn sdk_errors_convert() {
        let err: Error = TfplugError::AttributeNotSet("project".into()).into();
        assert!(matches!(err, Error::Sdk(_)));
        assert!(!err.is_not_found());
    }
}
