//! Failures that end a run with a dedicated process exit code.

use thiserror::Error;

/// Exit code used for errors that are not a [`SkadError`].
pub const UNEXPECTED_EXIT_CODE: u8 = 13;

/// A user-facing failure. The message is printed as is; [`SkadError::exit_code`]
/// becomes the process exit status.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkadError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    InvalidPlist(String),
    #[error("{0}")]
    InvalidPodFile(String),
    #[error("{0}")]
    EmptyPodFile(String),
    #[error("{0}")]
    EmptyNetworkList(String),
    #[error("{0}")]
    InvalidNetworks(String),
    #[error("{0}")]
    ServerUnavailable(String),
    #[error("{0}")]
    RemoteApiFailure(String),
    #[error("{0}")]
    NotAFile(String),
    #[error("{0}")]
    Oops(String),
}

impl SkadError {
    pub fn exit_code(&self) -> u8 {
        match self {
            SkadError::InvalidArguments(_) => 1,
            SkadError::InvalidPlist(_) => 2,
            SkadError::InvalidPodFile(_) => 3,
            SkadError::EmptyPodFile(_) => 4,
            SkadError::EmptyNetworkList(_) => 5,
            SkadError::InvalidNetworks(_) => 6,
            SkadError::ServerUnavailable(_) => 7,
            SkadError::RemoteApiFailure(_) => 8,
            SkadError::NotAFile(_) => 9,
            SkadError::Oops(_) => UNEXPECTED_EXIT_CODE,
        }
    }
}

/// Picks the exit code for any error bubbling out of a command.
pub fn exit_code_of(error: &anyhow::Error) -> u8 {
    error
        .downcast_ref::<SkadError>()
        .map(SkadError::exit_code)
        .unwrap_or(UNEXPECTED_EXIT_CODE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            SkadError::InvalidArguments(String::new()),
            SkadError::InvalidPlist(String::new()),
            SkadError::InvalidPodFile(String::new()),
            SkadError::EmptyPodFile(String::new()),
            SkadError::EmptyNetworkList(String::new()),
            SkadError::InvalidNetworks(String::new()),
            SkadError::ServerUnavailable(String::new()),
            SkadError::RemoteApiFailure(String::new()),
            SkadError::NotAFile(String::new()),
            SkadError::Oops(String::new()),
        ];
        let codes: Vec<u8> = errors.iter().map(SkadError::exit_code).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 13]);
    }

    #[test]
    fn test_display_is_the_bare_message() {
        let err = SkadError::EmptyPodFile("No supported networks found in your Podfile".into());
        assert_eq!(err.to_string(), "No supported networks found in your Podfile");
    }

    #[test]
    fn test_exit_code_of_downcasts_through_anyhow() {
        let err = anyhow::Error::from(SkadError::NotAFile("nope".into()));
        assert_eq!(exit_code_of(&err), 9);

        let err = anyhow::Error::from(SkadError::NotAFile("nope".into())).context("while loading");
        assert_eq!(exit_code_of(&err), 9);
    }

    #[test]
    fn test_exit_code_of_unexpected_error() {
        let err = anyhow::anyhow!("disk on fire");
        assert_eq!(exit_code_of(&err), UNEXPECTED_EXIT_CODE);
    }
}
