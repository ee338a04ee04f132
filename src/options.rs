//! Validated command line options.

use std::path::PathBuf;

use crate::error::SkadError;

/// Command line values as parsed, before validation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Arguments {
    pub plist_file_path: Option<PathBuf>,
    pub network_list: Option<String>,
    pub pod_file_path: Option<PathBuf>,
    pub dry_run: bool,
    pub show_networks: bool,
}

/// What a run should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ShowNetworks,
    Update(UpdateOptions),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOptions {
    pub plist_file_path: PathBuf,
    pub pod_file_path: Option<PathBuf>,
    pub network_list: Option<Vec<String>>,
    pub dry_run: bool,
}

impl Arguments {
    /// Check the combination of flags. `usage` is appended to the error message
    /// so the user sees the help text along with what is missing.
    pub fn into_action(self, usage: &str) -> Result<Action, SkadError> {
        if self.show_networks {
            return Ok(Action::ShowNetworks);
        }

        let Some(plist_file_path) = self.plist_file_path else {
            return Err(SkadError::InvalidArguments(format!(
                "Missing required parameter `plist_file_path`.\n{}",
                usage
            )));
        };

        if self.network_list.is_none() && self.pod_file_path.is_none() {
            return Err(SkadError::InvalidArguments(format!(
                "At least one of the parameters `network_list` or `pod_file_path` is required.\n\n{}",
                usage
            )));
        }

        Ok(Action::Update(UpdateOptions {
            plist_file_path,
            pod_file_path: self.pod_file_path,
            network_list: self.network_list.as_deref().map(split_list),
            dry_run: self.dry_run,
        }))
    }
}

/// Split a comma separated list. Empty names between commas are kept, a
/// single trailing empty name is not, so `""` yields no names at all.
pub fn split_list(list: &str) -> Vec<String> {
    let mut names: Vec<String> = list.split(',').map(str::to_string).collect();
    if names.last().is_some_and(|name| name.is_empty()) {
        names.pop();
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    const USAGE: &str = "Usage: skad_updater [OPTIONS]";

    fn arguments() -> Arguments {
        Arguments {
            plist_file_path: Some(PathBuf::from("Info.plist")),
            network_list: Some("AdColony,Applovin".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_update_action() {
        let action = arguments().into_action(USAGE).unwrap();
        assert_eq!(
            action,
            Action::Update(UpdateOptions {
                plist_file_path: PathBuf::from("Info.plist"),
                pod_file_path: None,
                network_list: Some(vec!["AdColony".to_string(), "Applovin".to_string()]),
                dry_run: false,
            })
        );
    }

    #[test]
    fn test_show_networks_ignores_other_flags() {
        let args = Arguments {
            show_networks: true,
            plist_file_path: None,
            ..arguments()
        };
        assert_eq!(args.into_action(USAGE).unwrap(), Action::ShowNetworks);
    }

    #[test]
    fn test_missing_plist_file_path() {
        let args = Arguments {
            plist_file_path: None,
            ..arguments()
        };

        let err = args.into_action(USAGE).unwrap_err();

        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.to_string(),
            "Missing required parameter `plist_file_path`.\nUsage: skad_updater [OPTIONS]"
        );
    }

    #[test]
    fn test_missing_network_source() {
        let args = Arguments {
            network_list: None,
            pod_file_path: None,
            ..arguments()
        };

        let err = args.into_action(USAGE).unwrap_err();

        assert_eq!(
            err,
            SkadError::InvalidArguments(
                "At least one of the parameters `network_list` or `pod_file_path` is required.\n\nUsage: skad_updater [OPTIONS]"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_pod_file_alone_is_enough() {
        let args = Arguments {
            network_list: None,
            pod_file_path: Some(PathBuf::from("Podfile")),
            dry_run: true,
            ..arguments()
        };

        match args.into_action(USAGE).unwrap() {
            Action::Update(options) => {
                assert_eq!(options.pod_file_path, Some(PathBuf::from("Podfile")));
                assert_eq!(options.network_list, None);
                assert!(options.dry_run);
            }
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("AdColony"), vec!["AdColony"]);
        assert_eq!(split_list("A,B,"), vec!["A", "B"]);
        assert_eq!(split_list("A,,B"), vec!["A", "", "B"]);
        assert!(split_list("").is_empty());
    }
}
