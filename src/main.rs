use clap::{CommandFactory, Parser, error::ErrorKind};
use log::{error, info};
use skad_updater::{
    VERSION, commands,
    error::{SkadError, exit_code_of},
    options::Arguments,
    runtime::{RealRuntime, Runtime},
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

/// Switches this crate's logging to debug level when set.
const DEBUG_LOG_ENV: &str = "FYBER_SKAD_DEBUG_LOG";

/// Automatically update your SKAdNetwork Items
///
/// Reads the SKAdNetworkItems of an Info.plist, asks the network setup service
/// for the SKAdNetwork identifiers of the networks used by your Podfile (or
/// named with --network_list) and adds the missing ones. The previous file is
/// kept as Info.plist.bak.<N>.
///
/// The service URL can be overridden with FYBER_SKAD_NETWORKS_SERVER_HOST.
/// Set FYBER_SKAD_DEBUG_LOG to enable debug logs.
///
/// Examples:
///   skad_updater --plist_file_path Info.plist --pod_file_path Podfile --dry_run
///   skad_updater --plist_file_path Info.plist --network_list AdColony,Applovin
#[derive(Parser, Debug)]
#[command(name = "skad_updater", version = VERSION)]
struct Cli {
    /// Path to the Info.plist file to update
    #[arg(long = "plist_file_path", value_name = "PATH")]
    pub plist_file_path: Option<PathBuf>,

    /// Comma separated list of networks to add, e.g. AdColony,Applovin
    #[arg(long = "network_list", value_name = "NETWORKS")]
    pub network_list: Option<String>,

    /// Path to the Podfile to read the networks from
    #[arg(long = "pod_file_path", value_name = "PATH")]
    pub pod_file_path: Option<PathBuf>,

    /// Print the new SKAdNetwork identifiers without changing the Info.plist
    #[arg(long = "dry_run")]
    pub dry_run: bool,

    /// Print the names of the supported networks and exit
    #[arg(long = "show_networks")]
    pub show_networks: bool,

    /// Network setup service URL (defaults to https://network-setup.fyber.com)
    #[arg(long = "api_url", value_name = "URL")]
    pub api_url: Option<String>,
}

impl From<Cli> for Arguments {
    fn from(cli: Cli) -> Self {
        Arguments {
            plist_file_path: cli.plist_file_path,
            network_list: cli.network_list,
            pod_file_path: cli.pod_file_path,
            dry_run: cli.dry_run,
            show_networks: cli.show_networks,
        }
    }
}

fn init_logging<R: Runtime>(runtime: &R) {
    let level = if runtime.env_var(DEBUG_LOG_ENV).is_ok() {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(format!("warn,skad_updater={}", level)),
    )
    .target(env_logger::Target::Stdout)
    .format(|buf, record| writeln!(buf, "*** {}", record.args()))
    .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let runtime = RealRuntime;
    init_logging(&runtime);
    info!("Welcome to SKAd Updater ( version {} )", VERSION);

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let err = SkadError::InvalidArguments(e.render().to_string().trim_end().to_string());
            error!("{}", err);
            return ExitCode::from(err.exit_code());
        }
    };

    let api_url = cli.api_url.clone();
    let usage = Cli::command().render_help().to_string();

    let result = match Arguments::from(cli).into_action(&usage) {
        Ok(action) => commands::execute(runtime, action, api_url).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code_of(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_update_parsing() {
        let cli = Cli::try_parse_from([
            "skad_updater",
            "--plist_file_path",
            "Info.plist",
            "--network_list=AdColony,Applovin",
            "--dry_run",
        ])
        .unwrap();

        assert_eq!(cli.plist_file_path, Some(PathBuf::from("Info.plist")));
        assert_eq!(cli.network_list.as_deref(), Some("AdColony,Applovin"));
        assert_eq!(cli.pod_file_path, None);
        assert!(cli.dry_run);
        assert!(!cli.show_networks);
    }

    #[test]
    fn test_cli_pod_file_parsing() {
        let cli = Cli::try_parse_from([
            "skad_updater",
            "--plist_file_path",
            "Info.plist",
            "--pod_file_path=Podfile",
        ])
        .unwrap();
        assert_eq!(cli.pod_file_path, Some(PathBuf::from("Podfile")));
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_api_url_parsing() {
        let cli = Cli::try_parse_from([
            "skad_updater",
            "--show_networks",
            "--api_url",
            "http://localhost:5000",
        ])
        .unwrap();
        assert!(cli.show_networks);
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:5000"));
    }

    #[test]
    fn test_cli_help_wins_over_other_flags() {
        let err = Cli::try_parse_from(["skad_updater", "--show_networks", "-h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_help_starts_with_about() {
        let help = Cli::command().render_help().to_string();
        assert!(help.starts_with("Automatically update your SKAdNetwork Items"));
    }

    #[test]
    fn test_cli_unknown_option_fails() {
        let result = Cli::try_parse_from(["skad_updater", "--unknown_param", "323"]);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_into_arguments() {
        let cli =
            Cli::try_parse_from(["skad_updater", "--plist_file_path", "Info.plist"]).unwrap();
        let args = Arguments::from(cli);
        assert!(args.into_action("usage").is_err());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
