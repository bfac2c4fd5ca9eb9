//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};
use kiroswitch::build_info;

/// Account and token manager for the Kiro IDE cloud-auth subsystem.
#[derive(Debug, Parser)]
#[command(name = "kiroswitch", version = Box::leak(build_info::cli_version_text().into_boxed_str()) as &'static str)]
pub struct Args {
    /// Path to config file (default: ./kiroswitch.toml or
    /// ~/.config/kiroswitch/kiroswitch.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Overview: token counts, active account, resolved paths.
    Status,
    /// List stored accounts.
    List,
    /// Make an account the one the IDE uses.
    Switch {
        /// Account name, token file name, or a fragment of either.
        name: String,
        /// Refresh before activating even if the token is still live.
        #[arg(long = "force-refresh")]
        force_refresh: bool,
    },
    /// Refresh an account's access token.
    Refresh { name: String },
    /// Delete an account's token file.
    Delete { name: String },
    /// Delete every expired token file.
    Clean,
    /// Mint a new account via the device-authorization flow.
    Login {
        /// Account name for the new record.
        #[arg(long, default_value = "auto")]
        name: String,
        /// Print the verification URL instead of opening a browser.
        #[arg(long = "no-browser")]
        no_browser: bool,
    },
    /// Show usage quota for the active account, one account, or all.
    Quota {
        /// Account to query; the active account when omitted.
        name: Option<String>,
        /// Query every stored account.
        #[arg(long, conflicts_with = "name")]
        all: bool,
    },
    /// Import an SSO session cookie as a new account.
    ImportSso {
        /// SSO session cookie value.
        #[arg(long)]
        cookie: String,
        #[arg(long, default_value = "imported")]
        name: String,
        /// Region override for the exchange.
        #[arg(long)]
        region: Option<String>,
    },
    /// Run a registration attempt (device flow under the attempt slot).
    Register {
        #[arg(long, default_value = "auto")]
        name: String,
        /// Spoof-profile seed; random when omitted.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the composed fingerprint-spoof script for a profile.
    SpoofScript {
        /// Profile seed; the fixed baseline profile when omitted.
        #[arg(long)]
        seed: Option<u64>,
        /// GPU profile key (e.g. nvidia_rtx_3060).
        #[arg(long)]
        gpu: Option<String>,
        /// Location preset key (e.g. new_york, london).
        #[arg(long)]
        location: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::{Args, Command};
    use clap::Parser;

    #[test]
    fn switch_parses_force_refresh() {
        let args = Args::parse_from(["kiroswitch", "switch", "work", "--force-refresh"]);
        match args.command {
            Command::Switch {
                name,
                force_refresh,
            } => {
                assert_eq!(name, "work");
                assert!(force_refresh);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn quota_all_conflicts_with_name() {
        assert!(Args::try_parse_from(["kiroswitch", "quota", "work", "--all"]).is_err());
        assert!(Args::try_parse_from(["kiroswitch", "quota", "--all"]).is_ok());
    }

    #[test]
    fn spoof_script_accepts_profile_knobs() {
        let args = Args::parse_from([
            "kiroswitch",
            "spoof-script",
            "--seed",
            "7",
            "--gpu",
            "amd_rx_580",
        ]);
        match args.command {
            Command::SpoofScript { seed, gpu, .. } => {
                assert_eq!(seed, Some(7));
                assert_eq!(gpu.as_deref(), Some("amd_rx_580"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn login_defaults_account_name() {
        let args = Args::parse_from(["kiroswitch", "login"]);
        match args.command {
            Command::Login { name, no_browser } => {
                assert_eq!(name, "auto");
                assert!(!no_browser);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
