//! CLI argument parsing.

use clap::{Args, Parser, Subcommand};
use solx_core::EnvVars;
use std::path::PathBuf;

use crate::styles::STYLES;

/// solx - Solidity compiler version manager
#[derive(Parser, Debug)]
#[command(name = "solx")]
#[command(author, version, about = "Install and invoke solc compiler versions")]
#[command(long_about = None)]
#[command(propagate_version = true)]
#[command(styles = STYLES)]
#[command(after_help = "Use `solx help <command>` for more information about a command.")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true, env = EnvVars::SOLX_VERBOSE)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Install root for solc binaries (defaults to ~/.solx)
    #[arg(long, global = true, env = EnvVars::SOLX_BINARY_PATH)]
    pub solc_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a solc version (exact version or pragma expression)
    Install {
        /// Version to install, e.g. `0.8.21` or `^0.8.0`
        // Not named `version`: that id belongs to the propagated
        // `--version` flag.
        #[arg(value_name = "VERSION")]
        version_or_pragma: String,

        /// Allow building 0.4.x from source on macOS
        #[arg(long)]
        allow_build: bool,

        /// Disable the download progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// List solc versions
    Versions {
        /// Only list installed versions
        #[arg(long)]
        installed: bool,
    },

    /// Resolve a pragma expression to the best matching version
    Resolve {
        /// Pragma expression, e.g. `>=0.4.22 <0.9.0`
        pragma: String,

        /// Resolve against installed versions instead of available ones
        #[arg(long)]
        installed: bool,
    },

    /// Compile Solidity sources
    Compile {
        /// Source files (omit to read source from stdin)
        files: Vec<PathBuf>,

        /// solc version or pragma to compile with (defaults to the
        /// newest installed version)
        #[arg(long = "use", value_name = "VERSION")]
        use_version: Option<String>,

        /// Compile a standard-JSON input document instead of sources
        #[arg(long, conflicts_with_all = ["optimize", "optimize_runs", "remap", "output_values"])]
        standard_json: bool,

        /// Enable the optimizer
        #[arg(long)]
        optimize: bool,

        /// Optimizer run count (implies --optimize)
        #[arg(long, value_name = "N")]
        optimize_runs: Option<u32>,

        /// Import remapping (`prefix=path`), repeatable
        #[arg(long = "remap", value_name = "MAPPING")]
        remap: Vec<String>,

        /// Comma-separated artifact kinds to request
        #[arg(long, value_name = "KINDS")]
        output_values: Option<String>,

        /// Accept output with no contracts
        #[arg(long)]
        allow_empty: bool,

        /// Report when a newer release satisfies the `--use` pragma
        #[arg(long, requires = "use_version")]
        check_new: bool,
    },

    /// Link placeholder library references in unlinked bytecode
    Link {
        /// File with unlinked bytecode (omit to read from stdin)
        file: Option<PathBuf>,

        /// Library address (`name=address`), repeatable
        #[arg(short = 'l', long = "library", value_name = "NAME=ADDRESS", required = true)]
        libraries: Vec<String>,

        /// solc version or pragma to link with
        #[arg(long = "use", value_name = "VERSION")]
        use_version: Option<String>,
    },

    /// Import solc binaries already installed on the system
    Import,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_install_args() {
        let cli = Cli::parse_from(["solx", "install", "^0.8.0", "--allow-build"]);
        match cli.command {
            Commands::Install {
                version_or_pragma,
                allow_build,
                no_progress,
            } => {
                assert_eq!(version_or_pragma, "^0.8.0");
                assert!(allow_build);
                assert!(!no_progress);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_install_coexists_with_version_flag() {
        // The propagated --version flag must not clash with the
        // positional version argument
        let cli = Cli::try_parse_from(["solx", "install", "0.8.21"]).unwrap();
        assert!(matches!(cli.command, Commands::Install { .. }));
    }

    #[test]
    fn test_compile_args() {
        let cli = Cli::parse_from([
            "solx",
            "compile",
            "--use",
            "0.8.21",
            "--optimize-runs",
            "200",
            "--remap",
            "@oz=node_modules/@openzeppelin",
            "a.sol",
        ]);
        match cli.command {
            Commands::Compile {
                files,
                use_version,
                optimize_runs,
                remap,
                ..
            } => {
                assert_eq!(files, vec![PathBuf::from("a.sol")]);
                assert_eq!(use_version.as_deref(), Some("0.8.21"));
                assert_eq!(optimize_runs, Some(200));
                assert_eq!(remap, vec!["@oz=node_modules/@openzeppelin"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_link_requires_library() {
        assert!(Cli::try_parse_from(["solx", "link", "code.bin"]).is_err());
    }
}
