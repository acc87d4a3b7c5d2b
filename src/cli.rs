use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "panos-provider")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative resources for PAN-OS firewalls and Panorama", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Provider settings (default: ~/.config/panos-provider/config.toml)
    #[arg(long, global = true, env = "PANOS_PROVIDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Resource declarations
    #[arg(short, long, global = true, default_value = "panos.toml")]
    pub file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show resource and data source schemas
    Schema(SchemaArgs),

    /// Check declarations against schemas without contacting the device
    Validate,

    /// Show what apply would change
    Plan(PlanArgs),

    /// Make the device match the declarations
    Apply(ApplyArgs),

    /// Re-read stored resources from the device and update state
    Refresh,

    /// Adopt an existing device object into state
    Import {
        /// Resource type, e.g. panos_ldap_profile
        #[arg(value_name = "TYPE")]
        type_name: String,

        /// Address to record it under, e.g. panos_ldap_profile.corp
        address: String,

        /// Resource identifier, e.g. "::shared:corp-ldap"
        id: String,
    },

    /// Evaluate declared data sources
    Read(ReadArgs),

    /// Inspect or migrate stored state
    #[command(subcommand)]
    State(StateCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Schema
// ============================================================================

#[derive(Parser)]
pub struct SchemaArgs {
    /// Only this resource or data source type
    #[arg(value_name = "TYPE")]
    pub type_name: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = SchemaFormat::Text)]
    pub format: SchemaFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaFormat {
    Text,
    Json,
}

// ============================================================================
// Plan / Apply
// ============================================================================

#[derive(Parser)]
pub struct PlanArgs {
    /// Only changes to a resource type or a single address
    #[arg(short, long)]
    pub target: Option<String>,

    /// Number of parallel reads
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Only changes to a resource type or a single address
    #[arg(short, long)]
    pub target: Option<String>,

    /// Show the plan, change nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Apply without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Changes applied concurrently within one wave
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

// ============================================================================
// Read
// ============================================================================

#[derive(Parser)]
pub struct ReadArgs {
    /// Only this data address, e.g. data.panos_ldap_profiles.all
    pub address: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// State
// ============================================================================

#[derive(Subcommand)]
pub enum StateCommand {
    /// List stored resources
    Show {
        /// Only this address
        address: Option<String>,
    },

    /// Upgrade stored attributes to current schema versions
    Upgrade {
        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Forget a resource without touching the device
    Rm {
        /// Address to forget
        address: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_flags() {
        let cli = Cli::try_parse_from([
            "panos-provider",
            "-vv",
            "apply",
            "--yes",
            "--target",
            "panos_device_group",
            "-j",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.file, PathBuf::from("panos.toml"));
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert!(args.yes);
        assert!(!args.dry_run);
        assert_eq!(args.jobs, Some(2));
        assert_eq!(args.target.as_deref(), Some("panos_device_group"));
    }

    #[test]
    fn test_import_arguments() {
        let cli = Cli::try_parse_from([
            "panos-provider",
            "import",
            "panos_ldap_profile",
            "panos_ldap_profile.corp",
            "::shared:corp-ldap",
        ])
        .unwrap();
        let Command::Import {
            type_name,
            address,
            id,
        } = cli.command
        else {
            panic!("expected import");
        };
        assert_eq!(type_name, "panos_ldap_profile");
        assert_eq!(address, "panos_ldap_profile.corp");
        assert_eq!(id, "::shared:corp-ldap");
    }
}
