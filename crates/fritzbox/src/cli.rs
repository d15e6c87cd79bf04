//! Clap derive structures for the `fritzbox` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fritzbox -- control FRITZ!Box smart-home devices
#[derive(Debug, Parser)]
#[command(
    name = "fritzbox",
    version,
    about = "Control FRITZ!Box smart-home devices from the command line",
    long_about = "Switch outlets, read temperatures and set thermostats through the\n\
        FRITZ!Box home automation interface.\n\n\
        Logs in with the box's challenge-response scheme and renews the\n\
        session transparently when it expires.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Box profile to use
    #[arg(long, short = 'p', env = "FRITZBOX_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Box host or URL (overrides profile)
    #[arg(long, short = 'H', env = "FRITZBOX_HOST", global = true)]
    pub host: Option<String>,

    /// Username (overrides profile)
    #[arg(long, short = 'u', env = "FRITZBOX_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FRITZBOX_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Verify the box's TLS certificate
    #[arg(long, env = "FRITZBOX_STRICT_TLS", global = true)]
    pub strict_tls: bool,

    /// Request timeout in seconds
    #[arg(long, env = "FRITZBOX_TIMEOUT", default_value = "30", global = true)]
    pub timeout: u64,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the configured credentials are accepted
    Login,

    /// List and inspect smart-home devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Switch an outlet on or off
    #[command(alias = "sw")]
    Switch(SwitchArgs),

    /// Read temperatures and set thermostat targets
    #[command(alias = "t")]
    Temp(TempArgs),

    /// Run a raw operation by name (e.g. getSwitchState)
    Call(CallArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices known to the box
    #[command(alias = "ls")]
    List {
        /// Only devices with this capability (repeatable, all must match)
        #[arg(long, short = 'c')]
        capability: Vec<String>,
    },

    /// Show one device
    Get {
        /// Device AIN (spaces optional)
        ain: String,
    },
}

// ── Switch ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SwitchArgs {
    /// Outlet AIN (spaces optional)
    pub ain: String,

    #[command(subcommand)]
    pub command: SwitchCommand,
}

#[derive(Debug, Subcommand)]
pub enum SwitchCommand {
    /// Switch the outlet on
    On,
    /// Switch the outlet off
    Off,
    /// Show the current relay state
    State,
}

// ── Temperature ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TempArgs {
    /// Device AIN (spaces optional)
    pub ain: String,

    #[command(subcommand)]
    pub command: TempCommand,
}

#[derive(Debug, Subcommand)]
pub enum TempCommand {
    /// Measured temperature
    Get,
    /// Thermostat target temperature
    Target,
    /// Set the thermostat target (°C, 8-28 in 0.5 steps, or "on"/"off")
    Set {
        /// Target value
        value: String,
    },
}

// ── Raw call ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CallArgs {
    /// Operation name (getDeviceList, getSwitchState, setSwitchOn, ...)
    pub action: String,

    /// Device AIN, for device operations
    pub ain: Option<String>,

    /// Operation payload (setTempTarget: °C)
    pub payload: Option<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Display current configuration (secrets masked)
    Show,

    /// List configured profiles (* marks the default)
    Profiles,

    /// Make a profile the default
    Use {
        /// Profile name
        name: String,
    },

    /// Store the profile's password in the system keyring (read from stdin)
    SetPassword,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
