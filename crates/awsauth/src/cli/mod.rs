//! CLI structure and command definitions

use clap::{Parser, Subcommand};

/// Inspect which AWS credentials and account a process would use
#[derive(Parser, Debug)]
#[command(name = "awsauth")]
#[command(
    version,
    about = "Inspect which AWS credentials and account a process would use"
)]
#[command(long_about = "
Inspect which AWS credentials and account a process would use

Credentials are picked by precedence: static keys from the config file,
then AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY, then the shared credentials
file, then the EC2 instance role.

EXAMPLES:
    # Show the selected provider, account and partition
    awsauth whoami

    # Use a named profile from ~/.aws/credentials
    awsauth --profile ci whoami

    # Point the instance metadata lookups at a local test double
    awsauth --metadata-url http://127.0.0.1:1338 credentials

    # Parse an ARN
    awsauth arn arn:aws-us-gov:iam::123456789012:role/deploy -o json

For more help on a specific command, run:
    awsauth <command> --help
")]
pub struct Cli {
    /// Path to alternate configuration file
    #[arg(long, global = true, env = "AWSAUTH_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Shared credentials profile to use
    #[arg(long, short, global = true)]
    pub profile: Option<String>,

    /// Region for the IAM and STS clients
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Path to the shared credentials file
    #[arg(long, global = true)]
    pub shared_credentials_file: Option<String>,

    /// Instance metadata base URL
    #[arg(long, global = true)]
    pub metadata_url: Option<String>,

    /// Never contact the instance metadata service
    #[arg(long, global = true)]
    pub skip_metadata_api_check: bool,

    /// Overall deadline for account discovery, in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    pub identity_timeout: Option<u64>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table
    Text,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Establish a session and show provider, account and partition
    #[command(after_help = "EXAMPLES:
    awsauth whoami
    awsauth whoami -o json
    awsauth --identity-timeout 10 whoami
")]
    Whoami {
        /// Skip the account lookup and infer the partition from the region
        #[arg(long)]
        skip_account_lookup: bool,
    },

    /// Show the selected credential source and masked access key
    Credentials,

    /// Parse an ARN and print its fields
    #[command(after_help = "EXAMPLES:
    awsauth arn arn:aws:iam::123456789012:user/Bob
    awsauth arn arn:aws-cn:sts::123456789012:assumed-role/app/session -o yaml
")]
    Arn {
        /// The ARN to parse
        arn: String,
    },

    /// Version information
    #[command(visible_alias = "ver")]
    Version,
}
