use awsauth_core::Arn;
use tracing::debug;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::output;

pub fn handle_arn(arn: &str, output_format: OutputFormat) -> Result<()> {
    let parsed = Arn::parse(arn)?;
    debug!(partition = parsed.partition, account_id = parsed.account_id, "Parsed ARN");
    output::print_output(&parsed, output_format)?;
    Ok(())
}
