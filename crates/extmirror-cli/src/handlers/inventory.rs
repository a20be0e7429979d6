//! Inventory handler.

use extmirror_download::{InventoryReport, scan_inventory};

use crate::commands::InventoryCommand;
use crate::error::CliError;
use crate::presentation::format_inventory;

/// Print what the download directory holds.
///
/// Fails with [`CliError::Inconsistent`] when stale records, unrecorded
/// artifacts or unreadable sidecars were found.
pub async fn execute(cmd: &InventoryCommand) -> Result<InventoryReport, CliError> {
    let report = scan_inventory(&cmd.target_dir, cmd.flatten).await?;
    print!("{}", format_inventory(&report, &cmd.target_dir));

    if report.is_consistent() {
        Ok(report)
    } else {
        Err(CliError::Inconsistent)
    }
}
