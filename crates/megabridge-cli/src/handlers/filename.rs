//! Filename command handler.

use megabridge_runtime::Megatools;

use crate::error::CliError;

/// Print the name of the file behind `url` without downloading it.
pub async fn execute(megatools: &Megatools, url: &str) -> Result<(), CliError> {
    let name = megatools.filename_async(url).await?;
    println!("{name}");
    Ok(())
}
