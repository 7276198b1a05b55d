//! Version command handler.

use megabridge_runtime::Megatools;

use crate::error::CliError;

pub async fn execute(megatools: &Megatools) -> Result<(), CliError> {
    let version = megatools.version_async().await?;
    println!("megabridge {}", env!("CARGO_PKG_VERSION"));
    println!("megatools  {version}");
    Ok(())
}
