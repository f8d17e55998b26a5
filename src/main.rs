use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    vox_cli::run().await
}
