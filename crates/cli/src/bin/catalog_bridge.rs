use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    catalog_bridge_cli::main_entry().await
}
