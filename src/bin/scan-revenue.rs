use anyhow::Result;

#[tokio::main]
pub async fn main() -> Result<()> {
    hub_revenue_backend::start_scan().await
}
