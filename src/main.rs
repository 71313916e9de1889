#[tokio::main]
async fn main() -> anyhow::Result<()> {
    msp_gateway::cli::run_cli().await
}
