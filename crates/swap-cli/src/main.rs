#[tokio::main]
async fn main() -> anyhow::Result<()> {
    swap_cli::start(std::env::args()).await
}
