#[tokio::main]
async fn main() -> std::io::Result<()> {
    rhythm_server::run_with_config().await
}
