#[tokio::main]
async fn main() -> anyhow::Result<()> {
    residency_backend::run().await
}
