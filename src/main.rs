use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    gitea_release::run().await
}
