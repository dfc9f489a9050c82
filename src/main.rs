use hemmer_provider_commercetools::{init_logging, serve, CommercetoolsProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    serve(CommercetoolsProvider::new()).await
}
