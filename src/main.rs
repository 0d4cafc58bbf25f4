//! wallpaper-archive: daily wallpaper archive gallery.
//!
//! Serves the archive as an HTML gallery plus a JSON API.

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use wallpaper_archive::{Args, Config, GalleryServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Parse command-line arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug {
        Level::DEBUG
    } else if args.silent {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::from(args);
    let server = GalleryServer::new(config);

    println!(
        r#"
Wallpaper archive gallery is starting at {}

Open {}/ in a browser, or query {}/api/gallery for JSON.

Press Ctrl+C to stop the server.
"#,
        server.bind_address(),
        server.base_url(),
        server.base_url()
    );

    server.run().await
}
