//! Generate static files

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::generator::Generator;
use crate::Blog;

/// Render every page from the published release into the public directory
pub async fn run(blog: &Blog) -> Result<()> {
    let start = Instant::now();

    let written = Generator::new(blog).generate().await?;

    let duration = start.elapsed();
    tracing::info!("Generated {} files in {:.2}s", written, duration.as_secs_f64());
    Ok(())
}

/// Regenerate on a fixed interval until interrupted
pub async fn watch(blog: &Blog, every: Duration) -> Result<()> {
    let mut ticker = tokio::time::interval(every);
    // the first tick completes immediately and the initial run already happened
    ticker.tick().await;

    tracing::info!(
        "Regenerating every {}s. Press Ctrl+C to stop.",
        every.as_secs()
    );

    loop {
        ticker.tick().await;
        tracing::info!("Revalidating...");
        if let Err(e) = run(blog).await {
            tracing::error!("Generation failed: {}", e);
        }
    }
}
