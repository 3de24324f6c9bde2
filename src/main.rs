/*
 * Responsibility
 * - tokio runtime entry point
 * - app::run() only (no logic here)
 */
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    bearer_gate::app::run().await
}
