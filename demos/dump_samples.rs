// Dump the most recent stored samples as JSON.
//
// Usage: cargo run --example dump_samples -- [DB_PATH] [LIMIT] [UTC_OFFSET_MINUTES]
//   DB_PATH             default: ./data/hostmon.db
//   LIMIT               default: 5
//   UTC_OFFSET_MINUTES  default: 0

use chrono::FixedOffset;
use hostmon::sample_repo::SampleRepo;
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let path = args.get(1).map(String::as_str).unwrap_or("./data/hostmon.db");
    let limit: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(5);
    let offset_minutes: i32 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0);
    let offset = FixedOffset::east_opt(offset_minutes * 60)
        .ok_or_else(|| anyhow::anyhow!("utc offset out of range: {} minutes", offset_minutes))?;

    let repo = SampleRepo::connect(path, offset, Duration::from_secs(5)).await?;
    let samples = repo.recent(limit).await?;
    repo.close().await;

    println!("{}", serde_json::to_string_pretty(&samples)?);
    Ok(())
}
