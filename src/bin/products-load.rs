use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use clap::Parser;

#[derive(Parser)]
#[command(name = "products-load")]
#[command(about = "Fire concurrent requests at the products service", long_about = None)]
struct Cli {
    /// Endpoint to hit.
    #[arg(short, long, default_value = "http://localhost:8883/products")]
    url: String,

    /// Total number of requests.
    #[arg(short = 'n', long, default_value_t = 20)]
    requests: usize,

    /// Concurrent workers.
    #[arg(short, long, default_value_t = 5)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let concurrency = cli.concurrency.max(1);
    let client = reqwest::Client::builder().no_proxy().build()?;
    let start = Instant::now();

    let mut tasks = Vec::new();
    for worker in 0..concurrency {
        let client = client.clone();
        let url = cli.url.clone();
        // Spread the remainder over the first workers.
        let share = cli.requests / concurrency + usize::from(worker < cli.requests % concurrency);
        tasks.push(tokio::spawn(async move {
            let mut results = Vec::with_capacity(share);
            for _ in 0..share {
                let req_start = Instant::now();
                let outcome = match client.get(&url).send().await {
                    Ok(res) => res.status().as_u16().to_string(),
                    Err(e) if e.is_timeout() => "timeout".to_string(),
                    Err(_) => "error".to_string(),
                };
                results.push((outcome, req_start.elapsed()));
            }
            results
        }));
    }

    let mut outcomes: BTreeMap<String, usize> = BTreeMap::new();
    let mut latencies: Vec<Duration> = Vec::new();
    for task in tasks {
        for (outcome, latency) in task.await? {
            *outcomes.entry(outcome).or_default() += 1;
            latencies.push(latency);
        }
    }

    println!("\n--- Load Results ---");
    println!("Target:         {}", cli.url);
    println!("Requests:       {}", latencies.len());
    println!("Concurrency:    {}", concurrency);
    println!("Total Duration: {:?}", start.elapsed());
    for (outcome, count) in &outcomes {
        println!("  {:<12}  {}", outcome, count);
    }

    if !latencies.is_empty() {
        latencies.sort();
        let pick = |q: f64| latencies[((latencies.len() - 1) as f64 * q) as usize];
        println!("P50 Latency:    {:?}", pick(0.50));
        println!("P95 Latency:    {:?}", pick(0.95));
        println!("P99 Latency:    {:?}", pick(0.99));
    }
    println!("--------------------\n");

    Ok(())
}
