//! Integration tests for the calculator peripheral firmware.
//!
//! Run after flashing the firmware. The service UUID is random per boot and
//! printed in the firmware log ("BLE: Service ...").

mod ble_client;
mod tests;

use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use uuid::Uuid;

use ble_client::CalcClient;
use tests::{print_results, run_all_tests};

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Integration tests for the calculator peripheral firmware")]
struct Args {
    /// Service UUID the device is advertising
    #[arg(short, long)]
    service: Uuid,

    /// BLE scan timeout in seconds
    #[arg(long, default_value = "10")]
    scan_timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("{}", "Calculator Peripheral Integration Tests".bold());
    println!("Service: {}", args.service);
    println!();

    println!("Scanning...");
    let client = CalcClient::connect_by_service(args.service, Duration::from_secs(args.scan_timeout)).await?;
    println!("{}", "Connected!".green());

    println!("\nRunning tests...\n");

    let results = run_all_tests(&client).await;
    print_results(&results);

    client.disconnect().await?;

    // Exit with error code if any tests failed
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
