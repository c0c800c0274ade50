//! Integration test cases.

use std::future::Future;
use std::time::Duration;

use colored::Colorize;

use crate::ble_client::CalcClient;

/// How long to wait for a notification
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Test result.
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub message: Option<String>,
}

impl TestResult {
    fn pass() -> Self {
        Self {
            name: String::new(),
            passed: true,
            message: None,
        }
    }

    fn fail(message: &str) -> Self {
        Self {
            name: String::new(),
            passed: false,
            message: Some(message.to_string()),
        }
    }
}

/// Run a test and print its result as it happens.
async fn run_test<'a, F, Fut>(name: &str, client: &'a CalcClient, test_fn: F) -> TestResult
where
    F: FnOnce(&'a CalcClient) -> Fut,
    Fut: Future<Output = TestResult>,
{
    print!("  {} ... ", name);
    std::io::Write::flush(&mut std::io::stdout()).ok();

    let mut result = test_fn(client).await;
    result.name = name.to_string();

    if result.passed {
        println!("{}", "PASS".green().bold());
    } else {
        println!("{}", "FAIL".red().bold());
        if let Some(msg) = &result.message {
            println!("    {}", msg.red());
        }
    }

    result
}

/// Run all tests and return results.
pub async fn run_all_tests(client: &CalcClient) -> Vec<TestResult> {
    let mut results = Vec::new();

    results.push(run_test("Multiplication notifies result", client, test_multiplication).await);
    results.push(run_test("Division by zero notifies ERROR", client, test_division_by_zero).await);
    results.push(run_test("Malformed input notifies ERROR", client, test_malformed).await);
    results.push(run_test("Chained operators notify ERROR", client, test_chained).await);
    results.push(run_test("Read returns last result", client, test_read_last_result).await);
    results.push(run_test("Write characteristic is not readable", client, test_write_not_readable).await);
    results.push(run_test("Repeated writes all answered", client, test_repeated).await);

    results
}

/// Print test results summary.
pub fn print_results(results: &[TestResult]) {
    println!("\n{}", "=".repeat(60));
    println!("{}", "Test Results".bold());
    println!("{}", "=".repeat(60));

    let mut passed = 0;
    let mut failed = 0;

    for result in results {
        if result.passed {
            println!("  {} {}", "[PASS]".green().bold(), result.name);
            passed += 1;
        } else {
            println!("  {} {}", "[FAIL]".red().bold(), result.name);
            if let Some(msg) = &result.message {
                println!("         {}", msg.red());
            }
            failed += 1;
        }
    }

    println!("{}", "-".repeat(60));
    println!(
        "  Total: {} passed, {} failed",
        passed.to_string().green(),
        if failed > 0 {
            failed.to_string().red()
        } else {
            failed.to_string().normal()
        }
    );
    println!("{}", "=".repeat(60));
}

/// Write `expression` and compare the notified value
async fn expect_result(client: &CalcClient, expression: &str, expected: &str) -> TestResult {
    match client.evaluate(expression.as_bytes(), RESPONSE_TIMEOUT).await {
        Ok(value) if value == expected => TestResult::pass(),
        Ok(value) => TestResult::fail(&format!(
            "{:?}: expected {:?}, got {:?}",
            expression, expected, value
        )),
        Err(e) => TestResult::fail(&format!("{:?}: {}", expression, e)),
    }
}

// --- Individual Tests ---

async fn test_multiplication(client: &CalcClient) -> TestResult {
    expect_result(client, "12*4", "48").await
}

async fn test_division_by_zero(client: &CalcClient) -> TestResult {
    // The write itself must still be acknowledged with success
    expect_result(client, "9/0", "ERROR").await
}

async fn test_malformed(client: &CalcClient) -> TestResult {
    for expression in ["abc", "3+", ""] {
        let result = expect_result(client, expression, "ERROR").await;
        if !result.passed {
            return result;
        }
    }
    TestResult::pass()
}

async fn test_chained(client: &CalcClient) -> TestResult {
    expect_result(client, "7-2+1", "ERROR").await
}

async fn test_read_last_result(client: &CalcClient) -> TestResult {
    let result = expect_result(client, "100-1", "99").await;
    if !result.passed {
        return result;
    }

    match client.read_result().await {
        Ok(value) if value == "99" => TestResult::pass(),
        Ok(value) => TestResult::fail(&format!("Expected \"99\", got {:?}", value)),
        Err(e) => TestResult::fail(&format!("Error: {}", e)),
    }
}

async fn test_write_not_readable(client: &CalcClient) -> TestResult {
    match client.read_write_characteristic().await {
        Ok(value) => TestResult::fail(&format!("Read succeeded with {:?}", value)),
        Err(_) => TestResult::pass(),
    }
}

async fn test_repeated(client: &CalcClient) -> TestResult {
    for i in 1..=10 {
        let expression = format!("{}*{}", i, i);
        let result = expect_result(client, &expression, &(i * i).to_string()).await;
        if !result.passed {
            return result;
        }
    }
    TestResult::pass()
}
