// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Install the tracing subscriber (logs go to stderr)
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 1 = broken links, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use std::collections::BTreeMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, CrawlArgs};
use url_pager::checker::{self, LinkCheckResult, LinkChecker, LinkKind, LinkStatus};
use url_pager::crawl::site_crawler;
use url_pager::urldiff::{Bucket, FieldKey, FieldValue, UrlDiff};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info,url_pager=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// Returns:
//   Ok(0) = success
//   Ok(1) = broken links found
//   Err = anything else (exit code 2)
async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Diff { current, other, json } => handle_diff(&current, &other, json),
        Commands::Recognize { urls, page, json } => handle_recognize(&urls, page, json),
        Commands::Links { crawl, limit, json } => handle_links(&crawl, limit, json).await,
        Commands::Check { crawl, only, json } => handle_check(&crawl, only, json).await,
    }
}

fn handle_diff(current: &str, other: &str, json: bool) -> Result<i32> {
    let diff = UrlDiff::new(current, other);

    if json {
        println!("{}", serde_json::to_string_pretty(diff.partition())?);
        return Ok(0);
    }

    for (symbol, bucket) in [
        ("-", Bucket::Minus),
        ("+", Bucket::Plus),
        ("!", Bucket::NotEqual),
        ("=", Bucket::Equal),
    ] {
        for (key, value) in diff.partition().bucket(bucket) {
            println!("{} {:<20} {}", symbol, key.to_string(), format_value(value));
        }
    }
    Ok(0)
}

fn format_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Segment(segment) => segment.clone(),
        FieldValue::Params(values) => format!("[{}]", values.join(", ")),
    }
}

fn handle_recognize(urls: &[String], page: Option<i64>, json: bool) -> Result<i32> {
    let field = url_pager::recognize(urls).context("page recognition failed")?;
    let page_url = page.map(|n| field.page_url(n.into())).transpose()?;

    if json {
        let mut output = serde_json::to_value(field.record())?;
        if let Some(url) = &page_url {
            output["page_url"] = serde_json::Value::String(url.clone());
        }
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(0);
    }

    let kind = match field.key {
        FieldKey::PathIndex(_) => "path segment",
        FieldKey::QueryName(_) => "query parameter",
    };
    println!("Page field: {} ({})", field.key, kind);
    let values: Vec<String> = field.values.iter().map(|v| v.to_string()).collect();
    println!("Observed values: {}", values.join(", "));
    if let (Some(n), Some(url)) = (page, page_url) {
        println!("Page {}: {}", n, url);
    }

    // Show the basis URL the page URL is built from
    println!("Basis: {}", field.diff.unparse(&BTreeMap::new())?);
    Ok(0)
}

async fn handle_links(args: &CrawlArgs, limit: Option<usize>, json: bool) -> Result<i32> {
    let config = args.config();
    let mut crawler = site_crawler(&args.start_url, &config, args.pages.clone())?;

    let mut links = Box::pin(crawler.links().take(limit.unwrap_or(usize::MAX)));
    let mut count = 0;
    while let Some(link) = links.next().await {
        let link = link?;
        if json {
            println!("{}", serde_json::to_string(&link)?);
        } else {
            println!("{}", link.url);
        }
        count += 1;
    }

    tracing::info!(count, "links discovered");
    Ok(0)
}

async fn handle_check(args: &CrawlArgs, only: LinkKind, json: bool) -> Result<i32> {
    let config = args.config();
    let mut crawler = site_crawler(&args.start_url, &config, args.pages.clone())?;
    let mut link_checker = LinkChecker::new(&config)?;

    let results = checker::check_crawl(&mut crawler, &mut link_checker, only).await?;

    if results.is_empty() {
        println!("✅ No links found to check");
        return Ok(0);
    }

    print_results(&results, json)?;

    let broken_count = results.iter().filter(|r| !r.is_ok()).count();
    if broken_count > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

fn print_results(results: &[LinkCheckResult], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
    } else {
        print_table(results);
    }
    Ok(())
}

fn print_table(results: &[LinkCheckResult]) {
    let mut current_page: Option<&str> = None;

    for result in results {
        // Group rows under the page they were found on
        if current_page != Some(result.page_url.as_str()) {
            current_page = Some(result.page_url.as_str());
            println!("\n📄 {}", result.page_url);
            println!("{:<60} {:<22} {:<30}", "URL", "STATUS", "MESSAGE");
            println!("{}", "=".repeat(112));
        }

        let url_display = if result.url.len() > 57 {
            format!("{}...", truncate(&result.url, 57))
        } else {
            result.url.clone()
        };
        let mut message = result.message.clone().unwrap_or_default();
        if result.cached {
            message.push_str(" (checked already)");
        }

        println!("{:<60} {:<22} {:<30}", url_display, format_status(&result.status), message);
    }

    println!();

    let ok_count = results.iter().filter(|r| r.is_ok()).count();
    let broken_count = results.len() - ok_count;

    println!("📊 Summary:");
    println!("   ✅ OK: {}", ok_count);
    println!("   ❌ Broken: {}", broken_count);
    println!("   📋 Total: {}", results.len());
}

// Cuts on a char boundary so multi-byte URLs don't panic
fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

fn format_status(status: &LinkStatus) -> String {
    match status {
        LinkStatus::Ok => "✅ OK".to_string(),
        LinkStatus::Redirect(_) => "🔀 REDIRECT".to_string(),
        LinkStatus::Broken => "❌ BROKEN".to_string(),
        LinkStatus::Timeout => "⏱️  TIMEOUT".to_string(),
        LinkStatus::SslError => "🔒 SSL ERROR".to_string(),
        LinkStatus::TooManyRedirects => "🔁 TOO MANY REDIRECTS".to_string(),
        LinkStatus::DnsError => "🌐 DNS ERROR".to_string(),
        LinkStatus::Error => "⚠️  ERROR".to_string(),
    }
}
