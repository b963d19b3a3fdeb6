// src/main.rs
// =============================================================================
// Entry point of the crawl-audit CLI.
//
// What happens here:
// 1. Set up logging (tracing, to stderr)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the subcommand handler
// 4. Print the result and exit with a proper code:
//    0 = nothing blocks crawlers, 1 = something does, 2 = error
// =============================================================================

mod audit;
mod classify;
mod cli;
mod config;
mod executor;
mod probe;
mod robots;
mod sitemap;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use audit::{AuditReport, Auditor, SampleSource};
use cli::{Cli, Commands, Overrides};
use config::AuditConfig;

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

// Logs go to stderr so `--json` output on stdout stays clean
fn init_logging(verbose: bool) {
    let default = if verbose { "crawl_audit=debug" } else { "crawl_audit=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Audit {
            target,
            json,
            config,
            concurrency,
            max_sample,
            max_sitemaps,
            timeout_secs,
        } => {
            let base = match config {
                Some(path) => AuditConfig::from_file(&path)?,
                None => AuditConfig::default(),
            };
            let overrides = Overrides {
                concurrency,
                max_sample,
                max_sitemaps,
                timeout_secs,
            };
            handle_audit(&target, overrides.apply(base), json).await
        }
        Commands::Robots {
            target,
            agent,
            path,
            json,
        } => handle_robots(&target, &agent, &path, json).await,
    }
}

// Handles the 'audit' subcommand
async fn handle_audit(target: &str, config: AuditConfig, json: bool) -> Result<i32> {
    if !json {
        println!("🔍 Auditing: {}", target);
    }

    let auditor = Auditor::new(config)?;
    let report = auditor
        .audit(target)
        .await
        .with_context(|| format!("audit of {} failed", target))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(if report.has_blockers() { 1 } else { 0 })
}

// Handles the 'robots' subcommand
async fn handle_robots(target: &str, agent: &str, path: &str, json: bool) -> Result<i32> {
    let origin = audit::normalize_target(target)?;
    let auditor = Auditor::new(AuditConfig::default())?;
    let (policy, summary) = auditor.fetch_policy(&origin).await;

    let verdict = policy.evaluate(agent, path);
    let matched_rule = verdict.rule.map(|r| r.to_string());
    let disallowed = policy.disallowed_patterns(agent);

    if json {
        let output = serde_json::json!({
            "origin": origin.as_str(),
            "robots_found": summary.found,
            "agent": agent,
            "path": path,
            "allowed": verdict.allowed,
            "matched_rule": matched_rule,
            "disallowed_patterns": disallowed,
            "sitemaps": policy.sitemaps(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        if !summary.found {
            println!("⚠️  No usable robots.txt at {} (everything is allowed)", origin);
        }
        let status = if verdict.allowed { "✅ ALLOWED" } else { "❌ DISALLOWED" };
        println!("{} {} for {}", status, path, agent);
        if let Some(rule) = &matched_rule {
            println!("   Matched rule: {}", rule);
        }
        if !disallowed.is_empty() {
            println!("   Disallowed for this agent: {}", disallowed.join(", "));
        }
    }

    Ok(if verdict.allowed { 0 } else { 1 })
}

// Prints the report as human-readable tables
fn print_report(report: &AuditReport) {
    println!("🌐 Origin: {}", report.origin);
    println!(
        "🤖 robots.txt: {}",
        if report.robots.found { "found" } else { "not found" }
    );
    println!();

    println!("{:<12} {:<12} {:<25} {:<10}", "CRAWLER", "ROBOTS", "RULE", "ROOT");
    println!("{}", "=".repeat(62));
    for crawler in &report.crawlers {
        let robots = if crawler.allowed_by_robots { "✅ allowed" } else { "❌ blocked" };
        let rule = crawler.matched_rule.as_deref().unwrap_or("-");
        let root = crawler
            .root_status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "failed".to_string());
        println!("{:<12} {:<12} {:<25} {:<10}", crawler.name, robots, truncate(rule, 25), root);
    }
    println!();

    if report.platform.detected {
        println!("🛡️  Bot protection: {}", report.platform.indicators.join(", "));
    }

    println!("🗺️  Sitemap: {}", sitemap_line(report));
    println!();

    println!("{:<60} {:<8} {:<8} {:<30}", "URL", "STATUS", "INDEX", "SCHEMA");
    println!("{}", "=".repeat(108));
    for page in &report.pages {
        let status = page
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "failed".to_string());
        let index = if !page.success {
            "-"
        } else if page.noindex() {
            "❌ no"
        } else {
            "✅ yes"
        };
        let schema = page
            .classification
            .as_ref()
            .map(|c| c.structured_data_types.join(", "))
            .unwrap_or_default();
        println!("{:<60} {:<8} {:<8} {:<30}", truncate(&page.url, 57), status, index, schema);
    }
    println!();

    let health = &report.health;
    println!("📊 Summary:");
    println!("   ✅ OK: {}", health.succeeded);
    println!("   ❌ Failed: {}", health.failed);
    println!("   🚫 Noindex: {}", health.noindex);
    println!("   🤖 Disallowed by robots.txt: {}", health.disallowed);
    println!("   ⭐ Rich-result eligible: {}", health.rich_result_eligible);
    println!("   📋 Sampled: {}", health.sampled);

    if !report.recommendations.is_empty() {
        println!();
        println!("💡 Recommendations:");
        for recommendation in &report.recommendations {
            println!("   - {}", recommendation);
        }
    }
}

// Describes the sitemap situation, including a sitemap that listed nothing
fn sitemap_line(report: &AuditReport) -> String {
    let Some(first) = report.sitemaps.first() else {
        return "none found, sampled the home page".to_string();
    };
    match report.sample_source {
        SampleSource::Sitemap => format!("{} ({} found)", first.url, report.sitemaps.len()),
        SampleSource::Root => format!("{} lists no pages, sampled the home page", first.url),
    }
}

// Shortens long values so the table stays aligned
fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        let kept: String = value.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        value.to_string()
    }
}
