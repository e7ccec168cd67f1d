use anyhow::Context;
use clap::Parser;
use storefront_acceptance::core::repository::{RepositoryCheckSettings, StaticReference};
use storefront_acceptance::domain::model::ValidationReport;
use storefront_acceptance::domain::ports::{ReferenceSource, RepositoryCheckConfig};
use storefront_acceptance::utils::error::{ErrorSeverity, HarnessError};
use storefront_acceptance::utils::{logger, validation::Validate};
use storefront_acceptance::{
    CliConfig, GitCloner, HtmlReferenceSource, HttpProbe, RepositoryValidationPipeline,
    TomlConfig,
};

async fn run_with_source<R: ReferenceSource>(
    source: R,
    config: &TomlConfig,
) -> storefront_acceptance::Result<ValidationReport> {
    let probe = HttpProbe::new(config.request_timeout())?;
    let pipeline = RepositoryValidationPipeline::new(
        source,
        probe,
        GitCloner::new(),
        RepositoryCheckSettings::from_config(config),
    );
    pipeline.run().await
}

async fn run(config: &TomlConfig) -> storefront_acceptance::Result<ValidationReport> {
    match config.repository_url() {
        Some(url) => run_with_source(StaticReference(url.to_string()), config).await,
        None => {
            let source = HtmlReferenceSource::new(
                config.base_url(),
                config.link_host(),
                config.request_timeout(),
            )?;
            run_with_source(source, config).await
        }
    }
}

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report_failure(e: &HarnessError) -> i32 {
    tracing::error!(
        "❌ Repository check failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    exit_code(e.severity())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting storefront-acceptance");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = cli.validate() {
        tracing::error!("❌ Configuration validation failed");
        std::process::exit(report_failure(&e));
    }
    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => std::process::exit(report_failure(&e)),
    };

    match run(&config).await {
        Ok(report) => {
            tracing::info!("✅ Repository check passed for {}", report.reference);
            if cli.json {
                let rendered =
                    serde_json::to_string_pretty(&report).context("rendering JSON report")?;
                println!("{}", rendered);
            } else {
                println!("✅ Repository check passed");
                println!("🔗 Repository: {}", report.reference);
                println!(
                    "📄 {} ({} bytes)",
                    report.expected_file, report.expected_file_size
                );
                println!(
                    "⏱  {} ms",
                    (report.finished_at - report.started_at).num_milliseconds()
                );
            }
        }
        Err(e) => {
            let code = report_failure(&e);
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
