//! Extract command implementation.

use super::Verdict;
use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use bowtie_extractor::{Extractor, RunOptions, TemplatePromptAssembler};
use bowtie_gatekeeper::Gatekeeper;
use bowtie_store::ManifestStore;
use std::future::Future;
use tracing::{info, warn};

/// Execute the extract command, stopping early on Ctrl+C.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<Verdict> {
    run_extract(args, config, formatter, interrupt()).await
}

/// Execute the extract command with an explicit shutdown signal.
pub async fn run_extract<F>(
    args: ExtractArgs,
    config: &Config,
    formatter: &Formatter,
    shutdown: F,
) -> Result<Verdict>
where
    F: Future<Output = ()>,
{
    if args.limit == Some(0) {
        return Err(CliError::InvalidInput("--limit must be greater than 0".to_string()));
    }

    let provider_name = args.provider.unwrap_or_else(|| config.provider.name.clone());
    let mut settings = config.provider.settings.clone();
    if let Some(model) = args.model {
        settings.model = Some(model);
    }

    let mut extractor_config = config.extractor.clone();
    if let Some(workers) = args.workers {
        extractor_config.workers = workers;
    }
    if let Some(max_attempts) = args.max_attempts {
        extractor_config.retry.max_attempts = max_attempts;
    }
    extractor_config.validate().map_err(CliError::InvalidInput)?;

    // Credentials are checked here, before any input is touched
    let provider = bowtie_llm::provider_from_name(&provider_name, &settings)?;

    let assembler = match (&config.paths.prompt_template, &config.paths.schema_template) {
        (Some(prompt), Some(schema)) => TemplatePromptAssembler::from_files(prompt, schema)?,
        (None, None) => TemplatePromptAssembler::default(),
        _ => {
            return Err(CliError::Config(
                "prompt_template and schema_template must be set together".to_string(),
            ))
        }
    };

    let text_dir = args.text_dir.unwrap_or_else(|| config.paths.text_dir.clone());
    let out_dir = args.out_dir.unwrap_or_else(|| config.paths.out_dir.clone());
    let manifest_path = args.manifest.unwrap_or_else(|| config.paths.manifest.clone());
    let mut manifest = ManifestStore::open(&manifest_path)?;

    info!(
        provider = %provider_name,
        model = settings.model.as_deref().unwrap_or("default"),
        text_dir = %text_dir.display(),
        resume = args.resume,
        "Starting extraction"
    );

    let options = RunOptions {
        resume: args.resume,
        limit: args.limit,
    };
    let extractor = Extractor::new(provider, assembler, Gatekeeper::default_config(), extractor_config);
    let summary = extractor
        .run_until(&text_dir, &out_dir, &mut manifest, options, shutdown)
        .await?;

    println!("{}", formatter.run_summary(&summary)?);

    Ok(if summary.interrupted {
        Verdict::Interrupted
    } else if summary.has_errors() {
        Verdict::InputErrors
    } else {
        Verdict::Success
    })
}

/// Resolves on the first Ctrl+C; never resolves if the handler cannot be installed.
async fn interrupt() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => warn!("Interrupt received, stopping after in-flight inputs are reverted"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use bowtie_domain::ManifestStatus;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn config_in(root: &Path) -> Config {
        let mut config = Config::default();
        config.paths.text_dir = root.join("text");
        config.paths.out_dir = root.join("structured").join("incidents");
        config.paths.manifest = root.join("manifests").join("structured_manifest.csv");
        config.extractor.retry = bowtie_extractor::RetryPolicy::immediate(1);
        config
    }

    fn formatter() -> Formatter {
        Formatter::new(OutputFormat::Json, false)
    }

    #[tokio::test]
    async fn test_extract_with_stub() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        fs::create_dir_all(&config.paths.text_dir).unwrap();
        fs::write(config.paths.text_dir.join("INC-1.txt"), "A valve failed.").unwrap();
        fs::write(config.paths.text_dir.join("INC-2.txt"), "   ").unwrap();

        let verdict = run_extract(ExtractArgs::default(), &config, &formatter(), std::future::pending())
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::InputErrors);

        let manifest = ManifestStore::open(&config.paths.manifest).unwrap();
        assert_eq!(manifest.counts()[&ManifestStatus::Valid], 1);
        assert_eq!(manifest.counts()[&ManifestStatus::Error], 1);
        assert!(config.paths.out_dir.join("stub").join("INC-1.json").is_file());
    }

    #[tokio::test]
    async fn test_resume_after_success_is_clean() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        fs::create_dir_all(&config.paths.text_dir).unwrap();
        fs::write(config.paths.text_dir.join("INC-1.txt"), "A valve failed.").unwrap();

        for _ in 0..2 {
            let args = ExtractArgs {
                resume: true,
                ..ExtractArgs::default()
            };
            let verdict = run_extract(args, &config, &formatter(), std::future::pending())
                .await
                .unwrap();
            assert_eq!(verdict, Verdict::Success);
        }
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_before_any_input() {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path());
        let args = ExtractArgs {
            provider: Some("no-such-provider".to_string()),
            ..ExtractArgs::default()
        };
        let result = run_extract(args, &config, &formatter(), std::future::pending()).await;
        assert!(matches!(result, Err(CliError::Provider(_))));
        assert!(!config.paths.manifest.exists());
    }

    #[tokio::test]
    async fn test_zero_limit_rejected() {
        let dir = TempDir::new().unwrap();
        let args = ExtractArgs {
            limit: Some(0),
            ..ExtractArgs::default()
        };
        let result = run_extract(args, &config_in(dir.path()), &formatter(), std::future::pending()).await;
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_missing_text_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = run_extract(
            ExtractArgs::default(),
            &config_in(dir.path()),
            &formatter(),
            std::future::pending(),
        )
        .await;
        assert!(matches!(result, Err(CliError::Extractor(_))));
    }
}
