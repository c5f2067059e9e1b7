//! Status command implementation.

use super::Verdict;
use crate::cli::StatusArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use bowtie_domain::ManifestStatus;
use bowtie_store::ManifestStore;

/// Execute the status command.
pub fn execute_status(args: StatusArgs, config: &Config, formatter: &Formatter) -> Result<Verdict> {
    let path = args.manifest.unwrap_or_else(|| config.paths.manifest.clone());
    let store = ManifestStore::open(&path)?;

    let failing: Vec<_> = store
        .entries()
        .iter()
        .filter(|entry| matches!(entry.status, ManifestStatus::Invalid | ManifestStatus::Error))
        .collect();

    println!("{}", formatter.manifest_status(&store.counts(), &failing)?);
    Ok(Verdict::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::error::CliError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_status_of_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let args = StatusArgs {
            manifest: Some(dir.path().join("manifest.csv")),
        };
        let formatter = Formatter::new(OutputFormat::Table, false);
        let verdict = execute_status(args, &Config::default(), &formatter).unwrap();
        assert_eq!(verdict, Verdict::Success);
    }

    #[test]
    fn test_status_of_corrupt_manifest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.csv");
        fs::write(&path, "source_path,incident_id,status\n,INC-1,valid\n").unwrap();
        let args = StatusArgs { manifest: Some(path) };
        let formatter = Formatter::new(OutputFormat::Json, false);
        let result = execute_status(args, &Config::default(), &formatter);
        assert!(matches!(result, Err(CliError::Store(_))));
    }
}
