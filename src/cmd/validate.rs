use crate::validate::{ValidateOptions, Validator};
use crate::writer::OutputFormat;
use std::path::PathBuf;
use std::time::Instant;

pub fn run(
    dir: PathBuf,
    format: Option<String>,
    strict: bool,
    json: bool,
    max_issues: usize,
) -> anyhow::Result<()> {
    let format: Option<OutputFormat> = match format {
        Some(s) => Some(s.parse().map_err(|e: String| anyhow::anyhow!(e))?),
        None => None,
    };

    if !json {
        eprintln!("Validating dataset: {}", dir.display());
        eprintln!();
    }

    let start_time = Instant::now();
    let mut options = ValidateOptions::new(dir);
    options.format = format;
    options.max_issues = max_issues;

    let summary = Validator::new(options).validate()?;
    let elapsed = start_time.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for issue in &summary.issues {
            eprintln!("{}", issue);
        }
        if summary.truncated {
            eprintln!("... further issues truncated (--max-issues {})", max_issues);
        }
        if !summary.issues.is_empty() {
            eprintln!();
        }

        eprintln!("Validation summary:");
        eprintln!("  Format: {}", summary.format);
        eprintln!(
            "  Rows: {} products, {} customers, {} sellers, {} orders, {} order items",
            summary.tables.products,
            summary.tables.customers,
            summary.tables.sellers,
            summary.tables.orders,
            summary.tables.order_items
        );
        eprintln!("  Time: {:.3?}", elapsed);
        eprintln!();
        eprintln!("  Checks:");
        eprintln!("    - Column schema:      {}", summary.checks.schema);
        eprintln!("    - PK duplicates:      {}", summary.checks.pk_duplicates);
        eprintln!("    - FK integrity:       {}", summary.checks.fk_integrity);
        eprintln!("    - Timestamp order:    {}", summary.checks.timestamp_order);
        eprintln!(
            "    - Temporal validity:  {}",
            summary.checks.temporal_validity
        );
        eprintln!();
        eprintln!(
            "  Total: {} errors, {} warnings",
            summary.errors, summary.warnings
        );
        eprintln!();

        if summary.has_errors() {
            eprintln!("Result: FAILED");
        } else if summary.has_warnings() && strict {
            eprintln!("Result: FAILED (--strict mode, warnings treated as errors)");
        } else if summary.has_warnings() {
            eprintln!("Result: PASSED (with warnings)");
        } else {
            eprintln!("Result: PASSED");
        }
    }

    if summary.has_errors() {
        anyhow::bail!("validation failed with {} errors", summary.errors);
    }
    if strict && summary.has_warnings() {
        anyhow::bail!(
            "validation failed with {} warnings (strict mode)",
            summary.warnings
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{Generator, GeneratorConfig};
    use crate::writer::{DatasetWriter, WriteOptions};
    use tempfile::TempDir;

    /// Dataset where one order has had all of its items removed, which
    /// raises a warning but no errors.
    fn dataset_with_orphan_order() -> TempDir {
        let dir = TempDir::new().unwrap();
        let config = GeneratorConfig {
            customers: 10,
            sellers: 4,
            orders: 20,
            workers: 1,
            ..GeneratorConfig::default()
        };
        let dataset = Generator::new(config).generate().unwrap();
        DatasetWriter::new(dir.path().to_path_buf(), WriteOptions::default())
            .write(&dataset)
            .unwrap();

        let path = dir.path().join("order_items.csv");
        let content = std::fs::read_to_string(&path).unwrap();
        let kept: Vec<&str> = content
            .lines()
            .filter(|l| !l.starts_with("00000001,"))
            .collect();
        std::fs::write(&path, kept.join("\n")).unwrap();
        dir
    }

    #[test]
    fn test_warnings_pass_without_strict() {
        let dir = dataset_with_orphan_order();
        assert!(run(dir.path().to_path_buf(), None, false, false, 1000).is_ok());
    }

    #[test]
    fn test_strict_turns_warnings_into_failure() {
        let dir = dataset_with_orphan_order();
        let err = run(dir.path().to_path_buf(), None, true, false, 1000).unwrap_err();
        assert!(err.to_string().contains("strict"), "{}", err);
    }
}
