//! Validation command handler and related utilities

use crate::cli::{OutputFormat, SpecKindArg, ValidateArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use rrms_schemas::model::{Resource, ResourceSpec, ResourceToDbMapper, ResourceToDbMappingSpec};
use rrms_schemas::{
    validate_mapper, validate_mapping_spec, validate_resource, validate_resource_spec,
    FieldNormalizer, FieldSchema, SpecError, ValidationConfig, ValidationError,
};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Handle the validate command
#[instrument(skip_all, fields(files = args.files.len(), kind = ?args.kind))]
pub async fn handle_validate(
    args: ValidateArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let timer = Timer::with_details("validate_command", &format!("{} file(s)", args.files.len()));
    info!("Starting validation process");
    output.info(&format!("Validating {} specification file(s)", args.files.len()))?;

    let validation = Arc::new(validation_config(&args, config));
    debug!(config = ?validation, "Using validation configuration");

    let results = check_files(&args.files, args.kind, Arc::clone(&validation), output).await?;
    let outcome = report(&args, &validation, results, output);

    info!(elapsed_ms = timer.elapsed().as_millis() as u64, "Validation finished");
    outcome
}

/// Library configuration from the config file with command-line overrides
fn validation_config(args: &ValidateArgs, config: &Config) -> ValidationConfig {
    let mut validation = config.validation.to_validation_config();

    if let Some(cutoff) = args.cutoff {
        validation = validation.with_similarity_cutoff(cutoff);
    }
    validation = match args.max_depth {
        Some(0) => validation.unlimited_depth(),
        Some(depth) => validation.with_max_depth(depth),
        None => validation,
    };
    if args.fail_fast {
        validation = validation.with_fail_fast();
    }
    if let Some(max_errors) = args.max_errors {
        validation = validation.with_max_errors(max_errors);
    }

    validation
}

/// Kind of specification held by a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SpecKind {
    Mapping,
    ResourceSpec,
    Resource,
    Mapper,
}

impl SpecKind {
    fn describe(&self) -> &'static str {
        match self {
            SpecKind::Mapping => "mapping specification",
            SpecKind::ResourceSpec => "resource specification",
            SpecKind::Resource => "resource",
            SpecKind::Mapper => "resourceToDbMapper",
        }
    }

    fn requested(arg: SpecKindArg) -> Option<Self> {
        match arg {
            SpecKindArg::Auto => None,
            SpecKindArg::Mapping => Some(SpecKind::Mapping),
            SpecKindArg::ResourceSpec => Some(SpecKind::ResourceSpec),
            SpecKindArg::Resource => Some(SpecKind::Resource),
            SpecKindArg::Mapper => Some(SpecKind::Mapper),
        }
    }
}

/// Detect which kind of specification a document holds
///
/// Top-level keys are matched the way the validators match them: case
/// insensitively, with likely typos counted as their canonical name.
/// Non-mapping documents are treated as mapping specifications so that the
/// validator reports them.
fn detect_spec_kind(value: &Value, normalizer: &FieldNormalizer) -> Option<SpecKind> {
    let Some(map) = value.as_object() else {
        return Some(SpecKind::Mapping);
    };

    let envelope = ResourceToDbMappingSpec::lookup();
    let envelope_keys: Vec<&str> = map
        .keys()
        .filter_map(|key| {
            envelope
                .canonical(key)
                .or_else(|| envelope.suggest(key, normalizer.cutoff()))
        })
        .collect();
    if envelope_keys.contains(&"resourceToDbMapper") {
        return Some(SpecKind::Mapping);
    }
    if envelope_keys.contains(&"resource") {
        return Some(SpecKind::ResourceSpec);
    }

    let resource = normalizer.coverage(Resource::lookup(), map);
    let mapper = normalizer.coverage(ResourceToDbMapper::lookup(), map);
    match (resource, mapper) {
        (0, 0) => None,
        (resource, mapper) if mapper > resource => Some(SpecKind::Mapper),
        _ => Some(SpecKind::Resource),
    }
}

/// Read a JSON or YAML document, by file extension
fn load_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    debug!(file = %path.display(), bytes = content.len(), "File read successfully");

    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: format!("YAML ({})", e),
        })
    } else {
        serde_json::from_str(&content).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: format!("JSON ({})", e),
        })
    }
}

/// Validated model of any supported kind
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Model {
    Mapping(ResourceToDbMappingSpec),
    ResourceSpec(ResourceSpec),
    Resource(Resource),
    Mapper(ResourceToDbMapper),
}

fn validate_document(
    kind: SpecKind,
    document: &Value,
    config: &ValidationConfig,
) -> std::result::Result<Model, SpecError> {
    match kind {
        SpecKind::Mapping => validate_mapping_spec(document, config).map(Model::Mapping),
        SpecKind::ResourceSpec => validate_resource_spec(document, config).map(Model::ResourceSpec),
        SpecKind::Resource => validate_resource(document, config).map(Model::Resource),
        SpecKind::Mapper => validate_mapper(document, config).map(Model::Mapper),
    }
}

/// Outcome of validating one readable file
#[derive(Debug)]
struct Checked {
    kind: SpecKind,
    result: std::result::Result<Model, SpecError>,
}

fn check_file(path: &Path, requested: SpecKindArg, config: &ValidationConfig) -> Result<Checked> {
    let document = load_document(path)?;
    let kind = match SpecKind::requested(requested) {
        Some(kind) => kind,
        None => detect_spec_kind(&document, &config.normalizer()).ok_or_else(|| {
            Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: "a resource, resourceToDbMapper or mapping specification".to_string(),
            }
        })?,
    };
    debug!(file = %path.display(), kind = ?kind, "Detected spec kind");

    Ok(Checked {
        kind,
        result: validate_document(kind, &document, config),
    })
}

/// Validate every file on the blocking pool, returning results in input order
async fn check_files(
    files: &[PathBuf],
    kind: SpecKindArg,
    config: Arc<ValidationConfig>,
    output: &OutputWriter,
) -> Result<Vec<Result<Checked>>> {
    let progress = output.progress_bar(files.len() as u64, "Validating");

    let mut set = JoinSet::new();
    for (index, path) in files.iter().cloned().enumerate() {
        let config = Arc::clone(&config);
        set.spawn_blocking(move || {
            let _timer = Timer::with_details("validate_file", &path.display().to_string());
            (index, check_file(&path, kind, &config))
        });
    }

    let mut slots: Vec<Option<Result<Checked>>> = files.iter().map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        let (index, checked) = joined?;
        slots[index] = Some(checked);
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(files
        .iter()
        .zip(slots)
        .map(|(path, slot)| {
            slot.unwrap_or_else(|| {
                Err(Error::other(format!("No validation result for {}", path.display())))
            })
        })
        .collect())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum FileStatus {
    Valid,
    Invalid,
    Unreadable,
    Skipped,
}

/// Machine-readable result for one file
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<SpecKind>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<Model>,
}

impl FileReport {
    fn new(path: &Path, status: FileStatus) -> Self {
        Self {
            file: path.display().to_string(),
            status,
            kind: None,
            errors: Vec::new(),
            message: None,
            model: None,
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct ValidationReport {
    valid: usize,
    invalid: usize,
    unreadable: usize,
    skipped: usize,
    files: Vec<FileReport>,
}

impl ValidationReport {
    fn failures(&self) -> usize {
        self.invalid + self.unreadable
    }
}

/// Whether `fail_fast` or `max_errors` stops reporting after `failures` files
fn limit_reached(config: &ValidationConfig, failures: usize) -> bool {
    (config.fail_fast && failures > 0) || (config.max_errors > 0 && failures >= config.max_errors)
}

fn report(
    args: &ValidateArgs,
    config: &ValidationConfig,
    results: Vec<Result<Checked>>,
    output: &mut OutputWriter,
) -> Result<()> {
    let total = results.len();
    let human = output.format() == OutputFormat::Human;
    let mut summary = ValidationReport::default();
    let mut first_unreadable: Option<Error> = None;
    let mut fatal: Option<SpecError> = None;

    for (path, result) in args.files.iter().zip(results) {
        if limit_reached(config, summary.failures()) {
            output.warning(&format!("⚠ Skipped {}", path.display()))?;
            summary.skipped += 1;
            summary.files.push(FileReport::new(path, FileStatus::Skipped));
            continue;
        }

        match result {
            Ok(Checked { kind, result: Ok(model) }) => {
                info!(file = %path.display(), kind = ?kind, "Specification is valid");
                output.success(&format!("✓ {} is a valid {}", path.display(), kind.describe()))?;
                if args.detailed && human {
                    output.section(&format!("Validated {}", kind.describe()))?;
                    output.data(&model)?;
                }

                summary.valid += 1;
                summary.files.push(FileReport {
                    kind: Some(kind),
                    model: args.detailed.then_some(model),
                    ..FileReport::new(path, FileStatus::Valid)
                });
            }
            Ok(Checked { kind, result: Err(error) }) => {
                warn!(
                    file = %path.display(),
                    violations = error.violations().len(),
                    "Validation failed"
                );
                output.error(&format!(
                    "✗ {} failed validation as a {}",
                    path.display(),
                    kind.describe()
                ))?;
                output.spec_error(&error)?;

                summary.invalid += 1;
                summary.files.push(FileReport {
                    kind: Some(kind),
                    errors: error.violations().to_vec(),
                    message: error.is_fatal().then(|| error.to_string()),
                    ..FileReport::new(path, FileStatus::Invalid)
                });
                if error.is_fatal() && fatal.is_none() {
                    fatal = Some(error);
                }
            }
            Err(error) => {
                warn!(file = %path.display(), error = %error, "Could not read specification");
                output.error(&format!("✗ {}: {}", path.display(), error))?;

                summary.unreadable += 1;
                summary.files.push(FileReport {
                    message: Some(error.to_string()),
                    ..FileReport::new(path, FileStatus::Unreadable)
                });
                if first_unreadable.is_none() {
                    first_unreadable = Some(error);
                }
            }
        }
    }

    if human {
        output.section("Summary")?;
        output.info(&format!("{} of {} specification(s) valid", summary.valid, total))?;
        if summary.skipped > 0 {
            output.warning(&format!("{} file(s) skipped", summary.skipped))?;
        }
    } else {
        output.data(&summary)?;
    }

    if let Some(error) = first_unreadable {
        return Err(error);
    }
    if summary.invalid > 0 {
        return Err(match fatal {
            Some(error) if total == 1 => Error::Spec(error),
            _ => Error::ValidationFailed {
                invalid: summary.invalid,
                total,
            },
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FILL: &str = include_str!("../../../rrms-schemas/tests/fixtures/fill.yaml");
    const BROKEN: &str = include_str!("../../../rrms-schemas/tests/fixtures/broken.yaml");

    fn args(files: Vec<PathBuf>) -> ValidateArgs {
        ValidateArgs {
            files,
            kind: SpecKindArg::Auto,
            max_depth: None,
            cutoff: None,
            fail_fast: false,
            max_errors: None,
            detailed: false,
        }
    }

    fn sink(format: OutputFormat) -> OutputWriter {
        OutputWriter::with_writer(format, false, Box::new(std::io::sink()))
    }

    #[test]
    fn test_detect_spec_kind() {
        let normalizer = FieldNormalizer::default();
        let detect = |value: Value| detect_spec_kind(&value, &normalizer);

        assert_eq!(
            detect(json!({"resource": {}, "ResourceToDbMapper": {}})),
            Some(SpecKind::Mapping)
        );
        assert_eq!(
            detect(json!({"resource": {}, "resourceToDbMaper": {}})),
            Some(SpecKind::Mapping)
        );
        assert_eq!(detect(json!({"Resource": {}})), Some(SpecKind::ResourceSpec));
        assert_eq!(
            detect(json!({"resource_name": "fill", "version": "1", "fields": []})),
            Some(SpecKind::Resource)
        );
        assert_eq!(
            detect(json!({"resource_name": "fill", "masterTable": "fills", "fields": []})),
            Some(SpecKind::Mapper)
        );
        assert_eq!(detect(json!({"provider": "x"})), None);
        assert_eq!(detect(json!([1, 2])), Some(SpecKind::Mapping));
    }

    #[test]
    fn test_command_line_overrides_config() {
        let config = Config::default();
        let mut args = args(vec![PathBuf::from("fill.yaml")]);
        assert_eq!(validation_config(&args, &config), ValidationConfig::default());

        args.cutoff = Some(0.9);
        args.max_depth = Some(0);
        args.max_errors = Some(2);
        let validation = validation_config(&args, &config);
        assert_eq!(validation.similarity_cutoff, 0.9);
        assert_eq!(validation.max_depth, None);
        assert_eq!(validation.max_errors, 2);
        assert!(!validation.fail_fast);
    }

    #[test]
    fn test_limit_reached() {
        let unlimited = ValidationConfig::default();
        assert!(!limit_reached(&unlimited, 10));

        let fail_fast = ValidationConfig::default().with_fail_fast();
        assert!(!limit_reached(&fail_fast, 0));
        assert!(limit_reached(&fail_fast, 1));

        let capped = ValidationConfig::default().with_max_errors(2);
        assert!(!limit_reached(&capped, 1));
        assert!(limit_reached(&capped, 2));
    }

    #[test]
    fn test_load_document_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("fill.yml");
        let json = dir.path().join("fill.json");
        fs::write(&yaml, FILL).unwrap();
        fs::write(&json, "{\"resource\": ").unwrap();

        assert!(load_document(&yaml).unwrap().get("resourceToDbMapper").is_some());
        assert!(matches!(load_document(&json), Err(Error::InvalidFormat { .. })));
        assert!(matches!(
            load_document(&dir.path().join("missing.yaml")),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_check_file_with_forced_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fill.yaml");
        fs::write(&path, FILL).unwrap();
        let config = ValidationConfig::default();

        let checked = check_file(&path, SpecKindArg::Auto, &config).unwrap();
        assert_eq!(checked.kind, SpecKind::Mapping);
        assert!(checked.result.is_ok());

        // Read as a `{resource}` document the mapper key is unexpected
        let checked = check_file(&path, SpecKindArg::ResourceSpec, &config).unwrap();
        assert_eq!(checked.kind, SpecKind::ResourceSpec);
        let error = checked.result.unwrap_err();
        assert_eq!(error.violations().len(), 1);
        assert_eq!(error.violations()[0].path, "$.resourceToDbMapper");
    }

    #[tokio::test]
    async fn test_validate_reports_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let fill = dir.path().join("fill.yaml");
        let broken = dir.path().join("broken.yaml");
        fs::write(&fill, FILL).unwrap();
        fs::write(&broken, BROKEN).unwrap();
        let config = Config::default();

        let mut output = sink(OutputFormat::Human);
        handle_validate(args(vec![fill.clone()]), &config, &mut output)
            .await
            .unwrap();

        let mut output = sink(OutputFormat::Json);
        let error = handle_validate(args(vec![fill, broken]), &config, &mut output)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::ValidationFailed { invalid: 1, total: 2 }));
        assert_eq!(error.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_single_fatal_document_surfaces_spec_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let mut output = sink(OutputFormat::Human);
        let error = handle_validate(args(vec![path]), &Config::default(), &mut output)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Spec(SpecError::NotAnObject { found: "list" })));
    }

    #[tokio::test]
    async fn test_unreadable_file_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.yaml");
        fs::write(&broken, BROKEN).unwrap();
        let missing = dir.path().join("missing.yaml");

        let mut output = sink(OutputFormat::Human);
        let error = handle_validate(args(vec![broken, missing]), &Config::default(), &mut output)
            .await
            .unwrap_err();
        assert_eq!(error.exit_code(), 3);
    }
}
