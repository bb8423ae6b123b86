// Tests for output formatting
//
// These tests verify human and machine rendering of validation errors and
// the message helpers of OutputWriter.

use super::*;
use pretty_assertions::assert_eq;
use rrms_schemas::ErrorKind;
use std::cell::RefCell;
use std::rc::Rc;

/// Writer whose contents stay readable after being boxed
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

fn sample_errors() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(
        ValidationError::structural(
            "$.resourceToDbMapper.masterTabel",
            "Unexpected field 'masterTabel'. Did you mean 'masterTable' ?",
        )
        .with_suggestion("masterTable"),
    );
    errors.add(ValidationError::mapping_coverage(
        "$.resource.fields[1].name",
        "Resource attribute 'energy' is not mapped by any resourceToDbMapper field",
    ));
    errors
}

#[test]
fn test_validation_errors_formatting_human() {
    let formatted = OutputFormat::Human
        .format_validation_errors(&sample_errors())
        .unwrap();

    assert!(formatted.starts_with("❌ Validation Failed - 2 Error(s)\n\n"));
    assert!(formatted.contains("1. 📍 Path: $.resourceToDbMapper.masterTabel\n"));
    assert!(formatted.contains("🏷️  Kind: structural"));
    assert!(formatted.contains("💡 Did you mean: masterTable"));
    assert!(formatted.contains("2. 📍 Path: $.resource.fields[1].name\n"));
    assert!(formatted.contains("Kind: mapping_coverage"));
    assert_eq!(formatted.matches("💡").count(), 1);
}

#[test]
fn test_validation_errors_formatting_json() {
    let formatted = OutputFormat::Json
        .format_validation_errors(&sample_errors())
        .unwrap();
    let parsed: ValidationErrors = serde_json::from_str(&formatted).unwrap();

    assert_eq!(parsed, sample_errors());
    assert_eq!(parsed.errors[1].kind, ErrorKind::MappingCoverage);
}

#[test]
fn test_validation_errors_formatting_yaml() {
    let formatted = OutputFormat::Yaml
        .format_validation_errors(&sample_errors())
        .unwrap();

    assert!(formatted.contains("kind: structural"));
    assert!(formatted.contains("suggestion: masterTable"));
}

#[test]
fn test_fatal_spec_error_formatting() {
    let error = SpecError::NotAnObject { found: "list" };

    let human = OutputFormat::Human.format_spec_error(&error).unwrap();
    assert_eq!(human, "❌ Input data must be a mapping at the root level, found list\n");

    let json = OutputFormat::Json.format_spec_error(&error).unwrap();
    assert_eq!(
        json,
        r#"{"fatal":"Input data must be a mapping at the root level, found list"}"#
    );
}

#[test]
fn test_writer_messages_without_color() {
    let buffer = SharedBuffer::default();
    let mut writer = OutputWriter::with_writer(OutputFormat::Human, false, Box::new(buffer.clone()));

    writer.info("Validating 2 file(s)").unwrap();
    writer.success("✓ fill.yaml is valid").unwrap();
    writer.warning("skipped").unwrap();
    writer.error("✗ broken.yaml failed validation").unwrap();
    writer.section("Summary").unwrap();

    assert_eq!(
        buffer.contents(),
        "INFO: Validating 2 file(s)\n\
         ✓ fill.yaml is valid\n\
         WARNING: skipped\n\
         ERROR: ✗ broken.yaml failed validation\n\
         \n\
         === Summary ===\n"
    );
}

#[test]
fn test_machine_formats_only_emit_data() {
    let buffer = SharedBuffer::default();
    let mut writer = OutputWriter::with_writer(OutputFormat::Json, false, Box::new(buffer.clone()));

    writer.info("ignored").unwrap();
    writer.error("ignored").unwrap();
    writer
        .spec_error(&SpecError::Invalid(sample_errors()))
        .unwrap();
    writer.data(&serde_json::json!({"valid": 1})).unwrap();

    assert_eq!(buffer.contents(), "{\"valid\":1}\n");
}

#[test]
fn test_yaml_data_is_not_double_terminated() {
    let buffer = SharedBuffer::default();
    let mut writer = OutputWriter::with_writer(OutputFormat::Yaml, false, Box::new(buffer.clone()));

    writer.data(&serde_json::json!({"valid": 1})).unwrap();

    assert_eq!(buffer.contents(), "valid: 1\n");
}
