//! SARIF (Static Analysis Results Interchange Format) output formatter.
//!
//! Implements SARIF 2.1.0 format for integration with GitHub Advanced
//! Security and other CI/CD tools.

use std::collections::HashMap;

use serde::Serialize;

use crate::finding::{Finding, Severity};
use crate::result::FileResult;

/// SARIF version constant
const SARIF_VERSION: &str = "2.1.0";

/// Tool information for SARIF
const TOOL_NAME: &str = "doclify";

/// Generates SARIF output from check results
pub fn generate_sarif(results: &[FileResult]) -> Result<String, serde_json::Error> {
    let sarif_log = SarifLog::from_results(results);
    serde_json::to_string_pretty(&sarif_log)
}

/// Root SARIF log structure
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifLog {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<Run>,
}

impl SarifLog {
    fn from_results(results: &[FileResult]) -> Self {
        let run = Run::from_results(results);
        Self {
            schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json".to_string(),
            version: SARIF_VERSION.to_string(),
            runs: vec![run],
        }
    }
}

/// A single run of the tool
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Run {
    tool: Tool,
    results: Vec<SarifResult>,
}

impl Run {
    fn from_results(file_results: &[FileResult]) -> Self {
        let mut results = Vec::new();
        let mut rules_map: HashMap<String, ReportingDescriptor> = HashMap::new();

        for file_result in file_results {
            let findings = file_result
                .report
                .errors
                .iter()
                .chain(file_result.report.warnings.iter());
            for finding in findings {
                results.push(SarifResult::from_finding(finding, file_result));

                if !rules_map.contains_key(&finding.code) {
                    rules_map.insert(
                        finding.code.clone(),
                        ReportingDescriptor::new(&finding.code, &finding.message),
                    );
                }
            }
        }

        Self {
            tool: Tool::new(rules_map),
            results,
        }
    }
}

/// Tool information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    driver: ToolComponent,
}

impl Tool {
    fn new(rules: HashMap<String, ReportingDescriptor>) -> Self {
        Self {
            driver: ToolComponent::new(rules),
        }
    }
}

/// Tool component (driver)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolComponent {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rules: Vec<ReportingDescriptor>,
}

impl ToolComponent {
    fn new(rules: HashMap<String, ReportingDescriptor>) -> Self {
        let rules_vec: Vec<_> = rules.into_values().collect();
        Self {
            name: TOOL_NAME.to_string(),
            version: option_env!("CARGO_PKG_VERSION").map(|s| s.to_string()),
            rules: rules_vec,
        }
    }
}

/// Rule descriptor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportingDescriptor {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    short_description: Option<Message>,
}

impl ReportingDescriptor {
    fn new(id: &str, message: &str) -> Self {
        Self {
            id: id.to_string(),
            name: Some(id.to_string()),
            short_description: Some(Message::text(message)),
        }
    }
}

/// A message
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Message {
    text: String,
}

impl Message {
    fn text(s: impl Into<String>) -> Self {
        Self { text: s.into() }
    }
}

/// A single result (finding)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct SarifResult {
    rule_id: String,
    level: String,
    message: Message,
    locations: Vec<Location>,
}

impl SarifResult {
    fn from_finding(finding: &Finding, file_result: &FileResult) -> Self {
        let level = match finding.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };

        Self {
            rule_id: finding.code.clone(),
            level: level.to_string(),
            message: Message::text(&finding.message),
            locations: vec![Location::from_finding(finding, file_result)],
        }
    }
}

/// Location information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Location {
    physical_location: PhysicalLocation,
}

impl Location {
    fn from_finding(finding: &Finding, file_result: &FileResult) -> Self {
        Self {
            physical_location: PhysicalLocation {
                artifact_location: ArtifactLocation {
                    uri: file_result.path.to_string_lossy().to_string(),
                },
                region: finding.line.map(|line| Region {
                    start_line: Some(line),
                }),
            },
        }
    }
}

/// Physical location
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct PhysicalLocation {
    artifact_location: ArtifactLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<Region>,
}

/// Artifact location (file path)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactLocation {
    uri: String,
}

/// Region (line information)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct Region {
    #[serde(skip_serializing_if = "Option::is_none")]
    start_line: Option<u32>,
}
