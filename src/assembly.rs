// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud Assembly Output
//!
//! Writes a synthesized stack to disk the way the deployment toolchain
//! expects it: `<stack>.template.json` plus a `manifest.json` naming the
//! stack artifact and its target environment. Files are written only after
//! evaluation succeeded, so a failed run leaves no template behind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::TopologyResult;
use crate::evaluator::SynthesizedStack;

/// Assembly schema version written to the manifest
pub const MANIFEST_VERSION: &str = "21.0.0";

pub const MANIFEST_FILE: &str = "manifest.json";

/// Top-level manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub artifacts: BTreeMap<String, Artifact>,
}

/// One stack artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub environment: String,
    pub properties: ArtifactProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactProperties {
    pub template_file: String,
}

/// Paths written for one stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenAssembly {
    pub template: PathBuf,
    pub manifest: PathBuf,
}

/// File name of a stack's template
pub fn template_file_name(stack_name: &str) -> String {
    format!("{}.template.json", stack_name)
}

/// Build the manifest for a stack
pub fn manifest_for(stack: &SynthesizedStack) -> Manifest {
    let mut artifacts = BTreeMap::new();
    artifacts.insert(
        stack.stack_name.clone(),
        Artifact {
            artifact_type: "aws:cloudformation:stack".to_string(),
            environment: stack.environment.to_string(),
            properties: ArtifactProperties {
                template_file: template_file_name(&stack.stack_name),
            },
        },
    );
    Manifest {
        version: MANIFEST_VERSION.to_string(),
        artifacts,
    }
}

/// Write template and manifest into `output_dir`, creating it if needed
pub fn write_assembly(
    stack: &SynthesizedStack,
    output_dir: impl AsRef<Path>,
) -> TopologyResult<WrittenAssembly> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let template = output_dir.join(template_file_name(&stack.stack_name));
    fs::write(&template, serde_json::to_string_pretty(&stack.template())?)?;

    let manifest = output_dir.join(MANIFEST_FILE);
    fs::write(&manifest, serde_json::to_string_pretty(&manifest_for(stack))?)?;

    info!(
        "Wrote cloud assembly for {} to {}",
        stack.stack_name,
        output_dir.display()
    );
    Ok(WrittenAssembly { template, manifest })
}
