// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use log::{debug, error, info};

/// Contains the guest/host CPU definition object model.
pub mod cpu;
/// Contains the contract every per-architecture CPU driver implements.
pub mod driver;
/// Contains the CPU model map descriptor sources.
pub mod model_map;

/// Errors associated with CPU configuration processing and model resolution.
#[derive(Debug, thiserror::Error)]
pub enum CpuConfigurationError {
    /// A model descriptor source listed the same model name twice.
    #[error("CPU model [{0}] already defined")]
    DuplicateModel(String),
    /// A host description line carried the expected label but no usable value.
    #[error("Missing or invalid CPU variation in [{0}], offending line [{1}]")]
    MalformedHostInfo(String, String),
    /// Opening or reading the file was unsuccessful.
    #[error("Unable to use file specified [{0}]. \n[{1}]")]
    IOError(String, std::io::Error),
    /// Relative update requested against an unresolved host CPU model.
    #[error("unknown host CPU model")]
    UnknownHostModel,
    /// JSON library(serde) error processing JSON data.
    #[error("Error processing CPU configuration in JSON format - [{0}]")]
    JsonError(serde_json::Error),
    /// The path did not name a regular file.
    #[error("Unable to use file specified [{0}].")]
    InvalidFilePath(String),
    /// Entry point not implemented by the architecture's CPU driver.
    #[error("Operation [{0}] is not supported for this CPU architecture")]
    UnsupportedOperation(&'static str),
}

/// Converts a JSON string of a CPU definition to an in-memory instance.
pub fn deserialize_cpu_config(
    cpu_config_str: &str,
) -> Result<cpu::CpuConfiguration, CpuConfigurationError> {
    debug!(
        "Deserializing JSON CPU config structure \n{}",
        &cpu_config_str
    );
    match serde_json::from_str(cpu_config_str) {
        Ok(cpu_config) => {
            info!("Parsed JSON CPU config successfully");
            Ok(cpu_config)
        }
        Err(err) => {
            error!("Failed to parse JSON CPU config");
            Err(CpuConfigurationError::JsonError(err))
        }
    }
}
