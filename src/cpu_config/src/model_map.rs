// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::PathBuf;

use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::CpuConfigurationError;

/// Enumerates the named CPU models known for an architecture.
///
/// Implementations own locating and parsing their backing storage; the
/// consumer supplies a per-name callback and accumulates entries however it
/// sees fit.
pub trait ModelDescriptorSource {
    /// Invokes `visit` once per model name defined for `arch`, in listing
    /// order.
    ///
    /// Enumerating zero names is not an error. The first error returned by
    /// `visit` aborts the enumeration and is propagated unchanged.
    fn for_each_model(
        &self,
        arch: &str,
        visit: &mut dyn FnMut(&str) -> Result<(), CpuConfigurationError>,
    ) -> Result<(), CpuConfigurationError>;
}

/// Root of a CPU model map document.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelMapDocument {
    /// Per-architecture model listings.
    pub arches: Vec<ArchModelSet>,
}

/// Model listing for one architecture.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ArchModelSet {
    /// Architecture tag the listing applies to.
    pub arch: String,
    /// Named models defined for the architecture, in listing order.
    pub models: Vec<ModelMapEntry>,
}

/// One named model within an architecture's listing.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ModelMapEntry {
    /// Model name. Uniqueness is enforced by the consuming catalog, not
    /// by the map itself.
    pub name: String,
}

/// JSON-backed CPU model map.
///
/// The backing document is re-read and re-parsed on every enumeration so
/// that no state is carried between driver calls.
#[derive(Clone, Debug)]
pub struct JsonModelMap {
    backing: MapBacking,
}

#[derive(Clone, Debug)]
enum MapBacking {
    File(PathBuf),
    Embedded(&'static str),
}

impl JsonModelMap {
    /// Creates a map backed by a JSON document on disk.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        JsonModelMap {
            backing: MapBacking::File(path.into()),
        }
    }

    /// Creates a map backed by a JSON document embedded in the binary.
    pub fn embedded(data: &'static str) -> Self {
        JsonModelMap {
            backing: MapBacking::Embedded(data),
        }
    }

    fn document(&self) -> Result<ModelMapDocument, CpuConfigurationError> {
        let raw = match &self.backing {
            MapBacking::File(path) => {
                let path_str = path.display().to_string();
                debug!("Loading CPU model map from [{}]", path_str);

                let metadata = fs::metadata(path)
                    .map_err(|err| CpuConfigurationError::IOError(path_str.clone(), err))?;
                if !metadata.is_file() {
                    return Err(CpuConfigurationError::InvalidFilePath(path_str));
                }

                fs::read_to_string(path)
                    .map_err(|err| CpuConfigurationError::IOError(path_str, err))?
            }
            MapBacking::Embedded(data) => (*data).to_string(),
        };

        serde_json::from_str(&raw).map_err(|err| {
            error!("Failed to parse JSON CPU model map: {:?}", err);
            CpuConfigurationError::JsonError(err)
        })
    }
}

impl ModelDescriptorSource for JsonModelMap {
    fn for_each_model(
        &self,
        arch: &str,
        visit: &mut dyn FnMut(&str) -> Result<(), CpuConfigurationError>,
    ) -> Result<(), CpuConfigurationError> {
        let document = self.document()?;

        let arch_set = match document.arches.iter().find(|set| set.arch == arch) {
            Some(arch_set) => arch_set,
            None => {
                debug!("No CPU models defined for architecture [{}]", arch);
                return Ok(());
            }
        };

        for entry in &arch_set.models {
            visit(&entry.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod model_map_unit_tests {
    use std::fs;
    use std::io::Write;

    use tempfile::Builder;

    use super::*;

    const MODEL_MAP_JSON: &str = r#"{
        "arches": [
            {
                "arch": "sw_64",
                "models": [
                    { "name": "core3" },
                    { "name": "core4" }
                ]
            }
        ]
    }"#;

    fn collect_models(map: &JsonModelMap, arch: &str) -> Vec<String> {
        let mut names = Vec::new();
        map.for_each_model(arch, &mut |name| {
            names.push(name.to_string());
            Ok(())
        })
        .expect("Enumerating the model map failed");
        names
    }

    #[test]
    fn test_embedded_map_enumeration() {
        let map = JsonModelMap::embedded(MODEL_MAP_JSON);
        assert_eq!(collect_models(&map, "sw_64"), vec!["core3", "core4"]);
    }

    #[test]
    fn test_unknown_arch_enumerates_nothing() {
        let map = JsonModelMap::embedded(MODEL_MAP_JSON);
        assert!(collect_models(&map, "mips").is_empty());
    }

    #[test]
    fn test_visit_error_aborts_enumeration() {
        let map = JsonModelMap::embedded(MODEL_MAP_JSON);
        let mut seen = Vec::new();
        let result = map.for_each_model("sw_64", &mut |name| {
            seen.push(name.to_string());
            Err(CpuConfigurationError::DuplicateModel(name.to_string()))
        });

        match result {
            Err(CpuConfigurationError::DuplicateModel(name)) => assert_eq!(name, "core3"),
            other => panic!("CpuConfigurationError::DuplicateModel expected, got {:?}", other),
        }
        assert_eq!(seen, vec!["core3"]);
    }

    #[test]
    fn test_unknown_document_keys_rejected() {
        let map = JsonModelMap::embedded(r#"{ "arches": [], "vendors": [] }"#);
        let result = map.for_each_model("sw_64", &mut |_| Ok(()));
        match result {
            Err(CpuConfigurationError::JsonError(_)) => {}
            other => panic!("CpuConfigurationError::JsonError expected, got {:?}", other),
        }
    }

    #[test]
    fn test_file_map_reread_per_enumeration() {
        let mut map_tempfile = Builder::new()
            .prefix("cpu-model-map-test")
            .suffix(".json")
            .tempfile()
            .expect("Failed to create temporary file for testing the model map");
        map_tempfile
            .write_all(MODEL_MAP_JSON.as_bytes())
            .expect("Failed to write model map data");

        let map = JsonModelMap::open(map_tempfile.path());
        assert_eq!(collect_models(&map, "sw_64"), vec!["core3", "core4"]);

        // Rewriting the backing file must be visible to the next call.
        fs::write(
            map_tempfile.path(),
            r#"{ "arches": [ { "arch": "sw_64", "models": [ { "name": "core3" } ] } ] }"#,
        )
        .expect("Failed to rewrite model map data");
        assert_eq!(collect_models(&map, "sw_64"), vec!["core3"]);
    }

    #[test]
    fn test_file_map_errors() {
        let map = JsonModelMap::open("/does/not/exist/cpu_map.json");
        let result = map.for_each_model("sw_64", &mut |_| Ok(()));
        match result {
            Err(CpuConfigurationError::IOError(path, _)) => {
                assert_eq!(path, "/does/not/exist/cpu_map.json")
            }
            other => panic!("CpuConfigurationError::IOError expected, got {:?}", other),
        }

        let map_tempdir = Builder::new()
            .prefix("cpu-model-map-test-dir")
            .tempdir()
            .expect("Failed to create temporary directory for testing the model map");
        let map = JsonModelMap::open(map_tempdir.path());
        let result = map.for_each_model("sw_64", &mut |_| Ok(()));
        match result {
            Err(CpuConfigurationError::InvalidFilePath(_)) => {}
            other => panic!(
                "CpuConfigurationError::InvalidFilePath expected, got {:?}",
                other
            ),
        }
    }
}
