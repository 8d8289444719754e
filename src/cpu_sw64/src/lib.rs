// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use cpu_config::cpu::{CpuConfiguration, CpuMatchPolicy, CpuMode};
use cpu_config::driver::{CpuArchDriver, CpuCompareResult};
use cpu_config::model_map::{JsonModelMap, ModelDescriptorSource};
use cpu_config::CpuConfigurationError;
use log::debug;

mod catalog;
mod host;

/// Architecture tags handled by the SW64 driver.
const SW64_ARCHS: &[&str] = &["sw_64"];

/// Host description read to identify the physical CPU.
const CPUINFO_PATH: &str = "/proc/cpuinfo";

/// Model map listing the CPU models shipped with the driver.
const BUNDLED_MODEL_MAP: &str = include_str!("../data/cpu_map_sw64.json");

/// CPU driver for SW64 hosts.
///
/// SW64 defines no feature-level CPU modeling: models are bare names, two
/// CPUs always compare as identical, and the decode/encode/baseline entry
/// points are unsupported. The driver holds only immutable configuration
/// and every entry point is self-contained, so a single instance may be
/// shared across threads.
pub struct Sw64CpuDriver {
    model_source: Box<dyn ModelDescriptorSource + Send + Sync>,
    cpuinfo_path: PathBuf,
}

impl Sw64CpuDriver {
    /// Creates a driver using the bundled SW64 model map and the system
    /// host description.
    pub fn new() -> Self {
        Self::with_model_source(Box::new(JsonModelMap::embedded(BUNDLED_MODEL_MAP)))
    }

    /// Creates a driver enumerating models from `model_source`.
    pub fn with_model_source(model_source: Box<dyn ModelDescriptorSource + Send + Sync>) -> Self {
        Sw64CpuDriver {
            model_source,
            cpuinfo_path: PathBuf::from(CPUINFO_PATH),
        }
    }

    /// Overrides the host description path consulted by
    /// [`get_host`](CpuArchDriver::get_host).
    pub fn with_cpuinfo_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cpuinfo_path = path.into();
        self
    }
}

impl Default for Sw64CpuDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuArchDriver for Sw64CpuDriver {
    fn name(&self) -> &'static str {
        "sw_64"
    }

    fn archs(&self) -> &'static [&'static str] {
        SW64_ARCHS
    }

    fn get_host(&self, host: &mut CpuConfiguration) -> Result<(), CpuConfigurationError> {
        let path = self.cpuinfo_path.display().to_string();
        let cpuinfo = File::open(&self.cpuinfo_path)
            .map_err(|err| CpuConfigurationError::IOError(path.clone(), err))?;

        let variation = host::scan_variation(BufReader::new(cpuinfo), &path)?;
        debug!("Host CPU variation resolved to [{:?}]", variation);

        if let Some(model) = variation.and_then(host::model_for_variation) {
            host.model = Some(model.to_string());
        }
        Ok(())
    }

    fn compare(
        &self,
        _host: &CpuConfiguration,
        _guest: &CpuConfiguration,
    ) -> Result<CpuCompareResult, CpuConfigurationError> {
        Ok(CpuCompareResult::Identical)
    }

    fn update(
        &self,
        guest: &mut CpuConfiguration,
        host: Option<&CpuConfiguration>,
        relative: bool,
    ) -> Result<(), CpuConfigurationError> {
        if !relative || guest.mode != CpuMode::HostModel {
            return Ok(());
        }

        let host = host.ok_or(CpuConfigurationError::UnknownHostModel)?;

        guest.copy_model_from(host);
        guest.mode = CpuMode::Custom;
        guest.match_policy = CpuMatchPolicy::Exact;
        Ok(())
    }

    fn get_models(&self) -> Result<Vec<String>, CpuConfigurationError> {
        let catalog = catalog::load_catalog(self.model_source.as_ref(), SW64_ARCHS[0])?;
        Ok(catalog.names())
    }
}
