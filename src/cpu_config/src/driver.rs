// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use crate::cpu::CpuConfiguration;
use crate::CpuConfigurationError;

/// Outcome of comparing a guest CPU definition against the host's.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CpuCompareResult {
    /// The guest CPU cannot run on the host CPU.
    Incompatible,
    /// Host and guest CPUs are indistinguishable.
    Identical,
    /// The host CPU is a strict superset of the guest CPU.
    Superset,
}

/// Opaque architecture-specific CPU description blob exchanged through the
/// optional decode/encode driver entry points.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawCpuData {
    /// Architecture tag the payload belongs to.
    pub arch: String,
    /// Architecture-defined payload bytes.
    pub data: Vec<u8>,
}

/// Contract implemented once per supported CPU architecture.
///
/// The platform keeps one driver per architecture in a registry keyed by the
/// tags reported from [`archs`](CpuArchDriver::archs) and dispatches every
/// CPU operation for a domain through it. Drivers hold no mutable state;
/// each entry point acquires whatever resources it needs, releases them
/// before returning, and may be invoked concurrently from multiple threads.
pub trait CpuArchDriver: Send + Sync {
    /// Short name identifying this driver in diagnostics.
    fn name(&self) -> &'static str;

    /// Architecture tags this driver handles.
    fn archs(&self) -> &'static [&'static str];

    /// Resolves the physical host's CPU model into `host`.
    ///
    /// Leaves `host.model` untouched when the host hardware does not map to
    /// any model known to the driver.
    fn get_host(&self, host: &mut CpuConfiguration) -> Result<(), CpuConfigurationError>;

    /// Compares a guest CPU definition against the host's.
    fn compare(
        &self,
        host: &CpuConfiguration,
        guest: &CpuConfiguration,
    ) -> Result<CpuCompareResult, CpuConfigurationError>;

    /// Reconciles a guest CPU definition against the resolved host definition.
    ///
    /// With `relative` set and a guest in host-model mode, the abstract
    /// "match the host" request is rewritten into a concrete, pinned model
    /// taken from `host`. All other combinations leave `guest` unchanged.
    fn update(
        &self,
        guest: &mut CpuConfiguration,
        host: Option<&CpuConfiguration>,
        relative: bool,
    ) -> Result<(), CpuConfigurationError>;

    /// Lists the named CPU models known for this architecture.
    fn get_models(&self) -> Result<Vec<String>, CpuConfigurationError>;

    /// Expands a raw CPU description into a CPU definition.
    ///
    /// Architectures without feature-level modeling leave this entry point
    /// unimplemented.
    fn decode(
        &self,
        _cpu: &mut CpuConfiguration,
        _data: &RawCpuData,
        _models: &[String],
    ) -> Result<(), CpuConfigurationError> {
        Err(CpuConfigurationError::UnsupportedOperation("decode"))
    }

    /// Produces a raw CPU description from a CPU definition.
    fn encode(&self, _cpu: &CpuConfiguration) -> Result<RawCpuData, CpuConfigurationError> {
        Err(CpuConfigurationError::UnsupportedOperation("encode"))
    }

    /// Computes the richest CPU definition supported by every input host.
    fn baseline(
        &self,
        _cpus: &[CpuConfiguration],
    ) -> Result<CpuConfiguration, CpuConfigurationError> {
        Err(CpuConfigurationError::UnsupportedOperation("baseline"))
    }
}
