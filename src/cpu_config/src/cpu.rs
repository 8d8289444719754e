// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// Guest or host CPU definition consumed by the per-architecture drivers.
///
/// A host definition describes the physical machine's CPU after resolution;
/// a guest definition describes what a virtual machine requests. Drivers
/// read `mode` and `model` from host definitions and may rewrite `mode`,
/// `match_policy` and the model-related fields of guest definitions.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CpuConfiguration {
    /// How the model-related fields are to be interpreted.
    #[serde(default)]
    pub mode: CpuMode,
    /// How strictly the named model must be matched by the virtual CPU.
    #[serde(default)]
    pub match_policy: CpuMatchPolicy,
    /// Named CPU model, once one has been requested or resolved.
    #[serde(default)]
    pub model: Option<String>,
    /// CPU vendor associated with the named model.
    #[serde(default)]
    pub vendor: Option<String>,
    /// Per-feature requirements layered on top of the named model.
    #[serde(default)]
    pub features: Vec<CpuFeature>,
    /// Socket/core/thread layout requested for the virtual CPU.
    #[serde(default)]
    pub topology: Option<CpuTopology>,
}

impl CpuConfiguration {
    /// Replaces this definition's model-related fields (model, vendor and
    /// feature list) with copies of `source`'s, discarding whatever model
    /// this definition previously carried.
    pub fn copy_model_from(&mut self, source: &CpuConfiguration) {
        self.model = source.model.clone();
        self.vendor = source.vendor.clone();
        self.features = source.features.clone();
    }
}

/// Interpretation mode for a CPU definition's model request.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CpuMode {
    /// The definition names a concrete model explicitly.
    #[default]
    Custom,
    /// The virtual CPU should mirror the host's resolved model.
    HostModel,
    /// The host CPU is passed through to the guest unchanged.
    HostPassthrough,
    /// The hypervisor provides the richest virtual CPU it can.
    Maximum,
}

/// Strictness applied when realizing a named model.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CpuMatchPolicy {
    /// The virtual CPU provides exactly the named model.
    #[default]
    Exact,
    /// The named model is a lower bound on the virtual CPU.
    Minimum,
    /// The virtual CPU must be realizable without feature fallback.
    Strict,
}

/// A single named feature requirement within a CPU definition.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CpuFeature {
    /// Architecture-defined feature name.
    pub name: String,
    /// Requirement the feature places on the virtual CPU.
    #[serde(default)]
    pub policy: CpuFeaturePolicy,
}

/// Requirement a feature places on the virtual CPU.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CpuFeaturePolicy {
    /// The feature is exposed even if the host lacks it.
    Force,
    /// The feature must be present on the host.
    #[default]
    Require,
    /// The feature is exposed when available.
    Optional,
    /// The feature is masked from the guest.
    Disable,
    /// The feature must be absent from the host.
    Forbid,
}

/// Requested socket/core/thread layout.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CpuTopology {
    /// Number of sockets.
    pub sockets: u32,
    /// Cores per socket.
    pub cores: u32,
    /// Threads per core.
    pub threads: u32,
}
