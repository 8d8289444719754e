// Copyright 2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use cpu_config::model_map::ModelDescriptorSource;
use cpu_config::CpuConfigurationError;

/// One named SW64 CPU model.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Sw64Model {
    name: String,
}

impl Sw64Model {
    pub(crate) fn new<S: Into<String>>(name: S) -> Self {
        Sw64Model { name: name.into() }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered, name-unique collection of SW64 CPU models.
///
/// A catalog is rebuilt from the model descriptor source on every listing
/// call and dropped before that call returns; insertion order is preserved
/// only so that listings are deterministic.
#[derive(Debug, Default)]
pub(crate) struct Sw64ModelCatalog {
    models: Vec<Sw64Model>,
}

impl Sw64ModelCatalog {
    pub(crate) fn new() -> Self {
        Sw64ModelCatalog { models: Vec::new() }
    }

    /// Appends `model`, rejecting a name that is already present.
    pub(crate) fn insert(&mut self, model: Sw64Model) -> Result<(), CpuConfigurationError> {
        if self.find(model.name()).is_some() {
            return Err(CpuConfigurationError::DuplicateModel(model.name));
        }
        self.models.push(model);
        Ok(())
    }

    /// Exact-match lookup. Absence is not an error.
    pub(crate) fn find(&self, name: &str) -> Option<&Sw64Model> {
        self.models.iter().find(|model| model.name() == name)
    }

    /// Snapshot of all model names in insertion order.
    pub(crate) fn names(&self) -> Vec<String> {
        self.models.iter().map(|model| model.name.clone()).collect()
    }
}

/// Builds a catalog from the descriptor source's listing for `arch`.
///
/// A duplicate name aborts the load and the partially built catalog never
/// escapes; a failure inside the source itself propagates unchanged.
pub(crate) fn load_catalog(
    source: &dyn ModelDescriptorSource,
    arch: &str,
) -> Result<Sw64ModelCatalog, CpuConfigurationError> {
    let mut catalog = Sw64ModelCatalog::new();
    source.for_each_model(arch, &mut |name| catalog.insert(Sw64Model::new(name)))?;
    Ok(catalog)
}
