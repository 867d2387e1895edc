// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Pipe Entity
//!
//! A named record binding an executable action to its declared
//! parameters, config files, owned products, and dependency products.
//! There is no metaclass/decorator registry: a [`Pipe`] is assembled by
//! [`PipeBuilder`], and what used to be declared through decorators
//! becomes plain fields populated at build time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::entities::action_context::{Action, ActionContext};
use crate::entities::dependency::ProductDependency;
use crate::error::WarpError;
use crate::value_objects::{Parameter, ParameterFile, Product};

/// Where a pipe's source comes from, for hashing and for the
/// `source.txt` snapshot written at build end.
#[derive(Debug, Clone)]
pub enum PipeOrigin {
    /// An ordinary pipe backed by a source file.
    File { path: PathBuf, code: String },
    /// A synthetic source pipe with no backing file.
    Synthetic,
}

/// Whether a pipe has a real action or is a synthetic source pipe that
/// merely advertises externally-supplied products.
#[derive(Clone)]
pub enum PipeAction {
    Source,
    Run(Action),
}

impl std::fmt::Debug for PipeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipeAction::Source => write!(f, "PipeAction::Source"),
            PipeAction::Run(_) => write!(f, "PipeAction::Run(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pipe {
    name: String,
    parameters: Vec<Parameter>,
    parameter_files: Vec<ParameterFile>,
    products: Vec<Product>,
    dependencies: Vec<ProductDependency>,
    origin: PipeOrigin,
    action: PipeAction,
}

impl Pipe {
    /// The synthetic source-pipe name prefix. Reserved: an ordinary pipe
    /// may not declare a name starting with it.
    pub const SOURCE_PREFIX: &'static str = "__source__";

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter_files(&self) -> &[ParameterFile] {
        &self.parameter_files
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn products_mut(&mut self) -> &mut [Product] {
        &mut self.products
    }

    pub fn dependencies(&self) -> &[ProductDependency] {
        &self.dependencies
    }

    pub fn dependencies_mut(&mut self) -> &mut [ProductDependency] {
        &mut self.dependencies
    }

    pub fn origin(&self) -> &PipeOrigin {
        &self.origin
    }

    pub fn is_source(&self) -> bool {
        matches!(self.action, PipeAction::Source)
    }

    pub fn action(&self) -> Option<&Action> {
        match &self.action {
            PipeAction::Run(a) => Some(a),
            PipeAction::Source => None,
        }
    }

    /// Runs the action against a prepared context. Source pipes have no
    /// action to run; calling this on one is a programmer error.
    pub fn run(&self, ctx: &mut ActionContext) -> Result<(), WarpError> {
        match &self.action {
            PipeAction::Run(action) => action(ctx).map_err(|e| WarpError::PipeActionFailure {
                pipe: self.name.clone(),
                message: e.to_string(),
            }),
            PipeAction::Source => Err(WarpError::Internal(format!(
                "attempted to run source pipe {} as an action",
                self.name
            ))),
        }
    }

    /// Looks up a declared parameter by name.
    pub fn param(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    pub fn param_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.parameters.iter_mut().find(|p| p.name() == name)
    }

    /// Looks up a declared product by relative path.
    pub fn product(&self, relative_path: &Path) -> Option<&Product> {
        self.products.iter().find(|p| p.relative_path() == relative_path)
    }

    /// The cache-directory key source: the pipe's declared source file
    /// path for ordinary pipes, or the pipe name for source pipes.
    pub fn cache_key_source(&self) -> String {
        match &self.origin {
            PipeOrigin::File { path, .. } => path.to_string_lossy().into_owned(),
            PipeOrigin::Synthetic => self.name.clone(),
        }
    }

    /// Builds a synthetic source pipe advertising `products`, all
    /// forced to `external = true`: a source pipe only advertises
    /// artifacts that already exist outside the graph.
    pub fn new_source(name: impl Into<String>, products: Vec<Product>) -> Self {
        let products = products.into_iter().map(|p| p.with_external(true)).collect();
        Self {
            name: name.into(),
            parameters: Vec::new(),
            parameter_files: Vec::new(),
            products,
            dependencies: Vec::new(),
            origin: PipeOrigin::Synthetic,
            action: PipeAction::Source,
        }
    }
}

/// Assembles a [`Pipe`] from its declared parts. Replaces the
/// decorator/metaclass registry of the reference implementation with an
/// explicit, no-global-state builder.
pub struct PipeBuilder {
    name: String,
    parameters: Vec<Parameter>,
    parameter_files: Vec<ParameterFile>,
    products: Vec<Product>,
    dependencies: Vec<ProductDependency>,
    origin: Option<PipeOrigin>,
    action: Option<Action>,
}

impl PipeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            parameter_files: Vec::new(),
            products: Vec::new(),
            dependencies: Vec::new(),
            origin: None,
            action: None,
        }
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn parameter_file(mut self, file: ParameterFile) -> Self {
        self.parameter_files.push(file);
        self
    }

    pub fn product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }

    pub fn depends_on(mut self, dependency: ProductDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn source_file(mut self, path: impl Into<PathBuf>, code: impl Into<String>) -> Self {
        self.origin = Some(PipeOrigin::File {
            path: path.into(),
            code: code.into(),
        });
        self
    }

    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut ActionContext) -> Result<(), WarpError> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    pub fn build(self) -> Result<Pipe, WarpError> {
        if self.name.is_empty() {
            return Err(WarpError::Internal("pipe name must not be empty".into()));
        }
        if self.name.starts_with(Pipe::SOURCE_PREFIX) {
            return Err(WarpError::Internal(format!(
                "pipe name {} collides with the reserved source-pipe prefix",
                self.name
            )));
        }
        let action = self
            .action
            .ok_or_else(|| WarpError::Internal(format!("pipe {} has no action", self.name)))?;
        let origin = self
            .origin
            .ok_or_else(|| WarpError::Internal(format!("pipe {} has no source reference", self.name)))?;
        Ok(Pipe {
            name: self.name,
            parameters: self.parameters,
            parameter_files: self.parameter_files,
            products: self.products,
            dependencies: self.dependencies,
            origin,
            action: PipeAction::Run(action),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::ParameterValue;

    fn noop_action(_ctx: &mut ActionContext) -> Result<(), WarpError> {
        Ok(())
    }

    #[test]
    fn builder_produces_well_formed_pipe() {
        let pipe = PipeBuilder::new("A")
            .source_file("A.rs", "// source")
            .parameter(Parameter::new("x", ParameterValue::Integer(1)))
            .product(Product::new("data/a.bin"))
            .action(noop_action)
            .build()
            .unwrap();

        assert_eq!(pipe.name(), "A");
        assert!(!pipe.is_source());
        assert_eq!(pipe.products().len(), 1);
        assert_eq!(pipe.param("x").unwrap().value().as_integer(), Some(1));
    }

    #[test]
    fn builder_rejects_missing_action() {
        let err = PipeBuilder::new("A").source_file("A.rs", "").build().unwrap_err();
        assert!(matches!(err, WarpError::Internal(_)));
    }

    #[test]
    fn builder_rejects_reserved_prefix() {
        let err = PipeBuilder::new("__source__x")
            .source_file("A.rs", "")
            .action(noop_action)
            .build()
            .unwrap_err();
        assert!(matches!(err, WarpError::Internal(_)));
    }

    #[test]
    fn source_pipe_forces_external_products() {
        let pipe = Pipe::new_source("__source__A0", vec![Product::new("inputs/raw.txt")]);
        assert!(pipe.is_source());
        assert!(pipe.products()[0].is_external());
        assert_eq!(pipe.cache_key_source(), "__source__A0");
    }

    #[test]
    fn cache_key_source_uses_declared_path_for_ordinary_pipes() {
        let pipe = PipeBuilder::new("A")
            .source_file("pkg/a.rs", "")
            .action(noop_action)
            .build()
            .unwrap();
        assert_eq!(pipe.cache_key_source(), "pkg/a.rs");
    }
}
