// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Workspace Façade
//!
//! The single entry point gluing the graph, the session cache, and the
//! executor together. Every public operation takes a user-supplied pipe
//! name through fuzzy resolution before touching the graph.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;

use warp_domain::aggregates::Graph;
use warp_domain::entities::{ActionContext, DependencyValue, Pipe};
use warp_domain::services::staleness;
use warp_domain::value_objects::{ParameterType, ParameterValue, ProductValue, SaveMode};
use warp_domain::WarpError;

use crate::infrastructure::build_state::HomeBuildStateProvider;
use crate::infrastructure::config_loader::{self, FlatConfig};
use crate::infrastructure::home::Home;
use crate::infrastructure::metadata;
use crate::infrastructure::process_executor;
use crate::infrastructure::product_io;

const GRAPH_SCRIPT_FILE: &str = "graph.json";

/// Values of products declared `save = false`: never written to disk,
/// so a direct consumer running in the same process pulls straight from
/// here instead of from the filesystem. Scoped to one `build`/`backfill`
/// invocation.
type InMemoryProducts = HashMap<String, HashMap<PathBuf, ProductValue>>;

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub target: String,
    pub lineage: Vec<String>,
    pub stale: Vec<String>,
    pub last_build_time: Option<u64>,
    pub git_commit_hash: Option<String>,
    pub time_elapsed_secs: Option<f64>,
    pub parameters: BTreeMap<String, ParameterValue>,
    pub products: Vec<(PathBuf, PathBuf)>,
}

#[derive(Debug)]
pub struct Workspace {
    graph: Graph,
    home: Home,
    pipe_sources: HashMap<String, Option<String>>,
    config_cache: RefCell<HashMap<PathBuf, FlatConfig>>,
    link_static_products: bool,
}

impl Workspace {
    /// Builds a graph from `pipes` in declaration order, persists the
    /// resulting add-script into the session directory, and returns the
    /// ready-to-use façade. This is the path the top-level process takes.
    pub fn new(home_path: impl Into<PathBuf>, session_id: Option<String>, pipes: Vec<(Pipe, bool)>) -> Result<Self, WarpError> {
        let home = Home::new(home_path, session_id)?;
        let graph = Self::build_graph(pipes)?;
        let workspace = Self::assemble(graph, home)?;
        workspace.save_graph_script()?;
        Ok(workspace)
    }

    /// Reconstructs a graph by replaying a previously saved add-script,
    /// resolving each entry's definition through `pipes` — the child
    /// process's path, per the executor's subprocess re-entry contract.
    pub fn rehydrate(home_path: impl Into<PathBuf>, session_id: String, pipes: Vec<(Pipe, bool)>) -> Result<Self, WarpError> {
        let home = Home::new(home_path, Some(session_id))?;
        let mut registry: HashMap<String, Pipe> = pipes.into_iter().map(|(p, _)| (p.name().to_string(), p)).collect();
        let script_path = home.session_dir()?.join(GRAPH_SCRIPT_FILE);
        let script = Graph::load_script(&script_path)?;

        let mut graph = Graph::new();
        graph.replay(&script, |name| registry.remove(name))?;
        Self::assemble(graph, home)
    }

    fn build_graph(pipes: Vec<(Pipe, bool)>) -> Result<Graph, WarpError> {
        let mut graph = Graph::new();
        for (pipe, make_dependencies_sources) in pipes {
            graph.add(pipe, make_dependencies_sources)?;
        }
        Ok(graph)
    }

    fn assemble(graph: Graph, home: Home) -> Result<Self, WarpError> {
        let mut pipe_sources = HashMap::new();
        for name in graph.names() {
            let pipe = graph.pipe(name).expect("name came from graph.names()");
            let source = if pipe.is_source() { None } else { Some(pipe.cache_key_source()) };
            pipe_sources.insert(name.to_string(), source);
        }
        Ok(Self {
            graph,
            home,
            pipe_sources,
            config_cache: RefCell::new(HashMap::new()),
            link_static_products: false,
        })
    }

    /// Links the static products of other sessions into this one when
    /// resolving staleness and backfills. Off by default; the reference
    /// workspace warns on enabling it since it can produce surprising
    /// results across sessions with divergent histories.
    pub fn with_link_static_products(mut self, enabled: bool) -> Self {
        if enabled {
            tracing::warn!("linking static products of other sessions into this one; use with caution");
        }
        self.link_static_products = enabled;
        self
    }

    fn save_graph_script(&self) -> Result<(), WarpError> {
        let path = self.home.session_dir()?.join(GRAPH_SCRIPT_FILE);
        self.graph.save_script(&path)
    }

    fn state_provider(&self) -> HomeBuildStateProvider<'_> {
        // staleness::is_stale looks a pipe's source mtime up by
        // `cache_key_source()` (its declared file path, or its own name
        // for a synthetic source pipe), not by pipe name, so the lookup
        // table handed to the provider has to be keyed the same way.
        let by_cache_key_source = self
            .graph
            .names()
            .filter_map(|name| self.graph.pipe(name))
            .map(|pipe| {
                let source = if pipe.is_source() { None } else { Some(pipe.cache_key_source()) };
                (pipe.cache_key_source(), source)
            })
            .collect();
        HomeBuildStateProvider::new(&self.home, by_cache_key_source)
    }

    fn resolve(&self, query: &str) -> Result<String, WarpError> {
        self.graph.resolve_name(query)
    }

    // ---- build / backfill -------------------------------------------------

    /// Builds exactly one pipe, bypassing staleness analysis. Used both
    /// by the top-level `build` command and, via [`Self::run_child`], by
    /// the subprocess re-entry point.
    #[tracing::instrument(skip(self, overrides), fields(session = %self.home.current_session()))]
    pub fn build(&mut self, target: &str, overrides: BTreeMap<String, String>) -> Result<(), WarpError> {
        let name = self.resolve(target)?;
        tracing::info!(pipe = %name, "build starting");
        let mut in_memory = InMemoryProducts::new();
        let result = self.execute_pipe(&name, &overrides, &mut in_memory);
        match &result {
            Ok(()) => tracing::info!(pipe = %name, "build finished"),
            Err(e) => tracing::error!(pipe = %name, error = %e, "build failed"),
        }
        result
    }

    /// Computes the stale trajectory for `target` and rebuilds it, one
    /// fresh child process per pipe.
    #[tracing::instrument(skip(self, configs_override), fields(session = %self.home.current_session()))]
    pub fn backfill(
        &mut self,
        target: &str,
        configs_override: BTreeMap<String, BTreeMap<String, String>>,
        rebuild_all: bool,
        rebuild_static_products: bool,
    ) -> Result<Vec<String>, WarpError> {
        let name = self.resolve(target)?;

        let mut resolved_overrides: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for (pipe_query, values) in configs_override {
            resolved_overrides.insert(self.resolve(&pipe_query)?, values);
        }

        let trajectory = if rebuild_all {
            let mut lineage = self.graph.lineage(&name)?;
            lineage.push(name.clone());
            lineage
        } else {
            let provider = self.state_provider();
            let mut gaps = staleness::gap_pipes(&self.graph, &name, &provider, self.link_static_products, rebuild_static_products)?;
            for always in resolved_overrides.keys() {
                if !gaps.contains(always) {
                    gaps.push(always.clone());
                }
            }
            let mut lineage_full = self.graph.lineage(&name)?;
            lineage_full.push(name.clone());
            lineage_full.into_iter().filter(|n| gaps.contains(n)).collect()
        };

        tracing::info!(target = %name, trajectory = ?trajectory, "trajectory computed");

        if trajectory.is_empty() {
            let overrides = resolved_overrides.remove(&name).unwrap_or_default();
            self.build(&name, overrides)?;
            return Ok(Vec::new());
        }

        let session_id = self.home.current_session().to_string();
        for pipe_name in &trajectory {
            let overrides = resolved_overrides
                .get(pipe_name)
                .map(|m| {
                    m.iter()
                        .map(|(k, v)| self.coerce_cli_override(pipe_name, k, v))
                        .collect::<Result<BTreeMap<_, _>, _>>()
                })
                .transpose()?
                .unwrap_or_default();

            if let Err(e) = process_executor::run_child(&session_id, pipe_name, &overrides) {
                tracing::error!(pipe = %pipe_name, error = %e, "child build failed, aborting trajectory");
                return Err(e);
            }
        }

        Ok(trajectory)
    }

    /// The subprocess re-entry point: build exactly `target` in this
    /// process and exit. Called by the `__run-child` CLI dispatch.
    pub fn run_child(&mut self, target: &str, overrides: BTreeMap<String, String>) -> Result<(), WarpError> {
        self.build(target, overrides)
    }

    fn coerce_cli_override(&self, pipe_name: &str, key: &str, raw: &str) -> Result<(String, ParameterValue), WarpError> {
        let declared_type = self
            .graph
            .pipe(pipe_name)
            .and_then(|p| p.param(key))
            .map(|p| p.declared_type())
            .unwrap_or(ParameterType::String);
        Ok((key.to_string(), coerce_scalar(declared_type, key, raw)?))
    }

    /// Runs one pipe's full build cycle in this process: load parameters,
    /// load dependencies (recursing in-process for unsaved producers),
    /// invoke the action, persist outputs, verify postconditions, and
    /// record metadata.
    fn execute_pipe(&mut self, name: &str, overrides: &BTreeMap<String, String>, in_memory: &mut InMemoryProducts) -> Result<(), WarpError> {
        if self.graph.pipe(name).map(|p| p.is_source()).unwrap_or(false) {
            return Ok(());
        }

        let dependencies = self.graph.pipe(name).expect("pipe resolved by caller").dependencies().to_vec();
        let mut inputs = HashMap::new();
        for dep in &dependencies {
            let producer = dep.source_pipe().ok_or_else(|| WarpError::MissingProducer {
                pipe: name.to_string(),
                dependency: dep.key().to_string(),
            })?;
            tracing::debug!(pipe = name, dependency = dep.key(), producer, "resolving dependency");
            let value = self.load_dependency(name, producer, dep.product_path(), in_memory)?;
            inputs.insert(dep.key().to_string(), value);
        }

        self.load_parameters(name, overrides)?;

        let parameters = self.graph.pipe(name).unwrap().parameters().iter().map(|p| (p.name().to_string(), p.clone())).collect();
        let mut ctx = ActionContext::new(parameters, inputs);

        let started = Instant::now();
        if let Err(e) = self.graph.pipe(name).unwrap().run(&mut ctx) {
            tracing::error!(pipe = name, error = %e, "pipe action failed");
            return Err(e);
        }
        let elapsed = started.elapsed().as_secs_f64();

        self.persist_outputs(name, ctx, in_memory)?;
        if let Err(e) = self.verify_postconditions(name) {
            tracing::error!(pipe = name, error = %e, "postcondition check failed");
            return Err(e);
        }
        self.write_build_metadata(name, elapsed)?;
        Ok(())
    }

    fn load_parameters(&mut self, name: &str, overrides: &BTreeMap<String, String>) -> Result<(), WarpError> {
        let parameter_files: Vec<PathBuf> = self.graph.pipe(name).unwrap().parameter_files().iter().map(|f| f.path().to_path_buf()).collect();

        let mut merged: BTreeMap<String, ParameterValue> = BTreeMap::new();
        for path in &parameter_files {
            let flat = self.load_config(path)?;
            for (key, value) in flat {
                if merged.insert(key.clone(), value).is_some() {
                    return Err(WarpError::DuplicateParameterKey(key));
                }
            }
        }

        for (key, raw) in overrides {
            let declared_type = self.graph.pipe(name).unwrap().param(key).map(|p| p.declared_type()).unwrap_or(ParameterType::String);
            let value = coerce_scalar(declared_type, key, raw)?;
            if merged.contains_key(key) {
                tracing::warn!(pipe = name, parameter = key, "override replaces a config-file value");
            }
            merged.insert(key.clone(), value);
        }

        let pipe = self.graph.pipe_mut(name).unwrap();
        for (key, value) in merged {
            if let Some(param) = pipe.param_mut(&key) {
                param.set_checked(value)?;
            } else {
                tracing::warn!(pipe = name, parameter = key, "config value has no matching declared parameter, ignored");
            }
        }
        Ok(())
    }

    fn load_config(&self, path: &Path) -> Result<FlatConfig, WarpError> {
        if let Some(cached) = self.config_cache.borrow().get(path) {
            return Ok(cached.clone());
        }
        let flat = config_loader::load(path)?;
        self.config_cache.borrow_mut().insert(path.to_path_buf(), flat.clone());
        Ok(flat)
    }

    fn load_dependency(
        &mut self,
        consumer: &str,
        producer: &str,
        product_path: &Path,
        in_memory: &mut InMemoryProducts,
    ) -> Result<DependencyValue, WarpError> {
        let missing = || WarpError::MissingProducer {
            pipe: consumer.to_string(),
            dependency: product_path.display().to_string(),
        };

        let producer_pipe = self.graph.pipe(producer).ok_or_else(missing)?;
        if producer_pipe.is_source() {
            let resolved = self.home.resolve_product_path(product_path, true, false);
            return Ok(DependencyValue::SourcePath(resolved.to_string_lossy().into_owned()));
        }

        let is_saved = producer_pipe.product(product_path).ok_or_else(missing)?.is_saved();

        if !is_saved {
            if let Some(value) = in_memory.get(producer).and_then(|m| m.get(product_path)) {
                return Ok(DependencyValue::Value(value.clone()));
            }
            self.execute_pipe(producer, &BTreeMap::new(), in_memory)?;
            let value = in_memory
                .get(producer)
                .and_then(|m| m.get(product_path))
                .cloned()
                .ok_or_else(|| WarpError::ProductNotProduced {
                    pipe: producer.to_string(),
                    product: product_path.display().to_string(),
                })?;
            return Ok(DependencyValue::Value(value));
        }

        let producer_pipe = self.graph.pipe(producer).ok_or_else(missing)?;
        let product = producer_pipe.product(product_path).ok_or_else(missing)?;
        let resolved_path = self.home.resolve_product_path(product_path, product.is_external(), product.is_static());
        tracing::debug!(producer, product = %product_path.display(), resolved = %resolved_path.display(), "resolved product path");
        let custom_reader = match product.save_mode() {
            SaveMode::Custom { reader, .. } => Some(reader.clone()),
            _ => None,
        };

        let value = match custom_reader {
            Some(reader) => reader(&resolved_path)?,
            None => product_io::read_default(&resolved_path)?,
        };
        Ok(DependencyValue::Value(value))
    }

    fn persist_outputs(&mut self, name: &str, ctx: ActionContext, in_memory: &mut InMemoryProducts) -> Result<(), WarpError> {
        let outputs = ctx.into_outputs();
        let products = self.graph.pipe(name).unwrap().products().to_vec();

        for product in &products {
            let Some(value) = outputs.get(&product.relative_path().to_string_lossy().into_owned()) else {
                continue;
            };

            if !product.is_saved() {
                in_memory.entry(name.to_string()).or_default().insert(product.relative_path().to_path_buf(), value.clone());
                continue;
            }

            let resolved_path = self.home.resolve_product_path(product.relative_path(), product.is_external(), product.is_static());
            match product.save_mode() {
                SaveMode::Custom { writer, .. } => writer(&resolved_path, value)?,
                _ => product_io::write_default(&resolved_path, value)?,
            }
        }
        Ok(())
    }

    fn verify_postconditions(&self, name: &str) -> Result<(), WarpError> {
        let pipe = self.graph.pipe(name).unwrap();
        for product in pipe.products().iter().filter(|p| p.is_saved()) {
            let resolved_path = self.home.resolve_product_path(product.relative_path(), product.is_external(), product.is_static());
            if !resolved_path.exists() {
                return Err(WarpError::ProductNotProduced {
                    pipe: name.to_string(),
                    product: product.relative_path().display().to_string(),
                });
            }
        }
        Ok(())
    }

    fn write_build_metadata(&self, name: &str, elapsed_secs: f64) -> Result<(), WarpError> {
        let pipe = self.graph.pipe(name).unwrap();
        let source_path = self.pipe_sources.get(name).and_then(|p| p.as_deref());
        let cache_key = metadata::pipe_cache_key(source_path, name);
        let session_dir = self.home.session_dir()?;

        let commit_hash = source_path.and_then(|p| metadata::git_commit_hash(Path::new(p)));
        metadata::write_metadata(
            &session_dir,
            &cache_key,
            &metadata::MetadataRecord {
                pipe_name: name.to_string(),
                last_build_time: metadata::now_secs(),
                time_elapsed_secs: elapsed_secs,
                git_commit_hash: commit_hash,
            },
        )?;

        let snapshot: BTreeMap<String, ParameterValue> = pipe.parameters().iter().map(|p| (p.name().to_string(), p.value().clone())).collect();
        metadata::write_parameters_snapshot(&session_dir, &cache_key, &snapshot)?;
        metadata::write_source_snapshot(&session_dir, &cache_key, source_path)?;

        self.home.write_current_session_meta()
    }

    // ---- session management ------------------------------------------------

    pub fn resume(&mut self) -> Result<(), WarpError> {
        self.home.resume()?;
        self.reapply_parameter_snapshots()
    }

    pub fn load_session(&mut self, session_id: impl Into<String>) -> Result<(), WarpError> {
        self.home.load(session_id)?;
        self.reapply_parameter_snapshots()
    }

    pub fn create_session(&mut self, session_id: Option<String>) -> Result<(), WarpError> {
        match session_id {
            Some(id) => self.home.create(id),
            None => self.home.create(metadata::now_secs().to_string()),
        }
    }

    pub fn clear_cache(&mut self, session_id: Option<&str>, clear_all: bool) -> Result<(), WarpError> {
        self.home.clear_cache(session_id, clear_all)
    }

    fn reapply_parameter_snapshots(&mut self) -> Result<(), WarpError> {
        let session_dir = self.home.session_dir()?;
        let names: Vec<String> = self.graph.names().map(str::to_string).collect();
        for name in names {
            let source_path = self.pipe_sources.get(&name).and_then(|p| p.as_deref());
            let cache_key = metadata::pipe_cache_key(source_path, &name);
            if let Some(snapshot) = metadata::read_parameters_snapshot(&session_dir, &cache_key)? {
                let pipe = self.graph.pipe_mut(&name).unwrap();
                for (key, value) in snapshot {
                    if let Some(param) = pipe.param_mut(&key) {
                        let _ = param.set_checked(value);
                    }
                }
            }
        }
        Ok(())
    }

    // ---- introspection ------------------------------------------------------

    pub fn pipes(&self) -> Vec<String> {
        self.graph.names().map(str::to_string).collect()
    }

    pub fn sessions(&self) -> Result<Vec<String>, WarpError> {
        self.home.list_sessions()
    }

    pub fn session_timestamps(&self) -> Result<BTreeMap<String, u64>, WarpError> {
        let mut out = BTreeMap::new();
        for session_id in self.home.list_sessions()? {
            if let Some(ts) = self.home.session_timestamp(&session_id)? {
                out.insert(session_id, ts);
            }
        }
        Ok(out)
    }

    pub fn parameters(&self, pipe: &str) -> Result<BTreeMap<String, ParameterValue>, WarpError> {
        let name = self.resolve(pipe)?;
        let pipe = self.graph.pipe(&name).expect("resolved name exists");
        Ok(pipe.parameters().iter().map(|p| (p.name().to_string(), p.value().clone())).collect())
    }

    pub fn products(&self, pipe: &str) -> Result<Vec<(PathBuf, PathBuf)>, WarpError> {
        let name = self.resolve(pipe)?;
        let pipe = self.graph.pipe(&name).expect("resolved name exists");
        Ok(pipe
            .products()
            .iter()
            .map(|p| {
                let resolved = self.home.resolve_product_path(p.relative_path(), p.is_external(), p.is_static());
                (p.relative_path().to_path_buf(), resolved)
            })
            .collect())
    }

    pub fn view_pipe(&self, pipe: &str) -> Result<String, WarpError> {
        let name = self.resolve(pipe)?;
        let pipe = self.graph.pipe(&name).expect("resolved name exists");
        Ok(format!(
            "{}\n  source: {:?}\n  parameters: {}\n  products: {}\n  dependencies: {}",
            pipe.name(),
            pipe.origin(),
            pipe.parameters().len(),
            pipe.products().len(),
            pipe.dependencies().len()
        ))
    }

    /// Lineage, staleness, last-build metadata, and product locations
    /// for `target`, per the Workspace façade's `status` operation.
    pub fn status(&self, target: &str) -> Result<StatusReport, WarpError> {
        let name = self.resolve(target)?;
        let provider = self.state_provider();
        let mut lineage = self.graph.lineage(&name)?;
        lineage.push(name.clone());

        let stale = staleness::gap_pipes(&self.graph, &name, &provider, self.link_static_products, false)?;

        let source_path = self.pipe_sources.get(&name).and_then(|p| p.as_deref());
        let cache_key = metadata::pipe_cache_key(source_path, &name);
        let session_dir = self.home.session_dir()?;
        let record = metadata::read_latest_metadata(&session_dir, &cache_key)?;

        Ok(StatusReport {
            target: name.clone(),
            lineage,
            stale,
            last_build_time: record.as_ref().map(|r| r.last_build_time),
            git_commit_hash: record.as_ref().and_then(|r| r.git_commit_hash.clone()),
            time_elapsed_secs: record.as_ref().map(|r| r.time_elapsed_secs),
            parameters: self.parameters(&name)?,
            products: self.products(&name)?,
        })
    }

    /// Loads a config file, memoizing by path for the lifetime of this
    /// Workspace.
    pub fn configs(&self, path: &Path) -> Result<FlatConfig, WarpError> {
        self.load_config(path)
    }

    /// Preflight check, separate from `status`: fails if any ancestor of
    /// `target` has never been built, or if an ancestor's newest product
    /// is younger than one of its own descendants' (a chronology
    /// violation). Neither condition stops `status` or `backfill`
    /// themselves — both treat it as ordinary staleness instead.
    pub fn check_ancestry_integrity(&self, target: &str) -> Result<(), WarpError> {
        let name = self.resolve(target)?;
        let provider = self.state_provider();
        staleness::check_ancestry_integrity(&self.graph, &name, &provider)
    }
}

fn coerce_scalar(declared_type: ParameterType, key: &str, raw: &str) -> Result<ParameterValue, WarpError> {
    let invalid = || WarpError::InvalidParameterType {
        parameter: key.to_string(),
        expected: declared_type.name().to_string(),
        actual: raw.to_string(),
    };
    match declared_type {
        ParameterType::Null => Ok(ParameterValue::Null),
        ParameterType::Bool => raw.parse().map(ParameterValue::Bool).map_err(|_| invalid()),
        ParameterType::Integer => raw.parse().map(ParameterValue::Integer).map_err(|_| invalid()),
        ParameterType::Real => raw.parse().map(ParameterValue::Real).map_err(|_| invalid()),
        ParameterType::String => Ok(ParameterValue::String(raw.to_string())),
        ParameterType::Timestamp => raw.parse().map(ParameterValue::Timestamp).map_err(|_| invalid()),
        ParameterType::ByteString => hex::decode(raw).map(ParameterValue::ByteString).map_err(|_| invalid()),
        ParameterType::Complex => serde_json::from_str(raw).map(ParameterValue::Complex).map_err(|_| invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;
    use warp_domain::entities::{PipeBuilder, ProductDependency};
    use warp_domain::value_objects::{Parameter, Product};

    fn pipe_a(calls: Arc<Mutex<Vec<String>>>) -> Pipe {
        PipeBuilder::new("A")
            .source_file("A.rs", "fn a() {}")
            .product(Product::new("data/a.bin"))
            .action(move |ctx| {
                calls.lock().unwrap().push("A".to_string());
                ctx.set_output("data/a.bin", ProductValue::Bytes(vec![42]));
                Ok(())
            })
            .build()
            .unwrap()
    }

    fn pipe_b(calls: Arc<Mutex<Vec<String>>>) -> Pipe {
        PipeBuilder::new("B")
            .source_file("B.rs", "fn b() {}")
            .depends_on(ProductDependency::new("a", "data/a.bin"))
            .product(Product::new("data/b.bin"))
            .action(move |ctx| {
                calls.lock().unwrap().push("B".to_string());
                let input = ctx.input("a").unwrap().as_value().unwrap().clone();
                let byte = input.as_bytes().unwrap()[0];
                ctx.set_output("data/b.bin", ProductValue::Bytes(vec![byte + 1]));
                Ok(())
            })
            .build()
            .unwrap()
    }

    #[test]
    fn linear_build_persists_products_and_writes_metadata() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dir = tempdir().unwrap();
        let mut ws = Workspace::new(dir.path(), Some("s1".into()), vec![(pipe_a(calls.clone()), false), (pipe_b(calls.clone()), false)]).unwrap();

        ws.build("B", BTreeMap::new()).unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["B".to_string()]);

        let products = ws.products("B").unwrap();
        let b_path = &products[0].1;
        assert_eq!(product_io::read_default(b_path).unwrap(), ProductValue::Bytes(vec![43]));
    }

    #[test]
    fn backfill_of_a_fully_built_target_has_empty_trajectory_on_rerun() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dir = tempdir().unwrap();
        let mut ws = Workspace::new(dir.path(), Some("s1".into()), vec![(pipe_a(calls.clone()), false)]).unwrap();

        ws.build("A", BTreeMap::new()).unwrap();

        let provider = ws.state_provider();
        let gaps = staleness::gap_pipes(&ws.graph, "A", &provider, false, false).unwrap();
        assert!(gaps.is_empty());
    }

    #[test]
    fn status_reports_lineage_and_last_build_time() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dir = tempdir().unwrap();
        let mut ws = Workspace::new(dir.path(), Some("s1".into()), vec![(pipe_a(calls.clone()), false), (pipe_b(calls.clone()), false)]).unwrap();
        ws.build("B", BTreeMap::new()).unwrap();

        let report = ws.status("B").unwrap();
        assert_eq!(report.target, "B");
        assert!(report.lineage.contains(&"A".to_string()));
        assert!(report.last_build_time.is_some());
    }

    #[test]
    fn unsaved_product_is_passed_in_memory_without_touching_disk() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dir = tempdir().unwrap();

        let a = PipeBuilder::new("A")
            .source_file("A.rs", "")
            .product(Product::new("data/a.bin").with_save(SaveMode::Disabled))
            .action({
                let calls = calls.clone();
                move |ctx| {
                    calls.lock().unwrap().push("A".to_string());
                    ctx.set_output("data/a.bin", ProductValue::Bytes(vec![7]));
                    Ok(())
                }
            })
            .build()
            .unwrap();
        let b = pipe_b(calls.clone());

        let mut ws = Workspace::new(dir.path(), Some("s1".into()), vec![(a, false), (b, false)]).unwrap();
        ws.build("B", BTreeMap::new()).unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["A".to_string(), "B".to_string()]);
        let a_product_path = ws.home.resolve_product_path(Path::new("data/a.bin"), false, false);
        assert!(!a_product_path.exists());
    }

    #[test]
    fn override_coerces_string_into_declared_parameter_type() {
        let dir = tempdir().unwrap();
        let a = PipeBuilder::new("A")
            .source_file("A.rs", "")
            .parameter(Parameter::new("threshold", ParameterValue::Integer(1)))
            .action(|_ctx| Ok(()))
            .build()
            .unwrap();

        let mut ws = Workspace::new(dir.path(), Some("s1".into()), vec![(a, false)]).unwrap();
        let mut overrides = BTreeMap::new();
        overrides.insert("threshold".to_string(), "9".to_string());
        ws.build("A", overrides).unwrap();

        let params = ws.parameters("A").unwrap();
        assert_eq!(params.get("threshold"), Some(&ParameterValue::Integer(9)));
    }
}
