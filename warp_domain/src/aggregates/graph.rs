// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Graph Aggregate
//!
//! The multi-DAG of pipes. `Graph` owns topology validation, automatic
//! source-pipe synthesis, fuzzy name lookup, and serialization of the
//! *adding script* — the ordered sequence of `add` calls that, replayed,
//! reconstructs the graph. The graph records how it was built, not its
//! adjacency, because dynamic source-pipe synthesis makes replay
//! order-dependent.
//!
//! Edges are stored as plain adjacency maps rather than through a
//! generic graph library: every algorithm this type needs (ancestor
//! sets, reachability, simple paths) is a few lines of BFS/DFS, and
//! insertion order — load-bearing for determinism throughout this
//! module — is native to [`indexmap::IndexMap`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::entities::pipe::Pipe;
use crate::error::WarpError;
use crate::value_objects::product::paths_nest;

/// One entry of a pipe's config-path registration, tracked so the
/// `multi_use` invariant can be checked when a later pipe tries to
/// reuse the same path.
#[derive(Debug, Clone)]
struct ConfigBinding {
    pipe_name: String,
    multi_use: bool,
}

/// The ordered `(pipe_name, make_dependencies_sources)` sequence that
/// reconstructs a graph when replayed through [`Graph::add`].
pub type AddScript = Vec<(String, bool)>;

#[derive(Default, Debug)]
pub struct Graph {
    pipes: IndexMap<String, Pipe>,
    /// producer -> [(consumer, product_path)]
    forward_edges: HashMap<String, Vec<(String, PathBuf)>>,
    /// consumer -> [(producer, product_path)]
    reverse_edges: HashMap<String, Vec<(String, PathBuf)>>,
    config_bindings: HashMap<PathBuf, Vec<ConfigBinding>>,
    add_script: AddScript,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pipes.contains_key(name)
    }

    pub fn pipe(&self, name: &str) -> Option<&Pipe> {
        self.pipes.get(name)
    }

    pub fn pipe_mut(&mut self, name: &str) -> Option<&mut Pipe> {
        self.pipes.get_mut(name)
    }

    /// Pipe names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pipes.keys().map(String::as_str)
    }

    pub fn add_script(&self) -> &AddScript {
        &self.add_script
    }

    /// Inserts a pipe: rejects nested products and reused config paths,
    /// resolves its dependencies against already-added pipes (optionally
    /// synthesizing a source pipe for anything left unresolved), and
    /// records the call in the add-script.
    pub fn add(&mut self, pipe: Pipe, make_dependencies_sources: bool) -> Result<(), WarpError> {
        self.add_impl(pipe, make_dependencies_sources, false, true)
    }

    /// Inserts a pipe, replacing any existing pipe of the same name
    /// instead of rejecting the call as `DuplicatePipe`.
    pub fn add_override(&mut self, pipe: Pipe, make_dependencies_sources: bool) -> Result<(), WarpError> {
        self.add_impl(pipe, make_dependencies_sources, true, true)
    }

    fn add_impl(
        &mut self,
        pipe: Pipe,
        make_dependencies_sources: bool,
        allow_override: bool,
        record: bool,
    ) -> Result<(), WarpError> {
        let name = pipe.name().to_string();

        if self.pipes.contains_key(&name) {
            if !allow_override {
                return Err(WarpError::DuplicatePipe(name));
            }
            self.remove_pipe(&name);
        }

        for new_product in pipe.products() {
            for (existing_name, existing_pipe) in &self.pipes {
                for existing_product in existing_pipe.products() {
                    if paths_nest(new_product.relative_path(), existing_product.relative_path()) {
                        return Err(WarpError::NestedProduct {
                            new: format!("{}:{}", name, new_product.relative_path().display()),
                            existing: format!("{}:{}", existing_name, existing_product.relative_path().display()),
                        });
                    }
                }
            }
        }

        for file in pipe.parameter_files() {
            if let Some(existing) = self.config_bindings.get(file.path()) {
                let all_multi_use = file.multi_use() && existing.iter().all(|b| b.multi_use);
                if !all_multi_use {
                    return Err(WarpError::DuplicateConfig(file.path().display().to_string()));
                }
            }
        }

        let mut pipe = pipe;
        let mut unresolved: Vec<PathBuf> = Vec::new();
        let mut resolutions: Vec<(usize, String)> = Vec::new();
        for (idx, dep) in pipe.dependencies().iter().enumerate() {
            match self.find_producer(dep.product_path()) {
                Some(producer) => resolutions.push((idx, producer)),
                None => unresolved.push(dep.product_path().to_path_buf()),
            }
        }

        if !unresolved.is_empty() {
            if !make_dependencies_sources {
                return Err(WarpError::UnresolvedDependency {
                    pipe: name,
                    product: unresolved[0].display().to_string(),
                });
            }
            let base = Self::source_base_name(&name);
            let source_name = self.next_source_name(&base);
            let source_products = unresolved.iter().cloned().map(crate::value_objects::Product::new).collect();
            let source_pipe = Pipe::new_source(source_name.clone(), source_products);
            // The synthesized source pipe is a side effect of this call, not a
            // user-initiated add — it must not get its own add-script entry,
            // or replaying the script would try to look it up in the user's
            // pipe registry and fail.
            self.add_impl(source_pipe, false, false, false)?;
            for path in &unresolved {
                resolutions.push((
                    pipe.dependencies().iter().position(|d| d.product_path() == path).unwrap(),
                    source_name.clone(),
                ));
            }
        }

        for (idx, producer) in &resolutions {
            pipe.dependencies_mut()[*idx].resolve(producer.clone());
        }

        for file in pipe.parameter_files() {
            self.config_bindings.entry(file.path().to_path_buf()).or_default().push(ConfigBinding {
                pipe_name: name.clone(),
                multi_use: file.multi_use(),
            });
        }

        for (_, producer) in &resolutions {
            let product_path = pipe
                .dependencies()
                .iter()
                .find(|d| d.source_pipe() == Some(producer.as_str()))
                .map(|d| d.product_path().to_path_buf());
            if let Some(product_path) = product_path {
                self.forward_edges
                    .entry(producer.clone())
                    .or_default()
                    .push((name.clone(), product_path.clone()));
                self.reverse_edges.entry(name.clone()).or_default().push((producer.clone(), product_path));
            }
        }

        for product in pipe.products_mut() {
            product.set_source_pipe(name.clone());
        }

        self.pipes.insert(name.clone(), pipe);
        if record {
            self.add_script.push((name, make_dependencies_sources));
        }
        Ok(())
    }

    fn remove_pipe(&mut self, name: &str) {
        self.pipes.shift_remove(name);
        self.forward_edges.remove(name);
        self.reverse_edges.remove(name);
        for edges in self.forward_edges.values_mut() {
            edges.retain(|(consumer, _)| consumer != name);
        }
        for edges in self.reverse_edges.values_mut() {
            edges.retain(|(producer, _)| producer != name);
        }
        for bindings in self.config_bindings.values_mut() {
            bindings.retain(|b| b.pipe_name != name);
        }
    }

    fn find_producer(&self, product_path: &Path) -> Option<String> {
        for (name, pipe) in &self.pipes {
            if pipe.products().iter().any(|p| p.relative_path() == product_path) {
                return Some(name.clone());
            }
        }
        None
    }

    fn source_base_name(dependent_name: &str) -> String {
        dependent_name.rsplit('.').next().unwrap_or(dependent_name).to_string()
    }

    fn next_source_name(&self, base: &str) -> String {
        let mut n = 0usize;
        loop {
            let candidate = format!("{}{}{}", Pipe::SOURCE_PREFIX, base, n);
            if !self.pipes.contains_key(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Ancestors of `target`, in graph insertion order. Does not include
    /// `target` itself.
    pub fn lineage(&self, target: &str) -> Result<Vec<String>, WarpError> {
        if !self.pipes.contains_key(target) {
            return Err(WarpError::UnknownPipe(target.to_string()));
        }
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(target.to_string());
        while let Some(current) = queue.pop_front() {
            if let Some(parents) = self.reverse_edges.get(&current) {
                for (producer, _) in parents {
                    if visited.insert(producer.clone()) {
                        queue.push_back(producer.clone());
                    }
                }
            }
        }
        let mut result: Vec<String> = visited.into_iter().collect();
        result.sort_by_key(|name| self.pipes.get_index_of(name).unwrap_or(usize::MAX));
        Ok(result)
    }

    /// Whether `to` is reachable from `from` by following producer ->
    /// consumer edges.
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(from.to_string());
        while let Some(current) = queue.pop_front() {
            if let Some(children) = self.forward_edges.get(&current) {
                for (consumer, _) in children {
                    if consumer == to {
                        return true;
                    }
                    if visited.insert(consumer.clone()) {
                        queue.push_back(consumer.clone());
                    }
                }
            }
        }
        false
    }

    /// All simple paths from `source` to `dest`.
    pub fn paths(&self, source: &str, dest: &str) -> Vec<Vec<String>> {
        let mut results = Vec::new();
        let mut stack = vec![source.to_string()];
        self.paths_dfs(source, dest, &mut stack, &mut results);
        results
    }

    fn paths_dfs(&self, current: &str, dest: &str, stack: &mut Vec<String>, results: &mut Vec<Vec<String>>) {
        if current == dest {
            results.push(stack.clone());
            return;
        }
        if let Some(children) = self.forward_edges.get(current) {
            for (next, _) in children {
                if stack.contains(next) {
                    continue;
                }
                stack.push(next.clone());
                self.paths_dfs(next, dest, stack, results);
                stack.pop();
            }
        }
    }

    /// Fuzzy, case-sensitive substring lookup. An exact match wins over
    /// any number of substring matches.
    pub fn resolve_name(&self, query: &str) -> Result<String, WarpError> {
        if self.pipes.contains_key(query) {
            return Ok(query.to_string());
        }
        let matches: Vec<String> = self.pipes.keys().filter(|name| name.contains(query)).cloned().collect();
        match matches.len() {
            0 => Err(WarpError::UnknownPipe(query.to_string())),
            1 => Ok(matches.into_iter().next().unwrap()),
            _ => Err(WarpError::AmbiguousName {
                query: query.to_string(),
                matches,
            }),
        }
    }

    /// Serializes the add-script to `path` as JSON.
    pub fn save_script(&self, path: &Path) -> Result<(), WarpError> {
        let json = serde_json::to_string_pretty(&self.add_script)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reads a previously saved add-script without mutating any graph.
    pub fn load_script(path: &Path) -> Result<AddScript, WarpError> {
        let contents = std::fs::read_to_string(path)?;
        let script: AddScript = serde_json::from_str(&contents)?;
        Ok(script)
    }

    /// Clears all state and replays `script`, resolving each entry's
    /// `Pipe` definition through `lookup`. This is how a child process
    /// reconstructs the graph from the persisted add-script without
    /// needing the full graph serialized to disk.
    pub fn replay<F>(&mut self, script: &AddScript, mut lookup: F) -> Result<(), WarpError>
    where
        F: FnMut(&str) -> Option<Pipe>,
    {
        *self = Graph::new();
        for (name, make_dependencies_sources) in script {
            let pipe = lookup(name).ok_or_else(|| WarpError::UnknownPipe(name.clone()))?;
            self.add(pipe, *make_dependencies_sources)?;
        }
        Ok(())
    }
}

/// A standalone, serializable snapshot of an add-script, for the
/// `graph.pkl`-equivalent file on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphScript(pub AddScript);


#[cfg(test)]
mod graph_invariants {
    use proptest::prelude::*;

    use super::*;
    use crate::entities::{ActionContext, PipeBuilder, ProductDependency};
    use crate::value_objects::Product;

    fn noop(_ctx: &mut ActionContext) -> Result<(), WarpError> {
        Ok(())
    }

    fn named_pipe(name: &str, product: &str, deps: &[(String, String)]) -> Pipe {
        let mut b = PipeBuilder::new(name).source_file(format!("{name}.rs"), "");
        for (key, path) in deps {
            b = b.depends_on(ProductDependency::new(key.clone(), path.clone()));
        }
        b.product(Product::new(product)).action(noop).build().unwrap()
    }

    fn letter_names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("P{i}")).collect()
    }

    fn linear_chain(names: &[String]) -> Graph {
        let mut g = Graph::new();
        for (i, name) in names.iter().enumerate() {
            let product = format!("data/{name}.bin");
            let deps = if i == 0 { vec![] } else { vec![("dep".to_string(), format!("data/{}.bin", names[i - 1]))] };
            g.add(named_pipe(name, &product, &deps), false).unwrap();
        }
        g
    }

    proptest! {
        /// A linear chain of any length is acyclic and free of
        /// duplicates: each pipe's lineage is exactly its predecessors,
        /// in insertion order, and never includes the pipe itself.
        #[test]
        fn linear_chain_lineage_has_no_duplicates_and_excludes_target(chain_len in 1usize..12) {
            let names = letter_names(chain_len);
            let g = linear_chain(&names);

            let target = names.last().unwrap();
            let lineage = g.lineage(target).unwrap();

            prop_assert_eq!(lineage.len(), chain_len - 1);
            prop_assert!(!lineage.contains(target));
            let mut seen = std::collections::HashSet::new();
            prop_assert!(lineage.iter().all(|n| seen.insert(n.clone())));
            prop_assert_eq!(&lineage, &names[..chain_len - 1]);
        }

        /// Every unresolved dependency on a single pipe, when
        /// `make_dependencies_sources` is set, synthesizes its own
        /// uniquely-named source pipe — no two collide, and every one
        /// is reachable as an ancestor of the dependent.
        #[test]
        fn synthesized_source_names_never_collide(dep_count in 1usize..8) {
            let deps: Vec<(String, String)> = (0..dep_count).map(|i| (format!("raw{i}"), format!("inputs/raw{i}.txt"))).collect();

            let mut g = Graph::new();
            g.add(named_pipe("A", "data/a.bin", &deps), true).unwrap();

            let lineage = g.lineage("A").unwrap();
            prop_assert_eq!(lineage.len(), dep_count);
            let mut seen = std::collections::HashSet::new();
            for name in &lineage {
                prop_assert!(name.starts_with(Pipe::SOURCE_PREFIX));
                prop_assert!(seen.insert(name.clone()), "source pipe name {} was reused", name);
            }
        }

        /// The build trajectory (gap pipes) computed by the staleness
        /// analyzer is always a subset of `lineage(target) ++ [target]`,
        /// regardless of which prefix of a linear chain is already
        /// considered built.
        #[test]
        fn trajectory_is_always_a_subset_of_lineage_plus_target(chain_len in 1usize..8, built_prefix in 0usize..8) {
            let names = letter_names(chain_len);
            let g = linear_chain(&names);

            let built_prefix = built_prefix.min(chain_len);
            let provider = FakeProvider { built: names[..built_prefix].iter().cloned().collect() };
            let target = names.last().unwrap();

            let trajectory = crate::services::staleness::gap_pipes(&g, target, &provider, false, false).unwrap();

            let mut lineage = g.lineage(target).unwrap();
            lineage.push(target.clone());
            for pipe in &trajectory {
                prop_assert!(lineage.contains(pipe));
            }
            let mut seen = std::collections::HashSet::new();
            prop_assert!(trajectory.iter().all(|n| seen.insert(n.clone())));
        }
    }

    struct FakeProvider {
        built: std::collections::HashSet<String>,
    }

    impl crate::repositories::BuildStateProvider for FakeProvider {
        fn product_mtime(&self, pipe: &str, _relative_path: &Path) -> Result<Option<std::time::SystemTime>, WarpError> {
            Ok(self.built.contains(pipe).then(std::time::SystemTime::now))
        }

        fn source_mtime(&self, _pipe: &str) -> Result<Option<std::time::SystemTime>, WarpError> {
            Ok(Some(std::time::SystemTime::UNIX_EPOCH))
        }

        fn static_product_exists(&self, _relative_path: &Path) -> Result<bool, WarpError> {
            Ok(false)
        }
    }
}
