// /////////////////////////////////////////////////////////////////////////////
// WARP
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Staleness Analysis
//!
//! Computes the *gap pipes* for a build target: the subset of the
//! target's lineage (plus the target itself) that must run before the
//! target is up to date. A pipe is a gap pipe if any of these hold:
//!
//! - it declares no products at all (there is nothing to check freshness
//!   against, so it always reruns);
//! - one of its declared products is missing;
//! - its source is newer than one of its products (the pipe's own
//!   definition changed since it last ran);
//! - a dependency's producer produced its product *after* this pipe's
//!   own product was last written — a chronology violation. This folds
//!   into ordinary staleness (the pipe becomes a gap pipe) rather than
//!   erroring out of the analysis; a session whose recorded build order
//!   cannot be trusted is reported separately by
//!   [`check_ancestry_integrity`], a preflight the caller invokes on its
//!   own schedule (`status`), not on every `gap_pipes`/`backfill` call;
//! - any of its ancestors is itself a gap pipe (staleness cascades
//!   forward through the graph).
//!
//! When `link_static_products` is on, ancestors whose *every* outgoing
//! edge in the lineage is a static, already-present product are pruned
//! from consideration before staleness is even evaluated, then the
//! remaining lineage is restricted to the connected component still
//! reaching the target — a pipe pruned this way never appears as a gap
//! pipe, regardless of its own mtime. `rebuild_static_products`
//! suppresses this pruning; it never adds pipes to the trajectory on
//! its own.

use std::collections::{HashSet, VecDeque};

use crate::aggregates::graph::Graph;
use crate::entities::Pipe;
use crate::error::WarpError;
use crate::repositories::BuildStateProvider;

/// Returns the gap pipes for `target`, in an order consistent with the
/// graph's topology (ancestors before descendants).
pub fn gap_pipes(
    graph: &Graph,
    target: &str,
    provider: &dyn BuildStateProvider,
    link_static_products: bool,
    rebuild_static_products: bool,
) -> Result<Vec<String>, WarpError> {
    let mut lineage_full = graph.lineage(target)?;
    lineage_full.push(target.to_string());

    let lineage = if link_static_products {
        prune_static_ancestors(graph, &lineage_full, target, provider, rebuild_static_products)?
    } else {
        lineage_full.clone()
    };

    let mut stale: HashSet<String> = HashSet::new();
    for name in &lineage {
        let pipe = graph.pipe(name).ok_or_else(|| WarpError::UnknownPipe(name.clone()))?;
        if is_stale(graph, pipe, provider, &stale)? {
            stale.insert(name.clone());
        }
    }

    Ok(lineage_full.into_iter().filter(|n| stale.contains(n)).collect())
}

/// Drops ancestors from `lineage_full` whose every outgoing dependency
/// edge within the lineage points at a static, already-cached product
/// (unless `rebuild_static_products` suppresses the drop), then
/// restricts what remains to the connected component that still reaches
/// `target` — a pipe kept alive only through an edge to a now-pruned
/// ancestor must not survive on its own.
fn prune_static_ancestors(
    graph: &Graph,
    lineage_full: &[String],
    target: &str,
    provider: &dyn BuildStateProvider,
    rebuild_static_products: bool,
) -> Result<Vec<String>, WarpError> {
    let mut parents_to_drop: HashSet<String> = HashSet::new();
    let mut parents_to_keep: HashSet<String> = HashSet::new();

    for name in lineage_full {
        let pipe = graph.pipe(name).ok_or_else(|| WarpError::UnknownPipe(name.clone()))?;
        for dep in pipe.dependencies() {
            let Some(producer_name) = dep.source_pipe() else { continue };
            let Some(producer_pipe) = graph.pipe(producer_name) else { continue };
            let Some(product) = producer_pipe.product(dep.product_path()) else { continue };

            let already_cached = product.is_static() && provider.static_product_exists(product.relative_path())?;
            if !rebuild_static_products && already_cached {
                parents_to_drop.insert(producer_name.to_string());
            } else {
                parents_to_keep.insert(producer_name.to_string());
            }
        }
    }

    let filtered: Vec<String> =
        lineage_full.iter().filter(|p| !(parents_to_drop.contains(*p) && !parents_to_keep.contains(*p))).cloned().collect();

    let filtered_set: HashSet<&str> = filtered.iter().map(String::as_str).collect();
    let mut component: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    component.insert(target.to_string());
    queue.push_back(target.to_string());
    while let Some(current) = queue.pop_front() {
        let Some(pipe) = graph.pipe(&current) else { continue };
        for dep in pipe.dependencies() {
            let Some(producer_name) = dep.source_pipe() else { continue };
            if !filtered_set.contains(producer_name) {
                continue;
            }
            if component.insert(producer_name.to_string()) {
                queue.push_back(producer_name.to_string());
            }
        }
    }

    Ok(filtered.into_iter().filter(|p| component.contains(p)).collect())
}

fn is_stale(graph: &Graph, pipe: &Pipe, provider: &dyn BuildStateProvider, stale_so_far: &HashSet<String>) -> Result<bool, WarpError> {
    if pipe.is_source() {
        return Ok(false);
    }

    for dep in pipe.dependencies() {
        if let Some(producer) = dep.source_pipe() {
            if stale_so_far.contains(producer) {
                return Ok(true);
            }
        }
    }

    if pipe.products().is_empty() {
        return Ok(true);
    }

    for product in pipe.products() {
        if provider.product_mtime(pipe.name(), product.relative_path())?.is_none() {
            return Ok(true);
        }
    }

    let source_mtime = provider.source_mtime(&pipe.cache_key_source())?;

    for product in pipe.products().iter().filter(|p| !p.is_static()) {
        let product_mtime =
            provider.product_mtime(pipe.name(), product.relative_path())?.expect("presence already checked above");

        if let Some(sm) = source_mtime {
            if sm > product_mtime {
                return Ok(true);
            }
        }

        for dep in pipe.dependencies() {
            let Some(producer_name) = dep.source_pipe() else { continue };
            let Some(producer_pipe) = graph.pipe(producer_name) else { continue };
            let Some(dep_product) = producer_pipe.product(dep.product_path()) else { continue };
            if let Some(dep_mtime) = provider.product_mtime(producer_name, dep_product.relative_path())? {
                if dep_mtime > product_mtime {
                    // A descendant older than an ancestor is a staleness
                    // criterion, not an error here — see the module docs.
                    return Ok(true);
                }
            }
        }
    }

    Ok(false)
}

/// `age(p)`, per spec §4.2 step 3: the pipe's last recorded build time,
/// or `+∞` (never built) if it has none. Built on the same mtime-backed
/// provider `gap_pipes` uses, rather than a separate metadata read.
fn pipe_is_built(pipe: &Pipe, provider: &dyn BuildStateProvider) -> Result<bool, WarpError> {
    if pipe.is_source() {
        return Ok(true);
    }
    if pipe.products().is_empty() {
        return Ok(false);
    }
    for product in pipe.products() {
        if provider.product_mtime(pipe.name(), product.relative_path())?.is_none() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// A preflight the caller runs on its own schedule (`status`), never
/// implicitly from `gap_pipes`/`backfill`: raises `StaleAncestors` for
/// any ancestor of `target` that has never been built, else
/// `ChronologyViolation` for the first ancestor built more recently than
/// one of its own descendants in the lineage. Grounded on the Python
/// original's `_discuss_ancestry_integrity`, which performs this same
/// check as a standalone, caller-invoked diagnostic rather than folding
/// it into the gap-pipe computation itself.
pub fn check_ancestry_integrity(graph: &Graph, target: &str, provider: &dyn BuildStateProvider) -> Result<(), WarpError> {
    let lineage = graph.lineage(target)?;

    let mut unbuilt = Vec::new();
    for name in &lineage {
        let pipe = graph.pipe(name).ok_or_else(|| WarpError::UnknownPipe(name.clone()))?;
        if !pipe_is_built(pipe, provider)? {
            unbuilt.push(name.clone());
        }
    }
    if let Some(first) = unbuilt.into_iter().next() {
        return Err(WarpError::StaleAncestors(first));
    }

    let mut lineage_full = lineage;
    lineage_full.push(target.to_string());

    for (j, descendant) in lineage_full.iter().enumerate() {
        for ancestor in &lineage_full[..j] {
            if !graph.has_path(ancestor, descendant) {
                continue;
            }
            let descendant_pipe = graph.pipe(descendant).ok_or_else(|| WarpError::UnknownPipe(descendant.clone()))?;
            let ancestor_pipe = graph.pipe(ancestor).ok_or_else(|| WarpError::UnknownPipe(ancestor.clone()))?;
            if let (Some(d_age), Some(a_age)) = (newest_product_mtime(descendant_pipe, provider)?, newest_product_mtime(ancestor_pipe, provider)?)
            {
                if d_age < a_age {
                    return Err(WarpError::ChronologyViolation {
                        descendant: descendant.clone(),
                        ancestor: ancestor.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}

fn newest_product_mtime(pipe: &Pipe, provider: &dyn BuildStateProvider) -> Result<Option<std::time::SystemTime>, WarpError> {
    let mut newest = None;
    for product in pipe.products() {
        if let Some(mtime) = provider.product_mtime(pipe.name(), product.relative_path())? {
            newest = Some(match newest {
                Some(current) if current >= mtime => current,
                _ => mtime,
            });
        }
    }
    Ok(newest)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::entities::{ActionContext, PipeBuilder, ProductDependency};
    use crate::value_objects::Product;

    #[derive(Default)]
    struct FakeState {
        product_mtimes: RefCell<HashMap<(String, PathBuf), SystemTime>>,
        source_mtimes: RefCell<HashMap<String, SystemTime>>,
        static_products: RefCell<HashSet<PathBuf>>,
    }

    impl FakeState {
        fn set_product(&self, pipe: &str, path: &str, t: SystemTime) {
            self.product_mtimes.borrow_mut().insert((pipe.to_string(), PathBuf::from(path)), t);
        }

        fn set_source(&self, pipe: &str, t: SystemTime) {
            self.source_mtimes.borrow_mut().insert(pipe.to_string(), t);
        }
    }

    impl BuildStateProvider for FakeState {
        fn product_mtime(&self, pipe: &str, relative_path: &Path) -> Result<Option<SystemTime>, WarpError> {
            Ok(self.product_mtimes.borrow().get(&(pipe.to_string(), relative_path.to_path_buf())).copied())
        }

        fn source_mtime(&self, pipe: &str) -> Result<Option<SystemTime>, WarpError> {
            Ok(self.source_mtimes.borrow().get(pipe).copied())
        }

        fn static_product_exists(&self, relative_path: &Path) -> Result<bool, WarpError> {
            Ok(self.static_products.borrow().contains(relative_path))
        }
    }

    fn noop(_ctx: &mut ActionContext) -> Result<(), WarpError> {
        Ok(())
    }

    fn epoch(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn missing_product_is_a_gap() {
        let mut g = Graph::new();
        g.add(
            PipeBuilder::new("A")
                .source_file("A.rs", "")
                .product(Product::new("a.bin"))
                .action(noop)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();

        let state = FakeState::default();
        let gaps = gap_pipes(&g, "A", &state, false, false).unwrap();
        assert_eq!(gaps, vec!["A".to_string()]);
    }

    #[test]
    fn up_to_date_pipe_is_not_a_gap() {
        let mut g = Graph::new();
        g.add(
            PipeBuilder::new("A")
                .source_file("A.rs", "")
                .product(Product::new("a.bin"))
                .action(noop)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();

        let state = FakeState::default();
        state.set_source("A.rs", epoch(10));
        state.set_product("A", "a.bin", epoch(20));

        assert!(gap_pipes(&g, "A", &state, false, false).unwrap().is_empty());
    }

    #[test]
    fn source_newer_than_product_is_a_gap() {
        let mut g = Graph::new();
        g.add(
            PipeBuilder::new("A")
                .source_file("A.rs", "")
                .product(Product::new("a.bin"))
                .action(noop)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();

        let state = FakeState::default();
        state.set_source("A.rs", epoch(30));
        state.set_product("A", "a.bin", epoch(20));

        assert_eq!(gap_pipes(&g, "A", &state, false, false).unwrap(), vec!["A".to_string()]);
    }

    #[test]
    fn staleness_cascades_to_descendants() {
        let mut g = Graph::new();
        g.add(
            PipeBuilder::new("A")
                .source_file("A.rs", "")
                .product(Product::new("a.bin"))
                .action(noop)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();
        g.add(
            PipeBuilder::new("B")
                .source_file("B.rs", "")
                .depends_on(ProductDependency::new("a", "a.bin"))
                .product(Product::new("b.bin"))
                .action(noop)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();

        let state = FakeState::default();
        state.set_source("A.rs", epoch(30));
        state.set_product("A", "a.bin", epoch(20));
        state.set_source("B.rs", epoch(10));
        state.set_product("B", "b.bin", epoch(40));

        let gaps = gap_pipes(&g, "B", &state, false, false).unwrap();
        assert_eq!(gaps, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn chronology_violation_is_folded_into_staleness_not_an_error() {
        let mut g = Graph::new();
        g.add(
            PipeBuilder::new("A")
                .source_file("A.rs", "")
                .product(Product::new("a.bin"))
                .action(noop)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();
        g.add(
            PipeBuilder::new("B")
                .source_file("B.rs", "")
                .depends_on(ProductDependency::new("a", "a.bin"))
                .product(Product::new("b.bin"))
                .action(noop)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();

        let state = FakeState::default();
        state.set_source("A.rs", epoch(1));
        state.set_product("A", "a.bin", epoch(50));
        state.set_source("B.rs", epoch(1));
        state.set_product("B", "b.bin", epoch(20));

        let gaps = gap_pipes(&g, "B", &state, false, false).unwrap();
        assert_eq!(gaps, vec!["B".to_string()]);
    }

    #[test]
    fn pipe_with_no_products_always_reruns() {
        let mut g = Graph::new();
        g.add(PipeBuilder::new("A").source_file("A.rs", "").action(noop).build().unwrap(), false).unwrap();

        let state = FakeState::default();
        assert_eq!(gap_pipes(&g, "A", &state, false, false).unwrap(), vec!["A".to_string()]);
    }

    fn chained_static_graph() -> Graph {
        let mut g = Graph::new();
        g.add(PipeBuilder::new("D").source_file("D.rs", "").product(Product::new("d.bin")).action(noop).build().unwrap(), false).unwrap();
        g.add(
            PipeBuilder::new("A")
                .source_file("A.rs", "")
                .depends_on(ProductDependency::new("d", "d.bin"))
                .product(Product::new("a.bin").with_static(true))
                .action(noop)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();
        g.add(
            PipeBuilder::new("B")
                .source_file("B.rs", "")
                .depends_on(ProductDependency::new("a", "a.bin"))
                .product(Product::new("b.bin"))
                .action(noop)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();
        g.add(
            PipeBuilder::new("C")
                .source_file("C.rs", "")
                .depends_on(ProductDependency::new("b", "b.bin"))
                .product(Product::new("c.bin"))
                .action(noop)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();
        g
    }

    /// `D -> A -> B -> C`, where `A`'s product consumed by `B` is static
    /// and already cached. With `link_static_products` on, `A` is
    /// dropped, and `D` — never itself dropped, but now reachable to `C`
    /// only through the dropped `A` — is excluded too by the
    /// connected-component restriction. Both would otherwise read as
    /// stale (missing product / source-newer-than-product).
    #[test]
    fn link_static_products_prunes_dropped_ancestor_and_its_now_disconnected_parent() {
        let g = chained_static_graph();

        let state = FakeState::default();
        // D never built.
        // A: source newer than its (static, cached) product -- would be stale if considered.
        state.set_source("A.rs", epoch(999));
        state.set_product("A", "a.bin", epoch(1));
        state.static_products.borrow_mut().insert(PathBuf::from("a.bin"));
        state.set_source("B.rs", epoch(1));
        state.set_product("B", "b.bin", epoch(20));
        state.set_source("C.rs", epoch(1));
        state.set_product("C", "c.bin", epoch(30));

        let gaps = gap_pipes(&g, "C", &state, true, false).unwrap();
        assert_eq!(gaps, Vec::<String>::new());
    }

    #[test]
    fn link_static_products_off_by_default_leaves_lineage_unpruned() {
        let g = chained_static_graph();

        let state = FakeState::default();
        state.set_source("A.rs", epoch(999));
        state.set_product("A", "a.bin", epoch(1));
        state.static_products.borrow_mut().insert(PathBuf::from("a.bin"));
        state.set_source("B.rs", epoch(1));
        state.set_product("B", "b.bin", epoch(20));
        state.set_source("C.rs", epoch(1));
        state.set_product("C", "c.bin", epoch(30));

        let gaps = gap_pipes(&g, "C", &state, false, false).unwrap();
        assert!(gaps.contains(&"D".to_string()));
        assert!(gaps.contains(&"A".to_string()));
    }

    #[test]
    fn rebuild_static_products_suppresses_the_pruning() {
        let g = chained_static_graph();

        let state = FakeState::default();
        state.set_source("A.rs", epoch(999));
        state.set_product("A", "a.bin", epoch(1));
        state.static_products.borrow_mut().insert(PathBuf::from("a.bin"));
        state.set_source("B.rs", epoch(1));
        state.set_product("B", "b.bin", epoch(20));
        state.set_source("C.rs", epoch(1));
        state.set_product("C", "c.bin", epoch(30));

        let gaps = gap_pipes(&g, "C", &state, true, true).unwrap();
        assert!(gaps.contains(&"A".to_string()), "rebuild_static_products must suppress pruning, not add work on top of it");
    }

    #[test]
    fn ancestry_integrity_reports_unbuilt_ancestor() {
        let mut g = Graph::new();
        g.add(PipeBuilder::new("A").source_file("A.rs", "").product(Product::new("a.bin")).action(noop).build().unwrap(), false).unwrap();
        g.add(
            PipeBuilder::new("B")
                .source_file("B.rs", "")
                .depends_on(ProductDependency::new("a", "a.bin"))
                .product(Product::new("b.bin"))
                .action(noop)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();

        let state = FakeState::default();
        state.set_product("B", "b.bin", epoch(10));

        let err = check_ancestry_integrity(&g, "B", &state).unwrap_err();
        assert!(matches!(err, WarpError::StaleAncestors(ref p) if p == "A"));
    }

    #[test]
    fn ancestry_integrity_reports_chronology_violation() {
        let mut g = Graph::new();
        g.add(PipeBuilder::new("A").source_file("A.rs", "").product(Product::new("a.bin")).action(noop).build().unwrap(), false).unwrap();
        g.add(
            PipeBuilder::new("B")
                .source_file("B.rs", "")
                .depends_on(ProductDependency::new("a", "a.bin"))
                .product(Product::new("b.bin"))
                .action(noop)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();

        let state = FakeState::default();
        state.set_product("A", "a.bin", epoch(50));
        state.set_product("B", "b.bin", epoch(20));

        let err = check_ancestry_integrity(&g, "B", &state).unwrap_err();
        assert!(matches!(err, WarpError::ChronologyViolation { ref descendant, ref ancestor } if descendant == "B" && ancestor == "A"));
    }

    #[test]
    fn ancestry_integrity_passes_for_a_properly_ordered_build() {
        let mut g = Graph::new();
        g.add(PipeBuilder::new("A").source_file("A.rs", "").product(Product::new("a.bin")).action(noop).build().unwrap(), false).unwrap();
        g.add(
            PipeBuilder::new("B")
                .source_file("B.rs", "")
                .depends_on(ProductDependency::new("a", "a.bin"))
                .product(Product::new("b.bin"))
                .action(noop)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();

        let state = FakeState::default();
        state.set_product("A", "a.bin", epoch(10));
        state.set_product("B", "b.bin", epoch(20));

        assert!(check_ancestry_integrity(&g, "B", &state).is_ok());
    }
}
