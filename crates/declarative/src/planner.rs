//! Execution planner - orders applications by their declared dependencies
//!
//! Ordering is Kahn's algorithm over an in-degree map. Applications that
//! become ready at the same depth are released as one batch sorted by
//! name, so the resulting order never depends on map iteration order.
//! Anything still unresolved once the queue drains is part of a cycle.

use crate::error::{Error, Result};
use crate::project::AppEntry;
use std::collections::{HashMap, VecDeque};

/// Applications in dependency-respecting order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionPlan {
    apps: Vec<AppEntry>,
}

impl ExecutionPlan {
    /// Ordered applications
    pub fn apps(&self) -> &[AppEntry] {
        &self.apps
    }

    /// Ordered application names
    pub fn names(&self) -> Vec<&str> {
        self.apps.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AppEntry> {
        self.apps.iter()
    }

    /// Number of applications in the plan
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Keep only the named applications, preserving plan order
    ///
    /// An empty selection keeps the whole plan.
    pub fn select<S: AsRef<str>>(self, names: &[S]) -> Result<Self> {
        if names.is_empty() {
            return Ok(self);
        }

        let mut unknown: Vec<String> = names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n: &&str| !self.apps.iter().any(|a| a.name == *n))
            .map(str::to_string)
            .collect();
        if !unknown.is_empty() {
            unknown.sort();
            unknown.dedup();
            return Err(Error::UnknownApp { apps: unknown });
        }

        Ok(Self {
            apps: self
                .apps
                .into_iter()
                .filter(|a| names.iter().any(|n| n.as_ref() == a.name))
                .collect(),
        })
    }
}

impl<'a> IntoIterator for &'a ExecutionPlan {
    type Item = &'a AppEntry;
    type IntoIter = std::slice::Iter<'a, AppEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.apps.iter()
    }
}

/// Compute the execution order for a set of applications
///
/// Fails with [`Error::UnknownDependency`] on the first dependency that
/// names an undeclared application, or [`Error::CircularDependency`]
/// listing every application that could not be ordered.
pub fn resolve_execution_order(apps: &HashMap<String, AppEntry>) -> Result<ExecutionPlan> {
    let mut names: Vec<&str> = apps.keys().map(String::as_str).collect();
    names.sort_unstable();

    // Validate references before building the graph
    for &name in &names {
        let app = &apps[name];
        if let Some(missing) = app.depends_on.iter().find(|d| !apps.contains_key(*d)) {
            return Err(Error::UnknownDependency {
                app: app.name.clone(),
                dependency: missing.clone(),
            });
        }
    }

    let mut in_degree: HashMap<&str, usize> = names.iter().map(|n| (*n, 0)).collect();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for &name in &names {
        for dep in &apps[name].depends_on {
            *in_degree.entry(name).or_default() += 1;
            dependents.entry(dep.as_str()).or_default().push(name);
        }
    }

    let mut queue: VecDeque<&str> = names
        .iter()
        .copied()
        .filter(|n| in_degree[n] == 0)
        .collect();
    let mut order: Vec<&str> = Vec::with_capacity(names.len());

    while let Some(current) = queue.pop_front() {
        order.push(current);

        let mut next_batch: Vec<&str> = Vec::new();
        for dependent in dependents.get(current).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree -= 1;
                if *degree == 0 {
                    next_batch.push(*dependent);
                }
            }
        }
        next_batch.sort_unstable();
        queue.extend(next_batch);
    }

    if order.len() < names.len() {
        let apps: Vec<String> = names
            .iter()
            .filter(|n| !order.contains(n))
            .map(|n| (*n).to_string())
            .collect();
        return Err(Error::CircularDependency { apps });
    }

    log::debug!("Resolved execution order: {}", order.join(" -> "));

    Ok(ExecutionPlan {
        apps: order.into_iter().map(|n| apps[n].clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn app(name: &str, deps: &[&str]) -> AppEntry {
        AppEntry {
            name: name.to_string(),
            app_id: format!("{}-id", name),
            files: BTreeMap::new(),
            domain: None,
            auth: None,
            guest_space_id: None,
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn apps(entries: &[(&str, &[&str])]) -> HashMap<String, AppEntry> {
        entries
            .iter()
            .map(|(name, deps)| (name.to_string(), app(name, deps)))
            .collect()
    }

    fn position(plan: &ExecutionPlan, name: &str) -> usize {
        plan.names().iter().position(|n| *n == name).unwrap()
    }

    #[test]
    fn test_independent_apps_sorted_by_name() {
        let plan = resolve_execution_order(&apps(&[("c", &[]), ("a", &[]), ("b", &[])])).unwrap();
        assert_eq!(plan.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dependencies_come_first() {
        let graph = apps(&[
            ("orders", &["customers", "products"]),
            ("customers", &[]),
            ("products", &["suppliers"]),
            ("suppliers", &[]),
            ("invoices", &["orders"]),
        ]);
        let plan = resolve_execution_order(&graph).unwrap();

        for entry in plan.iter() {
            for dep in &entry.depends_on {
                assert!(
                    position(&plan, dep) < position(&plan, &entry.name),
                    "{} must run before {}",
                    dep,
                    entry.name
                );
            }
        }
        assert_eq!(
            plan.names(),
            vec!["customers", "suppliers", "products", "orders", "invoices"]
        );
    }

    #[test]
    fn test_same_wave_sorted() {
        let graph = apps(&[("root", &[]), ("zeta", &["root"]), ("alpha", &["root"]), ("mid", &["root"])]);
        let plan = resolve_execution_order(&graph).unwrap();
        assert_eq!(plan.names(), vec!["root", "alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let graph = apps(&[
            ("e", &["a"]),
            ("d", &["b", "c"]),
            ("c", &[]),
            ("b", &["a"]),
            ("a", &[]),
        ]);
        let first = resolve_execution_order(&graph).unwrap();
        for _ in 0..10 {
            // Rebuild the map so iteration order can differ
            let rebuilt: HashMap<String, AppEntry> =
                graph.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            assert_eq!(resolve_execution_order(&rebuilt).unwrap(), first);
        }
    }

    #[test]
    fn test_direct_cycle() {
        let err = resolve_execution_order(&apps(&[("a", &["b"]), ("b", &["a"])])).unwrap_err();
        match err {
            Error::CircularDependency { apps } => assert_eq!(apps, vec!["a", "b"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cycle_reports_only_unresolved() {
        let graph = apps(&[
            ("base", &[]),
            ("x", &["base", "z"]),
            ("y", &["x"]),
            ("z", &["y"]),
            ("free", &["base"]),
        ]);
        let err = resolve_execution_order(&graph).unwrap_err();
        assert!(matches!(err, Error::CircularDependency { ref apps } if apps == &["x", "y", "z"]));
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let err = resolve_execution_order(&apps(&[("solo", &["solo"])])).unwrap_err();
        assert_eq!(err.code(), "CIRCULAR_DEPENDENCY");
    }

    #[test]
    fn test_unknown_dependency() {
        let err = resolve_execution_order(&apps(&[("a", &["ghost"]), ("b", &[])])).unwrap_err();
        match err {
            Error::UnknownDependency { app, dependency } => {
                assert_eq!(app, "a");
                assert_eq!(dependency, "ghost");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_select_preserves_order() {
        let graph = apps(&[("a", &[]), ("b", &["a"]), ("c", &["b"])]);
        let plan = resolve_execution_order(&graph).unwrap();
        let selected = plan.select(&["c", "a"]).unwrap();
        assert_eq!(selected.names(), vec!["a", "c"]);
    }

    #[test]
    fn test_select_unknown_app() {
        let plan = resolve_execution_order(&apps(&[("a", &[])])).unwrap();
        let err = plan.select(&["nope"]).unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_APP");
    }

    #[test]
    fn test_select_empty_keeps_all() {
        let plan = resolve_execution_order(&apps(&[("a", &[]), ("b", &[])])).unwrap();
        let names: [&str; 0] = [];
        assert_eq!(plan.select(&names).unwrap().len(), 2);
    }
}
