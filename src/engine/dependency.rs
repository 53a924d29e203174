// ABOUTME: Execution ordering for process tasks based on declared dependencies
// ABOUTME: Depth-first topological ordering with explicit cycle detection via petgraph

use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::NodeIndex;
use petgraph::Graph;
use std::collections::{HashMap, HashSet};
use tracing::warn;

use super::error::{EngineError, Result};
use crate::model::Task;

/// Dependency graph over a task list; edges run from dependency to dependent.
/// Dependencies naming tasks outside the list are left out of the graph.
pub struct DependencyGraph<'a> {
    tasks: &'a [Task],
    graph: Graph<&'a str, ()>,
    indices: HashMap<&'a str, NodeIndex>,
}

impl<'a> DependencyGraph<'a> {
    pub fn new(tasks: &'a [Task]) -> Self {
        let mut graph = Graph::new();
        let mut indices = HashMap::new();

        for task in tasks {
            let node = graph.add_node(task.id.as_str());
            indices.insert(task.id.as_str(), node);
        }

        for task in tasks {
            let task_node = indices[task.id.as_str()];
            for dependency in &task.dependencies {
                match indices.get(dependency.as_str()) {
                    Some(&dep_node) => {
                        graph.add_edge(dep_node, task_node, ());
                    }
                    None => warn!(
                        task_id = %task.id,
                        dependency = %dependency,
                        "Ignoring dependency on unknown task"
                    ),
                }
            }
        }

        Self {
            tasks,
            graph,
            indices,
        }
    }

    /// Fail with the members of every cycle in the graph.
    pub fn validate(&self) -> Result<()> {
        if !is_cyclic_directed(&self.graph) {
            return Ok(());
        }

        let mut tasks: Vec<String> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self
                        .graph
                        .contains_edge(component[0], component[0])
            })
            .flatten()
            .map(|node| self.graph[node].to_string())
            .collect();
        tasks.sort();

        Err(EngineError::CyclicDependency { tasks })
    }

    /// Topological order that follows the input order wherever dependencies allow:
    /// each task is placed right after a depth-first visit of its dependencies.
    pub fn execution_order(&self) -> Result<Vec<&'a Task>> {
        self.validate()?;

        let by_id: HashMap<&str, &'a Task> =
            self.tasks.iter().map(|t| (t.id.as_str(), t)).collect();
        let mut visited = HashSet::new();
        let mut order = Vec::with_capacity(self.tasks.len());

        for task in self.tasks {
            // Iterative DFS: (task, next dependency index to visit)
            let mut stack: Vec<(&'a Task, usize)> = vec![(task, 0)];
            while let Some((current, next)) = stack.pop() {
                if next == 0 && !visited.insert(current.id.as_str()) {
                    continue;
                }

                let pending = current.dependencies[next..]
                    .iter()
                    .enumerate()
                    .find_map(|(offset, dep)| {
                        by_id
                            .get(dep.as_str())
                            .filter(|dep_task| !visited.contains(dep_task.id.as_str()))
                            .map(|dep_task| (offset, *dep_task))
                    });

                match pending {
                    Some((offset, dep_task)) => {
                        stack.push((current, next + offset + 1));
                        stack.push((dep_task, 0));
                    }
                    None => order.push(current),
                }
            }
        }

        Ok(order)
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.indices.contains_key(task_id)
    }
}

/// Compute the execution order for a task list.
pub fn execution_order(tasks: &[Task]) -> Result<Vec<&Task>> {
    DependencyGraph::new(tasks).execution_order()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskType;

    fn task(id: &str, deps: &[&str]) -> Task {
        Task::new(id, TaskType::Decision).depends_on(deps.iter().copied())
    }

    fn ids(order: &[&Task]) -> Vec<String> {
        order.iter().map(|t| t.id.clone()).collect()
    }

    fn assert_valid_order(tasks: &[Task], order: &[&Task]) {
        assert_eq!(order.len(), tasks.len());
        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.as_str(), i))
            .collect();
        assert_eq!(position.len(), tasks.len(), "each task exactly once");

        for t in tasks {
            for dep in &t.dependencies {
                if let Some(dep_pos) = position.get(dep.as_str()) {
                    assert!(
                        *dep_pos < position[t.id.as_str()],
                        "{} must come before {}",
                        dep,
                        t.id
                    );
                }
            }
        }
    }

    #[test]
    fn test_linear_chain_declared_backwards() {
        let tasks = vec![task("c", &["b"]), task("b", &["a"]), task("a", &[])];
        let order = execution_order(&tasks).unwrap();

        assert_eq!(ids(&order), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_independent_tasks_keep_input_order() {
        let tasks = vec![task("x", &[]), task("y", &[]), task("z", &[])];
        let order = execution_order(&tasks).unwrap();

        assert_eq!(ids(&order), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_diamond() {
        let tasks = vec![
            task("report", &["left", "right"]),
            task("left", &["root"]),
            task("right", &["root"]),
            task("root", &[]),
        ];
        let order = execution_order(&tasks).unwrap();

        assert_valid_order(&tasks, &order);
        assert_eq!(ids(&order), vec!["root", "left", "right", "report"]);
    }

    #[test]
    fn test_permutation_property_over_many_shapes() {
        // Every task depends on a fixed selection of lower-numbered tasks,
        // then the list is rotated so declarations come out of order.
        for size in 1..12usize {
            for rotation in 0..size {
                let mut tasks: Vec<Task> = (0..size)
                    .map(|i| {
                        let deps: Vec<String> = (0..i)
                            .filter(|j| (i * 7 + j * 3) % 4 == 0)
                            .map(|j| format!("t{}", j))
                            .collect();
                        Task::new(format!("t{}", i), TaskType::Notify).depends_on(deps)
                    })
                    .collect();
                tasks.rotate_left(rotation);

                let order = execution_order(&tasks).unwrap();
                assert_valid_order(&tasks, &order);
            }
        }
    }

    #[test]
    fn test_dangling_dependency_ignored() {
        let tasks = vec![task("a", &["ghost"]), task("b", &["a"])];
        let order = execution_order(&tasks).unwrap();

        assert_eq!(ids(&order), vec!["a", "b"]);
    }

    #[test]
    fn test_cycle_detected() {
        let tasks = vec![task("a", &["c"]), task("b", &["a"]), task("c", &["b"]), task("d", &[])];
        let error = execution_order(&tasks).unwrap_err();

        match error {
            EngineError::CyclicDependency { tasks } => assert_eq!(tasks, vec!["a", "b", "c"]),
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let tasks = vec![task("a", &["a"])];
        assert!(matches!(
            execution_order(&tasks),
            Err(EngineError::CyclicDependency { .. })
        ));
    }
}
