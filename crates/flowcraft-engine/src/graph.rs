//! ABOUTME: Dependency graph construction, DFS-color cycle detection, and
//! ABOUTME: topological sort over a workflow document's steps.

use flowcraft_core::types::reference::find_reference_spans;
use flowcraft_core::types::{ParameterReference, WorkflowDocument};
use std::collections::{HashMap, HashSet};

/// Edges point from a step to the steps it depends on (explicit `depends_on`
/// plus implicit edges from any `${steps.<id>.outputs.*}` reference in its parameters).
pub fn build_edges(doc: &WorkflowDocument) -> HashMap<String, Vec<String>> {
    let mut edges: HashMap<String, Vec<String>> = HashMap::new();

    for step in &doc.steps {
        let mut deps: Vec<String> = step.depends_on.clone();
        for value in step.parameters.values() {
            collect_step_output_deps(value, &mut deps);
        }
        deps.sort();
        deps.dedup();
        edges.insert(step.id.clone(), deps);
    }

    edges
}

fn collect_step_output_deps(value: &serde_json::Value, deps: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => {
            for (_, _, body) in find_reference_spans(s) {
                if let Some(ParameterReference::StepOutput { step_id, .. }) = ParameterReference::parse(body) {
                    deps.push(step_id);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_step_output_deps(item, deps);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                collect_step_output_deps(item, deps);
            }
        }
        _ => {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// DFS-color cycle detection. Returns the cycle as a sequence of step ids
/// (first repeated at the end) if one exists.
pub fn detect_cycle(step_ids: &[String], edges: &HashMap<String, Vec<String>>) -> Option<Vec<String>> {
    let mut colors: HashMap<&str, Color> = step_ids.iter().map(|id| (id.as_str(), Color::White)).collect();
    let mut stack: Vec<String> = Vec::new();

    for id in step_ids {
        if colors.get(id.as_str()) == Some(&Color::White) {
            if let Some(cycle) = visit(id, edges, &mut colors, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit<'a>(
    id: &'a str,
    edges: &'a HashMap<String, Vec<String>>,
    colors: &mut HashMap<&'a str, Color>,
    stack: &mut Vec<String>,
) -> Option<Vec<String>> {
    colors.insert(id, Color::Gray);
    stack.push(id.to_string());

    if let Some(deps) = edges.get(id) {
        for dep in deps {
            match colors.get(dep.as_str()) {
                Some(Color::Gray) => {
                    let start = stack.iter().position(|s| s == dep).unwrap_or(0);
                    let mut cycle = stack[start..].to_vec();
                    cycle.push(dep.clone());
                    return Some(cycle);
                }
                Some(Color::White) | None => {
                    if let Some(cycle) = visit(dep, edges, colors, stack) {
                        return Some(cycle);
                    }
                }
                Some(Color::Black) => {}
            }
        }
    }

    stack.pop();
    colors.insert(id, Color::Black);
    None
}

/// Kahn's algorithm. Callers must have already confirmed the graph is
/// acyclic via `detect_cycle`; an unresolvable dependency (an edge pointing
/// to a step id that doesn't exist) is simply dropped rather than panicking,
/// since that case is reported separately as a validation error.
pub fn topo_sort(step_ids: &[String], edges: &HashMap<String, Vec<String>>) -> Vec<String> {
    let known: HashSet<&str> = step_ids.iter().map(|s| s.as_str()).collect();
    let mut remaining_deps: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for id in step_ids {
        let deps = edges.get(id).map(|d| d.as_slice()).unwrap_or(&[]);
        let known_deps = deps.iter().filter(|d| known.contains(d.as_str())).count();
        remaining_deps.insert(id.as_str(), known_deps);
        for dep in deps {
            if known.contains(dep.as_str()) {
                dependents.entry(dep.as_str()).or_default().push(id.as_str());
            }
        }
    }

    let mut ready: Vec<&str> = step_ids
        .iter()
        .map(|s| s.as_str())
        .filter(|id| remaining_deps.get(id) == Some(&0))
        .collect();
    ready.sort();

    let mut order = Vec::with_capacity(step_ids.len());
    let mut queue: std::collections::VecDeque<&str> = ready.into_iter().collect();

    while let Some(id) = queue.pop_front() {
        order.push(id.to_string());
        if let Some(dependents) = dependents.get(id) {
            let mut newly_ready = Vec::new();
            for dependent in dependents {
                if let Some(count) = remaining_deps.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        newly_ready.push(*dependent);
                    }
                }
            }
            newly_ready.sort();
            for id in newly_ready {
                queue.push_back(id);
            }
        }
    }

    order
}
