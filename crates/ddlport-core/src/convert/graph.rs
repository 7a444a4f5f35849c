//! 테이블 의존성 그래프 (자식 → 부모).

use std::collections::{BTreeMap, BTreeSet, HashSet};

/// 테이블 의존성 그래프
///
/// 노드 순서는 선언 순서이며, 위상 정렬 시 동순위 노드는 선언 순서를 따릅니다.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    /// 노드 → 의존 대상 (참조하는 부모 테이블)
    dependencies: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// 선언 순서의 노드로 그래프 생성
    pub fn new<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            dependencies: BTreeMap::new(),
        }
    }

    /// 의존성 추가 (자기 참조는 무시)
    pub fn add_dependency(&mut self, object: &str, depends_on: &str) {
        if object == depends_on {
            return;
        }
        self.dependencies
            .entry(object.to_string())
            .or_default()
            .insert(depends_on.to_string());
    }

    /// 노드의 의존 대상
    pub fn dependencies_of(&self, node: &str) -> impl Iterator<Item = &str> {
        self.dependencies
            .get(node)
            .into_iter()
            .flat_map(|deps| deps.iter().map(|d| d.as_str()))
    }

    /// 순환 의존성 검출 (DFS 기반, 선언 순서로 탐색)
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut visited = HashSet::new();
        let mut rec_stack = Vec::new();

        for node in &self.nodes {
            if !visited.contains(node.as_str()) {
                self.dfs_cycle(node, &mut visited, &mut rec_stack, &mut cycles);
            }
        }

        cycles
    }

    fn dfs_cycle<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut Vec<&'a str>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        visited.insert(node);
        rec_stack.push(node);

        for dep in self.dependencies_of(node) {
            if let Some(start) = rec_stack.iter().position(|x| *x == dep) {
                // 순환 발견: 시작 노드로 닫아서 기록
                let mut cycle: Vec<String> =
                    rec_stack[start..].iter().map(|s| s.to_string()).collect();
                cycle.push(dep.to_string());
                cycles.push(cycle);
            } else if !visited.contains(dep) {
                self.dfs_cycle(dep, visited, rec_stack, cycles);
            }
        }

        rec_stack.pop();
    }

    /// Kahn 위상 정렬 (부모 먼저)
    ///
    /// 순환으로 정렬할 수 없는 노드가 남으면 그 노드 목록을 `Err`로 반환합니다.
    pub fn topological_order(&self) -> Result<Vec<String>, Vec<String>> {
        let known: HashSet<&str> = self.nodes.iter().map(|n| n.as_str()).collect();
        let mut remaining: BTreeMap<&str, BTreeSet<&str>> = self
            .nodes
            .iter()
            .map(|n| {
                let deps = self
                    .dependencies_of(n)
                    .filter(|d| known.contains(d))
                    .collect();
                (n.as_str(), deps)
            })
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        let mut emitted: HashSet<&str> = HashSet::new();

        while order.len() < self.nodes.len() {
            let next = self
                .nodes
                .iter()
                .map(|n| n.as_str())
                .find(|n| !emitted.contains(n) && remaining.get(n).is_some_and(|d| d.is_empty()));

            let Some(next) = next else {
                let stuck = self
                    .nodes
                    .iter()
                    .filter(|n| !emitted.contains(n.as_str()))
                    .cloned()
                    .collect();
                return Err(stuck);
            };

            emitted.insert(next);
            order.push(next.to_string());
            for deps in remaining.values_mut() {
                deps.remove(next);
            }
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parents_first_ties_by_declaration() {
        let mut graph = DependencyGraph::new(["orders", "customers", "products", "categories"]);
        graph.add_dependency("orders", "customers");
        graph.add_dependency("orders", "products");
        graph.add_dependency("products", "categories");

        assert_eq!(
            graph.topological_order().unwrap(),
            vec!["customers", "categories", "products", "orders"]
        );
    }

    #[test]
    fn test_self_reference_ignored() {
        let mut graph = DependencyGraph::new(["categories"]);
        graph.add_dependency("categories", "categories");
        assert!(graph.find_cycles().is_empty());
        assert_eq!(graph.topological_order().unwrap(), vec!["categories"]);
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = DependencyGraph::new(["a", "b", "c"]);
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "a");

        let cycles = graph.find_cycles();
        assert_eq!(cycles, vec![vec!["a", "b", "a"]]);
        assert_eq!(graph.topological_order().unwrap_err(), vec!["a", "b"]);
    }
}
