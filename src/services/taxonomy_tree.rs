//! Recursive walks over the taxonomy hierarchy.
//!
//! Each walk issues one `list_children` (or `get`) per visited node and
//! carries the ids on the current path, so a corrupted parent chain ends in
//! [`RepoError::Cycle`] instead of unbounded recursion.

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::database::models::Taxonomy;
use crate::database::repository::{RepoError, RepoResult, TaxonomyRepo};

pub const PATH_SEPARATOR: &str = " > ";

/// Tree operations available on every taxonomy repository
#[async_trait]
pub trait TaxonomyTree {
    /// Leaves under `node`, each renamed to its path from `node`.
    /// A leaf yields itself unchanged; `None` yields nothing.
    async fn flatten(&self, node: Option<Taxonomy>) -> RepoResult<Vec<Taxonomy>>;

    /// `node` renamed to its full path from the root, with `parent` attached
    async fn reverse_flatten(&self, node: Option<Taxonomy>) -> RepoResult<Option<Taxonomy>>;

    /// Roots with `children` populated all the way down
    async fn list_recursive(&self) -> RepoResult<Vec<Taxonomy>>;

    /// Children of `parent_id` with `children` populated all the way down;
    /// [`RepoError::NotFound`] when `parent_id` does not exist
    async fn list_children_recursive(&self, parent_id: i64) -> RepoResult<Vec<Taxonomy>>;

    /// Whether re-parenting `id` under `new_parent` would close a loop
    async fn would_create_cycle(&self, id: i64, new_parent: Option<i64>) -> RepoResult<bool>;
}

#[async_trait]
impl<R> TaxonomyTree for R
where
    R: TaxonomyRepo + ?Sized,
{
    async fn flatten(&self, node: Option<Taxonomy>) -> RepoResult<Vec<Taxonomy>> {
        match node {
            Some(node) => flatten_node(self, node, Vec::new()).await,
            None => Ok(Vec::new()),
        }
    }

    async fn reverse_flatten(&self, node: Option<Taxonomy>) -> RepoResult<Option<Taxonomy>> {
        match node {
            Some(node) => reverse_node(self, node, Vec::new()).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_recursive(&self) -> RepoResult<Vec<Taxonomy>> {
        let mut roots = self.list().await?;
        for root in roots.iter_mut() {
            root.children = children_recursive(self, root.id, vec![root.id]).await?;
        }
        Ok(roots)
    }

    async fn list_children_recursive(&self, parent_id: i64) -> RepoResult<Vec<Taxonomy>> {
        if self.get(parent_id).await?.is_none() {
            return Err(RepoError::NotFound {
                entity: "taxonomy",
                id: parent_id,
            });
        }
        children_recursive(self, parent_id, vec![parent_id]).await
    }

    async fn would_create_cycle(&self, id: i64, new_parent: Option<i64>) -> RepoResult<bool> {
        let mut seen = Vec::new();
        let mut cursor = new_parent.filter(|p| *p != 0);
        while let Some(current) = cursor {
            if current == id {
                return Ok(true);
            }
            if seen.contains(&current) {
                // pre-existing loop above the new parent
                return Err(RepoError::Cycle(current));
            }
            seen.push(current);
            cursor = self.get(current).await?.and_then(|t| t.parent());
        }
        Ok(false)
    }
}

fn flatten_node<'a, R>(repo: &'a R, node: Taxonomy, mut path: Vec<i64>) -> BoxFuture<'a, RepoResult<Vec<Taxonomy>>>
where
    R: TaxonomyRepo + ?Sized,
{
    Box::pin(async move {
        if path.contains(&node.id) {
            return Err(RepoError::Cycle(node.id));
        }

        let children = repo.list_children(node.id).await?;
        if children.is_empty() {
            return Ok(vec![node]);
        }

        path.push(node.id);
        let mut flattened = Vec::new();
        for mut child in children {
            child.name = format!("{}{}{}", node.name, PATH_SEPARATOR, child.name);
            flattened.extend(flatten_node(repo, child, path.clone()).await?);
        }
        Ok(flattened)
    })
}

fn reverse_node<'a, R>(repo: &'a R, mut node: Taxonomy, mut path: Vec<i64>) -> BoxFuture<'a, RepoResult<Taxonomy>>
where
    R: TaxonomyRepo + ?Sized,
{
    Box::pin(async move {
        let Some(parent_id) = node.parent() else {
            return Ok(node);
        };

        path.push(node.id);
        if path.contains(&parent_id) {
            return Err(RepoError::Cycle(parent_id));
        }

        let Some(parent) = repo.get(parent_id).await? else {
            return Ok(node);
        };

        let flattened_parent = reverse_node(repo, parent.clone(), path).await?;
        node.name = format!("{}{}{}", flattened_parent.name, PATH_SEPARATOR, node.name);
        node.parent = Some(Box::new(parent));
        Ok(node)
    })
}

fn children_recursive<'a, R>(repo: &'a R, parent_id: i64, path: Vec<i64>) -> BoxFuture<'a, RepoResult<Vec<Taxonomy>>>
where
    R: TaxonomyRepo + ?Sized,
{
    Box::pin(async move {
        let mut children = repo.list_children(parent_id).await?;
        for child in children.iter_mut() {
            if path.contains(&child.id) {
                return Err(RepoError::Cycle(child.id));
            }
            let mut child_path = path.clone();
            child_path.push(child.id);
            child.children = children_recursive(repo, child.id, child_path).await?;
        }
        Ok(children)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::MemoryStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fixed tree that counts child lookups and can be wired into a loop
    #[derive(Default)]
    struct FixtureRepo {
        nodes: HashMap<i64, Taxonomy>,
        child_queries: AtomicUsize,
    }

    impl FixtureRepo {
        fn with(nodes: &[(i64, &str, Option<i64>)]) -> Self {
            let nodes = nodes
                .iter()
                .map(|(id, name, parent)| {
                    let mut t = Taxonomy::new(*name);
                    t.id = *id;
                    t.parent_id = *parent;
                    (*id, t)
                })
                .collect();
            Self {
                nodes,
                child_queries: AtomicUsize::new(0),
            }
        }

        fn node(&self, id: i64) -> Taxonomy {
            self.nodes[&id].clone()
        }
    }

    #[async_trait]
    impl TaxonomyRepo for FixtureRepo {
        async fn get(&self, id: i64) -> RepoResult<Option<Taxonomy>> {
            Ok(self.nodes.get(&id).cloned())
        }
        async fn list(&self) -> RepoResult<Vec<Taxonomy>> {
            let mut roots: Vec<_> = self.nodes.values().filter(|t| t.is_root()).cloned().collect();
            roots.sort_by_key(|t| t.id);
            Ok(roots)
        }
        async fn list_children(&self, parent_id: i64) -> RepoResult<Vec<Taxonomy>> {
            self.child_queries.fetch_add(1, Ordering::SeqCst);
            let mut children: Vec<_> = self
                .nodes
                .values()
                .filter(|t| t.parent() == Some(parent_id))
                .cloned()
                .collect();
            children.sort_by_key(|t| t.id);
            Ok(children)
        }
        async fn find_grade_by_name(&self, _name: &str) -> RepoResult<Option<Taxonomy>> {
            Ok(None)
        }
        async fn save(&self, _taxonomy: &Taxonomy) -> RepoResult<i64> {
            Ok(0)
        }
        async fn update(&self, _taxonomy: &Taxonomy) -> RepoResult<()> {
            Ok(())
        }
    }

    fn sample_tree() -> FixtureRepo {
        // A
        // ├── B
        // │   ├── D
        // │   └── E
        // └── C
        FixtureRepo::with(&[
            (1, "A", None),
            (2, "B", Some(1)),
            (3, "C", Some(1)),
            (4, "D", Some(2)),
            (5, "E", Some(2)),
        ])
    }

    fn names(list: &[Taxonomy]) -> Vec<&str> {
        list.iter().map(|t| t.name.as_str()).collect()
    }

    #[tokio::test]
    async fn flatten_returns_leaves_with_full_paths() {
        let repo = sample_tree();
        let flattened = repo.flatten(Some(repo.node(1))).await.unwrap();

        assert_eq!(names(&flattened), vec!["A > B > D", "A > B > E", "A > C"]);
        assert_eq!(flattened.iter().map(|t| t.id).collect::<Vec<_>>(), vec![4, 5, 3]);
        // one query per visited node: A, B, D, E, C
        assert_eq!(repo.child_queries.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn flatten_of_leaf_is_the_leaf_unchanged() {
        let repo = sample_tree();
        let leaf = repo.node(4);
        assert_eq!(repo.flatten(Some(leaf.clone())).await.unwrap(), vec![leaf]);
    }

    #[tokio::test]
    async fn flatten_of_none_is_empty() {
        let repo = sample_tree();
        assert!(repo.flatten(None).await.unwrap().is_empty());
        assert_eq!(repo.child_queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn flatten_detects_cycles() {
        // 1 -> 2 -> 3 -> 1
        let repo = FixtureRepo::with(&[(1, "A", Some(3)), (2, "B", Some(1)), (3, "C", Some(2))]);
        let err = repo.flatten(Some(repo.node(1))).await.unwrap_err();
        assert!(matches!(err, RepoError::Cycle(1)));
    }

    #[tokio::test]
    async fn reverse_flatten_builds_path_from_root() {
        let repo = sample_tree();
        let node = repo.reverse_flatten(Some(repo.node(5))).await.unwrap().unwrap();

        assert_eq!(node.name, "A > B > E");
        assert_eq!(node.parent.as_ref().map(|p| p.id), Some(2));

        let root = repo.reverse_flatten(Some(repo.node(1))).await.unwrap().unwrap();
        assert_eq!(root.name, "A");
        assert!(repo.reverse_flatten(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reverse_flatten_detects_cycles() {
        let repo = FixtureRepo::with(&[(1, "A", Some(2)), (2, "B", Some(1))]);
        assert!(matches!(
            repo.reverse_flatten(Some(repo.node(1))).await,
            Err(RepoError::Cycle(_))
        ));
    }

    #[tokio::test]
    async fn list_recursive_populates_children() {
        let repo = sample_tree();
        let roots = repo.list_recursive().await.unwrap();

        assert_eq!(names(&roots), vec!["A"]);
        assert_eq!(names(&roots[0].children), vec!["B", "C"]);
        assert_eq!(names(&roots[0].children[0].children), vec!["D", "E"]);
        assert!(roots[0].children[1].children.is_empty());

        let under_b = repo.list_children_recursive(2).await.unwrap();
        assert_eq!(names(&under_b), vec!["D", "E"]);
    }

    #[tokio::test]
    async fn children_of_a_missing_node_are_not_found() {
        let repo = sample_tree();
        assert!(matches!(
            repo.list_children_recursive(99).await,
            Err(RepoError::NotFound { entity: "taxonomy", id: 99 })
        ));
        assert_eq!(repo.child_queries.load(Ordering::SeqCst), 0);

        // an existing leaf simply has no children
        assert!(repo.list_children_recursive(4).await.unwrap().is_empty());

        let store = MemoryStore::new();
        assert!(matches!(
            store.list_children_recursive(99).await,
            Err(RepoError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn reparenting_under_descendant_is_a_cycle() {
        let repo = sample_tree();
        assert!(repo.would_create_cycle(2, Some(4)).await.unwrap());
        assert!(repo.would_create_cycle(2, Some(2)).await.unwrap());
        assert!(!repo.would_create_cycle(4, Some(3)).await.unwrap());
        assert!(!repo.would_create_cycle(4, None).await.unwrap());
    }

    #[tokio::test]
    async fn works_through_trait_objects_over_memory_store() {
        let store: std::sync::Arc<dyn TaxonomyRepo> = std::sync::Arc::new(MemoryStore::new());
        let grade = store.save(&Taxonomy::new("2nd Grade")).await.unwrap();
        let math = store.save(&Taxonomy::with_parent("Math", grade)).await.unwrap();
        store.save(&Taxonomy::with_parent("Addition", math)).await.unwrap();

        let root = store.get(grade).await.unwrap();
        let flattened = store.flatten(root).await.unwrap();
        assert_eq!(names(&flattened), vec!["2nd Grade > Math > Addition"]);
    }
}
