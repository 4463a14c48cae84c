//! Greek Gods Lookup Tests
//!
//! End-to-end lookups over the sample family tree: the ancestors of the deity
//! known as Death, and the descendants of the Night.

#[cfg(test)]
mod greek_gods_tests {
    use anyhow::Result;
    use lineage_core::db::MemoryStore;
    use lineage_core::fixtures::greek_gods;
    use lineage_core::services::LookupService;
    use lineage_core::{Node, NodePredicate, Shape, TraversalBody};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    struct Pantheon {
        lookup: LookupService,
        /// name -> id
        ids: HashMap<String, String>,
    }

    impl Pantheon {
        async fn new() -> Result<Self> {
            let gods = greek_gods();
            let ids = gods
                .iter()
                .filter_map(|n: &Node| {
                    let name = n.attribute("name")?.as_str()?;
                    Some((name.to_string(), n.id.clone()))
                })
                .collect();
            let store = MemoryStore::with_nodes(gods).await?;
            Ok(Self {
                lookup: LookupService::new(Arc::new(store)),
                ids,
            })
        }

        fn id(&self, name: &str) -> String {
            self.ids[name].clone()
        }
    }

    #[tokio::test]
    async fn test_ancestors_of_death() -> Result<()> {
        let pantheon = Pantheon::new().await?;

        let result = pantheon
            .lookup
            .ancestors(NodePredicate::attribute("knownAs", "Death"), Some(5), Shape::Flat)
            .await?;

        assert_eq!(result.seeds, vec![pantheon.id("Thanatos")]);
        assert_eq!(
            result.paths[0].paths,
            vec![vec![
                pantheon.id("Thanatos"),
                pantheon.id("Nyx"),
                pantheon.id("Chaos")
            ]]
        );
        assert!(!result.truncated);

        let TraversalBody::Flat(items) = result.body else {
            panic!("expected flat body");
        };
        let known_as: Vec<&serde_json::Value> =
            items.iter().filter_map(|i| i.node.attribute("knownAs")).collect();
        assert_eq!(
            known_as,
            vec![&json!("Death"), &json!("The Night"), &json!("The Void")]
        );
        assert_eq!(items[2].depth, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_ancestors_of_death_truncated_at_one_level() -> Result<()> {
        let pantheon = Pantheon::new().await?;

        let result = pantheon
            .lookup
            .ancestors(NodePredicate::attribute("knownAs", "Death"), Some(1), Shape::Flat)
            .await?;

        assert!(result.truncated);
        assert_eq!(
            result.paths[0].paths,
            vec![vec![pantheon.id("Thanatos"), pantheon.id("Nyx")]]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_children_of_the_night() -> Result<()> {
        let pantheon = Pantheon::new().await?;

        let result = pantheon
            .lookup
            .descendants(NodePredicate::attribute("knownAs", "The Night"), None, Shape::Nested)
            .await?;

        assert_eq!(result.paths[0].paths.len(), 11);
        assert!(result
            .paths[0]
            .paths
            .iter()
            .all(|p| p.len() == 2 && p[0] == pantheon.id("Nyx")));

        let TraversalBody::Nested(roots) = result.body else {
            panic!("expected nested body");
        };
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].children.len(), 11);
        assert_eq!(roots[0].size(), 12);
        Ok(())
    }

    #[tokio::test]
    async fn test_whole_pantheon_from_chaos() -> Result<()> {
        let pantheon = Pantheon::new().await?;

        let result = pantheon
            .lookup
            .descendants(NodePredicate::id(pantheon.id("Chaos")), Some(2), Shape::Nested)
            .await?;

        assert!(!result.truncated);
        let TraversalBody::Nested(roots) = result.body else {
            panic!("expected nested body");
        };
        assert_eq!(roots[0].size(), 21);
        assert_eq!(result.stats.levels_expanded, 2);
        Ok(())
    }
}
