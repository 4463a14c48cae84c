//! Sample data
//!
//! The family tree of the Greek gods modelled with parent references:
//! Chaos at the root, five children, and two of those with children of their
//! own. Every deity carries `name` and `knownAs` attributes.

use crate::models::Node;
use serde_json::json;

const CHILDREN_OF_CHAOS: [(&str, &str); 5] = [
    ("Tartarus", "The Abyss"),
    ("Gaia", "The Earth"),
    ("Eros", "Desire"),
    ("Erebus", "Darkness"),
    ("Nyx", "The Night"),
];

const CHILDREN_OF_GAIA: [(&str, &str); 4] = [
    ("Typhon", "The Storms"),
    ("Uranus", "The Sky"),
    ("Ourea", "Mountains"),
    ("Pontus", "The Sea"),
];

const CHILDREN_OF_NYX: [(&str, &str); 11] = [
    ("Moros", "Doom"),
    ("Oneiroi", "Dreams"),
    ("Nemesis", "Retribution"),
    ("Momus", "Blame"),
    ("Philotes", "Affection"),
    ("Geras", "Aging"),
    ("Thanatos", "Death"),
    ("Hypnos", "Sleep"),
    ("Eris", "Strife"),
    ("Apate", "Deceit"),
    ("Oizys", "Distress"),
];

fn deity(name: &str, known_as: &str, parent_id: Option<&str>) -> Node {
    Node::new(
        parent_id.map(str::to_string),
        json!({ "name": name, "knownAs": known_as }),
    )
}

/// Build the Greek gods tree with fresh UUID ids (21 nodes).
///
/// Nodes are returned parents first.
pub fn greek_gods() -> Vec<Node> {
    let chaos = deity("Chaos", "The Void", None);
    let chaos_id = chaos.id.clone();
    let mut nodes = vec![chaos];

    let children: Vec<Node> = CHILDREN_OF_CHAOS
        .iter()
        .map(|(name, known_as)| deity(name, known_as, Some(&chaos_id)))
        .collect();
    let id_of = |name: &str| {
        children
            .iter()
            .find(|n| n.attribute("name") == Some(&json!(name)))
            .map(|n| n.id.clone())
    };
    let gaia_id = id_of("Gaia");
    let nyx_id = id_of("Nyx");

    let grandchildren: Vec<Node> = CHILDREN_OF_GAIA
        .iter()
        .map(|(name, known_as)| deity(name, known_as, gaia_id.as_deref()))
        .chain(
            CHILDREN_OF_NYX
                .iter()
                .map(|(name, known_as)| deity(name, known_as, nyx_id.as_deref())),
        )
        .collect();

    nodes.extend(children);
    nodes.extend(grandchildren);
    nodes
}
