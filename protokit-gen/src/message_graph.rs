use std::collections::{HashMap, HashSet};

use petgraph::algo::kosaraju_scc;
use petgraph::graphmap::DiGraphMap;
use protokit_front::{Label, TypeRef};

use crate::context::{Context, Def};

/// `(container, target)` pairs for singular embedded-message fields that
/// close a reference cycle and therefore must be heap-boxed to keep the
/// containing Rust struct's size finite.
///
/// Only singular (non-repeated, non-map) message fields create an edge:
/// `Vec<T>` and `BTreeMap<K, V>` are already indirect, so a recursive type
/// reached only through them never needs boxing.
pub fn boxed_fields(ctx: &Context) -> HashSet<(String, String)> {
    let mut graph = DiGraphMap::<&str, ()>::new();
    for key in ctx.types.keys() {
        graph.add_node(key.as_str());
    }

    for (abs, info) in &ctx.types {
        let Def::Message(message) = &info.def else { continue };
        for field in &message.fields {
            if field.label == Label::Repeated {
                continue;
            }
            if let TypeRef::Named(target) = &field.ty {
                if matches!(ctx.types.get(target).map(|t| &t.def), Some(Def::Message(_))) {
                    graph.add_edge(abs.as_str(), target.as_str(), ());
                }
            }
        }
    }

    let sccs = kosaraju_scc(&graph);
    let mut component_of: HashMap<&str, usize> = HashMap::new();
    for (id, scc) in sccs.iter().enumerate() {
        for node in scc {
            component_of.insert(node, id);
        }
    }

    let mut boxed = HashSet::new();
    for (a, b, ()) in graph.all_edges() {
        let same_component = component_of.get(a) == component_of.get(b);
        let self_loop = a == b;
        if same_component && (self_loop || sccs[component_of[a]].len() > 1) {
            boxed.insert((a.to_string(), b.to_string()));
        }
    }
    boxed
}

#[cfg(test)]
mod tests {
    use super::*;
    use protokit_front::parse;
    use protokit_link::link;

    #[test]
    fn boxes_a_directly_self_referential_message() {
        let (entry, _) = parse("a.proto", "message Node { Node child = 1; repeated Node children = 2; }");
        let mut loader = |_: &str| -> Result<String, String> { Err("no imports".into()) };
        let (linked, diagnostics) = link(vec![entry], &mut loader);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let ctx = Context::build(&linked);
        let boxed = boxed_fields(&ctx);
        assert!(boxed.contains(&(".Node".to_string(), ".Node".to_string())));
    }

    #[test]
    fn does_not_box_through_a_repeated_field() {
        let (entry, _) = parse("a.proto", "message Node { repeated Node children = 1; }");
        let mut loader = |_: &str| -> Result<String, String> { Err("no imports".into()) };
        let (linked, diagnostics) = link(vec![entry], &mut loader);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let ctx = Context::build(&linked);
        assert!(boxed_fields(&ctx).is_empty());
    }

    #[test]
    fn boxes_a_mutual_cycle_between_two_messages() {
        let (entry, _) = parse("a.proto", "message A { B b = 1; } message B { A a = 1; }");
        let mut loader = |_: &str| -> Result<String, String> { Err("no imports".into()) };
        let (linked, diagnostics) = link(vec![entry], &mut loader);
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        let ctx = Context::build(&linked);
        let boxed = boxed_fields(&ctx);
        assert!(boxed.contains(&(".A".to_string(), ".B".to_string())));
        assert!(boxed.contains(&(".B".to_string(), ".A".to_string())));
    }
}
