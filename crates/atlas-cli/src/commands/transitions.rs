use crate::support::{atlas_or_exit, load_covering_or_exit, print_json};
use atlas_kernel::toy::Toric;
use serde_json::json;

pub fn run(file: String, json_output: bool) {
    let mut loaded = load_covering_or_exit(&file);
    let transitions = atlas_or_exit(loaded.covering.transition_graph(&Toric)).clone();

    let mut vertices: Vec<(usize, (usize, usize))> = transitions
        .edge_ids()
        .into_iter()
        .map(|(edge, id)| (id, edge))
        .collect();
    vertices.sort_unstable();
    let edges = transitions.edges();

    if json_output {
        let vertices: Vec<_> = vertices
            .iter()
            .map(|(id, (i, v))| {
                json!({
                    "id": id,
                    "edge": [i, v],
                    "charts": [loaded.name(*i), loaded.name(*v)],
                })
            })
            .collect();
        print_json(&json!({
            "source": loaded.path.display().to_string(),
            "vertices": vertices,
            "edges": edges,
            "components": transitions.component_count(),
        }));
    } else {
        println!("atlas transitions {}", loaded.path.display());
        println!(
            "  Vertices: {} ({} components)",
            transitions.vertex_count(),
            transitions.component_count()
        );
        for (id, (i, v)) in &vertices {
            println!("    {id}: {} -> {}", loaded.name(*i), loaded.name(*v));
        }
        if edges.is_empty() {
            println!("  Edges: none");
        } else {
            let edges: Vec<String> = edges.iter().map(|(a, b)| format!("{a}-{b}")).collect();
            println!("  Edges: {}", edges.join(", "));
        }
    }
}
