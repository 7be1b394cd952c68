use crate::support::{atlas_or_exit, load_covering_with_or_exit, print_json, yes_no};
use atlas_kernel::toy::Toric;
use serde_json::json;

pub fn run(file: String, all_dense: bool, json_output: bool) {
    let mut loaded = load_covering_with_or_exit(&file, all_dense);
    let all_dense = loaded.covering.options().all_dense;

    let report = atlas_or_exit(loaded.covering.report(&Toric));
    let connectivity = atlas_or_exit(loaded.covering.connectivity(&Toric));
    let connected = if loaded.covering.is_empty() {
        None
    } else {
        Some(atlas_or_exit(loaded.covering.is_connected(&Toric)))
    };
    let arcs = atlas_or_exit(loaded.covering.glueing_graph(&Toric)).arcs();
    let arc_names: Vec<String> = arcs
        .iter()
        .map(|(i, j)| format!("{} -> {}", loaded.name(*i), loaded.name(*j)))
        .collect();

    if json_output {
        print_json(&json!({
            "source": loaded.path.display().to_string(),
            "all_dense": all_dense,
            "report": report,
            "arcs": arcs,
            "connected": connected,
            "connectivity": connectivity,
        }));
    } else {
        println!("atlas inspect {}", loaded.path.display());
        println!("{}", loaded.covering.display(&Toric));
        if arc_names.is_empty() {
            println!("  Arcs: none");
        } else {
            println!("  Arcs: {}", arc_names.join(", "));
        }
        match connected {
            Some(connected) => println!("  Connected: {}", yes_no(connected)),
            None => println!("  Connected: n/a (no charts)"),
        }
        println!(
            "  Components: {} glueing, {} transition ({} transition vertices)",
            connectivity.glueing_components,
            connectivity.transition_components,
            connectivity.transition_vertices,
        );
        println!(
            "  Decomposition info: {}",
            yes_no(report.decomposition_info)
        );
        println!("  Fingerprint: {}", report.fingerprint);
    }
}
