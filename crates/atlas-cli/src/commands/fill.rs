use crate::support::{atlas_or_exit, load_covering_or_exit, print_json};
use atlas_kernel::toy::Toric;
use serde_json::json;

pub fn run(file: String, json_output: bool) {
    let mut loaded = load_covering_or_exit(&file);
    let before = atlas_or_exit(loaded.covering.glueing_pairs()).len();
    let added = atlas_or_exit(loaded.covering.fill_transitions(&Toric));
    let after = atlas_or_exit(loaded.covering.glueing_pairs()).len();
    let fingerprint = atlas_or_exit(loaded.covering.fingerprint(&Toric));

    let named: Vec<(String, String)> = added
        .iter()
        .map(|(i, j)| (loaded.name(*i).to_string(), loaded.name(*j).to_string()))
        .collect();

    if json_output {
        print_json(&json!({
            "source": loaded.path.display().to_string(),
            "glueings_before": before,
            "added": added,
            "added_charts": named,
            "glueings_after": after,
            "fingerprint": fingerprint,
        }));
    } else {
        println!("atlas fill {}", loaded.path.display());
        println!("  Glueings before: {before}");
        if named.is_empty() {
            println!("  Added: none (already closed)");
        } else {
            for (first, second) in &named {
                println!("  Added: {first} <-> {second}");
            }
        }
        println!("  Glueings after: {after}");
        println!("  Fingerprint: {fingerprint}");
    }
}
