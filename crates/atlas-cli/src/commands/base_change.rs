use crate::support::{atlas_or_exit, load_covering_or_exit, print_json, yes_no};
use atlas_kernel::base_change;
use atlas_kernel::toy::{FieldExtension, Toric};
use serde_json::json;

pub fn run(file: String, field: String, json_output: bool) {
    let loaded = load_covering_or_exit(&file);
    let transform = FieldExtension::new(field.clone());
    let (changed, morphism) = atlas_or_exit(base_change(&Toric, &transform, &loaded.covering));
    let report = atlas_or_exit(changed.report(&Toric));

    let charts: Vec<_> = changed
        .patches()
        .iter()
        .map(|patch| {
            let source = morphism
                .get(patch.id())
                .and_then(|(target, _)| loaded.covering.index_of(target).ok());
            (patch.name.clone(), patch.base_field.clone(), source)
        })
        .collect();

    if json_output {
        let charts: Vec<_> = charts
            .iter()
            .map(|(name, base_field, source)| {
                json!({ "name": name, "base_field": base_field, "from": source })
            })
            .collect();
        print_json(&json!({
            "source": loaded.path.display().to_string(),
            "field": field,
            "charts": charts,
            "report": report,
        }));
    } else {
        println!("atlas base-change {} --field {field}", loaded.path.display());
        println!("{}", changed.display(&Toric));
        for (name, base_field, source) in &charts {
            let from = source
                .map(|k| loaded.name(k).to_string())
                .unwrap_or_else(|| "?".to_string());
            println!("  {name} over {base_field} <- {from}");
        }
        println!(
            "  Decomposition info: {}",
            yes_no(report.decomposition_info)
        );
        println!("  Fingerprint: {}", report.fingerprint);
    }
}
