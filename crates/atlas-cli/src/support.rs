use atlas_kernel::toy::{Monomial, MonomialMap, Toric, ToricChart, ToricOpen};
use atlas_kernel::{AtlasError, Covering, CoveringOptions, Glueing, Patch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while turning a covering description into a covering.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path} as JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse {path} as TOML: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("chart name `{name}` is used twice")]
    DuplicateChart { name: String },

    #[error("unknown chart `{name}`")]
    UnknownChart { name: String },

    #[error("{side} map of glueing {first} -> {second} must be {rows}x{width}: {detail}")]
    MalformedMap {
        first: String,
        second: String,
        side: &'static str,
        rows: usize,
        width: usize,
        detail: String,
    },

    #[error("decomposition info of `{name}` needs {expected} exponents, found {found}")]
    MalformedElement {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Atlas(#[from] AtlasError),
}

/// On-disk covering description.
///
/// ```toml
/// [options]
/// all_dense = false
///
/// [[charts]]
/// name = "U1"
/// coordinates = ["x", "y"]
///
/// [[glueings]]
/// first = "U1"
/// second = "U2"
/// first_inverted = [0]
/// second_inverted = [0]
/// forward = [[-1, 0], [-1, 1]]
/// backward = [[-1, 0], [-1, 1]]
/// ```
#[derive(Debug, Deserialize)]
pub struct CoveringSource {
    #[serde(default)]
    pub options: CoveringOptions,
    pub charts: Vec<ToricChart>,
    #[serde(default)]
    pub glueings: Vec<GlueingSource>,
    /// Decomposition info by chart name.
    #[serde(default)]
    pub decomposition: BTreeMap<String, Vec<Monomial>>,
}

#[derive(Debug, Deserialize)]
pub struct GlueingSource {
    pub first: String,
    pub second: String,
    #[serde(default)]
    pub first_inverted: Vec<usize>,
    #[serde(default)]
    pub second_inverted: Vec<usize>,
    /// Components met on the first side; all of them when absent.
    #[serde(default)]
    pub first_components: Option<Vec<String>>,
    #[serde(default)]
    pub second_components: Option<Vec<String>>,
    pub forward: Vec<Vec<i64>>,
    pub backward: Vec<Vec<i64>>,
}

pub struct LoadedCovering {
    pub path: PathBuf,
    pub covering: Covering<Toric>,
}

impl LoadedCovering {
    /// Chart name at an index.
    pub fn name(&self, index: usize) -> &str {
        self.covering
            .patch(index)
            .map(|patch| patch.name.as_str())
            .unwrap_or("?")
    }
}

pub fn parse_source(path: &Path, text: &str) -> Result<CoveringSource, SourceError> {
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        toml::from_str(text).map_err(|source| SourceError::Toml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(text).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn build_covering(source: CoveringSource) -> Result<Covering<Toric>, SourceError> {
    let mut by_name: BTreeMap<String, Patch<ToricChart>> = BTreeMap::new();
    let mut patches = Vec::with_capacity(source.charts.len());
    for chart in source.charts {
        let name = chart.name.clone();
        let patch = Patch::new(chart);
        if by_name.insert(name.clone(), patch.clone()).is_some() {
            return Err(SourceError::DuplicateChart { name });
        }
        patches.push(patch);
    }
    let lookup = |name: &str| {
        by_name
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::UnknownChart {
                name: name.to_string(),
            })
    };

    let mut covering = Covering::with_glueings(patches, Vec::new(), source.options)?;
    for entry in source.glueings {
        let first = lookup(&entry.first)?;
        let second = lookup(&entry.second)?;
        let names = (entry.first.as_str(), entry.second.as_str());
        let forward = checked_map(names, "forward", entry.forward, (second.dim(), first.dim()))?;
        let backward = checked_map(names, "backward", entry.backward, (first.dim(), second.dim()))?;
        let domain = open_on(&first, entry.first_components, entry.first_inverted);
        let codomain = open_on(&second, entry.second_components, entry.second_inverted);
        covering.add_glueing(Glueing::new(
            first.id(),
            second.id(),
            (domain, codomain),
            (forward, backward),
        ))?;
    }
    for (name, elements) in source.decomposition {
        let patch = lookup(&name)?;
        if let Some(bad) = elements.iter().find(|m| m.exponents.len() != patch.dim()) {
            return Err(SourceError::MalformedElement {
                name,
                expected: patch.dim(),
                found: bad.exponents.len(),
            });
        }
        covering.set_decomposition_info(patch.id(), elements)?;
    }
    Ok(covering)
}

/// A glueing map with one row per target coordinate and one column per
/// source coordinate.
fn checked_map(
    (first, second): (&str, &str),
    side: &'static str,
    exponents: Vec<Vec<i64>>,
    (rows, width): (usize, usize),
) -> Result<MonomialMap, SourceError> {
    let malformed = |detail: String| SourceError::MalformedMap {
        first: first.to_string(),
        second: second.to_string(),
        side,
        rows,
        width,
        detail,
    };
    if exponents.len() != rows {
        return Err(malformed(format!("found {} rows", exponents.len())));
    }
    if let Some((k, row)) = exponents.iter().enumerate().find(|(_, row)| row.len() != width) {
        return Err(malformed(format!("row {k} has {} exponents", row.len())));
    }
    Ok(MonomialMap::new(exponents))
}

fn open_on(chart: &ToricChart, components: Option<Vec<String>>, inverted: Vec<usize>) -> ToricOpen {
    match components {
        Some(components) => ToricOpen::on_components(chart, components, inverted),
        None => ToricOpen::inverting(chart, inverted),
    }
}

/// Read and build a covering. `all_dense` forces the option on.
pub fn load_covering(path: &Path, all_dense: bool) -> Result<Covering<Toric>, SourceError> {
    let text = fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut source = parse_source(path, &text)?;
    source.options.all_dense |= all_dense;
    build_covering(source)
}

pub fn load_covering_or_exit(file: &str) -> LoadedCovering {
    load_covering_with_or_exit(file, false)
}

pub fn load_covering_with_or_exit(file: &str, all_dense: bool) -> LoadedCovering {
    let path = PathBuf::from(file);
    let covering = load_covering(&path, all_dense).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    tracing::debug!(path = %path.display(), charts = covering.len(), "loaded covering");
    LoadedCovering { path, covering }
}

pub fn atlas_or_exit<T>(result: Result<T, AtlasError>) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

pub fn print_json<T: Serialize>(payload: &T) {
    match serde_json::to_string_pretty(payload) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("error: json serialization failed: {e}");
            std::process::exit(1);
        }
    }
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_CHARTS: &str = r#"
[[charts]]
name = "U1"
coordinates = ["x", "y"]

[[charts]]
name = "U2"
coordinates = ["u", "v"]

[[glueings]]
first = "U1"
second = "U2"
first_inverted = [0]
second_inverted = [0]
forward = [[-1, 0], [-1, 1]]
backward = [[-1, 0], [-1, 1]]
"#;

    #[test]
    fn toml_source_builds_covering() {
        let source = parse_source(Path::new("two.toml"), TWO_CHARTS).unwrap();
        let covering = build_covering(source).unwrap();
        assert_eq!(covering.len(), 2);
        assert_eq!(covering.glueing_pairs().unwrap(), vec![(0, 1)]);
        assert_eq!(covering.options(), CoveringOptions::default());
    }

    #[test]
    fn json_source_reads_options() {
        let text = r#"{
            "options": { "all_dense": true },
            "charts": [{ "name": "A", "coordinates": ["s"] }]
        }"#;
        let source = parse_source(Path::new("a.json"), text).unwrap();
        let covering = build_covering(source).unwrap();
        assert!(covering.options().all_dense);
        assert!(covering.options().check);
    }

    #[test]
    fn unknown_chart_is_reported() {
        let text = TWO_CHARTS.replace("second = \"U2\"", "second = \"U9\"");
        let source = parse_source(Path::new("two.toml"), &text).unwrap();
        let err = build_covering(source).err().unwrap();
        assert!(matches!(err, SourceError::UnknownChart { name } if name == "U9"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let text = TWO_CHARTS.replace("name = \"U2\"", "name = \"U1\"");
        let source = parse_source(Path::new("two.toml"), &text).unwrap();
        assert!(matches!(
            build_covering(source),
            Err(SourceError::DuplicateChart { .. })
        ));
    }

    #[test]
    fn ragged_glueing_map_is_rejected() {
        let text = TWO_CHARTS.replace("forward = [[-1, 0], [-1, 1]]", "forward = [[1, 0], [1]]");
        let source = parse_source(Path::new("two.toml"), &text).unwrap();
        let err = build_covering(source).err().unwrap();
        assert!(matches!(
            err,
            SourceError::MalformedMap { side: "forward", rows: 2, width: 2, .. }
        ));
        assert!(err.to_string().contains("row 1 has 1 exponents"));
    }

    #[test]
    fn glueing_map_must_match_chart_dimensions() {
        let text = TWO_CHARTS.replace("backward = [[-1, 0], [-1, 1]]", "backward = [[-1, 0, 0]]");
        let source = parse_source(Path::new("two.toml"), &text).unwrap();
        assert!(matches!(
            build_covering(source),
            Err(SourceError::MalformedMap { side: "backward", .. })
        ));
    }

    #[test]
    fn decomposition_info_must_match_chart_dimension() {
        let text = format!(
            "{TWO_CHARTS}\n[decomposition]\nU1 = [{{ coefficient = 1.0, exponents = [1] }}]\n"
        );
        let source = parse_source(Path::new("two.toml"), &text).unwrap();
        assert!(matches!(
            build_covering(source),
            Err(SourceError::MalformedElement { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn all_dense_can_be_forced_at_load() {
        let path = std::env::temp_dir().join(format!("atlas-support-{}.toml", std::process::id()));
        fs::write(&path, TWO_CHARTS).unwrap();
        let plain = load_covering(&path, false).unwrap();
        let forced = load_covering(&path, true).unwrap();
        let _ = fs::remove_file(&path);
        assert!(!plain.options().all_dense);
        assert!(forced.options().all_dense);
    }
}
