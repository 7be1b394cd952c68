//! Integration tests: small coverings with known answers.

use atlas_kernel::toy::{
    FieldExtension, MonomialMap, Toric, ToricChart, ToricOpen, projective_glueing,
    projective_space,
};
use atlas_kernel::{AtlasError, Covering, CoveringOptions, Glueing, Patch, base_change};

/// U1 = Spec k[x, y] and U2 = Spec k[u, v], glued along x ≠ 0 and u ≠ 0 by
/// (x, y) ↦ (1/x, y/x).
fn two_charts() -> (Covering<Toric>, Patch<ToricChart>, Patch<ToricChart>) {
    let u1 = Patch::new(ToricChart::affine("U1", ["x", "y"]));
    let u2 = Patch::new(ToricChart::affine("U2", ["u", "v"]));
    let flip = MonomialMap::new(vec![vec![-1, 0], vec![-1, 1]]);
    let glueing = Glueing::new(
        u1.id(),
        u2.id(),
        (ToricOpen::inverting(&u1, [0]), ToricOpen::inverting(&u2, [0])),
        (flip.clone(), flip),
    );
    let covering = Covering::with_glueings(
        vec![u1.clone(), u2.clone()],
        vec![glueing],
        CoveringOptions::default(),
    )
    .unwrap();
    (covering, u1, u2)
}

#[test]
fn two_chart_glueing_and_its_inverse() {
    let (mut covering, u1, u2) = two_charts();

    let forward = covering.glueing(u1.id(), u2.id()).unwrap();
    assert_eq!(forward.patches(), (u1.id(), u2.id()));
    assert_eq!(forward.domains().0, &ToricOpen::inverting(&u1, [0]));

    let backward = covering.glueing(u2.id(), u1.id()).unwrap();
    assert_eq!(*backward, forward.inverse());
    assert!(std::ptr::eq(
        backward,
        covering.glueing(u2.id(), u1.id()).unwrap()
    ));

    let graph = covering.glueing_graph(&Toric).unwrap();
    assert!(graph.has_arc(0, 1));
    assert!(graph.has_arc(1, 0));
    assert!(covering.is_connected(&Toric).unwrap());
}

#[test]
fn one_sided_density_gives_one_arc() {
    let a = Patch::new(ToricChart::reducible("A", ["s"], ["left", "right"]));
    let b = Patch::new(ToricChart::affine("B", ["t"]));
    let glueing = Glueing::new(
        a.id(),
        b.id(),
        (
            ToricOpen::on_components(&a, ["left"], []),
            ToricOpen::whole(&b),
        ),
        (MonomialMap::identity(1), MonomialMap::identity(1)),
    );
    let mut covering =
        Covering::with_glueings(vec![a, b], vec![glueing], CoveringOptions::default()).unwrap();

    let graph = covering.glueing_graph(&Toric).unwrap();
    assert_eq!(graph.arcs(), vec![(1, 0)]);
    assert!(graph.is_adjacent(0, 1));

    let graph = covering.glueing_graph_with(&Toric, true).unwrap();
    assert_eq!(graph.arcs(), vec![(0, 1), (1, 0)]);
}

#[test]
fn pruning_drops_empty_charts() {
    let charts = projective_space(1);
    let hole = Patch::new(ToricChart::empty("E", ["e"]));
    let covering = Covering::with_glueings(
        vec![charts[0].clone(), hole.clone(), charts[1].clone()],
        vec![projective_glueing(&charts, 0, 1)],
        CoveringOptions::default(),
    )
    .unwrap();

    let pruned = covering.pruned_glueing_graph(&Toric);
    assert_eq!(pruned.patches, vec![charts[0].id(), charts[1].id()]);
    assert_eq!(pruned.graph.arcs(), vec![(0, 1), (1, 0)]);
}

#[test]
fn transition_graph_is_memoized() {
    let charts = projective_space(2);
    let mut covering = Covering::with_glueings(
        charts.clone(),
        vec![
            projective_glueing(&charts, 0, 1),
            projective_glueing(&charts, 1, 2),
        ],
        CoveringOptions::default(),
    )
    .unwrap();

    let transitions = covering.transition_graph(&Toric).unwrap();
    assert_eq!(transitions.vertex_count(), 2);
    assert_eq!(transitions.id_of((0, 1)), Some(0));
    assert_eq!(transitions.id_of((1, 2)), Some(1));
    assert_eq!(transitions.edges(), vec![(0, 1)]);

    covering.fill_transitions(&Toric).unwrap();
    assert_eq!(covering.transition_graph(&Toric).unwrap().vertex_count(), 2);
}

#[test]
fn closure_completes_projective_space() {
    let charts = projective_space(3);
    let mut covering = Covering::with_glueings(
        charts.clone(),
        vec![
            projective_glueing(&charts, 0, 1),
            projective_glueing(&charts, 2, 1),
            projective_glueing(&charts, 3, 2),
        ],
        CoveringOptions::default(),
    )
    .unwrap();

    let added = covering.fill_transitions(&Toric).unwrap();
    assert_eq!(added.len(), 3);
    for i in 0..4 {
        for j in 0..4 {
            if i != j {
                assert_eq!(
                    *covering.glueing(charts[i].id(), charts[j].id()).unwrap(),
                    projective_glueing(&charts, i, j),
                );
            }
        }
    }
    assert_eq!(covering.glueing_graph(&Toric).unwrap().edge_count(), 6);
}

#[test]
fn missing_glueing_is_information() {
    let charts = projective_space(2);
    let covering = Covering::<Toric>::new(charts.clone());
    let err = covering.glueing(charts[0].id(), charts[2].id()).unwrap_err();
    assert!(matches!(err, AtlasError::GlueingNotFound { .. }));
    assert!(!covering.has_glueing(charts[0].id(), charts[2].id()));
}

#[test]
fn base_change_keeps_two_charts() {
    let (covering, u1, u2) = two_charts();
    let (changed, morphism) =
        base_change(&Toric, &FieldExtension::new("QQ(sqrt(2))"), &covering).unwrap();
    assert_eq!(changed.len(), 2);
    assert_eq!(morphism.len(), 2);

    let new = changed.patches();
    let point = [3.0, 4.0];
    let before = covering.glueing(u2.id(), u1.id()).unwrap();
    let after = changed.glueing(new[1].id(), new[0].id()).unwrap();
    let expected = before.maps().0.evaluate(&point);
    let actual = after.maps().0.evaluate(&point);
    approx::assert_relative_eq!(actual[0], expected[0]);
    approx::assert_relative_eq!(actual[1], expected[1]);
}

#[test]
fn display_snapshot() {
    let (covering, _, _) = two_charts();
    insta::assert_snapshot!(covering.display(&Toric).to_string(), @r"
Covering with 2 charts
  1: [x, y]
  2: [u, v]
  glued along (1, 2)
");
}

#[test]
fn connectivity_snapshot() {
    let charts = projective_space(2);
    let mut covering = Covering::with_glueings(
        charts.clone(),
        vec![
            projective_glueing(&charts, 0, 1),
            projective_glueing(&charts, 1, 2),
        ],
        CoveringOptions::default(),
    )
    .unwrap();
    insta::assert_json_snapshot!(covering.connectivity(&Toric).unwrap(), @r#"
{
  "charts": 3,
  "glueing_components": 1,
  "transition_vertices": 2,
  "transition_components": 1
}
"#);
}
