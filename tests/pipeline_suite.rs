use std::collections::BTreeSet;

use orthograph::dcel::DummyKind;
use orthograph::error::{LayoutError, OrthogonalizationError, PlanarizationError, TopologyError};
use orthograph::ir::Graph;
use orthograph::layout::{
    EmbeddingStrategy, Point, embed_graph, expand_high_degree, orthogonalize,
};
use orthograph::{LayoutOptions, compute_layout};

fn cycle(n: u32) -> Graph {
    let edges: Vec<(u32, u32)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
    Graph::from_edges(&edges)
}

fn star(leaves: u32) -> Graph {
    let edges: Vec<(u32, u32)> = (1..=leaves).map(|leaf| (0, leaf)).collect();
    Graph::from_edges(&edges)
}

fn k5() -> Graph {
    let mut graph = Graph::new();
    for u in 0..5u32 {
        for v in (u + 1)..5 {
            graph.add_edge(u, v);
        }
    }
    graph
}

fn total_interior_points(layout: &orthograph::Layout) -> usize {
    layout.edges.iter().map(|e| e.interior().len()).sum()
}

fn assert_endpoints_match(layout: &orthograph::Layout) {
    for edge in &layout.edges {
        let first = edge.points.first().copied();
        let last = edge.points.last().copied();
        assert_eq!(first, layout.positions.get(&edge.from).copied());
        assert_eq!(last, layout.positions.get(&edge.to).copied());
    }
}

#[test]
fn four_cycle_draws_as_a_unit_square() {
    let layout = compute_layout(&cycle(4), &LayoutOptions::default()).unwrap();
    let corners: BTreeSet<Point> = layout.positions.values().copied().collect();
    let expected: BTreeSet<Point> = [
        Point::new(0, 0),
        Point::new(1, 0),
        Point::new(0, 1),
        Point::new(1, 1),
    ]
    .into_iter()
    .collect();
    assert_eq!(corners, expected);
    assert_eq!(total_interior_points(&layout), 0, "square needs no bends");
    assert!(layout.dummy_vertices.is_empty());
    assert_eq!((layout.width, layout.height), (1, 1));
    assert_endpoints_match(&layout);
}

#[test]
fn five_cycle_bends_exactly_once() {
    let layout = compute_layout(&cycle(5), &LayoutOptions::default()).unwrap();
    assert_eq!(layout.positions.len(), 5);
    assert_eq!(total_interior_points(&layout), 1);
    assert_endpoints_match(&layout);
    for edge in &layout.edges {
        for window in edge.points.windows(2) {
            let dx = (window[0].x - window[1].x).abs();
            let dy = (window[0].y - window[1].y).abs();
            assert!(
                (dx == 0) != (dy == 0),
                "segments must be axis-aligned and non-degenerate"
            );
        }
    }
}

#[test]
fn k5_needs_exactly_one_crossing_dummy() {
    let options = LayoutOptions {
        preserve_dummy_vertices: true,
        ..LayoutOptions::default()
    };
    let layout = compute_layout(&k5(), &options).unwrap();
    let crossings = layout
        .dummy_vertices
        .iter()
        .filter(|d| d.kind == DummyKind::Crossing)
        .count();
    assert_eq!(crossings, 1);
    assert_eq!(layout.edges.len(), 10);
    assert_endpoints_match(&layout);
}

#[test]
fn collapsed_output_hides_the_crossing_vertex() {
    let layout = compute_layout(&k5(), &LayoutOptions::default()).unwrap();
    assert!(layout.dummy_vertices.is_empty());
    // The crossing still shows up as an interior point of the routed edge.
    assert!(total_interior_points(&layout) > 0);
}

#[test]
fn degree_five_hub_is_rejected_raw_but_expands_in_the_pipeline() {
    let embedding = embed_graph(&star(5), EmbeddingStrategy::Computed).unwrap();
    assert!(matches!(
        orthogonalize(&embedding.dcel),
        Err(OrthogonalizationError::DegreeTooHigh { degree: 5, .. })
    ));

    let mut dcel = embedding.dcel.clone();
    let links = expand_high_degree(&mut dcel);
    assert_eq!(links.len(), 1);
    let rep = orthogonalize(&dcel).unwrap();
    assert_eq!(rep.bend_count(), 0, "the expanded hub fits without bends");

    let layout = compute_layout(&star(5), &LayoutOptions::default()).unwrap();
    assert_eq!(layout.positions.len(), 6);
    assert_endpoints_match(&layout);
}

#[test]
fn identical_runs_are_bit_identical() {
    let options = LayoutOptions {
        preserve_dummy_vertices: true,
        vertex_separation: 2,
        deterministic_seed: 7,
    };
    let first = compute_layout(&k5(), &options).unwrap();
    let second = compute_layout(&k5(), &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn embeddings_satisfy_euler_and_twin_invariants() {
    for graph in [cycle(4), cycle(5), k5(), star(7)] {
        let embedding = embed_graph(&graph, EmbeddingStrategy::Computed).unwrap();
        embedding.dcel.check_consistency().unwrap();
    }
}

#[test]
fn orthogonal_shapes_close_every_face() {
    for graph in [cycle(4), cycle(5), k5()] {
        let embedding = embed_graph(&graph, EmbeddingStrategy::Computed).unwrap();
        let rep = orthogonalize(&embedding.dcel).unwrap();
        rep.check_invariants(&embedding.dcel).unwrap();
    }
}

#[test]
fn multigraph_with_loop_is_canonicalized() {
    let mut graph = Graph::new();
    graph.add_edge(0, 1);
    graph.add_edge(0, 1);
    graph.add_edge(1, 1);
    let layout = compute_layout(&graph, &LayoutOptions::default()).unwrap();
    assert_eq!(layout.edges.len(), 3);
    assert_endpoints_match(&layout);
    // The duplicate edge detours through its subdivision point.
    assert!(!layout.edges[1].interior().is_empty());
    // The loop leaves vertex 1 and returns to it.
    let loop_path = &layout.edges[2];
    assert_eq!(loop_path.from, 1);
    assert_eq!(loop_path.to, 1);
    assert_eq!(loop_path.points.first(), loop_path.points.last());
    assert!(loop_path.points.len() >= 4);
}

#[test]
fn disconnected_pieces_and_isolated_vertices_coexist() {
    let mut graph = Graph::from_edges(&[(0, 1), (1, 2), (2, 0), (10, 11)]);
    graph.ensure_vertex(7);
    let layout = compute_layout(&graph, &LayoutOptions::default()).unwrap();
    assert_eq!(layout.positions.len(), 6);
    let distinct: BTreeSet<Point> = layout.positions.values().copied().collect();
    assert_eq!(distinct.len(), 6, "no two vertices share a grid point");
}

#[test]
fn fixed_rotation_is_honored_or_rejected() {
    let mut graph = Graph::new();
    graph.add_edge(0, 1);
    graph.add_edge(0, 2);
    graph.add_edge(0, 3);
    graph.add_edge(1, 2);
    graph.add_edge(1, 3);
    graph.add_edge(2, 3);

    let mut planar = orthograph::ir::RotationSystem::default();
    planar.order.insert(0, vec![0, 1, 2]);
    planar.order.insert(1, vec![3, 0, 4]);
    planar.order.insert(2, vec![5, 1, 3]);
    planar.order.insert(3, vec![4, 2, 5]);
    let mut with_rotation = graph.clone();
    with_rotation.rotation = Some(planar);
    let layout = compute_layout(&with_rotation, &LayoutOptions::default()).unwrap();
    assert_eq!(layout.positions.len(), 4);

    let mut toroidal = orthograph::ir::RotationSystem::default();
    toroidal.order.insert(0, vec![0, 1, 2]);
    toroidal.order.insert(1, vec![0, 3, 4]);
    toroidal.order.insert(2, vec![1, 3, 5]);
    toroidal.order.insert(3, vec![2, 4, 5]);
    let mut bad = graph.clone();
    bad.rotation = Some(toroidal);
    assert!(matches!(
        compute_layout(&bad, &LayoutOptions::default()),
        Err(LayoutError::Planarization(
            PlanarizationError::NonPlanarRotation { .. }
        ))
    ));
}

#[test]
fn bad_input_surfaces_the_offending_edge() {
    let mut graph = Graph::from_edges(&[(0, 1)]);
    graph.edges.push(orthograph::ir::Edge { u: 0, v: 42 });
    let result = compute_layout(&graph, &LayoutOptions::default());
    assert!(matches!(
        result,
        Err(LayoutError::Topology(TopologyError::UnknownEndpoint {
            edge: 1,
            vertex: 42
        }))
    ));
}

#[test]
fn separation_scales_the_square() {
    let options = LayoutOptions {
        vertex_separation: 3,
        ..LayoutOptions::default()
    };
    let layout = compute_layout(&cycle(4), &options).unwrap();
    assert_eq!((layout.width, layout.height), (3, 3));
}

#[test]
fn layout_dump_round_trips_through_json() {
    let layout = compute_layout(&cycle(4), &LayoutOptions::default()).unwrap();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("square.json");
    orthograph::layout_dump::write_layout_dump(&path, &layout).expect("dump failed");
    let raw = std::fs::read_to_string(&path).expect("read failed");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("invalid json");
    assert_eq!(value["vertices"].as_array().map(Vec::len), Some(4));
    assert_eq!(value["edges"].as_array().map(Vec::len), Some(4));
}

#[test]
fn options_load_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("options.json");
    std::fs::write(&path, r#"{"preserve_dummy_vertices": true}"#).expect("write failed");
    let options = orthograph::config::load_options(Some(&path)).expect("load failed");
    assert!(options.preserve_dummy_vertices);
    assert_eq!(options.vertex_separation, 1);
}
