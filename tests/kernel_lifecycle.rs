use std::sync::Arc;

use trellis::storage::{CounterMetrics, FreeIndexList, KernelStats};
use trellis::{
    ClassFilter, ClassTag, Direction, EdgeEnd, EdgeId, GraphError, GraphKernel, Incidence,
    KernelOptions, Ownership, Result, TableSchema, VertexId,
};

const PERSON: ClassTag = ClassTag(1);
const ADDRESS: ClassTag = ClassTag(2);
const LIVES_AT: ClassTag = ClassTag(20);
const HAS_PART: ClassTag = ClassTag(21);
const KNOWS: ClassTag = ClassTag(22);

fn schema() -> TableSchema {
    TableSchema::new()
        .allow_end(LIVES_AT, EdgeEnd::Alpha, [PERSON])
        .allow_end(LIVES_AT, EdgeEnd::Omega, [ADDRESS])
        .ownership(HAS_PART, Ownership::OwnsFrom)
}

fn kernel_with(metrics: Option<Arc<CounterMetrics>>) -> Result<GraphKernel> {
    let mut options = KernelOptions::new(Arc::new(schema())).validate(true);
    if let Some(metrics) = metrics {
        options = options.metrics(metrics);
    }
    GraphKernel::new(options)
}

fn check(kernel: &GraphKernel) {
    let report = kernel.verify();
    assert!(report.is_ok(), "verify failed: {:?}", report.errors);
}

#[test]
fn free_index_list_example() {
    let mut list = FreeIndexList::new(10);
    assert_eq!(list.allocate_index(), 1);
    for expected in 2..=9 {
        assert_eq!(list.allocate_index(), expected);
    }
    assert_eq!((list.free(), list.used()), (1, 9));
    list.free_index(5);
    assert_eq!(list.allocate_index(), 5);
    assert_eq!(list.allocate_index(), 10);
    assert_eq!(list.allocate_index(), 0);
}

#[test]
fn composition_delete_spares_plain_neighbours() -> Result<()> {
    let mut kernel = kernel_with(None)?;
    let a = kernel.create_vertex(PERSON)?;
    let b = kernel.create_vertex(PERSON)?;
    let c = kernel.create_vertex(PERSON)?;
    kernel.create_edge(HAS_PART, a, b)?;
    kernel.create_edge(KNOWS, b, c)?;

    assert_eq!(kernel.delete_vertex(a), 2);
    assert!(kernel.is_vertex_live(c));
    assert_eq!(kernel.vertex_count(), 1);
    assert_eq!(kernel.edge_count(), 0);
    assert_eq!(kernel.degree(c, Direction::Both), 0);
    check(&kernel);
    Ok(())
}

#[test]
fn defragment_packs_ids() -> Result<()> {
    let options = KernelOptions::new(Arc::new(schema())).vertex_capacity(5);
    let mut kernel = GraphKernel::new(options)?;
    let ids: Vec<_> = (0..5)
        .map(|_| kernel.create_vertex(PERSON))
        .collect::<Result<_>>()?;
    kernel.delete_vertex(ids[1]);
    kernel.delete_vertex(ids[3]);

    kernel.defragment();
    let live: Vec<_> = kernel.vertices(ClassFilter::Any).map(|v| v.0).collect();
    let mut sorted = live.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![1, 2, 3]);
    assert_eq!(kernel.vertex_capacity(), 3);
    let KernelStats {
        vertices_fragmented,
        vertex_count,
        ..
    } = kernel.stats();
    assert!(!vertices_fragmented);
    assert_eq!(vertex_count, 3);
    check(&kernel);
    Ok(())
}

#[test]
fn schema_rules_guard_creation_and_relinking() -> Result<()> {
    let mut kernel = kernel_with(None)?;
    let alice = kernel.create_vertex(PERSON)?;
    let home = kernel.create_vertex(ADDRESS)?;
    let office = kernel.create_vertex(ADDRESS)?;

    assert!(matches!(
        kernel.create_edge(LIVES_AT, home, alice),
        Err(GraphError::ConstraintViolation { .. })
    ));
    let e = kernel.create_edge(LIVES_AT, alice, home)?;
    kernel.set_omega(e, office)?;
    assert_eq!(kernel.omega(e), office);
    assert!(kernel.set_alpha(e, office).is_err());
    assert_eq!(kernel.alpha(e), alice);
    check(&kernel);
    Ok(())
}

#[test]
fn stale_cursor_then_fresh_cursor_sees_live_set() -> Result<()> {
    let mut kernel = kernel_with(None)?;
    let a = kernel.create_vertex(PERSON)?;
    let b = kernel.create_vertex(PERSON)?;
    kernel.create_edge(KNOWS, a, b)?;

    let mut vertices = kernel.vertex_cursor(ClassFilter::Any);
    let mut incidences = kernel.incidence_cursor(a, Direction::Both, ClassFilter::Any);
    assert!(vertices.has_next(&kernel)?);
    kernel.delete_vertex(b);
    assert!(matches!(
        vertices.has_next(&kernel),
        Err(GraphError::StaleIterator(_))
    ));
    assert!(matches!(
        incidences.next(&kernel),
        Err(GraphError::StaleIterator(_))
    ));

    let mut fresh = kernel.vertex_cursor(ClassFilter::Any);
    let mut seen = Vec::new();
    while let Some(v) = fresh.next(&kernel)? {
        seen.push(v);
    }
    assert_eq!(seen, vec![a]);
    Ok(())
}

#[test]
fn versions_track_each_kind_of_change() -> Result<()> {
    let mut kernel = kernel_with(None)?;
    let a = kernel.create_vertex(PERSON)?;
    let b = kernel.create_vertex(PERSON)?;
    let before = (
        kernel.graph_version(),
        kernel.vertex_list_version(),
        kernel.edge_list_version(),
    );
    kernel.create_edge(KNOWS, a, b)?;
    assert!(kernel.graph_version() > before.0);
    assert_eq!(kernel.vertex_list_version(), before.1);
    assert!(kernel.edge_list_version() > before.2);

    let edge_version = kernel.edge_list_version();
    kernel.put_vertex_before(a, b);
    assert!(kernel.vertex_list_version() > before.1);
    assert_eq!(kernel.edge_list_version(), edge_version);
    Ok(())
}

#[test]
fn bulk_load_round_trip() -> Result<()> {
    let mut source = kernel_with(None)?;
    let a = source.create_vertex(PERSON)?;
    let b = source.create_vertex(ADDRESS)?;
    let c = source.create_vertex(PERSON)?;
    source.create_edge(LIVES_AT, a, b)?;
    source.create_edge(KNOWS, c, a)?;
    source.create_edge(KNOWS, a, a)?;

    let options = KernelOptions::new(Arc::new(schema()))
        .vertex_capacity(0)
        .edge_capacity(0);
    let mut target = GraphKernel::new(options)?;
    target.begin_loading()?;
    for v in source.vertices(ClassFilter::Any) {
        target.load_vertex(v, source.vertex_class(v))?;
    }
    for e in source.edges(ClassFilter::Any) {
        target.load_edge(e, source.edge_class(e), source.alpha(e), source.omega(e))?;
    }
    let mut first = vec![0i64; target.vertex_capacity() + 1];
    let mut next = vec![0i64; 2 * (target.edge_capacity() + 1)];
    for v in source.vertices(ClassFilter::Any) {
        let chain: Vec<Incidence> = source
            .incidences(v, Direction::Both, ClassFilter::Any)
            .collect();
        if let Some(head) = chain.first() {
            first[v.0 as usize] = head.signed();
        }
        for pair in chain.windows(2) {
            next[trellis::storage::incidence_slot(pair[0])] = pair[1].signed();
        }
    }
    target.finish_loading(&first, &next)?;
    check(&target);

    for v in [a, b, c] {
        let expected: Vec<_> = source
            .incidences(v, Direction::Both, ClassFilter::Any)
            .collect();
        let actual: Vec<_> = target
            .incidences(v, Direction::Both, ClassFilter::Any)
            .collect();
        assert_eq!(actual, expected);
    }
    assert_eq!(target.edge_count(), 3);
    assert_eq!(target.that(Incidence::reversed_of(EdgeId(2))), VertexId(3));
    Ok(())
}

#[test]
fn metrics_observe_growth_and_defragmentation() -> Result<()> {
    let metrics = Arc::new(CounterMetrics::default());
    let mut kernel = GraphKernel::new(
        KernelOptions::new(Arc::new(schema()))
            .vertex_capacity(2)
            .edge_capacity(1)
            .metrics(metrics.clone()),
    )?;
    let vs: Vec<_> = (0..4)
        .map(|_| kernel.create_vertex(PERSON))
        .collect::<Result<_>>()?;
    kernel.create_edge(KNOWS, vs[0], vs[3])?;
    kernel.create_edge(KNOWS, vs[3], vs[1])?;
    kernel.delete_vertex(vs[0]);
    let stats = kernel.defragment();

    let snap = metrics.snapshot();
    assert_eq!(snap.vertices_created, 4);
    assert_eq!(snap.vertex_expansions, 1);
    assert_eq!(snap.edge_expansions, 1);
    assert_eq!(snap.edges_deleted, 1);
    assert_eq!(
        snap.elements_moved,
        (stats.vertices_moved + stats.edges_moved) as u64
    );
    check(&kernel);
    Ok(())
}
