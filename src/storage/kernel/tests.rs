#![cfg(test)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use super::*;
use crate::storage::metrics::CounterMetrics;
use crate::storage::schema::{Ownership, TableSchema};
use crate::storage::table::MAX_CAPACITY;

const PLAIN: ClassTag = ClassTag(100);
const OWNS: ClassTag = ClassTag(101);
const OWNED_BY: ClassTag = ClassTag(102);
const NODE: ClassTag = ClassTag(1);

fn kernel() -> GraphKernel {
    GraphKernel::new(KernelOptions::default().validate(true)).unwrap()
}

fn sized(vertices: usize, edges: usize) -> GraphKernel {
    let options = KernelOptions::default()
        .vertex_capacity(vertices)
        .edge_capacity(edges)
        .validate(true);
    GraphKernel::new(options).unwrap()
}

fn owning_kernel() -> GraphKernel {
    let schema = TableSchema::new()
        .ownership(OWNS, Ownership::OwnsFrom)
        .ownership(OWNED_BY, Ownership::OwnsTo);
    GraphKernel::new(KernelOptions::new(Arc::new(schema)).validate(true)).unwrap()
}

fn incidences(k: &GraphKernel, v: VertexId) -> Vec<i64> {
    k.incidences(v, Direction::Both, ClassFilter::Any)
        .map(Incidence::signed)
        .collect()
}

fn vertex_ids(k: &GraphKernel) -> Vec<u32> {
    k.vertices(ClassFilter::Any).map(|v| v.0).collect()
}

fn assert_consistent(k: &GraphKernel) {
    let report = k.verify();
    assert!(report.is_ok(), "{:?}", report.errors);
}

mod lifecycle {
    use super::*;

    #[test]
    fn create_vertex_appends_and_bumps_versions() {
        let mut k = kernel();
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(ClassTag(2)).unwrap();
        assert_eq!((a, b), (VertexId(1), VertexId(2)));
        assert_eq!(k.vertex_count(), 2);
        assert_eq!(k.graph_version(), 2);
        assert_eq!(k.vertex_list_version(), 2);
        assert_eq!(k.edge_list_version(), 0);
        assert_eq!(vertex_ids(&k), vec![1, 2]);
        assert_eq!(k.vertex_class(b), ClassTag(2));
        assert_consistent(&k);
    }

    #[test]
    fn create_edge_links_both_ends() {
        let mut k = kernel();
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(NODE).unwrap();
        let e = k.create_edge(PLAIN, a, b).unwrap();
        assert_eq!(k.alpha(e), a);
        assert_eq!(k.omega(e), b);
        assert_eq!(incidences(&k, a), vec![1]);
        assert_eq!(incidences(&k, b), vec![-1]);
        assert_eq!(k.degree(a, Direction::Out), 1);
        assert_eq!(k.degree(a, Direction::In), 0);
        assert_eq!(k.degree(b, Direction::In), 1);
        assert_eq!(k.edge_list_version(), 1);
        assert_eq!(k.incidence_version(a), 1);
        assert_eq!(k.incidence_version(b), 1);

        let rev = k.incidence(-1).unwrap();
        assert_eq!(k.this(rev), b);
        assert_eq!(k.that(rev), a);
        assert!(k.incidence(-2).is_none());
        assert!(k.incidence(0).is_none());
        assert_consistent(&k);
    }

    #[test]
    fn self_loop_contributes_two_incidences() {
        let mut k = kernel();
        let v = k.create_vertex(NODE).unwrap();
        let e = k.create_edge(PLAIN, v, v).unwrap();
        assert_eq!(incidences(&k, v), vec![1, -1]);
        assert_eq!(k.degree(v, Direction::Both), 2);
        assert_eq!(k.degree(v, Direction::Out), 1);
        assert_eq!(k.degree(v, Direction::In), 1);
        assert_consistent(&k);

        k.delete_edge(e);
        assert_eq!(k.degree(v, Direction::Both), 0);
        assert_eq!(k.edge_count(), 0);
        assert_consistent(&k);
    }

    #[test]
    fn delete_edge_bumps_every_owning_version() {
        let mut k = kernel();
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(NODE).unwrap();
        let e = k.create_edge(PLAIN, a, b).unwrap();
        let (g, el, ia, ib) = (
            k.graph_version(),
            k.edge_list_version(),
            k.incidence_version(a),
            k.incidence_version(b),
        );
        k.delete_edge(e);
        assert!(k.graph_version() > g);
        assert!(k.edge_list_version() > el);
        assert!(k.incidence_version(a) > ia);
        assert!(k.incidence_version(b) > ib);
        assert!(k.is_vertex_live(a) && k.is_vertex_live(b));
        assert!(!k.is_edge_live(e));
    }

    #[test]
    fn freed_ids_are_reused_lowest_first() {
        let mut k = kernel();
        let ids: Vec<_> = (0..4).map(|_| k.create_vertex(NODE).unwrap()).collect();
        k.delete_vertex(ids[2]);
        k.delete_vertex(ids[0]);
        assert_eq!(k.create_vertex(NODE).unwrap(), VertexId(1));
        assert_eq!(k.create_vertex(NODE).unwrap(), VertexId(3));
        assert_eq!(vertex_ids(&k), vec![2, 4, 1, 3]);
        assert_consistent(&k);
    }

    #[test]
    #[should_panic(expected = "is not live")]
    fn deleting_dead_vertex_panics() {
        let mut k = kernel();
        let v = k.create_vertex(NODE).unwrap();
        k.delete_vertex(v);
        k.delete_vertex(v);
    }
}

mod constraints {
    use super::*;

    fn restricted() -> GraphKernel {
        let schema = TableSchema::new().allow_end(PLAIN, EdgeEnd::Omega, [ClassTag(2)]);
        GraphKernel::new(KernelOptions::new(Arc::new(schema))).unwrap()
    }

    #[test]
    fn rejected_edge_leaves_state_unchanged() {
        let mut k = restricted();
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(NODE).unwrap();
        let version = k.graph_version();
        let err = k.create_edge(PLAIN, a, b).unwrap_err();
        assert!(matches!(
            err,
            GraphError::ConstraintViolation {
                edge_class: PLAIN,
                vertex_class: NODE,
                end: EdgeEnd::Omega,
            }
        ));
        assert!(err.is_recoverable());
        assert_eq!(k.edge_count(), 0);
        assert_eq!(k.graph_version(), version);
        assert_eq!(k.degree(a, Direction::Both), 0);
    }

    #[test]
    fn relink_validates_before_touching_links() {
        let mut k = restricted();
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(ClassTag(2)).unwrap();
        let c = k.create_vertex(NODE).unwrap();
        let e = k.create_edge(PLAIN, a, b).unwrap();
        let version = k.graph_version();
        assert!(matches!(
            k.set_omega(e, c),
            Err(GraphError::ConstraintViolation { .. })
        ));
        assert_eq!(k.omega(e), b);
        assert_eq!(k.graph_version(), version);
        assert_eq!(incidences(&k, b), vec![-1]);
    }
}

mod relink {
    use super::*;

    #[test]
    fn moves_incidence_to_new_vertex() {
        let mut k = kernel();
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(NODE).unwrap();
        let c = k.create_vertex(NODE).unwrap();
        let e = k.create_edge(PLAIN, a, b).unwrap();
        let other = k.create_edge(PLAIN, c, c).unwrap();
        let (g, ib, ic) = (k.graph_version(), k.incidence_version(b), k.incidence_version(c));

        k.set_omega(e, c).unwrap();
        assert_eq!(k.omega(e), c);
        assert!(incidences(&k, b).is_empty());
        assert_eq!(incidences(&k, c), vec![2, -2, -1]);
        assert_eq!(k.graph_version(), g + 1);
        assert!(k.incidence_version(b) > ib);
        assert!(k.incidence_version(c) > ic);
        assert!(k.is_edge_live(other));
        assert_consistent(&k);

        k.set_alpha(e, c).unwrap();
        assert!(incidences(&k, a).is_empty());
        assert_eq!(k.degree(c, Direction::Both), 4);
        assert_consistent(&k);
    }

    #[test]
    fn relink_to_same_vertex_is_noop() {
        let mut k = kernel();
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(NODE).unwrap();
        let e = k.create_edge(PLAIN, a, b).unwrap();
        let (g, ia) = (k.graph_version(), k.incidence_version(a));
        k.relink_edge_end(e, a, EdgeEnd::Alpha).unwrap();
        assert_eq!(k.graph_version(), g);
        assert_eq!(k.incidence_version(a), ia);
    }
}

mod cascade {
    use super::*;

    #[test]
    fn owned_vertex_is_deleted_with_owner() {
        let mut k = owning_kernel();
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(NODE).unwrap();
        let c = k.create_vertex(NODE).unwrap();
        k.create_edge(OWNS, a, b).unwrap();
        k.create_edge(PLAIN, b, c).unwrap();

        assert_eq!(k.delete_vertex(a), 2);
        assert!(!k.is_vertex_live(a));
        assert!(!k.is_vertex_live(b));
        assert!(k.is_vertex_live(c));
        assert_eq!(k.edge_count(), 0);
        assert!(incidences(&k, c).is_empty());
        assert_eq!(vertex_ids(&k), vec![3]);
        assert_consistent(&k);
    }

    #[test]
    fn owned_side_does_not_cascade_upward() {
        let mut k = owning_kernel();
        let owner = k.create_vertex(NODE).unwrap();
        let part = k.create_vertex(NODE).unwrap();
        k.create_edge(OWNS, owner, part).unwrap();
        assert_eq!(k.delete_vertex(part), 1);
        assert!(k.is_vertex_live(owner));
        assert_consistent(&k);
    }

    #[test]
    fn owns_to_cascades_from_omega() {
        let mut k = owning_kernel();
        let part = k.create_vertex(NODE).unwrap();
        let owner = k.create_vertex(NODE).unwrap();
        k.create_edge(OWNED_BY, part, owner).unwrap();
        assert_eq!(k.delete_vertex(owner), 2);
        assert!(!k.is_vertex_live(part));
        assert_consistent(&k);
    }

    #[test]
    fn recursive_and_cyclic_ownership_terminates() {
        let mut k = owning_kernel();
        let v: Vec<_> = (0..4).map(|_| k.create_vertex(NODE).unwrap()).collect();
        k.create_edge(OWNS, v[0], v[1]).unwrap();
        k.create_edge(OWNS, v[1], v[2]).unwrap();
        k.create_edge(OWNS, v[2], v[0]).unwrap();
        k.create_edge(OWNS, v[2], v[2]).unwrap();
        k.create_edge(PLAIN, v[3], v[1]).unwrap();

        assert_eq!(k.delete_vertex(v[1]), 3);
        assert_eq!(vertex_ids(&k), vec![4]);
        assert_eq!(k.edge_count(), 0);
        assert_consistent(&k);
    }
}

mod defrag {
    use super::*;

    #[test]
    fn compacts_vertex_ids_and_shrinks() {
        let mut k = sized(5, 3);
        let v: Vec<_> = (0..5).map(|_| k.create_vertex(NODE).unwrap()).collect();
        let e1 = k.create_edge(PLAIN, v[0], v[2]).unwrap();
        k.create_edge(PLAIN, v[2], v[4]).unwrap();
        k.create_edge(PLAIN, v[4], v[0]).unwrap();
        k.delete_vertex(v[1]);
        k.delete_vertex(v[3]);
        k.delete_edge(e1);
        assert!(k.stats().vertices_fragmented);
        assert!(k.stats().edges_fragmented);

        let version = k.graph_version();
        let stats = k.defragment();
        assert_eq!(stats.vertices_moved, 1);
        assert_eq!(stats.edges_moved, 1);
        assert_eq!(k.vertex_capacity(), 3);
        assert_eq!(k.edge_capacity(), 2);
        assert!(!k.stats().vertices_fragmented);
        assert!(!k.stats().edges_fragmented);
        assert!(k.graph_version() > version);

        // Old vertex 5 now lives at 2, old edge 3 at 1; order is preserved.
        assert_eq!(vertex_ids(&k), vec![1, 3, 2]);
        let edges: Vec<_> = k.edges(ClassFilter::Any).map(|e| e.0).collect();
        assert_eq!(edges, vec![2, 1]);
        assert_eq!(k.alpha(EdgeId(2)), VertexId(3));
        assert_eq!(k.omega(EdgeId(2)), VertexId(2));
        assert_eq!(k.alpha(EdgeId(1)), VertexId(2));
        assert_eq!(k.omega(EdgeId(1)), VertexId(1));
        assert_eq!(incidences(&k, VertexId(2)), vec![-2, 1]);
        assert_consistent(&k);
    }

    #[test]
    fn moves_self_loop_links() {
        let mut k = sized(2, 2);
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(NODE).unwrap();
        let e1 = k.create_edge(PLAIN, a, b).unwrap();
        k.create_edge(PLAIN, a, a).unwrap();
        k.delete_edge(e1);
        assert_eq!(incidences(&k, a), vec![2, -2]);

        k.defragment();
        assert_eq!(incidences(&k, a), vec![1, -1]);
        assert_eq!(k.edge_capacity(), 1);
        assert_consistent(&k);
    }

    #[test]
    fn packed_kernel_is_left_alone() {
        let mut k = sized(3, 1);
        for _ in 0..3 {
            k.create_vertex(NODE).unwrap();
        }
        let stats = k.defragment();
        assert_eq!(stats.vertices_moved, 0);
        assert_eq!(stats.vertex_capacity, 3);
        assert_eq!(stats.edge_capacity, 0);
        assert_consistent(&k);
    }
}

mod iteration {
    use super::*;

    #[test]
    fn class_filters_skip_non_matching_elements() {
        let mut k = kernel();
        let a = k.create_vertex(ClassTag(1)).unwrap();
        let b = k.create_vertex(ClassTag(2)).unwrap();
        let c = k.create_vertex(ClassTag(1)).unwrap();
        let only_one = ClassFilter::Exact(ClassTag(1));
        assert_eq!(k.vertices(only_one).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(k.first_vertex(ClassFilter::Exact(ClassTag(2))), Some(b));
        assert_eq!(k.last_vertex(only_one), Some(c));
        assert_eq!(k.prev_vertex(c, only_one), Some(a));
        assert_eq!(k.next_vertex(c, ClassFilter::Any), None);

        k.create_edge(ClassTag(7), a, b).unwrap();
        k.create_edge(ClassTag(8), c, a).unwrap();
        k.create_edge(ClassTag(7), a, a).unwrap();
        let seven = ClassFilter::Exact(ClassTag(7));
        assert_eq!(k.degree_of(a, Direction::Both, seven), 3);
        assert_eq!(k.degree_of(a, Direction::In, ClassFilter::Any), 2);
        let ins: Vec<_> = k
            .incidences(a, Direction::In, ClassFilter::Any)
            .map(Incidence::signed)
            .collect();
        assert_eq!(ins, vec![-2, -3]);
        assert_eq!(
            k.last_incidence(a, Direction::Out, ClassFilter::Any),
            Some(Incidence::normal(EdgeId(3)))
        );
        assert_eq!(
            k.prev_incidence(Incidence::reversed_of(EdgeId(3)), Direction::In, seven),
            None
        );
    }

    #[test]
    fn vertex_cursor_fails_after_mutation_and_resets() {
        let mut k = kernel();
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(NODE).unwrap();
        let mut cursor = k.vertex_cursor(ClassFilter::Any);
        assert_eq!(cursor.next(&k).unwrap(), Some(a));

        let c = k.create_vertex(NODE).unwrap();
        assert!(matches!(cursor.next(&k), Err(GraphError::StaleIterator(_))));
        assert!(cursor.has_next(&k).is_err());

        cursor.reset(&k);
        let mut seen = Vec::new();
        while let Some(v) = cursor.next(&k).unwrap() {
            seen.push(v);
        }
        assert_eq!(seen, vec![a, b, c]);
        assert!(!cursor.has_next(&k).unwrap());
    }

    #[test]
    fn edge_cursor_sees_reorder_as_change() {
        let mut k = kernel();
        let a = k.create_vertex(NODE).unwrap();
        let e1 = k.create_edge(PLAIN, a, a).unwrap();
        let e2 = k.create_edge(PLAIN, a, a).unwrap();
        let mut cursor = k.edge_cursor(ClassFilter::Any);
        k.put_edge_before(e1, e2);
        assert!(cursor.next(&k).is_err());
        cursor.reset(&k);
        assert_eq!(cursor.next(&k).unwrap(), Some(e2));
    }

    #[test]
    fn incidence_cursor_tracks_only_its_vertex() {
        let mut k = kernel();
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(NODE).unwrap();
        let c = k.create_vertex(NODE).unwrap();
        k.create_edge(PLAIN, a, b).unwrap();
        let mut cursor = k.incidence_cursor(a, Direction::Both, ClassFilter::Any);
        k.create_edge(PLAIN, b, c).unwrap();
        assert_eq!(cursor.next(&k).unwrap(), Some(Incidence::normal(EdgeId(1))));
        assert_eq!(cursor.next(&k).unwrap(), None);

        k.create_edge(PLAIN, c, a).unwrap();
        assert!(cursor.next(&k).is_err());
    }

    #[test]
    fn incidence_cursor_detects_reused_vertex_id() {
        let mut k = kernel();
        let a = k.create_vertex(NODE).unwrap();
        let mut cursor = k.incidence_cursor(a, Direction::Both, ClassFilter::Any);
        k.delete_vertex(a);
        assert!(cursor.has_next(&k).is_err());
        let again = k.create_vertex(NODE).unwrap();
        assert_eq!(again, a);
        assert!(cursor.next(&k).is_err());
        assert!(cursor.reset(&k).is_err());
    }
}

mod ordering {
    use super::*;

    #[test]
    fn put_vertex_reorders_and_noop_keeps_versions() {
        let mut k = kernel();
        let v: Vec<_> = (0..3).map(|_| k.create_vertex(NODE).unwrap()).collect();
        k.put_vertex_before(v[0], v[2]);
        assert_eq!(vertex_ids(&k), vec![3, 1, 2]);
        assert!(k.is_vertex_before(v[2], v[1]));
        assert!(!k.is_vertex_before(v[1], v[2]));

        let (g, vl) = (k.graph_version(), k.vertex_list_version());
        k.put_vertex_after(v[2], v[0]);
        k.put_vertex_before(v[1], v[1]);
        assert_eq!(k.graph_version(), g);
        assert_eq!(k.vertex_list_version(), vl);

        k.put_vertex_after(v[1], v[2]);
        assert_eq!(vertex_ids(&k), vec![1, 2, 3]);
        assert!(k.vertex_list_version() > vl);
    }

    #[test]
    fn put_incidence_within_one_vertex() {
        let mut k = kernel();
        let hub = k.create_vertex(NODE).unwrap();
        let other = k.create_vertex(NODE).unwrap();
        for _ in 0..3 {
            k.create_edge(PLAIN, hub, other).unwrap();
        }
        let first = Incidence::normal(EdgeId(1));
        let last = Incidence::normal(EdgeId(3));
        k.put_incidence_before(first, last);
        assert_eq!(incidences(&k, hub), vec![3, 1, 2]);
        assert!(k.is_incidence_before(last, first));
        k.put_incidence_after(Incidence::normal(EdgeId(2)), last);
        assert_eq!(incidences(&k, hub), vec![1, 2, 3]);
        assert_eq!(incidences(&k, other), vec![-1, -2, -3]);
        assert_consistent(&k);
    }

    #[test]
    #[should_panic(expected = "does not belong")]
    fn put_incidence_across_vertices_panics() {
        let mut k = kernel();
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(NODE).unwrap();
        let e = k.create_edge(PLAIN, a, b).unwrap();
        k.put_incidence_before(Incidence::normal(e), Incidence::reversed_of(e));
    }

    #[test]
    fn sort_incidences_is_stable() {
        let mut k = kernel();
        let hub = k.create_vertex(NODE).unwrap();
        let other = k.create_vertex(NODE).unwrap();
        for class in [3, 1, 3, 2, 1] {
            k.create_edge(ClassTag(class), hub, other).unwrap();
        }
        let version = k.incidence_version(hub);
        k.sort_incidences(hub, |a, b| a.class.cmp(&b.class));
        assert_eq!(incidences(&k, hub), vec![2, 5, 4, 1, 3]);
        assert!(k.incidence_version(hub) > version);
        assert_eq!(incidences(&k, other), vec![-1, -2, -3, -4, -5]);
        assert_consistent(&k);
    }

    #[test]
    fn sort_vertices_and_edges() {
        let mut k = kernel();
        let v: Vec<_> = [2, 1, 2, 0]
            .into_iter()
            .map(|c| k.create_vertex(ClassTag(c)).unwrap())
            .collect();
        k.create_edge(PLAIN, v[3], v[0]).unwrap();
        k.create_edge(PLAIN, v[1], v[0]).unwrap();
        k.create_edge(PLAIN, v[0], v[0]).unwrap();

        k.sort_vertices(|a, b| a.class.cmp(&b.class));
        assert_eq!(vertex_ids(&k), vec![4, 2, 1, 3]);
        k.sort_vertices(|a, b| b.degree.cmp(&a.degree));
        assert_eq!(vertex_ids(&k), vec![1, 4, 2, 3]);

        k.sort_edges(|a, b| a.alpha.cmp(&b.alpha));
        let edges: Vec<_> = k.edges(ClassFilter::Any).map(|e| e.0).collect();
        assert_eq!(edges, vec![3, 2, 1]);
        assert_consistent(&k);
    }
}

mod growth {
    use super::*;

    #[derive(Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl StructureListener for Recorder {
        fn vertex_added(&mut self, v: VertexId) {
            self.0.borrow_mut().push(format!("+{v}"));
        }
        fn vertex_deleted(&mut self, v: VertexId) {
            self.0.borrow_mut().push(format!("-{v}"));
        }
        fn edge_added(&mut self, e: EdgeId) {
            self.0.borrow_mut().push(format!("+{e}"));
        }
        fn edge_deleted(&mut self, e: EdgeId) {
            self.0.borrow_mut().push(format!("-{e}"));
        }
        fn max_vertex_count_increased(&mut self, n: usize) {
            self.0.borrow_mut().push(format!("vcap {n}"));
        }
        fn max_edge_count_increased(&mut self, n: usize) {
            self.0.borrow_mut().push(format!("ecap {n}"));
        }
    }

    #[test]
    fn tables_grow_on_demand_and_notify() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut k = sized(1, 0);
        let id = k.add_listener(Box::new(Recorder(log.clone())));
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(NODE).unwrap();
        let e = k.create_edge(PLAIN, a, b).unwrap();
        assert_eq!(k.vertex_capacity(), 2);
        assert_eq!(k.edge_capacity(), 1);
        k.delete_vertex(b);
        assert_eq!(
            *log.borrow(),
            vec!["+v1", "vcap 2", "+v2", "ecap 1", "+e1", "-v2", "-e1"]
        );
        assert!(!k.is_edge_live(e));

        assert!(k.remove_listener(id).is_some());
        assert_eq!(k.listener_count(), 0);
        k.create_vertex(NODE).unwrap();
        assert_eq!(log.borrow().len(), 7);
    }

    #[test]
    fn explicit_expansion_keeps_ids() {
        let mut k = sized(2, 2);
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(NODE).unwrap();
        let e = k.create_edge(PLAIN, a, b).unwrap();
        let version = k.graph_version();
        k.expand_vertices(10).unwrap();
        k.expand_edges(8).unwrap();
        assert_eq!(k.vertex_capacity(), 10);
        assert_eq!(k.edge_capacity(), 8);
        assert_eq!(k.graph_version(), version);
        assert_eq!(k.alpha(e), a);
        assert_eq!(vertex_ids(&k), vec![1, 2]);
        assert_consistent(&k);
    }

    #[test]
    fn invalid_capacities_are_rejected() {
        let mut k = sized(4, 4);
        assert!(matches!(
            k.expand_vertices(4),
            Err(GraphError::InvalidCapacity { requested: 4, current: 4 })
        ));
        assert!(matches!(
            k.expand_edges(2),
            Err(GraphError::InvalidCapacity { .. })
        ));
        let too_big = KernelOptions::default().vertex_capacity(MAX_CAPACITY + 1);
        assert!(matches!(
            GraphKernel::new(too_big),
            Err(GraphError::InvalidCapacity { .. })
        ));
    }

    #[test]
    fn metrics_count_lifecycle_events() {
        let metrics = Arc::new(CounterMetrics::default());
        let schema = TableSchema::new().ownership(OWNS, Ownership::OwnsFrom);
        let options = KernelOptions::new(Arc::new(schema))
            .vertex_capacity(1)
            .metrics(metrics.clone());
        let mut k = GraphKernel::new(options).unwrap();
        let a = k.create_vertex(NODE).unwrap();
        let b = k.create_vertex(NODE).unwrap();
        k.create_edge(OWNS, a, b).unwrap();
        k.delete_vertex(a);
        let snap = metrics.snapshot();
        assert_eq!(snap.vertices_created, 2);
        assert_eq!(snap.vertices_deleted, 2);
        assert_eq!(snap.edges_created, 1);
        assert_eq!(snap.edges_deleted, 1);
        assert_eq!(snap.cascades, 1);
        assert_eq!(snap.vertex_expansions, 1);
    }
}

mod loading {
    use super::*;

    fn arrays(k: &GraphKernel) -> (Vec<i64>, Vec<i64>) {
        (
            vec![0; k.vertex_capacity() + 1],
            vec![0; 2 * (k.edge_capacity() + 1)],
        )
    }

    #[test]
    fn rebuilds_incidences_from_arrays() {
        let mut k = sized(2, 1);
        k.begin_loading().unwrap();
        assert!(matches!(k.create_vertex(NODE), Err(GraphError::Loading)));
        assert!(matches!(k.begin_loading(), Err(GraphError::Loading)));

        k.load_vertex(VertexId(3), NODE).unwrap();
        k.load_vertex(VertexId(1), NODE).unwrap();
        k.load_edge(EdgeId(2), PLAIN, VertexId(1), VertexId(3)).unwrap();
        k.load_edge(EdgeId(1), PLAIN, VertexId(3), VertexId(3)).unwrap();
        assert_eq!(k.vertex_capacity(), 4);
        assert_eq!(k.edge_capacity(), 2);

        let (mut first, mut next) = arrays(&k);
        first[1] = 2;
        first[3] = -2;
        next[incidence_slot(Incidence::reversed_of(EdgeId(2)))] = 1;
        next[incidence_slot(Incidence::normal(EdgeId(1)))] = -1;
        k.finish_loading(&first, &next).unwrap();

        assert!(!k.is_loading());
        assert_eq!(k.graph_version(), 1);
        assert_eq!(k.vertex_count(), 2);
        assert_eq!(k.edge_count(), 2);
        assert_eq!(vertex_ids(&k), vec![3, 1]);
        assert_eq!(incidences(&k, VertexId(1)), vec![2]);
        assert_eq!(incidences(&k, VertexId(3)), vec![-2, 1, -1]);
        assert_consistent(&k);

        assert_eq!(k.create_vertex(NODE).unwrap(), VertexId(2));
        assert_consistent(&k);
    }

    #[test]
    fn versions_hold_during_loading_then_move_forward_once() {
        let mut k = sized(1, 1);
        k.create_vertex(NODE).unwrap();
        k.delete_vertex(VertexId(1));
        let before = (k.graph_version(), k.vertex_list_version(), k.edge_list_version());

        k.begin_loading().unwrap();
        k.load_vertex(VertexId(1), NODE).unwrap();
        assert_eq!(k.vertex_count(), 1);
        k.load_vertex(VertexId(2), NODE).unwrap();
        k.load_vertex(VertexId(3), NODE).unwrap();
        k.load_edge(EdgeId(1), PLAIN, VertexId(1), VertexId(3)).unwrap();
        assert_eq!((k.vertex_count(), k.edge_count()), (3, 1));
        let during = (k.graph_version(), k.vertex_list_version(), k.edge_list_version());
        assert_eq!(during, before);

        let (mut first, next) = arrays(&k);
        first[1] = 1;
        first[3] = -1;
        k.finish_loading(&first, &next).unwrap();

        assert_eq!(k.graph_version(), during.0 + 1);
        assert_eq!(k.vertex_list_version(), during.1 + 1);
        assert_eq!(k.edge_list_version(), during.2 + 1);
        assert_eq!((k.vertex_count(), k.edge_count()), (3, 1));
        assert_consistent(&k);
    }

    #[test]
    fn rejects_malformed_chains_and_stays_loading() {
        let mut k = sized(2, 1);
        k.begin_loading().unwrap();
        k.load_vertex(VertexId(1), NODE).unwrap();
        k.load_vertex(VertexId(2), NODE).unwrap();
        k.load_edge(EdgeId(1), PLAIN, VertexId(1), VertexId(2)).unwrap();

        let (mut first, next) = arrays(&k);
        first[1] = -1;
        first[2] = 1;
        assert!(matches!(
            k.finish_loading(&first, &next),
            Err(GraphError::InvalidArgument(_))
        ));
        assert!(k.is_loading());

        first[1] = 1;
        first[2] = 0;
        assert!(matches!(
            k.finish_loading(&first, &next),
            Err(GraphError::InvalidArgument(_))
        ));
        assert!(k.finish_loading(&first[..1], &next).is_err());

        first[2] = -1;
        k.finish_loading(&first, &next).unwrap();
        assert_consistent(&k);
    }

    #[test]
    fn load_calls_require_loading_mode() {
        let mut k = kernel();
        assert!(matches!(k.finish_loading(&[], &[]), Err(GraphError::NotLoading)));
        assert!(matches!(
            k.load_vertex(VertexId(1), NODE),
            Err(GraphError::NotLoading)
        ));
        k.begin_loading().unwrap();
        assert!(k.load_edge(EdgeId(1), PLAIN, VertexId(1), VertexId(1)).is_err());
        assert!(k.load_vertex(VertexId(0), NODE).is_err());
    }
}
