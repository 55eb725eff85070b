use rustc_hash::FxHashSet;
use tracing::warn;

use super::GraphKernel;
use crate::storage::sequence::LinkSlots;
use crate::storage::table::ElementTable;
use crate::types::{EdgeId, Incidence, VertexId};

/// Findings of [`GraphKernel::verify`]. Empty when every structural
/// invariant holds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// One message per broken invariant.
    pub errors: Vec<String>,
}

impl VerifyReport {
    /// True when nothing is broken.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, msg: String) {
        self.errors.push(msg);
    }
}

impl GraphKernel {
    /// Walks every table, id list and sequence and reports inconsistencies.
    ///
    /// Linear in the size of the graph; meant for tests and diagnostics.
    pub fn verify(&self) -> VerifyReport {
        let mut report = VerifyReport::default();
        check_table(&mut report, "vertex", &self.vertices);
        check_table(&mut report, "edge", &self.edges);

        let vertices = walk(
            &mut report,
            "vertex sequence",
            self.vseq.first(),
            self.vseq.last(),
            self.vseq.len(),
            self.vertices.len(),
            &self.vertices,
            |v: VertexId| self.vertices.contains(v.0),
        );
        let edges = walk(
            &mut report,
            "edge sequence",
            self.eseq.first(),
            self.eseq.last(),
            self.eseq.len(),
            self.edges.len(),
            &self.edges,
            |e: EdgeId| self.edges.contains(e.0),
        );
        if vertices != self.vertices.len() || edges != self.edges.len() {
            // Walk errors already recorded; incidence checks would only repeat them.
            return self.finish(report);
        }

        let mut total = 0usize;
        for id in self.vertices.live_ids() {
            let v = VertexId(id);
            let anchor = &self.vertices[id].incidences;
            let label = format!("incidence sequence of {v}");
            let count = walk(
                &mut report,
                &label,
                anchor.first(),
                anchor.last(),
                anchor.len(),
                anchor.len(),
                &self.edges,
                |inc: Incidence| self.edges.contains(inc.edge().0) && self.this(inc) == v,
            );
            total += count;
        }
        if total != 2 * self.edges.len() {
            report.push(format!(
                "incidence sequences hold {total} entries, expected {}",
                2 * self.edges.len()
            ));
        }
        self.finish(report)
    }

    fn finish(&self, report: VerifyReport) -> VerifyReport {
        if !report.is_ok() {
            warn!(errors = report.errors.len(), "kernel.verify.failed");
        }
        report
    }
}

fn check_table<T>(report: &mut VerifyReport, kind: &str, table: &ElementTable<T>) {
    if let Err(msg) = table.ids().check_invariants() {
        report.push(format!("{kind} id list: {msg}"));
    }
    if table.ids().size() != table.capacity() {
        report.push(format!(
            "{kind} id list covers {} ids but the table has {}",
            table.ids().size(),
            table.capacity()
        ));
    }
    let mut live = table.live_ids();
    let mut used = table.ids().iter_used();
    loop {
        match (live.next(), used.next()) {
            (None, None) => break,
            (a, b) if a == b => continue,
            (a, b) => {
                report.push(format!(
                    "{kind} slots and id list disagree: occupied {a:?}, used {b:?}"
                ));
                break;
            }
        }
    }
}

/// Walks a sequence head to tail checking membership, back links, the tail
/// and the length. Returns the number of elements visited.
#[allow(clippy::too_many_arguments)]
fn walk<K, S>(
    report: &mut VerifyReport,
    label: &str,
    first: Option<K>,
    last: Option<K>,
    anchor_len: usize,
    expected: usize,
    slots: &S,
    is_member: impl Fn(K) -> bool,
) -> usize
where
    K: Copy + Eq + std::hash::Hash + std::fmt::Debug,
    S: LinkSlots<K>,
{
    let mut seen = FxHashSet::default();
    let mut prev = None;
    let mut cursor = first;
    while let Some(k) = cursor {
        if !is_member(k) {
            report.push(format!("{label}: {k:?} does not belong here"));
            return seen.len();
        }
        if !seen.insert(k) {
            report.push(format!("{label}: {k:?} visited twice"));
            return seen.len();
        }
        if slots.prev(k) != prev {
            report.push(format!("{label}: back link of {k:?} is {:?}", slots.prev(k)));
        }
        prev = Some(k);
        cursor = slots.next(k);
    }
    if prev != last {
        report.push(format!("{label}: walk ended at {prev:?}, anchor tail is {last:?}"));
    }
    if seen.len() != anchor_len || seen.len() != expected {
        report.push(format!(
            "{label}: visited {}, anchor length {anchor_len}, expected {expected}",
            seen.len()
        ));
    }
    seen.len()
}
