//! The slot manager: owns the slot-range-to-node mapping for a cluster.
//!
//! A [`SlotManager`] is built once, either by [`SlotManager::init`] from a
//! bare list of node identities (slot ranges are computed and assigned) or
//! by [`SlotManager::restore`] from a list of nodes that already carry a
//! persisted range (the ranges are validated, not recomputed), and is
//! immutable thereafter. It is safe to share across tasks behind an `Arc`
//! without locking.

use tracing::instrument;

use crate::error::{Error, Result};
use crate::node::{Node, SlotsRange};
use crate::slot::{slot_of, SLOTS};

/// Ordered mapping from slot ranges to the nodes that own them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotManager {
    nodes: Vec<Node>,
}

/// Rounds `i * SLOTS / n` to the nearest integer using exact integer
/// arithmetic, equivalent to `round(i * SLOTS / n)` for non-negative inputs.
fn boundary(i: usize, n: usize) -> u16 {
    let a = i as u64 * SLOTS as u64;
    let b = n as u64;
    ((2 * a + b) / (2 * b)) as u16
}

impl SlotManager {
    /// Allocates slot ranges across `nodes` and stamps each node with its
    /// range.
    ///
    /// Ranges are computed as `start_i = round(i * SLOTS / n)`,
    /// `end_i = round((i + 1) * SLOTS / n) - 1`, which divides the keyspace
    /// as evenly as possible while keeping every boundary an exact integer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSlotConfiguration` if `nodes` is empty or larger than
    /// [`SLOTS`].
    #[instrument(skip(nodes), fields(node_count = nodes.len()))]
    pub fn init(nodes: Vec<Node>) -> Result<Self> {
        let n = nodes.len();
        if n == 0 || n > SLOTS as usize {
            return Err(Error::InvalidSlotConfiguration {
                message: format!("node count {n} must be in 1..={SLOTS}"),
            });
        }

        let nodes = nodes
            .into_iter()
            .enumerate()
            .map(|(i, mut node)| {
                let start = boundary(i, n);
                let end = boundary(i + 1, n) - 1;
                node.slots = SlotsRange::new(start, end);
                node
            })
            .collect();

        let manager = Self { nodes };
        manager.check()?;
        tracing::info!(node_count = n, "slot manager initialized");
        Ok(manager)
    }

    /// Restores a slot manager from a persisted node list, whose ranges are
    /// authoritative and are validated rather than recomputed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSlotConfiguration` if the ranges are not sorted,
    /// contain a gap or overlap, or do not exactly cover `0..SLOTS`.
    #[instrument(skip(nodes), fields(node_count = nodes.len()))]
    pub fn restore(mut nodes: Vec<Node>) -> Result<Self> {
        let n = nodes.len();
        nodes.sort_by_key(|node| node.slots.start);
        let manager = Self { nodes };
        manager.check()?;
        tracing::info!(node_count = n, "slot manager restored from persisted list");
        Ok(manager)
    }

    /// Idempotently verifies the slot-range invariants: sorted, non-empty,
    /// contiguous, disjoint, and covering the whole `0..SLOTS` universe.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSlotConfiguration` describing the first invariant
    /// violated.
    pub fn check(&self) -> Result<()> {
        let n = self.nodes.len();
        if n == 0 || n > SLOTS as usize {
            return Err(Error::InvalidSlotConfiguration {
                message: format!("node count {n} must be in 1..={SLOTS}"),
            });
        }

        let first = &self.nodes[0].slots;
        if first.start != 0 {
            return Err(Error::InvalidSlotConfiguration {
                message: format!("first range must start at 0, got {}", first.start),
            });
        }

        for node in &self.nodes {
            if node.slots.is_empty() {
                return Err(Error::InvalidSlotConfiguration {
                    message: format!("node {} has an empty slot range", node.id),
                });
            }
        }

        for pair in self.nodes.windows(2) {
            let (prev, next) = (&pair[0].slots, &pair[1].slots);
            if next.start != prev.end + 1 {
                return Err(Error::InvalidSlotConfiguration {
                    message: format!(
                        "gap or overlap between ranges [{},{}] and [{},{}]",
                        prev.start, prev.end, next.start, next.end
                    ),
                });
            }
        }

        let last = &self.nodes[n - 1].slots;
        if last.end != SLOTS - 1 {
            return Err(Error::InvalidSlotConfiguration {
                message: format!("last range must end at {}, got {}", SLOTS - 1, last.end),
            });
        }

        Ok(())
    }

    /// Returns the node owning `slot` via binary search over the sorted
    /// ranges.
    ///
    /// # Errors
    ///
    /// Returns `SlotOutOfRange` if `slot >= SLOTS`.
    pub fn node_by_slot(&self, slot: u16) -> Result<&Node> {
        if slot >= SLOTS {
            return Err(Error::SlotOutOfRange {
                slot: slot as u32,
            });
        }

        let idx = self
            .nodes
            .binary_search_by(|node| {
                if slot < node.slots.start {
                    std::cmp::Ordering::Greater
                } else if slot > node.slots.end {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .expect("every slot in 0..SLOTS is covered by exactly one range");

        Ok(&self.nodes[idx])
    }

    /// Returns the node owning `key`'s slot. Equivalent to
    /// `node_by_slot(slot_of(key))`.
    pub fn node_by_key(&self, key: &str) -> Result<&Node> {
        self.node_by_slot(slot_of(key))
    }

    /// Returns the nodes in range order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}
