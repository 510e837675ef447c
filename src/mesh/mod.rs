//! Mesh arena: element storage, adjacency queries, AMR bookkeeping, and the
//! replication state the partitioners depend on.
//!
//! Elements live in an arena indexed by [`ElementId`]; neighbor links are
//! ids, never pointers, so back-references and cycles are representable
//! without ownership knots and a self-link is a checkable corruption rather
//! than a pointer-comparison subtlety.

pub mod element;
pub mod generation;

pub use element::{BoundingBox, Element, ElementId, ElementKind, ProcessorId};

use crate::algs::communicator::Communicator;
use crate::error::MeshPartError;
use hashbrown::HashMap;

/// Record exchanged between processes when gathering a distributed mesh.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct ElementRecord {
    id: ElementId,
    element: Element,
}

/// In-memory mesh of polymorphic elements.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Ambient spatial dimension; elements of strictly lower dimension are
    /// boundary elements and may carry an interior parent.
    dim: u8,
    /// Arena in insertion order. Ids are assigned monotonically, so
    /// ascending-id iteration equals insertion order.
    elements: Vec<(ElementId, Element)>,
    slot_of: HashMap<ElementId, usize>,
    next_id: u64,
    /// Whether every process holds the full element set.
    serial: bool,
}

impl Mesh {
    /// Empty mesh embedded in a `dim`-dimensional domain.
    pub fn new(dim: u8) -> Self {
        Mesh {
            dim,
            elements: Vec::new(),
            slot_of: HashMap::new(),
            next_id: 1,
            serial: true,
        }
    }

    /// Ambient dimension of the domain.
    pub fn dim(&self) -> u8 {
        self.dim
    }

    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    /// Insert a fresh element and return its id.
    pub fn add_element(&mut self, kind: ElementKind, bbox: BoundingBox) -> ElementId {
        let id = ElementId::new(self.next_id).expect("id counter overflowed to zero");
        self.next_id += 1;
        self.slot_of.insert(id, self.elements.len());
        self.elements.push((id, Element::new(kind, bbox)));
        id
    }

    /// Borrow an element.
    ///
    /// # Panics
    /// Panics on an id that does not belong to this mesh; ids are only ever
    /// minted by the mesh itself, so a miss is upstream corruption.
    pub fn element(&self, id: ElementId) -> &Element {
        let slot = self.slot_of[&id];
        &self.elements[slot].1
    }

    fn element_mut(&mut self, id: ElementId) -> &mut Element {
        let slot = self.slot_of[&id];
        &mut self.elements[slot].1
    }

    /// Fallible lookup for callers holding ids of unknown provenance.
    pub fn try_element(&self, id: ElementId) -> Option<&Element> {
        self.slot_of.get(&id).map(|&slot| &self.elements[slot].1)
    }

    /// Ids of all active (leaf) elements, ascending.
    pub fn active_element_ids(&self) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|(_, e)| e.active)
            .map(|(id, _)| *id)
            .collect()
    }

    /// All element ids, ascending, active or not.
    pub fn element_ids(&self) -> Vec<ElementId> {
        self.elements.iter().map(|(id, _)| *id).collect()
    }

    /// Bounding box of the whole mesh.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox::empty();
        for (_, e) in &self.elements {
            bb.union_box(&e.bbox);
        }
        bb
    }

    /// Wire `a.side_a` and `b.side_b` to each other (symmetric link).
    pub fn set_neighbors(
        &mut self,
        a: ElementId,
        side_a: usize,
        b: ElementId,
        side_b: usize,
    ) -> Result<(), MeshPartError> {
        if a == b {
            return Err(MeshPartError::SelfNeighbor(a));
        }
        self.check_side(a, side_a)?;
        self.check_side(b, side_b)?;
        self.element_mut(a).neighbors[side_a] = Some(b);
        self.element_mut(b).neighbors[side_b] = Some(a);
        Ok(())
    }

    fn check_side(&self, id: ElementId, side: usize) -> Result<(), MeshPartError> {
        let elem = self
            .try_element(id)
            .ok_or(MeshPartError::UnknownElement(id))?;
        if side >= elem.n_sides() {
            return Err(MeshPartError::InvalidSide {
                element: id,
                side,
                n_sides: elem.n_sides(),
            });
        }
        Ok(())
    }

    /// Declare `parent` the higher-dimensional host of boundary element `id`.
    pub fn set_interior_parent(
        &mut self,
        id: ElementId,
        parent: ElementId,
    ) -> Result<(), MeshPartError> {
        let elem_dim = self
            .try_element(id)
            .ok_or(MeshPartError::UnknownElement(id))?
            .dim();
        let parent_dim = self
            .try_element(parent)
            .ok_or(MeshPartError::UnknownElement(parent))?
            .dim();
        if parent_dim <= elem_dim {
            return Err(MeshPartError::InvalidInteriorParent { element: id });
        }
        self.element_mut(id).interior_parent = Some(parent);
        Ok(())
    }

    /// Which side of `of` faces `neighbor`, if any ("which neighbor am I").
    pub fn side_of_neighbor(&self, of: ElementId, neighbor: ElementId) -> Option<usize> {
        self.element(of)
            .neighbors
            .iter()
            .position(|n| *n == Some(neighbor))
    }

    /// Active members of `id`'s refinement family: `id` itself if active,
    /// otherwise its active descendants, depth first in child order.
    pub fn active_family_tree(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let elem = self.element(cur);
            if elem.active {
                out.push(cur);
            } else {
                // reversed so traversal yields children in declaration order
                stack.extend(elem.children.iter().rev().copied());
            }
        }
        out
    }

    /// Interior elements coupled to boundary element `id` through its
    /// interior parent: the active family of the host element. Empty when
    /// `id` has no interior parent.
    pub fn find_interior_neighbors(&self, id: ElementId) -> Vec<ElementId> {
        match self.element(id).interior_parent {
            Some(parent) => self.active_family_tree(parent),
            None => Vec::new(),
        }
    }

    /// Split a `Quad4` into four children (SW, SE, NW, NE), deactivating the
    /// parent.
    ///
    /// Children's sides are numbered coincident with the parent's: a child
    /// lying on parent side `s` has its own side `s` pointing at the
    /// parent's old neighbor on `s`. The coarse neighbor itself is left
    /// pointing at the (now inactive) parent — the non-conforming AMR case
    /// the graph builder has to discover.
    pub fn refine(&mut self, id: ElementId) -> Result<[ElementId; 4], MeshPartError> {
        let (kind, active) = {
            let e = self
                .try_element(id)
                .ok_or(MeshPartError::UnknownElement(id))?;
            (e.kind, e.active)
        };
        if kind != ElementKind::Quad4 {
            return Err(MeshPartError::NotRefinable {
                element: id,
                kind: kind.to_string(),
            });
        }
        if !active {
            return Err(MeshPartError::AlreadyRefined(id));
        }

        let parent = self.element(id).clone();
        let (lo, hi) = (parent.bbox.min, parent.bbox.max);
        let mid = parent.bbox.center();
        let quadrant = |xlo: f64, xhi: f64, ylo: f64, yhi: f64| BoundingBox {
            min: [xlo, ylo, lo[2]],
            max: [xhi, yhi, hi[2]],
        };
        let boxes = [
            quadrant(lo[0], mid[0], lo[1], mid[1]), // SW
            quadrant(mid[0], hi[0], lo[1], mid[1]), // SE
            quadrant(lo[0], mid[0], mid[1], hi[1]), // NW
            quadrant(mid[0], hi[0], mid[1], hi[1]), // NE
        ];
        let mut children = [id; 4];
        for (c, bbox) in boxes.into_iter().enumerate() {
            let child = self.add_element(ElementKind::Quad4, bbox);
            children[c] = child;
            let e = self.element_mut(child);
            e.parent = Some(id);
            e.processor_id = parent.processor_id;
        }

        // Quad side order: 0 bottom, 1 right, 2 top, 3 left.
        // Interior links between siblings:
        let sibling = [
            [(1usize, children[1]), (2, children[2])], // SW: right SE, top NW
            [(3, children[0]), (2, children[3])],      // SE: left SW, top NE
            [(0, children[0]), (1, children[3])],      // NW: bottom SW, right NE
            [(0, children[1]), (3, children[2])],      // NE: bottom SE, left NW
        ];
        // Outward sides per child, coincident with the parent's numbering:
        let outward = [
            [0usize, 3], // SW on parent's bottom and left
            [0, 1],      // SE
            [2, 3],      // NW
            [1, 2],      // NE
        ];
        for c in 0..4 {
            for &(side, other) in &sibling[c] {
                self.element_mut(children[c]).neighbors[side] = Some(other);
            }
            for &side in &outward[c] {
                self.element_mut(children[c]).neighbors[side] = parent.neighbors[side];
            }
        }

        let e = self.element_mut(id);
        e.active = false;
        e.children = children.to_vec();
        Ok(children)
    }

    /// Whether every process holds the full mesh.
    pub fn is_serial(&self) -> bool {
        self.serial
    }

    /// Mark this mesh as distributed (element sets differ across ranks).
    pub fn set_distributed(&mut self) {
        self.serial = false;
    }

    /// Collective: replicate the element set on every process.
    ///
    /// Every rank must call this. Records are exchanged as bincode bytes via
    /// the communicator's allgather; ids already known locally win, so the
    /// call is idempotent.
    pub fn allgather<C: Communicator>(&mut self, comm: &C) -> Result<(), MeshPartError> {
        if comm.size() > 1 {
            let mine: Vec<ElementRecord> = self
                .elements
                .iter()
                .map(|(id, element)| ElementRecord {
                    id: *id,
                    element: element.clone(),
                })
                .collect();
            let bytes =
                bincode::serialize(&mine).map_err(|e| MeshPartError::Exchange(e.to_string()))?;
            for buf in comm.allgather_bytes(&bytes) {
                let records: Vec<ElementRecord> = bincode::deserialize(&buf)
                    .map_err(|e| MeshPartError::Exchange(e.to_string()))?;
                for rec in records {
                    self.merge_record(rec);
                }
            }
            // Ids are minted per rank; keep the counter ahead of everything
            // we just learned about.
            self.next_id = self
                .elements
                .iter()
                .map(|(id, _)| id.get() + 1)
                .max()
                .unwrap_or(1)
                .max(self.next_id);
            self.elements.sort_by_key(|(id, _)| *id);
            self.slot_of = self
                .elements
                .iter()
                .enumerate()
                .map(|(slot, (id, _))| (*id, slot))
                .collect();
        }
        self.serial = true;
        Ok(())
    }

    fn merge_record(&mut self, rec: ElementRecord) {
        if self.slot_of.contains_key(&rec.id) {
            return;
        }
        self.slot_of.insert(rec.id, self.elements.len());
        self.elements.push((rec.id, rec.element));
    }

    /// Bypass neighbor validation to simulate upstream mesh corruption.
    #[cfg(test)]
    pub(crate) fn corrupt_neighbor_for_test(&mut self, id: ElementId, side: usize) {
        self.element_mut(id).neighbors[side] = Some(id);
    }

    pub fn processor_id(&self, id: ElementId) -> ProcessorId {
        self.element(id).processor_id
    }

    pub fn set_processor_id(&mut self, id: ElementId, pid: ProcessorId) {
        self.element_mut(id).processor_id = pid;
    }
}
