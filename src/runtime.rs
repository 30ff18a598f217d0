//! Cell storage and the propagation scheduler.
//!
//! All cells of one graph live in a slotmap arena owned by a [`Runtime`].
//! Handles into the arena are stable keys, so productions may create new
//! cells and edges while a propagation is in flight without invalidating
//! anything the scheduler is iterating over.
//!
//! Propagation is a single evaluation stack. A write that actually changes
//! a value walks the transitive dependents depth-first in pre-order, pushes
//! the reversed walk while skipping cells that are already queued, and then
//! drains the stack back down to where it stood before the write. Nested
//! writes performed by productions re-enter the same procedure with a fresh
//! stack pointer and settle completely before the outer evaluation resumes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::trace;
use slotmap::{new_key_type, SlotMap};

use crate::error::Error;
use crate::value::Value;

new_key_type! {
    /// Stable handle of a cell in the arena.
    pub(crate) struct CellId;
}

/// Boxed production body of a derivation. Receives the defined values of
/// every input, in input order; returning `None` leaves the cell untouched.
pub(crate) type Production = Rc<RefCell<dyn FnMut(&[Value]) -> Option<Value>>>;

/// Cleanup action run when the cell loses a dependent edge.
pub(crate) type Disposer = Box<dyn FnOnce()>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Kind {
    Source,
    Derivation,
}

struct Node {
    value: Option<Value>,
    kind: Kind,
    inputs: Vec<CellId>,
    production: Option<Production>,
    dependents: Vec<CellId>,
    disposer: Option<Disposer>,
    queued: bool,
    /// Clock reading of the most recent actual change of `value`.
    touched: u64,
}

impl Node {
    fn source(value: Option<Value>) -> Node {
        Node {
            value,
            kind: Kind::Source,
            inputs: vec![],
            production: None,
            dependents: vec![],
            disposer: None,
            queued: false,
            touched: 0,
        }
    }

    fn derivation(production: Production, inputs: Vec<CellId>) -> Node {
        Node {
            value: None,
            kind: Kind::Derivation,
            inputs,
            production: Some(production),
            dependents: vec![],
            disposer: None,
            queued: false,
            touched: 0,
        }
    }
}

/// A pending re-evaluation of a derivation.
struct Frame {
    cell: CellId,
    /// Clock reading at the start of the propagation that scheduled it.
    since: u64,
}

/// Arena and scheduler state shared by all handles of one graph.
pub(crate) struct Core {
    nodes: RefCell<SlotMap<CellId, Node>>,
    stack: RefCell<Vec<Frame>>,
    clock: Cell<u64>,
}

impl Core {
    pub(crate) fn new() -> Core {
        Core {
            nodes: RefCell::new(SlotMap::with_key()),
            stack: RefCell::new(Vec::new()),
            clock: Cell::new(0),
        }
    }

    /// Create a source cell, defined or not.
    pub(crate) fn create(&self, value: Option<Value>) -> CellId {
        self.nodes.borrow_mut().insert(Node::source(value))
    }

    /// Create a derivation over `inputs`, register it with each of them and
    /// attempt one synchronous evaluation before returning.
    pub(crate) fn link(&self, production: Production, inputs: &[CellId]) -> Result<CellId, Error> {
        if inputs.is_empty() {
            return Err(Error::EmptyInputs);
        }
        let id = {
            let mut nodes = self.nodes.borrow_mut();
            if inputs.iter().any(|input| !nodes.contains_key(*input)) {
                return Err(Error::ForeignInput);
            }
            let id = nodes.insert(Node::derivation(production, inputs.to_vec()));
            for &input in inputs {
                nodes[input].dependents.push(id);
            }
            id
        };
        self.evaluate(id, 0);
        Ok(id)
    }

    pub(crate) fn read(&self, id: CellId) -> Option<Value> {
        self.nodes.borrow()[id].value.clone()
    }

    pub(crate) fn is_defined(&self, id: CellId) -> bool {
        self.nodes.borrow()[id].value.is_some()
    }

    /// External write. Only sources accept it.
    pub(crate) fn write(&self, id: CellId, value: Value) -> Result<(), Error> {
        if self.nodes.borrow()[id].kind == Kind::Derivation {
            return Err(Error::ReadOnly);
        }
        self.set(id, Some(value));
        Ok(())
    }

    /// The write procedure: apply the no-op rules, update the value, stamp
    /// the change clock and propagate to dependents.
    pub(crate) fn set(&self, id: CellId, value: Option<Value>) {
        let Some(value) = value else { return };
        {
            let mut nodes = self.nodes.borrow_mut();
            let node = &mut nodes[id];
            if let Some(current) = &node.value {
                if value.same(current) {
                    return;
                }
            }
            node.value = Some(value);
            let now = self.clock.get() + 1;
            self.clock.set(now);
            node.touched = now;
        }
        self.propagate(id);
    }

    /// Schedule every transitive dependent of `id` and drain the stack back
    /// to its depth at entry.
    fn propagate(&self, id: CellId) {
        let since = self.clock.get();
        let pointer = self.stack.borrow().len();
        let mut walk = Vec::new();
        {
            let nodes = self.nodes.borrow();
            collect(&nodes, id, &mut walk);
        }
        {
            let mut nodes = self.nodes.borrow_mut();
            let mut stack = self.stack.borrow_mut();
            for &cell in walk.iter().rev() {
                let node = &mut nodes[cell];
                if !node.queued {
                    node.queued = true;
                    stack.push(Frame { cell, since });
                }
            }
            trace!(
                "propagate {:?}: {} reachable, {} scheduled",
                id,
                walk.len(),
                stack.len() - pointer
            );
        }
        while self.stack.borrow().len() > pointer {
            let frame = self.stack.borrow_mut().pop();
            let Some(frame) = frame else { break };
            self.nodes.borrow_mut()[frame.cell].queued = false;
            self.evaluate(frame.cell, frame.since);
        }
    }

    /// Re-run a derivation's production and write the result back into it.
    ///
    /// Runs only when every input is defined and at least one input changed
    /// at or after `since`; a freshly linked derivation passes `since = 0`
    /// so its first attempt is unconditional.
    fn evaluate(&self, id: CellId, since: u64) {
        let (production, values) = {
            let nodes = self.nodes.borrow();
            let node = &nodes[id];
            let Some(production) = node.production.clone() else {
                return;
            };
            let mut fresh = false;
            let mut values = Vec::with_capacity(node.inputs.len());
            for &input in &node.inputs {
                let input = &nodes[input];
                match &input.value {
                    Some(value) => {
                        fresh |= input.touched >= since;
                        values.push(value.clone());
                    }
                    None => return,
                }
            }
            if !fresh {
                return;
            }
            (production, values)
        };
        trace!("evaluate {:?}", id);
        let result = {
            let mut body = production.borrow_mut();
            (*body)(&values)
        };
        self.set(id, result);
    }

    /// Remove `dependent` from `producer`'s fan-out and run the producer's
    /// disposer, if it still has one.
    pub(crate) fn unlink(&self, producer: CellId, dependent: CellId) {
        let disposer = {
            let mut nodes = self.nodes.borrow_mut();
            let node = &mut nodes[producer];
            node.dependents.retain(|&d| d != dependent);
            node.disposer.take()
        };
        if let Some(dispose) = disposer {
            dispose();
        }
    }

    pub(crate) fn set_disposer(&self, id: CellId, disposer: Disposer) {
        self.nodes.borrow_mut()[id].disposer = Some(disposer);
    }
}

/// Depth-first pre-order walk over dependents. Repeated visits are kept;
/// the scheduler drops them again when it pushes frames, which parks each
/// cell at its most indirect occurrence.
fn collect(nodes: &SlotMap<CellId, Node>, id: CellId, out: &mut Vec<CellId>) {
    for &dependent in &nodes[id].dependents {
        out.push(dependent);
        collect(nodes, dependent, out);
    }
}

/// Owner of one signal graph: the cell arena and its scheduler.
///
/// Each runtime is fully independent; signals from different runtimes may
/// not be linked together (see [`Error::ForeignInput`]). Cloning a
/// `Runtime` clones the handle, not the graph.
#[derive(Clone)]
pub struct Runtime {
    core: Rc<Core>,
}

impl Runtime {
    /// Create an empty runtime.
    pub fn new() -> Runtime {
        Runtime { core: Rc::new(Core::new()) }
    }

    pub(crate) fn core(&self) -> &Rc<Core> {
        &self.core
    }
}

impl Default for Runtime {
    fn default() -> Runtime {
        Runtime::new()
    }
}
