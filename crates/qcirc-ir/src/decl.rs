//! Named, parametric gate declarations.

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::gate::{GateCall, GateKind};
use crate::parameter::ParameterExpression;

static NEXT_DECL_ID: AtomicU64 = AtomicU64::new(0);

/// Stable handle identifying one [`GateDecl`].
///
/// Two declarations with identical content still have distinct handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId(u64);

impl DeclId {
    /// The raw handle value.
    pub fn index(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decl#{}", self.0)
    }
}

/// A gate declaration: a name, ordered parameter symbols and a body
/// acting on local qubits `0..num_qubits`.
#[derive(Debug)]
pub struct GateDecl {
    id: DeclId,
    name: String,
    params: Vec<String>,
    body: Circuit,
}

impl GateDecl {
    /// Create a declaration with a fresh handle.
    pub fn new(name: impl Into<String>, params: Vec<String>, body: Circuit) -> Arc<Self> {
        Arc::new(Self {
            id: DeclId(NEXT_DECL_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            params,
            body,
        })
    }

    pub fn id(&self) -> DeclId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter symbol names, in declaration order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn body(&self) -> &Circuit {
        &self.body
    }

    pub fn num_qubits(&self) -> u32 {
        self.body.num_qubits()
    }

    /// Apply the declaration to arguments.
    ///
    /// Returns an error if the argument count does not match the parameters.
    pub fn call(self: &Arc<Self>, args: Vec<ParameterExpression>) -> IrResult<GateKind> {
        if args.len() != self.params.len() {
            return Err(IrError::ParameterCountMismatch {
                gate_name: self.name.clone(),
                expected: self.params.len(),
                got: args.len(),
            });
        }
        Ok(GateKind::Call(GateCall {
            decl: Arc::clone(self),
            args,
        }))
    }
}

impl PartialEq for GateDecl {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GateDecl {}

impl GateCall {
    /// Map each declared parameter symbol to its argument.
    pub fn bindings(&self) -> FxHashMap<String, ParameterExpression> {
        self.decl
            .params()
            .iter()
            .cloned()
            .zip(self.args.iter().cloned())
            .collect()
    }
}
