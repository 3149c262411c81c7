//! Type information recorded for every checked expression.

use goop_core::ExprId;
use rustc_hash::FxHashMap;

use crate::constant::ConstValue;
use crate::operand::ModeKind;
use crate::types::TypeId;

/// Final type, mode and constant value of one expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAndValue {
    pub mode: ModeKind,
    pub ty: TypeId,
    pub value: Option<ConstValue>,
}

/// Expression types keyed by node id.
///
/// An untyped expression is recorded once its final type is known; if
/// nothing ever fixes it, it keeps its untyped type.
#[derive(Debug, Clone, Default)]
pub struct Info {
    types: FxHashMap<ExprId, TypeAndValue>,
}

impl Info {
    pub fn record(&mut self, id: ExprId, tv: TypeAndValue) {
        self.types.insert(id, tv);
    }

    pub fn get(&self, id: ExprId) -> Option<&TypeAndValue> {
        self.types.get(&id)
    }

    pub fn type_of(&self, id: ExprId) -> Option<TypeId> {
        self.get(id).map(|tv| tv.ty)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ExprId, &TypeAndValue)> {
        self.types.iter().map(|(id, tv)| (*id, tv))
    }
}
