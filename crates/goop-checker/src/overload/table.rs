//! Resolved overloads, keyed by the operator expression they replace.

use goop_core::ExprId;
use rustc_hash::FxHashMap;

use super::OverloadOp;
use crate::types::TypeId;

/// A method that implements an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCandidate {
    pub name: String,
    /// Parameter types, excluding the receiver.
    pub params: Vec<TypeId>,
    pub result: TypeId,
    pub variadic: bool,
}

/// How one operator expression is rewritten into a method call.
///
/// `receiver` and `operand` are ids of the original operand expressions.
/// For a reversed binary overload the receiver is the right-hand operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverloadRecord {
    pub op: OverloadOp,
    pub method: MethodCandidate,
    pub receiver: ExprId,
    /// Absent for unary operators.
    pub operand: Option<ExprId>,
    pub reversed: bool,
}

impl OverloadRecord {
    /// Type of the rewritten expression.
    pub fn result(&self) -> TypeId {
        self.method.result
    }
}

/// Every overload resolved while checking one package.
#[derive(Debug, Clone, Default)]
pub struct OverloadTable {
    records: FxHashMap<ExprId, OverloadRecord>,
}

impl OverloadTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the overload for `expr`. A node keeps the first record it is
    /// given; returns false if one was already present.
    pub fn insert(&mut self, expr: ExprId, record: OverloadRecord) -> bool {
        match self.records.entry(expr) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn get(&self, expr: ExprId) -> Option<&OverloadRecord> {
        self.records.get(&expr)
    }

    pub fn contains(&self, expr: ExprId) -> bool {
        self.records.contains_key(&expr)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in expression id order.
    pub fn iter(&self) -> impl Iterator<Item = (ExprId, &OverloadRecord)> {
        let mut records: Vec<_> = self.records.iter().map(|(id, r)| (*id, r)).collect();
        records.sort_by_key(|(id, _)| *id);
        records.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BasicKind;

    fn record(method: &str, receiver: u32) -> OverloadRecord {
        OverloadRecord {
            op: OverloadOp::Add,
            method: MethodCandidate {
                name: method.to_string(),
                params: vec![TypeId::basic(BasicKind::Float32)],
                result: TypeId::basic(BasicKind::Float32),
                variadic: false,
            },
            receiver: ExprId::from_raw(receiver),
            operand: Some(ExprId::from_raw(receiver + 1)),
            reversed: false,
        }
    }

    #[test]
    fn first_record_wins() {
        let mut table = OverloadTable::new();
        assert!(table.is_empty());
        assert!(table.insert(ExprId::from_raw(7), record("Op_Add", 1)));
        assert!(!table.insert(ExprId::from_raw(7), record("Op_AddScalar", 1)));
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get(ExprId::from_raw(7)).map(|r| r.method.name.as_str()),
            Some("Op_Add")
        );
        assert!(!table.contains(ExprId::from_raw(1)));
    }

    #[test]
    fn iteration_is_ordered() {
        let mut table = OverloadTable::new();
        for id in [9, 3, 5] {
            table.insert(ExprId::from_raw(id), record("Op_Add", id - 2));
        }
        let ids: Vec<u32> = table.iter().map(|(id, _)| id.index()).collect();
        assert_eq!(ids, [3, 5, 9]);
    }
}
