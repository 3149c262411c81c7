//! The universe scope: predeclared types, constants, `nil` and builtins.

use goop_core::{FileId, Span};

use crate::constant::ConstValue;
use crate::objects::{Builtin, Object, ObjectId, ObjectKind, Objects, ScopeId, ScopeKind, Scopes};
use crate::types::{BasicKind, TypeId, TypeTable};

/// Handles to the predeclared scope and the objects the checker treats
/// specially.
#[derive(Debug, Clone, Copy)]
pub struct Universe {
    pub scope: ScopeId,
    pub iota: ObjectId,
}

impl Universe {
    pub fn new(objects: &mut Objects, scopes: &mut Scopes, types: &TypeTable) -> Self {
        let scope = scopes.new_scope(None, ScopeKind::Universe);
        let mut declare = |objects: &mut Objects, object: Object| {
            let name = object.name.clone();
            let id = objects.alloc(object);
            // Names are distinct, so insertion cannot fail.
            let _ = scopes.insert(scope, &name, id);
            id
        };
        let pos = Span::default();
        let file = FileId::default();

        for kind in BasicKind::ALL {
            if kind == BasicKind::Invalid || kind.is_untyped() {
                continue;
            }
            declare(
                objects,
                Object::new(kind.name(), ObjectKind::TypeName { alias: false }, file, pos)
                    .with_type(TypeId::basic(kind)),
            );
        }
        for (name, ty) in [
            ("byte", TypeId::basic(BasicKind::Uint8)),
            ("rune", TypeId::basic(BasicKind::Int32)),
            ("any", types.empty_interface()),
        ] {
            declare(
                objects,
                Object::new(name, ObjectKind::TypeName { alias: true }, file, pos).with_type(ty),
            );
        }
        declare(
            objects,
            Object::new("error", ObjectKind::TypeName { alias: false }, file, pos)
                .with_type(types.error_type()),
        );

        for (name, value) in [("true", true), ("false", false)] {
            declare(
                objects,
                Object::new(
                    name,
                    ObjectKind::Const {
                        value: Some(ConstValue::Bool(value)),
                    },
                    file,
                    pos,
                )
                .with_type(TypeId::basic(BasicKind::UntypedBool)),
            );
        }
        let iota = declare(
            objects,
            Object::new(
                "iota",
                ObjectKind::Const {
                    value: Some(ConstValue::Int(0)),
                },
                file,
                pos,
            )
            .with_type(TypeId::basic(BasicKind::UntypedInt)),
        );
        declare(
            objects,
            Object::new("nil", ObjectKind::Nil, file, pos)
                .with_type(TypeId::basic(BasicKind::UntypedNil)),
        );

        for builtin in Builtin::ALL {
            declare(
                objects,
                Object::new(builtin.name(), ObjectKind::Builtin(builtin), file, pos)
                    .with_type(TypeId::INVALID),
            );
        }

        Self { scope, iota }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predeclared_names() {
        let mut objects = Objects::default();
        let mut scopes = Scopes::default();
        let types = TypeTable::new();
        let universe = Universe::new(&mut objects, &mut scopes, &types);

        let lookup = |name: &str| scopes.lookup_local(universe.scope, name).map(|id| &objects[id]);

        assert_eq!(lookup("int").and_then(|o| o.ty), Some(TypeId::basic(BasicKind::Int)));
        assert_eq!(lookup("byte").and_then(|o| o.ty), Some(TypeId::basic(BasicKind::Uint8)));
        assert_eq!(lookup("error").and_then(|o| o.ty), Some(types.error_type()));
        assert!(matches!(lookup("len").map(|o| &o.kind), Some(ObjectKind::Builtin(Builtin::Len))));
        assert!(matches!(lookup("nil").map(|o| &o.kind), Some(ObjectKind::Nil)));
        assert!(lookup("untyped int").is_none());
        assert_eq!(objects[universe.iota].name, "iota");
    }
}
