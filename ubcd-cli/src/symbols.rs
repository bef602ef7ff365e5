use std::collections::BTreeMap;

use serde::Deserialize;
use ubcd_decompiler::SymbolResolver;
use ubcd_ir::{FunctionFlags, FunctionInfo, NameRef, ObjectInfo, ObjectKind, ObjectRef};
use ubcd_isa::{NativeFunction, NativeTable, NativeTableMap};

/// Package symbols loaded from YAML.
///
/// ```yaml
/// names: [None, Begin, Touch]
/// objects:
///   1: { name: Health, class: IntProperty }
///   10: { name: Touch, outer: Actor, kind: function, flags: 0x802 }
///   -3: { name: GameInfo, class: Class, kind: class }
/// natives:
///   300: { name: Spawn }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SymbolTable {
    names: Vec<String>,
    objects: BTreeMap<i32, ObjectEntry>,
    natives: NativeTableMap,
}

#[derive(Debug, Deserialize)]
struct ObjectEntry {
    name: String,
    #[serde(default)]
    class: String,
    #[serde(default)]
    outer: Option<String>,
    #[serde(default)]
    kind: KindDoc,
    #[serde(default)]
    flags: u32,
    #[serde(default)]
    native: u16,
    #[serde(default)]
    precedence: u8,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindDoc {
    #[default]
    Property,
    Function,
    Class,
    Struct,
    State,
    Enum,
    Const,
    Other,
}

impl From<KindDoc> for ObjectKind {
    fn from(k: KindDoc) -> Self {
        match k {
            KindDoc::Property => ObjectKind::Property,
            KindDoc::Function => ObjectKind::Function,
            KindDoc::Class => ObjectKind::Class,
            KindDoc::Struct => ObjectKind::Struct,
            KindDoc::State => ObjectKind::State,
            KindDoc::Enum => ObjectKind::Enum,
            KindDoc::Const => ObjectKind::Const,
            KindDoc::Other => ObjectKind::Other,
        }
    }
}

impl SymbolTable {
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

impl SymbolResolver for SymbolTable {
    fn name(&self, name: NameRef) -> Option<String> {
        usize::try_from(name.index)
            .ok()
            .and_then(|i| self.names.get(i))
            .cloned()
    }

    fn object(&self, object: ObjectRef) -> Option<ObjectInfo> {
        let e = self.objects.get(&object.0)?;
        let mut info = ObjectInfo::new(&e.name, e.kind.into()).with_class(&e.class);
        if let Some(outer) = &e.outer {
            info = info.with_outer(outer);
        }
        if matches!(e.kind, KindDoc::Function) {
            info = info.with_function(FunctionInfo {
                flags: FunctionFlags::from_bits_truncate(e.flags),
                native_index: e.native,
                operator_precedence: e.precedence,
            });
        }
        Some(info)
    }

    fn native_function(&self, ordinal: u16) -> Option<NativeFunction> {
        self.natives.native(ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "
names: [None, Begin]
objects:
  1: { name: Health, class: IntProperty }
  10: { name: Died, outer: Pawn, kind: function, flags: 0x1 }
natives:
  300: { name: Spawn }
";

    #[test]
    fn loads_names_objects_and_natives() {
        let t = SymbolTable::from_yaml(DOC).unwrap();
        assert_eq!(t.name(NameRef::new(1, 0)).as_deref(), Some("Begin"));
        assert_eq!(t.name(NameRef::new(-1, 0)), None);

        let prop = t.object(ObjectRef(1)).unwrap();
        assert_eq!(prop.kind, ObjectKind::Property);
        assert!(prop.function.is_none());

        let f = t.object(ObjectRef(10)).unwrap();
        assert_eq!(f.outer.as_deref(), Some("Pawn"));
        assert!(f.function.unwrap().flags.contains(FunctionFlags::FINAL));

        assert_eq!(t.native_function(300).unwrap().name, "Spawn");
        assert!(t.object(ObjectRef(2)).is_none());
    }

    #[test]
    fn empty_document_is_empty_table() {
        let t = SymbolTable::from_yaml("{}").unwrap();
        assert!(t.name(NameRef::new(0, 0)).is_none());
    }
}
