use ubcd_ir::{NameRef, ObjectInfo, ObjectRef};
use ubcd_isa::{NativeFunction, NativeTable};

/// Resolves name and object indices against the owning package.
pub trait SymbolResolver {
    fn name(&self, name: NameRef) -> Option<String>;
    fn object(&self, object: ObjectRef) -> Option<ObjectInfo>;
    /// Native function declared by the owning package under `ordinal`.
    fn native_function(&self, _ordinal: u16) -> Option<NativeFunction> {
        None
    }
}

/// Resolver that knows nothing; every reference renders as a placeholder.
pub struct NoSymbols;

impl SymbolResolver for NoSymbols {
    fn name(&self, _name: NameRef) -> Option<String> {
        None
    }

    fn object(&self, _object: ObjectRef) -> Option<ObjectInfo> {
        None
    }
}

/// Exposes a resolver's declared natives as a [`NativeTable`].
pub struct DeclaredNatives<'a>(pub &'a dyn SymbolResolver);

impl NativeTable for DeclaredNatives<'_> {
    fn native(&self, ordinal: u16) -> Option<NativeFunction> {
        self.0.native_function(ordinal)
    }
}

/// Text of a name reference; instance numbers append `_N`.
pub fn name_text(symbols: &dyn SymbolResolver, name: NameRef) -> String {
    let base = symbols
        .name(name)
        .unwrap_or_else(|| format!("Name#{}", name.index));
    if name.number > 0 {
        format!("{base}_{}", name.number - 1)
    } else {
        base
    }
}

/// Name of a referenced object, or a placeholder carrying its index.
pub fn object_text(symbols: &dyn SymbolResolver, object: ObjectRef) -> String {
    if object.is_none() {
        return "none".into();
    }
    symbols
        .object(object)
        .map(|o| o.name)
        .unwrap_or_else(|| format!("Object#{}", object.0))
}
