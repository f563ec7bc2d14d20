//! Type utilities for the source schema provider.

use quote::ToTokens;

const PRIMITIVES: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize", "f32",
    "f64", "bool", "char", "str",
];

/// Prelude and common std types that are reachable by a bare name.
const STD_TYPES: &[&str] = &[
    "String",
    "Option",
    "Vec",
    "Box",
    "Rc",
    "Arc",
    "Cow",
    "Cell",
    "RefCell",
    "Mutex",
    "RwLock",
    "HashMap",
    "HashSet",
    "BTreeMap",
    "BTreeSet",
    "VecDeque",
    "PhantomData",
    "Duration",
    "Instant",
    "SystemTime",
    "PathBuf",
    "OsString",
];

const STD_ROOTS: &[&str] = &["std", "core", "alloc"];

/// What a field type looks like before it is resolved against the schema.
#[derive(Debug)]
pub(crate) enum TypeShape<'a> {
    /// Ends recursion; carries the rendered type.
    Builtin(String),
    /// A path that may name a declared record.
    Path(&'a syn::Path),
}

pub(crate) fn type_text(ty: &impl ToTokens) -> String {
    ty.to_token_stream().to_string()
}

/// Checks if a path is a bare primitive name like `i32` or `bool`.
///
/// Qualified paths (`std::primitive::i32`) are not primitives here, but they
/// still end up builtin through their `std` root.
pub(crate) fn is_primitive_path(path: &syn::Path) -> bool {
    if path.leading_colon.is_some() || path.segments.len() != 1 {
        return false;
    }
    path.segments.first().is_some_and(|segment| {
        segment.arguments.is_empty() && PRIMITIVES.contains(&segment.ident.to_string().as_str())
    })
}

fn is_std_path(path: &syn::Path) -> bool {
    let Some(first) = path.segments.first() else {
        return false;
    };
    let first = first.ident.to_string();
    if path.segments.len() == 1 {
        STD_TYPES.contains(&first.as_str())
    } else {
        STD_ROOTS.contains(&first.as_str())
    }
}

fn is_generic_param(path: &syn::Path, generics: &[String]) -> bool {
    path.leading_colon.is_none()
        && path.segments.len() == 1
        && path
            .segments
            .first()
            .is_some_and(|segment| generics.iter().any(|g| segment.ident == g))
}

/// Sorts a field type into builtin or candidate record path.
pub(crate) fn classify<'a>(ty: &'a syn::Type, generics: &[String]) -> TypeShape<'a> {
    match ty {
        syn::Type::Group(group) => classify(&group.elem, generics),
        syn::Type::Paren(paren) => classify(&paren.elem, generics),
        syn::Type::Path(path) if path.qself.is_none() => {
            let inner = &path.path;
            if is_primitive_path(inner) || is_std_path(inner) || is_generic_param(inner, generics) {
                TypeShape::Builtin(type_text(ty))
            } else {
                TypeShape::Path(inner)
            }
        }
        // References, tuples, arrays, slices, pointers, fns, trait objects, qualified paths
        _ => TypeShape::Builtin(type_text(ty)),
    }
}
