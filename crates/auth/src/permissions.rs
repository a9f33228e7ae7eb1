use core::any::TypeId;
use core::fmt::Debug;
use core::hash::Hash;

/// A closed vocabulary of atomic capabilities.
///
/// Each variant maps to the string stored in the `value` column of a permission
/// assignment row. Implement it with [`permission_enum!`](crate::permission_enum)
/// rather than by hand.
pub trait PermissionEnum: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Enum name used in validation errors.
    const NAME: &'static str;

    fn as_value(&self) -> &'static str;

    fn from_value(value: &str) -> Option<Self>;

    /// Every variant, in declaration order.
    fn all() -> &'static [Self];
}

/// Type-erased view of a [`PermissionEnum`], stored in the type registry.
#[derive(Debug, Clone, Copy)]
pub struct PermissionVocabulary {
    type_id: TypeId,
    name: &'static str,
    canonical: fn(&str) -> Option<&'static str>,
    values: fn() -> Vec<&'static str>,
}

impl PermissionVocabulary {
    pub fn of<P: PermissionEnum>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            name: P::NAME,
            canonical: canonical_permission::<P>,
            values: permission_values::<P>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<P: PermissionEnum>(&self) -> bool {
        self.type_id == TypeId::of::<P>()
    }

    /// Parse a stored value, returning its canonical `'static` form.
    pub fn canonical(&self, value: &str) -> Option<&'static str> {
        (self.canonical)(value)
    }

    pub fn values(&self) -> Vec<&'static str> {
        (self.values)()
    }
}

impl PartialEq for PermissionVocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for PermissionVocabulary {}

fn canonical_permission<P: PermissionEnum>(value: &str) -> Option<&'static str> {
    P::from_value(value).map(|p| p.as_value())
}

fn permission_values<P: PermissionEnum>() -> Vec<&'static str> {
    P::all().iter().map(|p| p.as_value()).collect()
}

/// Declare a permission vocabulary.
///
/// ```ignore
/// permission_enum! {
///     pub enum ProjectPermission {
///         Edit => "edit",
///         Publish => "publish",
///     }
/// }
/// ```
#[macro_export]
macro_rules! permission_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),*
        }

        impl $crate::PermissionEnum for $name {
            const NAME: &'static str = stringify!($name);

            fn as_value(&self) -> &'static str {
                match self {
                    $( Self::$variant => $value ),*
                }
            }

            fn from_value(value: &str) -> Option<Self> {
                match value {
                    $( $value => Some(Self::$variant), )*
                    _ => None,
                }
            }

            fn all() -> &'static [Self] {
                &[ $( Self::$variant ),* ]
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str($crate::PermissionEnum::as_value(self))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::permission_enum! {
        enum DocPermission {
            Read => "read",
            Write => "write",
        }
    }

    crate::permission_enum! {
        enum OtherPermission {
            Read => "read",
        }
    }

    #[test]
    fn values_parse_back_to_variants() {
        assert_eq!(DocPermission::from_value("write"), Some(DocPermission::Write));
        assert_eq!(DocPermission::from_value("delete"), None);
        assert_eq!(DocPermission::Read.to_string(), "read");
        assert_eq!(DocPermission::NAME, "DocPermission");
    }

    #[test]
    fn vocabulary_identity_is_the_rust_type() {
        let doc = PermissionVocabulary::of::<DocPermission>();
        let other = PermissionVocabulary::of::<OtherPermission>();
        assert!(doc.is::<DocPermission>());
        assert!(!doc.is::<OtherPermission>());
        assert_ne!(doc, other);
        assert_eq!(doc.canonical("read"), Some("read"));
        assert_eq!(doc.values(), vec!["read", "write"]);
    }
}
