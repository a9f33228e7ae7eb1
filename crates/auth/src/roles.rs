use core::any::TypeId;
use core::fmt::Debug;
use core::hash::Hash;

use crate::permissions::{PermissionEnum, PermissionVocabulary};

/// A closed vocabulary of roles.
///
/// Every role names the permission vocabulary it draws from and may imply a
/// fixed list of those permissions. Roles without implied permissions return
/// an empty slice and contribute nothing to a subject's effective set.
pub trait RoleEnum: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    type Permission: PermissionEnum;

    /// Enum name used in validation errors.
    const NAME: &'static str;

    fn as_value(&self) -> &'static str;

    fn from_value(value: &str) -> Option<Self>;

    /// Every variant, in declaration order.
    fn all() -> &'static [Self];

    /// Permissions implied by holding this role.
    fn permissions(&self) -> &'static [Self::Permission] {
        &[]
    }

    fn grants(&self, permission: Self::Permission) -> bool {
        self.permissions().contains(&permission)
    }

    fn grants_any(&self, permissions: &[Self::Permission]) -> bool {
        permissions.iter().any(|p| self.grants(*p))
    }

    fn grants_all(&self, permissions: &[Self::Permission]) -> bool {
        permissions.iter().all(|p| self.grants(*p))
    }
}

/// Type-erased view of a [`RoleEnum`], stored in the type registry.
#[derive(Debug, Clone, Copy)]
pub struct RoleVocabulary {
    type_id: TypeId,
    name: &'static str,
    permissions: PermissionVocabulary,
    canonical: fn(&str) -> Option<&'static str>,
    implied: fn(&str) -> Vec<&'static str>,
    values: fn() -> Vec<&'static str>,
}

impl RoleVocabulary {
    pub fn of<R: RoleEnum>() -> Self {
        Self {
            type_id: TypeId::of::<R>(),
            name: R::NAME,
            permissions: PermissionVocabulary::of::<R::Permission>(),
            canonical: canonical_role::<R>,
            implied: implied_permissions::<R>,
            values: role_values::<R>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<R: RoleEnum>(&self) -> bool {
        self.type_id == TypeId::of::<R>()
    }

    /// The permission vocabulary this role vocabulary implies into.
    pub fn permissions(&self) -> PermissionVocabulary {
        self.permissions
    }

    /// Parse a stored value, returning its canonical `'static` form.
    pub fn canonical(&self, value: &str) -> Option<&'static str> {
        (self.canonical)(value)
    }

    /// Permission values implied by a role value (empty for unknown roles).
    pub fn implied_permissions(&self, value: &str) -> Vec<&'static str> {
        (self.implied)(value)
    }

    pub fn values(&self) -> Vec<&'static str> {
        (self.values)()
    }
}

impl PartialEq for RoleVocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for RoleVocabulary {}

fn canonical_role<R: RoleEnum>(value: &str) -> Option<&'static str> {
    R::from_value(value).map(|r| r.as_value())
}

fn implied_permissions<R: RoleEnum>(value: &str) -> Vec<&'static str> {
    R::from_value(value)
        .map(|r| r.permissions().iter().map(|p| p.as_value()).collect())
        .unwrap_or_default()
}

fn role_values<R: RoleEnum>() -> Vec<&'static str> {
    R::all().iter().map(|r| r.as_value()).collect()
}

/// Declare a role vocabulary bound to a permission vocabulary.
///
/// Implied permissions are listed in brackets after the stored value; roles
/// without brackets imply nothing.
///
/// ```ignore
/// role_enum! {
///     pub enum ProjectRole: ProjectPermission {
///         Editor => "editor" [Edit, Publish],
///         Guest => "guest",
///     }
/// }
/// ```
#[macro_export]
macro_rules! role_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $perm:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $value:literal $( [ $( $implied:ident ),* $(,)? ] )? ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),*
        }

        impl $crate::RoleEnum for $name {
            type Permission = $perm;

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

            fn permissions(&self) -> &'static [$perm] {
                match self {
                    $( Self::$variant => &[ $( $( $perm::$implied ),* )? ] ),*
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str($crate::RoleEnum::as_value(self))
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
            Share => "share",
        }
    }

    crate::role_enum! {
        enum DocRole: DocPermission {
            Owner => "owner" [Read, Write, Share],
            Reader => "reader" [Read],
            Guest => "guest",
        }
    }

    #[test]
    fn roles_carry_declared_permissions() {
        assert_eq!(
            DocRole::Owner.permissions(),
            &[DocPermission::Read, DocPermission::Write, DocPermission::Share]
        );
        assert!(DocRole::Guest.permissions().is_empty());
    }

    #[test]
    fn grant_helpers_use_standard_quantifiers() {
        assert!(DocRole::Reader.grants(DocPermission::Read));
        assert!(!DocRole::Reader.grants(DocPermission::Write));
        assert!(DocRole::Reader.grants_any(&[DocPermission::Write, DocPermission::Read]));
        assert!(!DocRole::Reader.grants_all(&[DocPermission::Write, DocPermission::Read]));
        assert!(!DocRole::Owner.grants_any(&[]));
        assert!(DocRole::Owner.grants_all(&[]));
    }

    #[test]
    fn erased_vocabulary_expands_roles() {
        let vocab = RoleVocabulary::of::<DocRole>();
        assert_eq!(vocab.name(), "DocRole");
        assert_eq!(vocab.canonical("reader"), Some("reader"));
        assert_eq!(vocab.canonical("admin"), None);
        assert_eq!(vocab.implied_permissions("reader"), vec!["read"]);
        assert!(vocab.implied_permissions("admin").is_empty());
        assert!(vocab.permissions().is::<DocPermission>());
    }
}
