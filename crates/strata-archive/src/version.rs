//! Declarative macro for append-only format version timelines.

/// Declares a `#[repr(i32)]` enum whose variants are the migration
/// milestones of one persisted format.
///
/// Discriminants must start at zero and grow by exactly one per variant; this
/// is checked at compile time. New milestones go at the end and existing
/// values never change, otherwise previously saved files decode with the
/// wrong logic.
///
/// The generated type gets `ALL`, `LATEST`, `as_i32`, and a `TryFrom<i32>`
/// impl returning [`ArchiveError::UnknownVersion`](crate::ArchiveError).
#[macro_export]
macro_rules! format_version {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($format:literal) {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(i32)]
        $vis enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl $name {
            /// Every milestone, oldest first.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The version every writer emits.
            pub const LATEST: $name = Self::ALL[Self::ALL.len() - 1];

            #[inline]
            pub const fn as_i32(self) -> i32 {
                self as i32
            }
        }

        const _: () = {
            let all = $name::ALL;
            assert!(all[0] as i32 == 0, "version timeline must start at 0");
            let mut i = 1;
            while i < all.len() {
                assert!(
                    all[i] as i32 == all[i - 1] as i32 + 1,
                    "version milestones must be contiguous"
                );
                i += 1;
            }
        };

        impl ::core::convert::TryFrom<i32> for $name {
            type Error = $crate::ArchiveError;

            fn try_from(version: i32) -> Result<Self, Self::Error> {
                match version {
                    $($value => Ok($name::$variant),)+
                    other => Err($crate::ArchiveError::UnknownVersion {
                        format: $format,
                        version: other,
                    }),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::ArchiveError;

    crate::format_version! {
        enum TestVersion ("test") {
            First = 0,
            Second = 1,
            Third = 2,
        }
    }

    #[test]
    fn test_latest_is_last_variant() {
        assert_eq!(TestVersion::LATEST, TestVersion::Third);
        assert_eq!(TestVersion::LATEST.as_i32(), 2);
    }

    #[test]
    fn test_ordering_follows_timeline() {
        assert!(TestVersion::First < TestVersion::Second);
        assert!(TestVersion::Second < TestVersion::LATEST);
    }

    #[test]
    fn test_try_from_rejects_unknown() {
        assert_eq!(TestVersion::try_from(1), Ok(TestVersion::Second));
        assert_eq!(
            TestVersion::try_from(3),
            Err(ArchiveError::UnknownVersion {
                format: "test",
                version: 3
            })
        );
        assert!(TestVersion::try_from(-1).is_err());
    }
}
