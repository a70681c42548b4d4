//! Macros for declaring state enums.

/// Declare a state enum and implement [`State`](crate::core::State) for it.
///
/// The enum gets the derives the engine requires and an `ALL` constant
/// listing every variant in declaration order.
///
/// # Example
///
/// ```
/// use utility_hsm::core::State;
/// use utility_hsm::state_enum;
///
/// state_enum! {
///     pub enum GuardState {
///         Idle,
///         Patrol,
///         Chase,
///     }
/// }
///
/// assert_eq!(GuardState::Chase.name(), "Chase");
/// assert_eq!(GuardState::ALL.len(), 3);
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Debug,
            serde::Serialize,
            serde::Deserialize
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            #[allow(dead_code)]
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}
