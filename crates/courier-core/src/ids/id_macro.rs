//! Common macro for implementing numeric ID wrapper types.

macro_rules! impl_numeric_id {
    ($($name:ident),* $(,)?) => {
        $(
            impl $name {
                pub const fn new(value: i64) -> Self {
                    Self(value)
                }

                pub const fn value(&self) -> i64 {
                    self.0
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<i64> for $name {
                fn from(value: i64) -> Self {
                    Self(value)
                }
            }

            impl From<$name> for i64 {
                fn from(id: $name) -> Self {
                    id.0
                }
            }
        )*
    };
}

pub(crate) use impl_numeric_id;
