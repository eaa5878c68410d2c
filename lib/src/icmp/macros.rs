macro_rules! __define_types {
    (
        impl $ty:ident {
            $(
                #[doc = $doc:literal]
                $name:ident = $value:expr;
            )*
        }
    ) => {
        impl $ty {
            $(
                #[doc = $doc]
                pub const $name: Self = Self($value);
            )*

            /// Construct an instance from the given value.
            #[inline]
            pub const fn new(value: u8) -> Self {
                Self(value)
            }

            /// Get the raw value as it appears on the wire.
            #[inline]
            pub const fn get(self) -> u8 {
                self.0
            }
        }

        impl fmt::Display for $ty {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match *self {
                    $(Self::$name => f.write_str($doc.trim_start()),)*
                    _ => write!(f, "unknown ({})", self.0),
                }
            }
        }

        impl fmt::Debug for $ty {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match *self {
                    $(Self::$name => write!(f, stringify!($name)),)*
                    _ => write!(f, "UNKNOWN({})", self.0),
                }
            }
        }
    };
}

pub(super) use __define_types as define_types;
