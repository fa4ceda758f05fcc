/// Declares a slug-backed identifier enum for frameworks and languages.
///
/// Each variant is `Variant => "slug" : "Label"` plus optional `| "alias"`
/// spellings accepted on input. Unknown slugs become `Custom(String)`, so a
/// stored analysis with an unrecognised framework still deserializes.
#[macro_export]
macro_rules! define_id_enum {
    (
        $(#[$enum_meta:meta])*
        $enum_name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $slug:literal : $display_name:literal
                $( | $alias:literal )*
            ),* $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $enum_name {
            $(
                $(#[$variant_meta])*
                $variant,
            )*
            Custom(String),
        }

        impl serde::Serialize for $enum_name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.slug())
            }
        }

        impl<'de> serde::Deserialize<'de> for $enum_name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from_slug(&s))
            }
        }

        impl $enum_name {
            pub fn slug(&self) -> &str {
                match self {
                    $(
                        Self::$variant => $slug,
                    )*
                    Self::Custom(slug) => slug,
                }
            }

            /// Human label, or the raw slug for `Custom`.
            pub fn name(&self) -> std::borrow::Cow<'_, str> {
                match self {
                    $(
                        Self::$variant => std::borrow::Cow::Borrowed($display_name),
                    )*
                    Self::Custom(slug) => std::borrow::Cow::Borrowed(slug.as_str()),
                }
            }

            /// Resolves a slug or alias case-insensitively, falling back to
            /// `Custom` with the input kept verbatim.
            pub fn from_slug(slug: &str) -> Self {
                match slug.trim().to_ascii_lowercase().as_str() {
                    $(
                        $slug $(| $alias)* => Self::$variant,
                    )*
                    _ => Self::Custom(slug.to_string()),
                }
            }

            pub fn is_custom(&self) -> bool {
                matches!(self, Self::Custom(_))
            }

            /// Every known variant, in declaration order.
            pub fn all_variants() -> &'static [Self] {
                &[
                    $(
                        Self::$variant,
                    )*
                ]
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::from_slug(s))
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.slug())
            }
        }
    };
}
