//! Binary descriptor normalization.
//!
//! Reflection metadata names types in several spellings: canonical dotted
//! names (`java.lang.String`), internal slash names (`java/lang/String`),
//! field descriptors (`Ljava/lang/String;`) and the binary names used for
//! array classes (`[I`, `[Ljava.lang.String;`). [`canonical_name`] folds all
//! of them into the canonical form used everywhere else in hookwire:
//! dotted names with a `[]` suffix per array dimension.

use crate::error::DescriptorError;

/// A primitive type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// `byte` (`B`)
    Byte,
    /// `char` (`C`)
    Char,
    /// `double` (`D`)
    Double,
    /// `float` (`F`)
    Float,
    /// `int` (`I`)
    Int,
    /// `long` (`J`)
    Long,
    /// `short` (`S`)
    Short,
    /// `boolean` (`Z`)
    Boolean,
}

impl BaseType {
    /// All primitive types, in descriptor-letter order.
    pub const ALL: [BaseType; 8] = [
        Self::Byte,
        Self::Char,
        Self::Double,
        Self::Float,
        Self::Int,
        Self::Long,
        Self::Short,
        Self::Boolean,
    ];

    /// Maps a descriptor letter to its primitive type.
    #[must_use]
    pub fn from_descriptor(letter: char) -> Option<Self> {
        match letter {
            'B' => Some(Self::Byte),
            'C' => Some(Self::Char),
            'D' => Some(Self::Double),
            'F' => Some(Self::Float),
            'I' => Some(Self::Int),
            'J' => Some(Self::Long),
            'S' => Some(Self::Short),
            'Z' => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Maps a source-level keyword (`int`, `boolean`, ...) to its primitive type.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|base| base.name() == name)
    }

    /// Returns the source-level keyword.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Double => "double",
            Self::Float => "float",
            Self::Int => "int",
            Self::Long => "long",
            Self::Short => "short",
            Self::Boolean => "boolean",
        }
    }
}

/// A parsed field descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// A primitive.
    Base(BaseType),
    /// A class or interface, stored with `/` separators as written.
    Object(String),
    /// An array of the boxed component type.
    Array(Box<FieldType>),
}

impl FieldType {
    /// Renders the canonical dotted name of this type.
    #[must_use]
    pub fn canonical_name(&self) -> String {
        match self {
            Self::Base(base) => base.name().to_string(),
            Self::Object(name) => name.replace('/', "."),
            Self::Array(component) => format!("{}[]", component.canonical_name()),
        }
    }
}

/// Parses a complete field descriptor such as `[[Ljava/lang/String;`.
///
/// Dotted class names inside `L...;` are accepted as well, since binary
/// names of array classes use them.
pub fn parse_field_descriptor(desc: &str) -> Result<FieldType, DescriptorError> {
    let (ty, rest) =
        parse_field_type(desc).map_err(|_| DescriptorError::Invalid(desc.to_string()))?;
    if !rest.is_empty() {
        return Err(DescriptorError::Invalid(desc.to_string()));
    }
    Ok(ty)
}

fn parse_field_type(input: &str) -> Result<(FieldType, &str), DescriptorError> {
    let mut chars = input.chars();
    let Some(first) = chars.next() else {
        return Err(DescriptorError::Invalid(input.to_string()));
    };

    if let Some(base) = BaseType::from_descriptor(first) {
        return Ok((FieldType::Base(base), chars.as_str()));
    }

    match first {
        'L' => {
            let end = input
                .find(';')
                .ok_or_else(|| DescriptorError::Invalid(input.to_string()))?;
            let name = &input[1..end];
            if name.is_empty() {
                return Err(DescriptorError::Invalid(input.to_string()));
            }
            Ok((FieldType::Object(name.to_string()), &input[end + 1..]))
        }
        '[' => {
            let (component, rest) = parse_field_type(chars.as_str())?;
            Ok((FieldType::Array(Box::new(component)), rest))
        }
        _ => Err(DescriptorError::Invalid(input.to_string())),
    }
}

/// Normalizes any supported spelling of a type name to its canonical form.
///
/// ```
/// use hookwire_reflect::descriptor::canonical_name;
///
/// assert_eq!(canonical_name("[I").unwrap(), "int[]");
/// assert_eq!(canonical_name("[Ljava.lang.String;").unwrap(), "java.lang.String[]");
/// assert_eq!(canonical_name("Ljava/util/List;").unwrap(), "java.util.List");
/// assert_eq!(canonical_name("java/util/Map$Entry").unwrap(), "java.util.Map$Entry");
/// assert_eq!(canonical_name("boolean").unwrap(), "boolean");
/// ```
pub fn canonical_name(name: &str) -> Result<String, DescriptorError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DescriptorError::Empty);
    }

    if name.starts_with('[') {
        return parse_field_descriptor(name).map(|ty| ty.canonical_name());
    }

    if name.len() > 2 && name.starts_with('L') && name.ends_with(';') {
        return Ok(name[1..name.len() - 1].replace('/', "."));
    }

    if name.contains(char::is_whitespace) || name.contains(';') {
        return Err(DescriptorError::Invalid(name.to_string()));
    }

    Ok(name.replace('/', "."))
}

/// Returns the component name of a canonical array name (`int[]` -> `int`).
#[must_use]
pub fn array_component(name: &str) -> Option<&str> {
    name.strip_suffix("[]")
}

/// Returns whether a canonical name denotes a primitive (including `void`).
#[must_use]
pub fn is_primitive(name: &str) -> bool {
    name == "void" || BaseType::from_name(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_field_descriptor_primitives_and_arrays() {
        assert_eq!(
            parse_field_descriptor("J").unwrap(),
            FieldType::Base(BaseType::Long)
        );
        assert_eq!(
            parse_field_descriptor("[[Ljava/lang/String;").unwrap(),
            FieldType::Array(Box::new(FieldType::Array(Box::new(FieldType::Object(
                "java/lang/String".to_string()
            )))))
        );
    }

    #[test]
    fn parse_field_descriptor_rejects_trailing_input() {
        assert!(parse_field_descriptor("II").is_err());
        assert!(parse_field_descriptor("[Ljava/lang/String").is_err());
        assert!(parse_field_descriptor("[L;").is_err());
        assert!(parse_field_descriptor("[Q").is_err());
    }

    #[test]
    fn canonical_name_handles_every_spelling() {
        assert_eq!(canonical_name("[[J").unwrap(), "long[][]");
        assert_eq!(
            canonical_name("[Ljava/lang/Object;").unwrap(),
            "java.lang.Object[]"
        );
        assert_eq!(canonical_name("Lcom/example/Foo;").unwrap(), "com.example.Foo");
        assert_eq!(canonical_name("com.example.Foo").unwrap(), "com.example.Foo");
        assert_eq!(canonical_name("  int ").unwrap(), "int");
    }

    #[test]
    fn canonical_name_rejects_garbage() {
        assert_eq!(canonical_name(""), Err(DescriptorError::Empty));
        assert!(canonical_name("java.lang.String extra").is_err());
        assert!(canonical_name("[").is_err());
    }

    #[test]
    fn single_letter_class_names_are_not_descriptors() {
        // Outside of arrays, `I` is a (badly named) class, not `int`.
        assert_eq!(canonical_name("I").unwrap(), "I");
    }

    #[test]
    fn primitive_and_array_helpers() {
        assert!(is_primitive("int"));
        assert!(is_primitive("void"));
        assert!(!is_primitive("java.lang.Integer"));
        assert_eq!(array_component("int[][]"), Some("int[]"));
        assert_eq!(array_component("int"), None);
    }
}
