//! Reflected type and member metadata.
//!
//! A [`TypeInfo`] is an immutable snapshot of one loaded type: its name,
//! direct supertypes and declared members in declaration order. Members are
//! plain data ([`Member`]); every type name stored in them is canonical (see
//! [`descriptor::canonical_name`](crate::descriptor::canonical_name)).

use core::fmt;
use std::sync::Arc;

use crate::descriptor::{self, canonical_name};
use crate::error::DescriptorError;
use crate::resolver::LoaderId;

/// Canonical name of the top type. Every reference type is assignable to it.
pub const OBJECT: &str = "java.lang.Object";

/// Canonical name of the sentinel type a hook definition targets when it
/// should bind nothing at all.
pub const NO_OP_TYPE: &str = "hookwire.reflect.NoOp";

/// Return type name used for methods that return nothing.
pub const VOID: &str = "void";

/// Shared handle to a resolved type.
pub type TypeRef = Arc<TypeInfo>;

// ─────────────────────────────────────────────────────────────────────────────
// Member
// ─────────────────────────────────────────────────────────────────────────────

/// Whether a [`Member`] is a method or a constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// A named method.
    Method,
    /// A constructor. Constructors have an empty name and no return type.
    Constructor,
}

/// One declared method or constructor of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    declaring_type: String,
    kind: MemberKind,
    name: String,
    parameter_types: Vec<String>,
    return_type: Option<String>,
    is_static: bool,
    is_abstract: bool,
    loader: Option<LoaderId>,
}

impl Member {
    /// Returns the canonical name of the declaring type.
    #[must_use]
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// Returns whether this is a method or a constructor.
    #[must_use]
    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Returns `true` for constructors.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.kind == MemberKind::Constructor
    }

    /// Returns the member name (empty for constructors).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the canonical formal parameter types in order.
    #[must_use]
    pub fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }

    /// Returns the canonical return type, or `None` for constructors.
    #[must_use]
    pub fn return_type(&self) -> Option<&str> {
        self.return_type.as_deref()
    }

    /// Returns `true` if the member does not take a receiver.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Returns `true` for methods without a body.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Returns the loader that defined the declaring type, or `None` for
    /// members of a type that was never defined in a class path.
    #[must_use]
    pub fn loader(&self) -> Option<&LoaderId> {
        self.loader.as_ref()
    }

    /// Returns a stable signature such as
    /// `com.example.Greeter#greet(java.lang.String)` or
    /// `com.example.Greeter#<init>(int)`.
    #[must_use]
    pub fn signature(&self) -> String {
        let name = if self.is_constructor() {
            "<init>"
        } else {
            self.name.as_str()
        };
        format!(
            "{}#{}({})",
            self.declaring_type,
            name,
            self.parameter_types.join(",")
        )
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TypeInfo
// ─────────────────────────────────────────────────────────────────────────────

/// Metadata for one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    name: String,
    superclass: Option<String>,
    interfaces: Vec<String>,
    primitive: bool,
    members: Vec<Member>,
}

impl TypeInfo {
    /// Starts building a class or interface with the given name.
    ///
    /// Any name spelling accepted by
    /// [`canonical_name`](crate::descriptor::canonical_name) may be used.
    pub fn builder(name: impl AsRef<str>) -> TypeBuilder {
        TypeBuilder::new(name.as_ref())
    }

    /// Creates the metadata for a primitive (or `void`).
    #[must_use]
    pub fn primitive(name: &str) -> Self {
        Self {
            name: name.to_string(),
            superclass: None,
            interfaces: Vec::new(),
            primitive: true,
            members: Vec::new(),
        }
    }

    /// Synthesizes the metadata of an array type from its canonical name.
    #[must_use]
    pub fn array(name: &str) -> Self {
        Self {
            name: name.to_string(),
            superclass: Some(OBJECT.to_string()),
            interfaces: Vec::new(),
            primitive: false,
            members: Vec::new(),
        }
    }

    /// Returns the canonical name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the direct superclass, if any.
    #[must_use]
    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    /// Returns the directly implemented interfaces.
    #[must_use]
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Returns the superclass followed by the interfaces.
    pub fn supertypes(&self) -> impl Iterator<Item = &str> {
        self.superclass
            .as_deref()
            .into_iter()
            .chain(self.interfaces.iter().map(String::as_str))
    }

    /// Returns `true` for primitives and `void`.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.primitive
    }

    /// Returns `true` for array types.
    #[must_use]
    pub fn is_array(&self) -> bool {
        descriptor::array_component(&self.name).is_some()
    }

    /// Returns `true` for the no-op sentinel type.
    #[must_use]
    pub fn is_no_op(&self) -> bool {
        self.name == NO_OP_TYPE
    }

    /// Returns all declared members in declaration order.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Returns the declared methods in declaration order.
    pub fn methods(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| !m.is_constructor())
    }

    /// Returns the declared constructors in declaration order.
    pub fn constructors(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.is_constructor())
    }

    /// Records `loader` as the defining loader of every member.
    pub(crate) fn defined_by(mut self, loader: &LoaderId) -> Self {
        for member in &mut self.members {
            member.loader = Some(loader.clone());
        }
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TypeBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for [`TypeInfo`].
///
/// Names are normalized as they are added; the first invalid name is kept
/// and returned from [`build`](Self::build).
///
/// # Example
///
/// ```
/// use hookwire_reflect::TypeInfo;
///
/// let greeter = TypeInfo::builder("com.example.Greeter")
///     .implements("java/io/Serializable")
///     .constructor(&["java.lang.String"])
///     .method("greet", &["java.lang.String"], "java.lang.String")
///     .static_method("create", &[], "Lcom/example/Greeter;")
///     .build()
///     .unwrap();
///
/// assert_eq!(greeter.methods().count(), 2);
/// assert_eq!(greeter.interfaces(), ["java.io.Serializable"]);
/// ```
#[derive(Debug)]
pub struct TypeBuilder {
    info: TypeInfo,
    error: Option<DescriptorError>,
}

impl TypeBuilder {
    fn new(name: &str) -> Self {
        let mut builder = Self {
            info: TypeInfo {
                name: String::new(),
                superclass: Some(OBJECT.to_string()),
                interfaces: Vec::new(),
                primitive: false,
                members: Vec::new(),
            },
            error: None,
        };
        builder.info.name = builder.normalize(name);
        if builder.info.name == OBJECT {
            builder.info.superclass = None;
        }
        builder
    }

    fn normalize(&mut self, name: &str) -> String {
        match canonical_name(name) {
            Ok(name) => name,
            Err(err) => {
                self.error.get_or_insert(err);
                name.to_string()
            }
        }
    }

    fn normalize_all(&mut self, names: &[&str]) -> Vec<String> {
        names.iter().map(|name| self.normalize(name)).collect()
    }

    /// Sets the direct superclass (defaults to the top type).
    #[must_use]
    pub fn extends(mut self, name: &str) -> Self {
        self.info.superclass = Some(self.normalize(name));
        self
    }

    /// Marks the type as an interface: no superclass.
    #[must_use]
    pub fn interface(mut self) -> Self {
        self.info.superclass = None;
        self
    }

    /// Adds a directly implemented interface.
    #[must_use]
    pub fn implements(mut self, name: &str) -> Self {
        let name = self.normalize(name);
        self.info.interfaces.push(name);
        self
    }

    /// Declares a constructor.
    #[must_use]
    pub fn constructor(mut self, params: &[&str]) -> Self {
        let parameter_types = self.normalize_all(params);
        self.push(MemberKind::Constructor, "", parameter_types, None, false, false);
        self
    }

    /// Declares an instance method.
    #[must_use]
    pub fn method(self, name: &str, params: &[&str], return_type: &str) -> Self {
        self.declare(name, params, return_type, false, false)
    }

    /// Declares a static method.
    #[must_use]
    pub fn static_method(self, name: &str, params: &[&str], return_type: &str) -> Self {
        self.declare(name, params, return_type, true, false)
    }

    /// Declares an abstract method.
    #[must_use]
    pub fn abstract_method(self, name: &str, params: &[&str], return_type: &str) -> Self {
        self.declare(name, params, return_type, false, true)
    }

    fn declare(
        mut self,
        name: &str,
        params: &[&str],
        return_type: &str,
        is_static: bool,
        is_abstract: bool,
    ) -> Self {
        let parameter_types = self.normalize_all(params);
        let return_type = self.normalize(return_type);
        self.push(
            MemberKind::Method,
            name,
            parameter_types,
            Some(return_type),
            is_static,
            is_abstract,
        );
        self
    }

    fn push(
        &mut self,
        kind: MemberKind,
        name: &str,
        parameter_types: Vec<String>,
        return_type: Option<String>,
        is_static: bool,
        is_abstract: bool,
    ) {
        self.info.members.push(Member {
            declaring_type: self.info.name.clone(),
            kind,
            name: name.to_string(),
            parameter_types,
            return_type,
            is_static,
            is_abstract,
            loader: None,
        });
    }

    /// Finishes the type.
    pub fn build(self) -> Result<TypeInfo, DescriptorError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.info),
        }
    }
}
