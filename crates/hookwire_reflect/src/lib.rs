//! Reflected type metadata for hookwire.
//!
//! This crate models the runtime type information the binding engine works
//! on: types and their declared members ([`TypeInfo`], [`Member`]), the
//! normalization of binary descriptors to canonical names ([`descriptor`]),
//! and name resolution through a chain of class loaders ([`TypeResolver`],
//! [`ClassPath`]).
//!
//! # Example
//!
//! ```
//! use hookwire_reflect::{ClassPath, LoaderId, TypeInfo, TypeResolver};
//!
//! let classpath = ClassPath::new();
//! classpath
//!     .define(
//!         &LoaderId::boot(),
//!         TypeInfo::builder("com.example.Greeter")
//!             .method("greet", &["java.lang.String"], "java.lang.String")
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let greeter = classpath.resolve("com.example.Greeter", None).unwrap();
//! assert_eq!(greeter.methods().count(), 1);
//! assert!(classpath.is_assignable("java.lang.CharSequence", "java.lang.String", None));
//! ```

pub mod descriptor;
pub mod error;
pub mod resolver;
pub mod types;

pub use error::{DescriptorError, ResolutionError};
pub use resolver::{ClassPath, LoaderId, TypeResolver};
pub use types::{Member, MemberKind, NO_OP_TYPE, OBJECT, TypeBuilder, TypeInfo, TypeRef, VOID};
