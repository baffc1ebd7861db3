pub mod error;
pub mod handle;
pub mod identifiers;
pub mod resource_type;
pub mod source;
pub mod specification;

pub use error::{CoreError, ErrorCategory, Result};
pub use handle::slugify;
pub use identifiers::{IdentifierMap, MatchKey};
pub use resource_type::{ResourceType, TypePolicy};
pub use source::{ActiveVersion, DraftVersion, LocalSource, RemoteSource};
pub use specification::{SourceDeclaration, SpecificationRegistry, TypeSpecification};
