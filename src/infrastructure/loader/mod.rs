//! Artifact loading
//!
//! [`FsLoader`] reads documents, [`schema`] turns them into validated
//! entities. Imports are left as opaque locators for the resolver.

mod fs_loader;
pub mod schema;

pub use fs_loader::{FsLoader, LoadFailure};
pub use schema::{is_semver, parse_assembly, parse_library};
