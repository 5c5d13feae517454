//! Domain Layer
//!
//! The PAL pipeline without I/O.
//!
//! ## Structure
//!
//! - `entities/` - Assemblies, libraries, execution and evaluation records
//! - `value_objects/` - Artifact keys, locators, content hashes
//! - `services/` - Template engine, resolver, compiler, pricing
//! - `ports/` - Interfaces for loading artifacts, calling models, auditing
//!
//! Everything that touches the file system or network is behind a port and
//! implemented in `infrastructure`.

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;
