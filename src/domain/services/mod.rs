//! Domain Services
//!
//! Pure pipeline logic: template rendering, import resolution, compilation
//! and pricing. Loading and model calls happen behind ports.

pub mod compiler;
pub mod pricing;
pub mod resolver;
pub mod template;

pub use compiler::{
    analyze_template_variables, compile, compile_with_report, CompileReport, ENTRY_SEPARATOR,
};
pub use pricing::{ModelPricing, PricingTable};
pub use resolver::{resolve, Resolver, SymbolTable};
pub use template::{ComponentSource, RenderContext, Rendered, Template, TemplateError};
