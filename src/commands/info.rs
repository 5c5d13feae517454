use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use pal::domain::entities::{ComponentLibrary, PromptAssembly};
use pal::domain::value_objects::{ArtifactKind, Locator};
use pal::infrastructure::FsLoader;

const DESCRIPTION_WIDTH: usize = 50;

pub async fn cmd_info(file: &Path) -> Result<ExitCode> {
    let loader = FsLoader::new();
    match Locator::from(file).kind() {
        ArtifactKind::Library => print_library(&loader.load_library_async(file).await?),
        ArtifactKind::Assembly => print_assembly(&loader.load_assembly_async(file).await?),
    }
    Ok(ExitCode::SUCCESS)
}

fn print_assembly(assembly: &PromptAssembly) {
    println!("Prompt Assembly: {}", assembly.id);
    println!("  Version:      {}", assembly.version);
    println!("  Description:  {}", assembly.description);
    if let Some(author) = &assembly.author {
        println!("  Author:       {author}");
    }
    println!("  Variables:    {}", assembly.variables.len());
    println!("  Imports:      {}", assembly.imports.len());
    println!("  Composition:  {} entries", assembly.composition.len());

    if !assembly.variables.is_empty() {
        println!("\nVariables:");
        for variable in &assembly.variables {
            let required = if variable.required { "required" } else { "optional" };
            let default = variable
                .default
                .as_ref()
                .map(|d| format!(" = {d}"))
                .unwrap_or_default();
            println!(
                "  {} ({}, {}){}  {}",
                variable.name, variable.var_type, required, default, variable.description
            );
        }
    }

    if !assembly.imports.is_empty() {
        println!("\nImports:");
        for import in &assembly.imports {
            println!("  {} -> {}", import.alias, import.locator);
        }
    }
}

fn print_library(library: &ComponentLibrary) {
    println!("Component Library: {}", library.library_id);
    println!("  Version:      {}", library.version);
    println!("  Type:         {}", library.library_type);
    println!("  Description:  {}", library.description);
    println!("  Components:   {}", library.components.len());

    if !library.components.is_empty() {
        println!("\nComponents:");
        for component in &library.components {
            println!(
                "  {} ({} chars)  {}",
                component.name,
                component.content.chars().count(),
                truncate(&component.description, DESCRIPTION_WIDTH)
            );
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let head: String = text.chars().take(width).collect();
        format!("{head}...")
    }
}
