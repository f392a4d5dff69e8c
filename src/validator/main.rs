//! Standalone validator for course content files.
//!
//! Checks a catalog JSON file for structural problems and cross-checks it
//! against a page library, reporting pages without content and content
//! that addresses no page.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use wireshark_course_bot::catalog::{BUILTIN_CATALOG_JSON, Catalog, PageLibrary};

/// Course content validator.
#[derive(Parser, Debug)]
#[command(name = "validate_catalog")]
#[command(about = "Validates the course catalog and page files for the Wireshark course bot")]
#[command(version)]
struct Args {
    /// Path to the catalog JSON file (defaults to the built-in catalog).
    #[arg(short, long)]
    catalog: Option<PathBuf>,

    /// Path to the page library JSON file (defaults to the built-in pages).
    #[arg(short, long)]
    pages: Option<PathBuf>,

    /// Write the built-in catalog to the specified path and exit.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Show every module and submodule that was checked.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(output_path) = args.export {
        return export_builtin(&output_path);
    }

    let catalog_json = match &args.catalog {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => {
                println!("Validating: {}", path.display());
                json
            }
            Err(e) => {
                eprintln!("✗ Failed to read {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => {
            println!("Validating: built-in catalog");
            BUILTIN_CATALOG_JSON.to_owned()
        }
    };

    let problems = match Catalog::validate_all(&catalog_json) {
        Ok(problems) => problems,
        Err(e) => {
            eprintln!("✗ Failed to parse catalog: {e}");
            return ExitCode::FAILURE;
        }
    };

    if !problems.is_empty() {
        for problem in &problems {
            println!("  ✗ Error: {problem}");
        }
        println!("\n✗ Validation failed: {} error(s) in the catalog", problems.len());
        return ExitCode::FAILURE;
    }

    let catalog = match Catalog::from_json(&catalog_json) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("✗ Failed to load catalog: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.verbose {
        print_outline(&catalog);
    }

    let pages = match &args.pages {
        Some(path) => PageLibrary::load_from_file(path),
        None => PageLibrary::builtin(),
    };
    let pages = match pages {
        Ok(p) => p,
        Err(e) => {
            eprintln!("✗ Failed to load pages: {e}");
            return ExitCode::FAILURE;
        }
    };

    check_pages(&catalog, &pages)
}

fn export_builtin(output_path: &Path) -> ExitCode {
    let catalog = match Catalog::builtin() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("✗ Built-in catalog is invalid: {e}");
            return ExitCode::FAILURE;
        }
    };

    match catalog.save_to_file(output_path) {
        Ok(()) => {
            println!("✓ Built-in catalog written to: {}", output_path.display());
            println!("\nThe file contains {} modules.", catalog.total_modules());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to write catalog file: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_outline(catalog: &Catalog) {
    for module in catalog.modules() {
        println!(
            "[{}] \"{}\" ({} questions, {} practice tasks)",
            module.id,
            truncate(&module.title, 40),
            module.questions.len(),
            module.practice.len()
        );
        for sub in module.submodules.values() {
            println!(
                "  {}.{} \"{}\" ({} pages)",
                module.id,
                sub.id,
                truncate(&sub.title, 40),
                sub.pages
            );
        }
    }
    println!();
}

fn check_pages(catalog: &Catalog, pages: &PageLibrary) -> ExitCode {
    let missing = pages.missing_pages(catalog);
    let orphans = pages.orphan_pages(catalog);

    for key in &missing {
        println!("  ✗ Error: page {key} has no content");
    }
    for key in &orphans {
        println!("  ⚠ Warning: content {key} addresses no page of the catalog");
    }

    let total: u32 = catalog.modules().map(|m| m.total_pages()).sum();
    println!();

    if missing.is_empty() {
        println!(
            "✓ Catalog is valid: {} modules, {total} pages, all with content",
            catalog.total_modules()
        );
        if !orphans.is_empty() {
            println!("  ({} warning(s) - unused page content)", orphans.len());
        }
        ExitCode::SUCCESS
    } else {
        println!(
            "✗ Validation failed: {} of {total} pages have no content",
            missing.len()
        );
        ExitCode::FAILURE
    }
}

/// Truncates a string for display.
fn truncate(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", chars[..max_len].iter().collect::<String>())
    }
}
