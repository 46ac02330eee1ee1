use std::collections::HashSet;
use std::path::Path;

use colored::*;
use ollamate_core::catalog::ModelCatalogEntry;
use ollamate_core::config::SystemConfig;
use ollamate_core::defaults::{DefaultsError, GenerationDefaults, SizeClass};
use ollamate_core::hardware::{HardwareProfile, SystemSpecs};
use ollamate_core::ollama::is_installed;
use ollamate_core::recommend::{Recommendation, Standing};
use ollamate_core::resources::ResourceSnapshot;
use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled)]
struct ModelRow {
    #[tabled(rename = "#")]
    number: String,
    #[tabled(rename = "Model")]
    identifier: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Tier")]
    tier: String,
    #[tabled(rename = "Standing")]
    standing: String,
    #[tabled(rename = "Max tokens")]
    max_tokens: String,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "Installed")]
    installed: String,
}

fn standing_text(standing: Standing) -> String {
    match standing {
        Standing::Primary => standing.label().green().to_string(),
        Standing::Alternate => standing.label().to_string(),
        Standing::Specialized => standing.label().cyan().to_string(),
        Standing::Experimental => standing.label().yellow().to_string(),
        Standing::NotRecommended => standing.label().red().to_string(),
    }
}

fn installed_text(identifier: &str, installed: Option<&HashSet<String>>) -> String {
    match installed {
        Some(set) if is_installed(identifier, set) => "✓".green().to_string(),
        Some(_) => String::new(),
        None => "-".dimmed().to_string(),
    }
}

pub fn display_system(specs: &SystemSpecs, profile: &HardwareProfile, tier: &str) {
    specs.display();
    println!("{}", "=== Hardware Profile ===".bold().cyan());
    println!("{}: {} GB", "RAM".bold(), profile.ram_gb);
    println!("{}: {}", "CPU cores".bold(), profile.cpu_cores);
    if profile.has_gpu() {
        println!("{}: {} GB", "GPU VRAM".bold(), profile.gpu_vram_gb);
        println!("{}: {}", "GPU type".bold(), profile.gpu_kind);
    } else {
        println!("{}: {}", "GPU".bold(), "none, CPU inference".dimmed());
    }
    println!("{}: {}", "Tier".bold(), tier.green());
    println!();
}

/// Numbered recommendation table. `installed` is `None` when Ollama could
/// not be reached.
pub fn display_recommendation(
    profile: &HardwareProfile,
    rec: &Recommendation,
    installed: Option<&HashSet<String>>,
) {
    println!(
        "\n{}",
        format!("=== Recommended models ({} tier) ===", rec.tier)
            .bold()
            .cyan()
    );
    println!(
        "{} GB RAM, {} GB VRAM: {}\n",
        profile.ram_gb,
        profile.gpu_vram_gb,
        rec.tier.description()
    );

    let rows: Vec<ModelRow> = rec
        .models
        .iter()
        .enumerate()
        .map(|(i, m)| ModelRow {
            number: (i + 1).to_string(),
            identifier: m.entry.identifier.to_string(),
            name: m.entry.display_name.to_string(),
            size: format!("{:.1} GB", m.entry.size_gb),
            tier: m.entry.tier.label().to_string(),
            standing: standing_text(m.standing),
            max_tokens: m.defaults.max_tokens.to_string(),
            temperature: format!("{:.1}", m.defaults.temperature),
            installed: installed_text(m.entry.identifier, installed),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    if let Some(top) = rec.top_pick() {
        println!("\nTop pick: {}", top.entry.identifier.bold().green());
    }
}

pub fn display_catalog(entries: &[&ModelCatalogEntry], installed: Option<&HashSet<String>>) {
    println!("\n{}", "=== Model Catalog ===".bold().cyan());
    println!("Total models: {}\n", entries.len());

    let rows: Vec<ModelRow> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let defaults = ollamate_core::defaults_for(e.identifier);
            ModelRow {
                number: (i + 1).to_string(),
                identifier: e.identifier.to_string(),
                name: e.display_name.to_string(),
                size: format!("{:.1} GB", e.size_gb),
                tier: e.tier.label().to_string(),
                standing: e.tags.join(", "),
                max_tokens: defaults.max_tokens.to_string(),
                temperature: format!("{:.1}", defaults.temperature),
                installed: installed_text(e.identifier, installed),
            }
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn display_defaults(
    identifier: &str,
    class: &Result<SizeClass, DefaultsError>,
    defaults: GenerationDefaults,
) {
    println!("\n{}", format!("=== {} ===", identifier).bold().cyan());
    match class {
        Ok(class) => println!("{}: {:?}", "Size class".bold(), class),
        Err(e) => println!("{}: {}", "Size class".bold(), e.to_string().yellow()),
    }
    println!("{}: {}", "Max tokens".bold(), defaults.max_tokens);
    println!("{}: {:.1}", "Temperature".bold(), defaults.temperature);
    println!();
}

pub fn display_config(path: &Path, config: &SystemConfig, exists: bool) {
    println!("\n{}", "=== System Configuration ===".bold().cyan());
    if exists {
        println!("{}: {}", "File".bold(), path.display());
    } else {
        println!(
            "{}: {} {}",
            "File".bold(),
            path.display(),
            "(not written yet, showing fallback)".yellow()
        );
    }
    let hw = &config.system_analysis;
    println!(
        "{}: {} GB RAM, {} cores, {} GB VRAM ({})",
        "Hardware".bold(),
        hw.ram_gb,
        hw.cpu_cores,
        hw.gpu_vram_gb,
        hw.gpu_kind
    );
    let rs = &config.recommended_settings;
    println!("{}: {}", "Model".bold(), rs.model.green());
    println!("{}: {}", "Max tokens".bold(), rs.max_tokens);
    println!("{}: {:.1}", "Temperature".bold(), rs.temperature);
    println!();
}

pub fn display_status(host: &str, available: bool, models: &[String]) {
    println!("\n{}", "=== Ollama ===".bold().cyan());
    println!("{}: {}", "Host".bold(), host);
    if !available {
        println!("{}: {}", "Status".bold(), "not reachable".red());
        println!("Start it with `ollama serve`.");
        println!();
        return;
    }
    println!("{}: {}", "Status".bold(), "running".green());
    if models.is_empty() {
        println!("No models installed. Try `ollamate init --pull`.");
    } else {
        println!("{} ({}):", "Installed models".bold(), models.len());
        for name in models {
            println!("  - {}", name);
        }
    }
    println!();
}

pub fn display_resources(snapshot: &ResourceSnapshot) {
    println!("\n{}", "=== Resources ===".bold().cyan());
    println!("{}: {}", "CPU".bold(), snapshot.cpu_text());
    println!("{}: {}", "Memory".bold(), snapshot.memory_text());
    println!("{}: {}", "GPU".bold(), snapshot.gpu_text());
    println!();
}

// ────────────────────────────────────────────────────────────────────
// JSON output for scripts
// ────────────────────────────────────────────────────────────────────

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("JSON serialization failed")
    );
}

pub fn display_json_system(specs: &SystemSpecs, profile: &HardwareProfile, tier: &str) {
    print_json(&serde_json::json!({
        "system": system_json(specs),
        "profile": profile,
        "tier": tier,
    }));
}

pub fn display_json_recommendation(profile: &HardwareProfile, rec: &Recommendation) {
    print_json(&serde_json::json!({
        "profile": profile,
        "tier": rec.tier,
        "top_pick": rec.top_pick().map(|m| m.entry.identifier),
        "models": rec.models,
    }));
}

pub fn display_json_catalog(entries: &[&ModelCatalogEntry]) {
    let models: Vec<serde_json::Value> = entries
        .iter()
        .map(|e| {
            serde_json::json!({
                "entry": e,
                "defaults": ollamate_core::defaults_for(e.identifier),
            })
        })
        .collect();
    print_json(&serde_json::json!({ "models": models }));
}

pub fn display_json_defaults(identifier: &str, defaults: GenerationDefaults) {
    print_json(&serde_json::json!({
        "model": identifier,
        "max_tokens": defaults.max_tokens,
        "temperature": defaults.temperature,
    }));
}

pub fn display_json_config(config: &SystemConfig) {
    print_json(&serde_json::json!(config));
}

pub fn display_json_status(host: &str, available: bool, models: &[String]) {
    print_json(&serde_json::json!({
        "host": host,
        "available": available,
        "models": models,
    }));
}

pub fn display_json_resources(snapshot: &ResourceSnapshot) {
    print_json(&serde_json::json!({
        "cpu_percent": round1(snapshot.cpu_percent),
        "memory_used_gb": round2(snapshot.memory_used_gb),
        "memory_total_gb": round2(snapshot.memory_total_gb),
        "gpu_name": snapshot.gpu_name,
    }));
}

fn system_json(specs: &SystemSpecs) -> serde_json::Value {
    let gpus_json: Vec<serde_json::Value> = specs
        .gpus
        .iter()
        .map(|g| {
            serde_json::json!({
                "name": g.name,
                "vram_gb": g.vram_gb.map(round2),
                "backend": g.backend.label(),
                "count": g.count,
                "unified_memory": g.unified_memory,
            })
        })
        .collect();

    serde_json::json!({
        "total_ram_gb": round2(specs.total_ram_gb),
        "available_ram_gb": round2(specs.available_ram_gb),
        "cpu_cores": specs.total_cpu_cores,
        "cpu_name": specs.cpu_name,
        "has_gpu": specs.has_gpu,
        "gpu_vram_gb": specs.gpu_vram_gb.map(round2),
        "gpu_name": specs.gpu_name,
        "unified_memory": specs.unified_memory,
        "backend": specs.backend.label(),
        "gpus": gpus_json,
    })
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
