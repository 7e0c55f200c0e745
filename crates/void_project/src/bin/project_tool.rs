//! Project document tool
//!
//! Run with: cargo run -p void_project --bin project_tool -- <command> <document>
//!
//! Commands:
//! - `inspect <document>`   print record counts and embedded payload sizes
//! - `normalize <document>` re-serialize with the canonical formatting
//!
//! `--config <file>` loads a project config (TOML) before running.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use void_project::{AssetInliner, InlinedAsset, ProjectConfig, ProjectDocument};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config_path: Option<PathBuf> = None;
    let mut positional = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = args.next().map(PathBuf::from),
            "-h" | "--help" => {
                print_usage();
                return ExitCode::SUCCESS;
            }
            _ => positional.push(arg),
        }
    }

    let config = match &config_path {
        Some(path) => match ProjectConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => ProjectConfig::load(),
    };

    let (Some(command), Some(path)) = (positional.first(), positional.get(1)) else {
        print_usage();
        return ExitCode::FAILURE;
    };
    let document = match read_document(Path::new(path)) {
        Ok(document) => document,
        Err(message) => {
            log::error!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    match command.as_str() {
        "inspect" => {
            inspect(&document);
            ExitCode::SUCCESS
        }
        "normalize" => match document.to_json(&config.export.indent) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("{}", e);
                ExitCode::FAILURE
            }
        },
        other => {
            log::error!("Unknown command '{}'", other);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    println!("Usage: project_tool [--config <file>] <inspect|normalize> <document>");
}

fn read_document(path: &Path) -> Result<ProjectDocument, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    ProjectDocument::from_json(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

/// Decoded size of every embedded payload; undecodable ones count as zero
fn payload_bytes(document: &ProjectDocument) -> usize {
    let inliner = AssetInliner::default();
    let mut buffers: Vec<(&str, &str)> = Vec::new();
    for material in &document.materials {
        for texture in &material.textures {
            buffers.push((texture.texture_name.as_str(), texture.texture_buffer.as_str()));
        }
    }
    for system in &document.particle_systems {
        if let (Some(name), Some(buffer)) = (&system.texture_name, &system.texture_buffer) {
            buffers.push((name.as_str(), buffer.as_str()));
        }
    }
    for system in &document.lens_flare_systems {
        for flare in system.flares.iter().flatten() {
            buffers.push((flare.flare_name.as_str(), flare.flare_buffer.as_str()));
        }
    }
    for sound in &document.sounds {
        if let Some(buffer) = &sound.sound_buffer {
            let name = sound.sound_name.as_deref().unwrap_or(&sound.name);
            buffers.push((name, buffer.as_str()));
        }
    }

    buffers
        .into_iter()
        .map(|(name, buffer)| {
            let asset = InlinedAsset {
                name: name.to_string(),
                buffer: buffer.to_string(),
            };
            match inliner.decode(&asset) {
                Ok(bytes) => bytes.len(),
                Err(e) => {
                    log::warn!("{}", e);
                    0
                }
            }
        })
        .sum()
}

fn inspect(document: &ProjectDocument) {
    let created = document.nodes.iter().filter(|n| !n.is_delta_only()).count();
    let deltas = document
        .nodes
        .iter()
        .filter(|n| n.is_delta_only() && n.has_deltas())
        .count();
    let placeholders = document.nodes.len() - created - deltas;

    println!("Format version:      {}", document.format_version);
    println!("Nodes:               {}", document.nodes.len());
    println!("  overlay:           {}", created);
    println!("  delta-only:        {}", deltas);
    println!("  placeholders:      {}", placeholders);
    println!("Materials:           {}", document.materials.len());
    println!("Particle systems:    {}", document.particle_systems.len());
    println!("Lens flare systems:  {}", document.lens_flare_systems.len());
    println!("Shadow casters:      {}", document.shadow_casters.len());
    println!("Render targets:      {}", document.render_targets.len());
    println!("Post-processes:      {}", document.post_processes.len());
    println!("Sounds:              {}", document.sounds.len());
    println!("2D containers:       {}", document.scene_2d.len());
    println!("Scene action graph:  {}", document.action_graph.is_some());
    println!("Physics enabled:     {}", document.physics_enabled);
    if let Some(kinds) = &document.requested_material_kinds {
        println!("Requested kinds:     {}", kinds.join(", "));
    }
    if !document.custom_metadata.is_empty() {
        let keys: Vec<&str> = document.custom_metadata.keys().map(String::as_str).collect();
        println!("Custom metadata:     {}", keys.join(", "));
    }
    println!("Embedded payloads:   {} bytes", payload_bytes(document));
}
