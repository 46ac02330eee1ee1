//! Host hardware probing.
//!
//! `SystemSpecs` is the raw, best-effort picture of the machine (sysinfo plus
//! vendor tools). `HardwareProfile` is the coarse, integer view of it that the
//! recommendation engine consumes and that gets persisted next to the chosen
//! model.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sysinfo::System;
use tracing::{debug, warn};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// The acceleration backend a GPU would be driven through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GpuBackend {
    Cuda,
    Metal,
    Rocm,
    Vulkan, // AMD without ROCm
    Sycl,   // Intel oneAPI
    CpuArm,
    CpuX86,
}

impl GpuBackend {
    pub fn label(&self) -> &'static str {
        match self {
            GpuBackend::Cuda => "CUDA",
            GpuBackend::Metal => "Metal",
            GpuBackend::Rocm => "ROCm",
            GpuBackend::Vulkan => "Vulkan",
            GpuBackend::Sycl => "SYCL",
            GpuBackend::CpuArm => "CPU (ARM)",
            GpuBackend::CpuX86 => "CPU (x86)",
        }
    }
}

/// Coarse GPU family, as written to the `gpu_type` field of the persisted
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GpuKind {
    Nvidia,
    Amd,
    AppleSilicon,
    Intel,
    #[default]
    None,
    #[serde(other)]
    Unknown,
}

impl GpuKind {
    pub fn label(&self) -> &'static str {
        match self {
            GpuKind::Nvidia => "NVIDIA",
            GpuKind::Amd => "AMD",
            GpuKind::AppleSilicon => "Apple Silicon",
            GpuKind::Intel => "Intel",
            GpuKind::None => "None",
            GpuKind::Unknown => "Unknown",
        }
    }

    fn from_gpu(gpu: &GpuInfo) -> Self {
        let lower = gpu.name.to_lowercase();
        match gpu.backend {
            GpuBackend::Cuda => GpuKind::Nvidia,
            GpuBackend::Metal => GpuKind::AppleSilicon,
            GpuBackend::Rocm => GpuKind::Amd,
            GpuBackend::Sycl => GpuKind::Intel,
            GpuBackend::Vulkan if lower.contains("amd") || lower.contains("radeon") => {
                GpuKind::Amd
            }
            GpuBackend::Vulkan if lower.contains("nvidia") => GpuKind::Nvidia,
            GpuBackend::Vulkan | GpuBackend::CpuArm | GpuBackend::CpuX86 => GpuKind::Unknown,
        }
    }
}

impl fmt::Display for GpuKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Information about a single detected GPU.
#[derive(Debug, Clone, Serialize)]
pub struct GpuInfo {
    pub name: String,
    pub vram_gb: Option<f64>,
    pub backend: GpuBackend,
    pub count: u32, // same-model cards, VRAM is per card
    pub unified_memory: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemSpecs {
    pub total_ram_gb: f64,
    pub available_ram_gb: f64,
    pub total_cpu_cores: usize,
    pub cpu_name: String,
    pub has_gpu: bool,
    pub gpu_vram_gb: Option<f64>,
    pub gpu_name: Option<String>,
    pub unified_memory: bool,
    pub backend: GpuBackend,
    /// All detected GPUs, best VRAM first.
    pub gpus: Vec<GpuInfo>,
}

impl SystemSpecs {
    pub fn detect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let total_ram_bytes = sys.total_memory();
        let available_ram_bytes = sys.available_memory();
        let total_ram_gb = total_ram_bytes as f64 / BYTES_PER_GB;
        let available_ram_gb = if available_ram_bytes == 0 && total_ram_bytes > 0 {
            // Some macOS releases report 0 available memory.
            let used = sys.used_memory();
            if used > 0 && used < total_ram_bytes {
                (total_ram_bytes - used) as f64 / BYTES_PER_GB
            } else {
                total_ram_gb * 0.8
            }
        } else {
            available_ram_bytes as f64 / BYTES_PER_GB
        };

        let total_cpu_cores = sys.cpus().len();
        let cpu_name = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .unwrap_or_else(|| "Unknown CPU".to_string());

        let gpus = Self::detect_all_gpus(total_ram_gb);
        debug!(
            total_ram_gb,
            cores = total_cpu_cores,
            gpus = gpus.len(),
            "hardware probe finished"
        );

        Self::assemble(total_ram_gb, available_ram_gb, total_cpu_cores, cpu_name, gpus)
    }

    /// Build specs from already-probed parts; the primary GPU is the first one.
    pub fn assemble(
        total_ram_gb: f64,
        available_ram_gb: f64,
        total_cpu_cores: usize,
        cpu_name: String,
        gpus: Vec<GpuInfo>,
    ) -> Self {
        let primary = gpus.first();
        let cpu_backend =
            if cfg!(target_arch = "aarch64") || cpu_name.to_lowercase().contains("apple") {
                GpuBackend::CpuArm
            } else {
                GpuBackend::CpuX86
            };

        SystemSpecs {
            total_ram_gb,
            available_ram_gb,
            total_cpu_cores,
            has_gpu: primary.is_some(),
            gpu_vram_gb: primary.and_then(|g| g.vram_gb),
            gpu_name: primary.map(|g| g.name.clone()),
            unified_memory: primary.map(|g| g.unified_memory).unwrap_or(false),
            backend: primary.map(|g| g.backend).unwrap_or(cpu_backend),
            cpu_name,
            gpus,
        }
    }

    /// Probe every vendor; does not stop at the first hit.
    fn detect_all_gpus(total_ram_gb: f64) -> Vec<GpuInfo> {
        let mut gpus = Self::detect_nvidia_gpus();

        if let Some(amd) = Self::detect_amd_gpu_rocm() {
            gpus.push(amd);
        } else if let Some(amd) = Self::detect_amd_gpu_sysfs() {
            gpus.push(amd);
        }

        if let Some(intel) = Self::detect_intel_arc()
            && !gpus.iter().any(|g| g.name.to_lowercase().contains("intel"))
        {
            gpus.push(intel);
        }

        if let Some(apple) = Self::detect_apple_gpu(total_ram_gb) {
            gpus.push(apple);
        }

        gpus.sort_by(|a, b| {
            let va = a.vram_gb.unwrap_or(0.0);
            let vb = b.vram_gb.unwrap_or(0.0);
            vb.partial_cmp(&va).unwrap_or(std::cmp::Ordering::Equal)
        });
        gpus
    }

    fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
        let output = std::process::Command::new(program).args(args).output().ok()?;
        if !output.status.success() {
            debug!(program, status = ?output.status, "probe command failed");
            return None;
        }
        String::from_utf8(output.stdout).ok()
    }

    fn detect_nvidia_gpus() -> Vec<GpuInfo> {
        match Self::command_stdout(
            "nvidia-smi",
            &["--query-gpu=memory.total,name", "--format=csv,noheader,nounits"],
        ) {
            Some(text) => Self::parse_nvidia_smi_list(&text),
            None => Vec::new(),
        }
    }

    /// Parse `nvidia-smi --query-gpu=memory.total,name --format=csv,noheader,nounits`.
    /// Same-model cards are grouped; VRAM stays per card.
    fn parse_nvidia_smi_list(text: &str) -> Vec<GpuInfo> {
        let mut grouped: BTreeMap<String, (u32, f64)> = BTreeMap::new();

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (vram_part, name_part) = line.split_once(',').unwrap_or((line, ""));
            let name = match name_part.trim() {
                "" => "NVIDIA GPU".to_string(),
                n => n.to_string(),
            };
            let parsed_mb = vram_part.trim().parse::<f64>().unwrap_or(0.0);
            let vram_mb = if parsed_mb > 0.0 {
                parsed_mb
            } else {
                estimate_vram_from_name(&name) * 1024.0
            };

            let entry = grouped.entry(name).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 = entry.1.max(vram_mb);
        }

        grouped
            .into_iter()
            .map(|(name, (count, per_card_mb))| GpuInfo {
                name,
                vram_gb: (per_card_mb > 0.0).then_some(per_card_mb / 1024.0),
                backend: GpuBackend::Cuda,
                count,
                unified_memory: false,
            })
            .collect()
    }

    fn detect_amd_gpu_rocm() -> Option<GpuInfo> {
        let vram_text = Self::command_stdout("rocm-smi", &["--showmeminfo", "vram"])?;
        let name = Self::command_stdout("rocm-smi", &["--showproductname"])
            .and_then(|text| Self::parse_rocm_product_name(&text))
            .unwrap_or_else(|| "AMD GPU".to_string());
        Some(Self::parse_rocm_vram(&vram_text, name))
    }

    /// Lines look like `GPU[0] : vram Total Memory (B): 8589934592`.
    fn parse_rocm_vram(text: &str, name: String) -> GpuInfo {
        let per_card: Vec<u64> = text
            .lines()
            .filter(|line| {
                let lower = line.to_lowercase();
                lower.contains("total") && !lower.contains("used")
            })
            .filter_map(|line| {
                line.split_whitespace()
                    .filter_map(|w| w.parse::<u64>().ok())
                    .next_back()
            })
            .filter(|&bytes| bytes > 0)
            .collect();

        let count = (per_card.len() as u32).max(1);
        let max_bytes = per_card.into_iter().max().unwrap_or(0);
        let vram_gb = if max_bytes > 0 {
            Some(max_bytes as f64 / BYTES_PER_GB)
        } else {
            let est = estimate_vram_from_name(&name);
            (est > 0.0).then_some(est)
        };

        GpuInfo {
            name,
            vram_gb,
            backend: GpuBackend::Rocm,
            count,
            unified_memory: false,
        }
    }

    fn parse_rocm_product_name(text: &str) -> Option<String> {
        text.lines().find_map(|line| {
            let lower = line.to_lowercase();
            if !(lower.contains("card series") || lower.contains("card model")) {
                return None;
            }
            let (_, value) = line.rsplit_once(':')?;
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
    }

    /// AMD cards without ROCm, found through the DRM subsystem (vendor 0x1002).
    fn detect_amd_gpu_sysfs() -> Option<GpuInfo> {
        if !cfg!(target_os = "linux") {
            return None;
        }
        let (vram_bytes, _) = Self::scan_drm_cards("0x1002")?;
        let name = "AMD GPU".to_string();
        let vram_gb = match vram_bytes {
            0 => None,
            bytes => Some(bytes as f64 / BYTES_PER_GB),
        };
        Some(GpuInfo {
            name,
            vram_gb,
            backend: GpuBackend::Vulkan,
            count: 1,
            unified_memory: false,
        })
    }

    /// Intel discrete cards expose their VRAM through DRM (vendor 0x8086).
    fn detect_intel_arc() -> Option<GpuInfo> {
        if !cfg!(target_os = "linux") {
            return None;
        }
        let (vram_bytes, _) = Self::scan_drm_cards("0x8086")?;
        if vram_bytes == 0 {
            // Integrated graphics share system RAM and do not change the picture.
            return None;
        }
        Some(GpuInfo {
            name: "Intel Arc".to_string(),
            vram_gb: Some(vram_bytes as f64 / BYTES_PER_GB),
            backend: GpuBackend::Sycl,
            count: 1,
            unified_memory: false,
        })
    }

    /// Returns the largest per-card VRAM (bytes) and card count for a PCI vendor.
    fn scan_drm_cards(vendor_id: &str) -> Option<(u64, u32)> {
        let entries = std::fs::read_dir("/sys/class/drm").ok()?;
        let mut max_vram = 0u64;
        let mut cards = 0u32;

        for entry in entries.flatten() {
            let card_path = entry.path();
            let Some(fname) = card_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            // cardN only, skip connectors like cardN-DP-1
            if !fname.starts_with("card") || fname.contains('-') {
                continue;
            }
            let device = card_path.join("device");
            let Ok(vendor) = std::fs::read_to_string(device.join("vendor")) else {
                continue;
            };
            if vendor.trim() != vendor_id {
                continue;
            }
            cards += 1;
            if let Ok(raw) = std::fs::read_to_string(device.join("mem_info_vram_total"))
                && let Ok(bytes) = raw.trim().parse::<u64>()
            {
                max_vram = max_vram.max(bytes);
            }
        }

        (cards > 0).then_some((max_vram, cards))
    }

    /// Apple Silicon shares one memory pool, so VRAM is total RAM.
    fn detect_apple_gpu(total_ram_gb: f64) -> Option<GpuInfo> {
        if !cfg!(target_os = "macos") {
            return None;
        }
        let text = Self::command_stdout("system_profiler", &["SPDisplaysDataType"])?;
        let chipset = text.lines().map(str::trim).find(|line| {
            let lower = line.to_lowercase();
            lower.contains("apple m") || lower.contains("apple gpu")
        })?;
        let name = chipset
            .split_once(':')
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or("Apple Silicon")
            .to_string();

        Some(GpuInfo {
            name,
            vram_gb: Some(total_ram_gb),
            backend: GpuBackend::Metal,
            count: 1,
            unified_memory: true,
        })
    }

    /// Override the primary GPU's VRAM (the `--memory` flag). Without a
    /// detected GPU a synthetic entry is created.
    pub fn with_gpu_memory_override(mut self, vram_gb: f64) -> Self {
        if self.gpus.is_empty() {
            let backend = if cfg!(target_arch = "aarch64")
                || self.cpu_name.to_lowercase().contains("apple")
            {
                GpuBackend::Metal
            } else {
                GpuBackend::Cuda
            };
            self.gpus.push(GpuInfo {
                name: "User-specified GPU".to_string(),
                vram_gb: Some(vram_gb),
                backend,
                count: 1,
                unified_memory: false,
            });
            self.gpu_name = Some("User-specified GPU".to_string());
            self.backend = backend;
        } else {
            self.gpus[0].vram_gb = Some(vram_gb);
        }
        self.has_gpu = true;
        self.gpu_vram_gb = Some(vram_gb);
        self
    }

    pub fn display(&self) {
        println!("\n=== System Specifications ===");
        println!("CPU: {} ({} cores)", self.cpu_name, self.total_cpu_cores);
        println!("Total RAM: {:.2} GB", self.total_ram_gb);
        println!("Available RAM: {:.2} GB", self.available_ram_gb);
        println!("Backend: {}", self.backend.label());

        if self.gpus.is_empty() {
            println!("GPU: Not detected");
        }
        for (i, gpu) in self.gpus.iter().enumerate() {
            let prefix = if self.gpus.len() > 1 {
                format!("GPU {}: ", i + 1)
            } else {
                "GPU: ".to_string()
            };
            match gpu.vram_gb {
                Some(vram) if gpu.unified_memory => println!(
                    "{prefix}{} (unified memory, {vram:.2} GB shared, {})",
                    gpu.name,
                    gpu.backend.label()
                ),
                Some(vram) if gpu.count > 1 => println!(
                    "{prefix}{} x{} ({vram:.2} GB VRAM each, {})",
                    gpu.name,
                    gpu.count,
                    gpu.backend.label()
                ),
                Some(vram) => println!(
                    "{prefix}{} ({vram:.2} GB VRAM, {})",
                    gpu.name,
                    gpu.backend.label()
                ),
                None => println!(
                    "{prefix}{} (VRAM unknown, {})",
                    gpu.name,
                    gpu.backend.label()
                ),
            }
        }
        println!();
    }
}

/// Integer hardware view fed to the recommendation engine.
///
/// Zero means "none or unknown" for every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HardwareProfile {
    pub ram_gb: u64,
    pub cpu_cores: u32,
    pub gpu_vram_gb: u64,
    #[serde(rename = "gpu_type")]
    pub gpu_kind: GpuKind,
}

impl HardwareProfile {
    pub fn new(ram_gb: u64, cpu_cores: u32, gpu_vram_gb: u64, gpu_kind: GpuKind) -> Self {
        Self {
            ram_gb,
            cpu_cores,
            gpu_vram_gb,
            gpu_kind,
        }
    }

    /// Collapse probed specs to whole gigabytes. Values are rounded, not
    /// truncated: kernels reserve memory, so a 16 GB host reports ~15.6.
    pub fn from_specs(specs: &SystemSpecs) -> Self {
        let primary = specs.gpus.first();
        let gpu_kind = primary.map(GpuKind::from_gpu).unwrap_or(GpuKind::None);
        let profile = Self {
            ram_gb: whole_gb(specs.total_ram_gb),
            cpu_cores: u32::try_from(specs.total_cpu_cores).unwrap_or(u32::MAX),
            gpu_vram_gb: whole_gb(specs.gpu_vram_gb.unwrap_or(0.0)),
            gpu_kind,
        };
        if profile.ram_gb == 0 {
            warn!("RAM size could not be determined; treating host as a basic system");
        }
        profile
    }

    pub fn has_gpu(&self) -> bool {
        self.gpu_vram_gb > 0 && self.gpu_kind != GpuKind::None
    }
}

fn whole_gb(gb: f64) -> u64 {
    if gb.is_finite() && gb > 0.0 {
        gb.round() as u64
    } else {
        0
    }
}

/// Parse a human-readable memory size ("32G", "32000M", "1.5T") into GB.
pub fn parse_memory_size(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let num_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    let (num_str, suffix) = s.split_at(num_end);
    let value: f64 = num_str.parse().ok()?;

    match suffix.trim().to_lowercase().as_str() {
        "g" | "gb" | "gib" | "" => Some(value),
        "m" | "mb" | "mib" => Some(value / 1024.0),
        "t" | "tb" | "tib" => Some(value * 1024.0),
        _ => None,
    }
}

/// Card families and their usual VRAM, most specific first.
const VRAM_BY_NAME: &[(&str, f64)] = &[
    ("5090", 32.0),
    ("5080", 16.0),
    ("5070 ti", 16.0),
    ("5070", 12.0),
    ("5060 ti", 16.0),
    ("5060", 8.0),
    ("4090", 24.0),
    ("4080", 16.0),
    ("4070", 12.0),
    ("4060 ti", 16.0),
    ("4060", 8.0),
    ("3090", 24.0),
    ("3080 ti", 12.0),
    ("3080", 10.0),
    ("3070", 8.0),
    ("3060 ti", 8.0),
    ("3060", 12.0),
    ("h100", 80.0),
    ("a100", 80.0),
    ("l40", 48.0),
    ("a10", 24.0),
    ("t4", 16.0),
    ("7900 xtx", 24.0),
    ("7900", 20.0),
    ("7800", 16.0),
    ("7700", 12.0),
    ("7600", 8.0),
    ("6900", 16.0),
    ("6800", 16.0),
    ("6700", 12.0),
    ("6600", 8.0),
    ("rtx", 8.0),
    ("gtx", 4.0),
    ("radeon", 8.0),
];

/// Fallback VRAM estimate when the vendor tool reports 0.
fn estimate_vram_from_name(name: &str) -> f64 {
    let lower = name.to_lowercase();
    VRAM_BY_NAME
        .iter()
        .find(|(needle, _)| contains_model_number(&lower, needle))
        .map(|&(_, gb)| gb)
        .unwrap_or(0.0)
}

/// `needle` occurs at the start of a word and is not followed by another
/// digit, so "a100" skips "a1000" while "4090" still finds "4090d".
fn contains_model_number(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(|c| c.is_ascii_digit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gpu(name: &str, vram: Option<f64>, backend: GpuBackend) -> GpuInfo {
        GpuInfo {
            name: name.to_string(),
            vram_gb: vram,
            backend,
            count: 1,
            unified_memory: backend == GpuBackend::Metal,
        }
    }

    #[test]
    fn test_parse_nvidia_smi_does_not_sum_multi_gpu_vram() {
        let text = "24564, NVIDIA GeForce RTX 4090\n24564, NVIDIA GeForce RTX 4090\n";
        let gpus = SystemSpecs::parse_nvidia_smi_list(text);

        assert_eq!(gpus.len(), 1);
        assert_eq!(gpus[0].count, 2);
        let vram = gpus[0].vram_gb.expect("VRAM should be parsed");
        assert!(vram > 23.0 && vram < 25.0, "unexpected VRAM value: {vram}");
    }

    #[test]
    fn test_parse_nvidia_smi_estimates_missing_vram() {
        let gpus = SystemSpecs::parse_nvidia_smi_list("[N/A], NVIDIA GeForce RTX 3060\n");
        assert_eq!(gpus.len(), 1);
        assert_eq!(gpus[0].vram_gb, Some(12.0));
    }

    #[test]
    fn test_parse_rocm_vram_and_name() {
        let vram = "GPU[0]\t\t: VRAM Total Memory (B): 17163091968\n\
                    GPU[0]\t\t: VRAM Total Used Memory (B): 123456\n";
        let names = "GPU[0]\t\t: Card Series: \t\tNavi 31 [Radeon RX 7900 XT]\n";
        let name = SystemSpecs::parse_rocm_product_name(names).unwrap();
        assert_eq!(name, "Navi 31 [Radeon RX 7900 XT]");

        let info = SystemSpecs::parse_rocm_vram(vram, name);
        assert_eq!(info.count, 1);
        assert_eq!(info.backend, GpuBackend::Rocm);
        let gb = info.vram_gb.unwrap();
        assert!(gb > 15.9 && gb < 16.1, "unexpected VRAM value: {gb}");
    }

    #[test]
    fn test_parse_memory_size() {
        assert_eq!(parse_memory_size("32G"), Some(32.0));
        assert_eq!(parse_memory_size("32gb"), Some(32.0));
        assert_eq!(parse_memory_size("2048M"), Some(2.0));
        assert_eq!(parse_memory_size("1.5T"), Some(1536.0));
        assert_eq!(parse_memory_size("16"), Some(16.0));
        assert_eq!(parse_memory_size(""), None);
        assert_eq!(parse_memory_size("lots"), None);
        assert_eq!(parse_memory_size("8X"), None);
    }

    #[test]
    fn test_profile_rounds_to_whole_gigabytes() {
        let specs = SystemSpecs::assemble(
            15.6,
            9.0,
            8,
            "AMD Ryzen 7".to_string(),
            vec![gpu("NVIDIA GeForce RTX 4060", Some(7.6), GpuBackend::Cuda)],
        );
        let profile = HardwareProfile::from_specs(&specs);
        assert_eq!(profile.ram_gb, 16);
        assert_eq!(profile.gpu_vram_gb, 8);
        assert_eq!(profile.cpu_cores, 8);
        assert_eq!(profile.gpu_kind, GpuKind::Nvidia);
        assert!(profile.has_gpu());
    }

    #[test]
    fn test_profile_without_gpu() {
        let specs = SystemSpecs::assemble(7.8, 3.0, 4, "Intel Core i5".to_string(), vec![]);
        let profile = HardwareProfile::from_specs(&specs);
        assert_eq!(profile.ram_gb, 8);
        assert_eq!(profile.gpu_vram_gb, 0);
        assert_eq!(profile.gpu_kind, GpuKind::None);
        assert!(!profile.has_gpu());
    }

    #[test]
    fn test_profile_apple_unified_memory_counts_as_vram() {
        let specs = SystemSpecs::assemble(
            32.0,
            20.0,
            10,
            "Apple M2 Pro".to_string(),
            vec![gpu("Apple M2 Pro", Some(32.0), GpuBackend::Metal)],
        );
        let profile = HardwareProfile::from_specs(&specs);
        assert_eq!(profile.gpu_kind, GpuKind::AppleSilicon);
        assert_eq!(profile.gpu_vram_gb, 32);
    }

    #[test]
    fn test_profile_unknown_values_collapse_to_zero() {
        let specs = SystemSpecs::assemble(f64::NAN, 0.0, 0, "Unknown CPU".to_string(), vec![]);
        let profile = HardwareProfile::from_specs(&specs);
        assert_eq!(profile, HardwareProfile::default());
    }

    #[test]
    fn test_memory_override_creates_synthetic_gpu() {
        let specs = SystemSpecs::assemble(16.0, 8.0, 8, "Intel Core i7".to_string(), vec![])
            .with_gpu_memory_override(12.0);
        assert!(specs.has_gpu);
        assert_eq!(specs.gpus.len(), 1);
        assert_eq!(specs.gpu_vram_gb, Some(12.0));
        assert_eq!(HardwareProfile::from_specs(&specs).gpu_vram_gb, 12);
    }

    #[test]
    fn test_gpu_kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&GpuKind::AppleSilicon).unwrap();
        assert_eq!(json, "\"apple_silicon\"");
        let kind: GpuKind = serde_json::from_str("\"quantum\"").unwrap();
        assert_eq!(kind, GpuKind::Unknown);
    }

    #[test]
    fn test_estimate_vram_prefers_specific_names() {
        assert_eq!(estimate_vram_from_name("GeForce RTX 3080 Ti"), 12.0);
        assert_eq!(estimate_vram_from_name("GeForce RTX 3080"), 10.0);
        assert_eq!(estimate_vram_from_name("Radeon RX 7900 XTX"), 24.0);
        assert_eq!(estimate_vram_from_name("Matrox G200"), 0.0);
    }

    #[test]
    fn test_estimate_vram_does_not_match_longer_model_numbers() {
        assert_eq!(estimate_vram_from_name("NVIDIA RTX A1000"), 8.0);
        assert_eq!(estimate_vram_from_name("NVIDIA A100-SXM4-80GB"), 80.0);
        assert_eq!(estimate_vram_from_name("NVIDIA A10"), 24.0);
        assert_eq!(estimate_vram_from_name("Tesla T4"), 16.0);
        assert_eq!(estimate_vram_from_name("NVIDIA T400"), 0.0);
        assert_eq!(estimate_vram_from_name("GeForce RTX 4090D"), 24.0);
    }
}
