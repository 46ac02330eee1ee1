//! Point-in-time resource usage for status displays.

use serde::Serialize;
use sysinfo::System;

use crate::hardware::SystemSpecs;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSnapshot {
    pub cpu_percent: f64,
    pub memory_used_gb: f64,
    pub memory_total_gb: f64,
    pub gpu_name: Option<String>,
}

impl ResourceSnapshot {
    /// Sample CPU and memory usage. Blocks for sysinfo's minimum CPU update
    /// interval (a fraction of a second) to get a meaningful CPU figure.
    pub fn sample(specs: &SystemSpecs) -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        Self {
            cpu_percent: f64::from(sys.global_cpu_usage()),
            memory_used_gb: sys.used_memory() as f64 / BYTES_PER_GB,
            memory_total_gb: sys.total_memory() as f64 / BYTES_PER_GB,
            gpu_name: specs.gpu_name.clone(),
        }
    }

    pub fn cpu_text(&self) -> String {
        format!("{:.1}%", self.cpu_percent)
    }

    pub fn memory_text(&self) -> String {
        format!("{:.1}/{:.1} GB", self.memory_used_gb, self.memory_total_gb)
    }

    pub fn gpu_text(&self) -> &str {
        self.gpu_name.as_deref().unwrap_or("Not detected")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_formatting() {
        let snapshot = ResourceSnapshot {
            cpu_percent: 12.345,
            memory_used_gb: 7.24,
            memory_total_gb: 16.0,
            gpu_name: None,
        };
        assert_eq!(snapshot.cpu_text(), "12.3%");
        assert_eq!(snapshot.memory_text(), "7.2/16.0 GB");
        assert_eq!(snapshot.gpu_text(), "Not detected");
    }

    #[test]
    fn test_sample_reports_memory() {
        let specs = SystemSpecs::assemble(16.0, 8.0, 4, "Test CPU".to_string(), vec![]);
        let snapshot = ResourceSnapshot::sample(&specs);
        assert!(snapshot.memory_total_gb > 0.0);
        assert!(snapshot.memory_used_gb <= snapshot.memory_total_gb);
        assert!(snapshot.cpu_percent >= 0.0);
    }
}
