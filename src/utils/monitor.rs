#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

/// 單一 ETL 階段的耗時與本行程記憶體
#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase_time: Duration,
    pub elapsed_time: Duration,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
#[derive(Debug)]
struct Checkpoints {
    last_phase: Instant,
    peak_memory_mb: u64,
}

/// 於每個 ETL 階段結束時記錄階段耗時與記憶體用量
#[cfg(feature = "cli")]
pub struct ProcessMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    start_time: Instant,
    checkpoints: Mutex<Checkpoints>,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl ProcessMonitor {
    pub fn new(enabled: bool) -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("Process monitoring unavailable: {}", e);
                None
            }
        };
        let now = Instant::now();

        Self {
            system: Mutex::new(System::new()),
            pid,
            start_time: now,
            checkpoints: Mutex::new(Checkpoints {
                last_phase: now,
                peak_memory_mb: 0,
            }),
            enabled: enabled && pid.is_some(),
        }
    }

    fn resident_memory_mb(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system.process(pid).map(|process| process.memory() / 1024 / 1024)
    }

    /// 結束一個階段：回傳自上一階段以來的耗時，並更新峰值記憶體
    pub fn checkpoint(&self) -> Option<PhaseStats> {
        if !self.enabled {
            return None;
        }

        let memory_mb = self.resident_memory_mb().unwrap_or(0);
        let mut checkpoints = self.checkpoints.lock().ok()?;
        let now = Instant::now();
        let phase_time = now.duration_since(checkpoints.last_phase);
        checkpoints.last_phase = now;
        checkpoints.peak_memory_mb = checkpoints.peak_memory_mb.max(memory_mb);

        Some(PhaseStats {
            phase_time,
            elapsed_time: self.start_time.elapsed(),
            memory_mb,
            peak_memory_mb: checkpoints.peak_memory_mb,
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(stats) = self.checkpoint() {
            tracing::info!(
                "📊 {} - Phase: {:?}, Memory: {}MB, Peak: {}MB, Time: {:?}",
                phase,
                stats.phase_time,
                stats.memory_mb,
                stats.peak_memory_mb,
                stats.elapsed_time
            );
        }
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        if let Ok(checkpoints) = self.checkpoints.lock() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                self.start_time.elapsed(),
                checkpoints.peak_memory_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(feature = "cli")]
impl Default for ProcessMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 建置不帶 sysinfo
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct ProcessMonitor;

#[cfg(not(feature = "cli"))]
impl ProcessMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_records_nothing() {
        let monitor = ProcessMonitor::default();
        assert!(!monitor.is_enabled());
        assert!(monitor.checkpoint().is_none());
    }

    #[test]
    fn test_checkpoints_split_phases() {
        let monitor = ProcessMonitor::new(true);
        if !monitor.is_enabled() {
            return;
        }

        std::thread::sleep(Duration::from_millis(20));
        let first = monitor.checkpoint().unwrap();
        let second = monitor.checkpoint().unwrap();

        assert!(first.phase_time >= Duration::from_millis(20));
        assert!(second.elapsed_time >= first.elapsed_time);
        assert!(second.peak_memory_mb >= first.memory_mb);
    }
}
