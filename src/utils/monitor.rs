#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct SystemStats {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub memory_usage_percent: f32,
    pub peak_memory_mb: u64,
    pub elapsed_time: Duration,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    peak_memory_mb: u64,
    last_mark: Instant,
    stages: Vec<(String, Duration)>,
}

/// 在各階段之間取樣目前行程的 CPU 與記憶體
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    state: Option<Mutex<MonitorState>>,
    pid: Option<Pid>,
    start_time: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let start_time = Instant::now();
        if !enabled {
            return Self {
                state: None,
                pid: None,
                start_time,
            };
        }

        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("Process monitoring unavailable: {}", e);
                None
            }
        };

        let mut system = System::new();
        system.refresh_memory();
        if let Some(pid) = pid {
            system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        }

        Self {
            state: pid.map(|_| {
                Mutex::new(MonitorState {
                    system,
                    peak_memory_mb: 0,
                    last_mark: start_time,
                    stages: Vec::new(),
                })
            }),
            pid,
            start_time,
        }
    }

    fn sample(&self, state: &mut MonitorState) -> Option<SystemStats> {
        let pid = self.pid?;
        state.system.refresh_memory();
        state
            .system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        let process = state.system.process(pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        let total_memory_mb = state.system.total_memory() / 1024 / 1024;
        state.peak_memory_mb = state.peak_memory_mb.max(memory_mb);

        Some(SystemStats {
            cpu_usage: process.cpu_usage(),
            memory_usage_mb: memory_mb,
            memory_usage_percent: if total_memory_mb > 0 {
                memory_mb as f32 / total_memory_mb as f32 * 100.0
            } else {
                0.0
            },
            peak_memory_mb: state.peak_memory_mb,
            elapsed_time: self.start_time.elapsed(),
        })
    }

    pub fn get_stats(&self) -> Option<SystemStats> {
        let mut state = self.state.as_ref()?.lock().ok()?;
        self.sample(&mut state)
    }

    /// 記錄取樣結果與距離上一個階段的耗時
    pub fn log_stats(&self, stage: &str) {
        let Some(mut state) = self.state.as_ref().and_then(|s| s.lock().ok()) else {
            return;
        };

        let now = Instant::now();
        let stage_time = now.duration_since(state.last_mark);
        state.last_mark = now;
        state.stages.push((stage.to_string(), stage_time));

        if let Some(stats) = self.sample(&mut state) {
            tracing::info!(
                "📊 {} ({:?}) - CPU: {:.1}%, Memory: {}MB ({:.1}%), Peak: {}MB",
                stage,
                stage_time,
                stats.cpu_usage,
                stats.memory_usage_mb,
                stats.memory_usage_percent,
                stats.peak_memory_mb
            );
        }
    }

    pub fn log_final_stats(&self) {
        let Some(mut state) = self.state.as_ref().and_then(|s| s.lock().ok()) else {
            return;
        };

        if let Some(stats) = self.sample(&mut state) {
            let breakdown = state
                .stages
                .iter()
                .map(|(stage, time)| format!("{}={:?}", stage, time))
                .collect::<Vec<_>>()
                .join(", ");
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB, Stages: [{}]",
                stats.elapsed_time,
                stats.peak_memory_mb,
                breakdown
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }

    #[cfg(test)]
    fn stage_times(&self) -> Vec<(String, Duration)> {
        self.state
            .as_ref()
            .and_then(|s| s.lock().ok())
            .map(|state| state.stages.clone())
            .unwrap_or_default()
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 建置時的空實作
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _stage: &str) {}

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}
