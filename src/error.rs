//! Error types for vertex building, pipeline compilation and frame submission.

/// GPU operation that failed, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuPhase {
    DeviceSetup,
    BufferUpload,
    Draw,
    Readback,
}

impl std::fmt::Display for GpuPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuPhase::DeviceSetup => write!(f, "Device Setup"),
            GpuPhase::BufferUpload => write!(f, "Buffer Upload"),
            GpuPhase::Draw => write!(f, "Draw"),
            GpuPhase::Readback => write!(f, "Readback"),
        }
    }
}

/// Errors surfaced by a [`Plotter`](crate::plotter::Plotter) to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotError {
    /// Fewer than two samples were supplied; the strip width can't be inferred.
    InsufficientData { count: usize },
    /// The band program failed to compile or link. Carries the compiler log.
    ShaderCompilation { log: String },
    /// A GPU call failed for the current frame.
    Gpu { phase: GpuPhase, message: String },
    /// Rejected configuration value.
    Config(String),
}

impl PlotError {
    pub fn gpu(phase: GpuPhase, message: impl Into<String>) -> Self {
        PlotError::Gpu {
            phase,
            message: message.into(),
        }
    }

    /// Whether the plotter should stop rendering rather than skip a frame.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PlotError::ShaderCompilation { .. })
    }
}

impl std::fmt::Display for PlotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlotError::InsufficientData { count } => {
                write!(f, "at least 2 samples are required to build the band, got {}", count)
            }
            PlotError::ShaderCompilation { log } => {
                write!(f, "band shader compilation failed: {}", log)
            }
            PlotError::Gpu { phase, message } => write!(f, "[{}] {}", phase, message),
            PlotError::Config(message) => write!(f, "invalid plotter config: {}", message),
        }
    }
}

impl std::error::Error for PlotError {}

pub type Result<T> = std::result::Result<T, PlotError>;
