use thiserror::Error;

/// Failure to turn a program description into something the GPU can run,
/// typically because an entry point does not resolve in its declared source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to compile ray program from `{source_id}`: {message}")]
pub struct CompileError {
    pub source_id: String,
    pub message: String,
}

impl CompileError {
    pub fn new(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("resource `{0}` was fetched but never declared")]
    UnregisteredResource(String),

    #[error("miss slot {slot} is out of range ({count} miss shaders declared)")]
    MissSlotOutOfRange { slot: usize, count: usize },

    #[error("hit group slot {slot} is out of range ({count} hit groups declared)")]
    HitGroupSlotOutOfRange { slot: usize, count: usize },

    #[error("ray program from `{0}` has an empty ray generation entry")]
    EmptyRayGenEntry(String),

    #[error("hit group {slot} from `{source_id}` has neither a closest hit nor an any hit entry")]
    EmptyHitGroup { source_id: String, slot: usize },

    #[error("ray program was already compiled")]
    ProgramAlreadyCompiled,

    #[error("resource `{0}` accumulates across frames and cannot be fetched cleared")]
    ClearOfAccumulationTexture(String),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("backend failure: {0}")]
    Backend(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl RenderError {
    /// Setup mistakes that must abort pipeline construction.
    pub fn is_configuration_fault(&self) -> bool {
        matches!(
            self,
            RenderError::UnregisteredResource(_)
                | RenderError::MissSlotOutOfRange { .. }
                | RenderError::HitGroupSlotOutOfRange { .. }
                | RenderError::EmptyRayGenEntry(_)
                | RenderError::EmptyHitGroup { .. }
                | RenderError::ProgramAlreadyCompiled
                | RenderError::ClearOfAccumulationTexture(_)
                | RenderError::Config(_)
        )
    }

    pub fn is_compile_fault(&self) -> bool {
        matches!(self, RenderError::Compile(_))
    }
}

impl From<kea_gpu::GpuError> for RenderError {
    fn from(err: kea_gpu::GpuError) -> Self {
        RenderError::Backend(err.to_string())
    }
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        RenderError::Backend(format!("image: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_faults() {
        assert!(RenderError::UnregisteredResource("Foo".into()).is_configuration_fault());
        assert!(RenderError::MissSlotOutOfRange { slot: 3, count: 1 }.is_configuration_fault());
        assert!(RenderError::ProgramAlreadyCompiled.is_configuration_fault());

        let compile = RenderError::from(CompileError::new("rtGBuffer", "no entry point `Foo`"));
        assert!(compile.is_compile_fault());
        assert!(!compile.is_configuration_fault());

        let backend = RenderError::Backend("device lost".into());
        assert!(!backend.is_configuration_fault());
        assert!(!backend.is_compile_fault());
    }

    #[test]
    fn messages_name_the_offending_key() {
        let err = RenderError::UnregisteredResource("UnregisteredKey".into());
        assert_eq!(
            err.to_string(),
            "resource `UnregisteredKey` was fetched but never declared"
        );
    }
}
