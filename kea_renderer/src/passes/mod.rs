use crate::{
    backend::RayTracingBackend,
    error::{CompileError, Result},
    launch::{DispatchStatus, RenderContext},
};
use std::sync::Arc;

mod diffuse_gi;
mod gbuffer;

pub use diffuse_gi::DiffuseGiPass;
pub use gbuffer::GBufferPass;

pub const WORLD_POSITION: &str = "WorldPosition";
pub const WORLD_NORMAL: &str = "WorldNormal";
pub const DIFFUSE_COLOR: &str = "DiffuseColor";
pub const SPECULAR_COLOR: &str = "SpecColor";

/// Anisotropy of the samplers passes read the environment map through.
pub const MAX_ANISOTROPY: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Unconfigured,
    Initialized,
    SceneBound,
    Ready,
}

/// Controls a host draws for pass options.
pub trait OptionsUi {
    /// Draws a checkbox inside `group`, returning whether the user changed `value`.
    fn checkbox(&mut self, group: &str, label: &str, value: &mut bool) -> bool;
}

pub trait RenderPass<B: RayTracingBackend> {
    fn name(&self) -> &str;

    fn options_group(&self) -> &str;

    fn state(&self) -> PassState;

    /// Declares resources, then builds and compiles the pass's ray program.
    fn initialize(&mut self) -> Result<()>;

    fn init_scene(&mut self, scene: Arc<B::Scene>);

    /// Dispatches the pass, or returns [`DispatchStatus::Skipped`] while it
    /// is not ready.
    fn execute(&mut self, ctx: &mut RenderContext) -> Result<DispatchStatus>;

    /// Returns true if an option changed, making earlier output stale.
    fn render_options(&mut self, ui: &mut dyn OptionsUi) -> bool;

    fn compile_error(&self) -> Option<&CompileError>;

    fn requires_scene(&self) -> bool {
        true
    }

    fn uses_ray_tracing(&self) -> bool {
        true
    }

    fn uses_environment_map(&self) -> bool {
        false
    }
}

pub enum Pass<B: RayTracingBackend> {
    GBuffer(GBufferPass<B>),
    DiffuseGi(DiffuseGiPass<B>),
}

macro_rules! delegate {
    ($self:ident, $pass:ident => $call:expr) => {
        match $self {
            Pass::GBuffer($pass) => $call,
            Pass::DiffuseGi($pass) => $call,
        }
    };
}

impl<B: RayTracingBackend> RenderPass<B> for Pass<B> {
    fn name(&self) -> &str {
        delegate!(self, pass => pass.name())
    }

    fn options_group(&self) -> &str {
        delegate!(self, pass => pass.options_group())
    }

    fn state(&self) -> PassState {
        delegate!(self, pass => pass.state())
    }

    fn initialize(&mut self) -> Result<()> {
        delegate!(self, pass => pass.initialize())
    }

    fn init_scene(&mut self, scene: Arc<B::Scene>) {
        delegate!(self, pass => pass.init_scene(scene))
    }

    fn execute(&mut self, ctx: &mut RenderContext) -> Result<DispatchStatus> {
        delegate!(self, pass => pass.execute(ctx))
    }

    fn render_options(&mut self, ui: &mut dyn OptionsUi) -> bool {
        delegate!(self, pass => pass.render_options(ui))
    }

    fn compile_error(&self) -> Option<&CompileError> {
        delegate!(self, pass => pass.compile_error())
    }

    fn requires_scene(&self) -> bool {
        delegate!(self, pass => pass.requires_scene())
    }

    fn uses_ray_tracing(&self) -> bool {
        delegate!(self, pass => pass.uses_ray_tracing())
    }

    fn uses_environment_map(&self) -> bool {
        delegate!(self, pass => pass.uses_environment_map())
    }
}

impl<B: RayTracingBackend> From<GBufferPass<B>> for Pass<B> {
    fn from(pass: GBufferPass<B>) -> Self {
        Pass::GBuffer(pass)
    }
}

impl<B: RayTracingBackend> From<DiffuseGiPass<B>> for Pass<B> {
    fn from(pass: DiffuseGiPass<B>) -> Self {
        Pass::DiffuseGi(pass)
    }
}

/// State a pass derives from what has happened to it so far.
pub(crate) fn derive_state(initialized: bool, scene_bound: bool, ready: bool) -> PassState {
    match (initialized, scene_bound) {
        (false, _) => PassState::Unconfigured,
        (true, false) => PassState::Initialized,
        (true, true) if ready => PassState::Ready,
        (true, true) => PassState::SceneBound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_needs_initialization_and_a_scene() {
        assert_eq!(derive_state(false, true, false), PassState::Unconfigured);
        assert_eq!(derive_state(true, false, false), PassState::Initialized);
        assert_eq!(derive_state(true, true, false), PassState::SceneBound);
        assert_eq!(derive_state(true, true, true), PassState::Ready);
    }
}
