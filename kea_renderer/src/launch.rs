use crate::{
    backend::{Extent2D, ProgramReflection, RayTracingBackend, RayTracingScene, Variables},
    error::{CompileError, RenderError, Result},
    program::RayProgramDesc,
    variables::{VariableScope, VariableTable},
};
use std::sync::Arc;

pub type Scope<B> =
    VariableScope<<B as RayTracingBackend>::Texture, <B as RayTracingBackend>::Sampler>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Skipped,
    Dispatched,
}

/// Per-frame bookkeeping shared by every pass executed in that frame.
#[derive(Debug, Default)]
pub struct RenderContext {
    frame: u64,
    dispatches: u32,
}

impl RenderContext {
    pub fn new(frame: u64) -> Self {
        Self {
            frame,
            dispatches: 0,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn dispatches(&self) -> u32 {
        self.dispatches
    }
}

/// Owns a ray program from description through compilation to dispatch,
/// together with the scene it traces against and its variable bindings.
pub struct RayLaunch<B: RayTracingBackend> {
    backend: B,
    desc: RayProgramDesc,
    program: Option<B::Program>,
    compile_attempted: bool,
    compile_error: Option<CompileError>,
    scene: Option<Arc<B::Scene>>,
    variables: Variables<B>,
}

impl<B: RayTracingBackend> RayLaunch<B> {
    pub fn new(backend: B, desc: RayProgramDesc) -> Self {
        let variables = VariableTable::new(ProgramReflection::empty(&desc));
        Self {
            backend,
            desc,
            program: None,
            compile_attempted: false,
            compile_error: None,
            scene: None,
            variables,
        }
    }

    pub fn desc(&self) -> &RayProgramDesc {
        &self.desc
    }

    /// Links the program. May be attempted once; a failed attempt leaves the
    /// launch permanently unable to render.
    pub fn compile(&mut self) -> Result<()> {
        if self.compile_attempted {
            return Err(RenderError::ProgramAlreadyCompiled);
        }
        self.compile_attempted = true;

        match self.backend.compile_program(&self.desc) {
            Ok((program, reflection)) => {
                log::debug!(
                    "Compiled ray program {}::{} with {} miss shaders and {} hit groups",
                    self.desc.ray_gen.source,
                    self.desc.ray_gen.entry,
                    self.desc.miss.len(),
                    self.desc.hit_groups.len()
                );
                self.variables = VariableTable::new(reflection);
                if let Some(scene) = &self.scene {
                    self.variables.bind_scene(scene.as_ref());
                }
                self.program = Some(program);
                Ok(())
            }
            Err(RenderError::Compile(err)) => {
                self.compile_error = Some(err.clone());
                Err(RenderError::Compile(err))
            }
            Err(err) => Err(err),
        }
    }

    pub fn compile_error(&self) -> Option<&CompileError> {
        self.compile_error.as_ref()
    }

    pub fn is_compiled(&self) -> bool {
        self.program.is_some()
    }

    pub fn set_scene(&mut self, scene: Arc<B::Scene>) {
        log::debug!("Binding scene {} to {}", scene.name(), self.desc.ray_gen.entry);
        self.variables.bind_scene(scene.as_ref());
        self.scene = Some(scene);
    }

    pub fn scene(&self) -> Option<&Arc<B::Scene>> {
        self.scene.as_ref()
    }

    pub fn ready_to_render(&self) -> bool {
        self.program.is_some() && self.scene.is_some()
    }

    pub fn ray_gen_vars(&mut self) -> &mut Scope<B> {
        self.variables.ray_gen_scope()
    }

    pub fn miss_vars(&mut self, slot: usize) -> Result<&mut Scope<B>> {
        self.variables.miss_scope(slot)
    }

    pub fn hit_vars(&mut self, slot: usize) -> Result<&mut [Scope<B>]> {
        self.variables.hit_group_scopes(slot)
    }

    pub fn variables(&self) -> &Variables<B> {
        &self.variables
    }

    /// Traces `extent.width * extent.height` rays with the current bindings,
    /// or does nothing if the launch is not ready yet.
    pub fn execute(&mut self, ctx: &mut RenderContext, extent: Extent2D) -> Result<DispatchStatus> {
        let (program, scene) = match (&self.program, &self.scene) {
            (Some(program), Some(scene)) => (program, scene),
            _ => {
                log::trace!("Skipping {}: not ready to render", self.desc.ray_gen.entry);
                return Ok(DispatchStatus::Skipped);
            }
        };
        if extent.is_empty() {
            log::trace!("Skipping {}: empty extent", self.desc.ray_gen.entry);
            return Ok(DispatchStatus::Skipped);
        }

        self.backend.dispatch(program, scene, &self.variables, extent)?;
        ctx.dispatches += 1;
        Ok(DispatchStatus::Dispatched)
    }
}
