use crate::{
    backend::{Extent2D, RayTracingBackend},
    config::CompileFaultPolicy,
    error::Result,
    launch::{DispatchStatus, RenderContext},
    passes::{OptionsUi, Pass, RenderPass},
    registry::ResourceRegistry,
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    pub dispatched: usize,
    pub skipped: usize,
    /// The frame index was reset because earlier output went stale.
    pub restarted: bool,
}

struct PassSlot<B: RayTracingBackend> {
    pass: Pass<B>,
    enabled: bool,
}

/// Runs passes in the order they were added, all sharing one registry.
pub struct RenderPipeline<B: RayTracingBackend> {
    registry: Arc<ResourceRegistry<B>>,
    compile_fault_policy: CompileFaultPolicy,
    passes: Vec<PassSlot<B>>,
    frame: u64,
    stale: bool,
}

impl<B: RayTracingBackend> RenderPipeline<B> {
    pub fn new(registry: Arc<ResourceRegistry<B>>, compile_fault_policy: CompileFaultPolicy) -> Self {
        Self {
            registry,
            compile_fault_policy,
            passes: Vec::new(),
            frame: 0,
            stale: false,
        }
    }

    pub fn registry(&self) -> &Arc<ResourceRegistry<B>> {
        &self.registry
    }

    pub fn add_pass(&mut self, pass: impl Into<Pass<B>>) {
        self.passes.push(PassSlot {
            pass: pass.into(),
            enabled: true,
        });
    }

    /// Initializes every pass. Configuration faults abort; a pass that fails
    /// to compile is reported once and then handled per the compile fault
    /// policy.
    pub fn initialize(&mut self) -> Result<()> {
        for slot in &mut self.passes {
            match slot.pass.initialize() {
                Ok(()) => log::info!("Initialized pass {}", slot.pass.name()),
                Err(err) if err.is_compile_fault() => {
                    log::error!("Pass {} failed to compile: {}", slot.pass.name(), err);
                    match self.compile_fault_policy {
                        CompileFaultPolicy::Abort => return Err(err),
                        CompileFaultPolicy::DisablePass => slot.enabled = false,
                    }
                }
                Err(err) => return Err(err),
            }
        }

        for (key, writers) in self.registry.shared_writers() {
            log::warn!("Review shared writers of {}: {}", key, writers.join(", "));
        }
        Ok(())
    }

    pub fn set_scene(&mut self, scene: Arc<B::Scene>) {
        for slot in &mut self.passes {
            if slot.pass.requires_scene() {
                slot.pass.init_scene(scene.clone());
            }
        }
        self.stale = true;
    }

    pub fn resize(&mut self, extent: Extent2D) {
        if self.registry.screen_extent() != extent {
            self.registry.resize(extent);
            self.stale = true;
        }
    }

    /// Returns true if any pass changed an option.
    pub fn render_options(&mut self, ui: &mut dyn OptionsUi) -> bool {
        let mut dirty = false;
        for slot in &mut self.passes {
            dirty |= slot.pass.render_options(ui);
        }
        if dirty {
            log::debug!("Options changed, restarting from a clean state");
            self.stale = true;
        }
        dirty
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn execute_frame(&mut self) -> Result<FrameReport> {
        let restarted = std::mem::take(&mut self.stale);
        if restarted {
            self.frame = 0;
        }

        let mut ctx = RenderContext::new(self.frame);
        let mut report = FrameReport {
            frame: self.frame,
            dispatched: 0,
            skipped: 0,
            restarted,
        };
        for slot in &mut self.passes {
            // A disabled pass never dispatches, but still clears the outputs
            // it owns so they cannot carry an old frame.
            match slot.pass.execute(&mut ctx)? {
                DispatchStatus::Dispatched => report.dispatched += 1,
                DispatchStatus::Skipped => report.skipped += 1,
            }
        }

        self.frame += 1;
        Ok(report)
    }

    pub fn passes(&self) -> impl Iterator<Item = &Pass<B>> {
        self.passes.iter().map(|slot| &slot.pass)
    }

    pub fn passes_mut(&mut self) -> impl Iterator<Item = &mut Pass<B>> {
        self.passes.iter_mut().map(|slot| &mut slot.pass)
    }

    pub fn is_enabled(&self, index: usize) -> bool {
        self.passes.get(index).is_some_and(|slot| slot.enabled)
    }

    pub fn shared_writers(&self) -> Vec<(String, Vec<String>)> {
        self.registry.shared_writers()
    }
}
