use super::{scene::VulkanScene, texture::VulkanTexture, VulkanSampler};
use crate::{
    backend::{Extent2D, ParameterSet, ProgramReflection},
    error::{CompileError, Result},
    program::{RayProgramDesc, ShaderEntry},
    variables::{VariableScope, VariableTable},
};
use ash::vk;
use kea_gpu::{
    commands::CommandBuffer,
    descriptors::{DescriptorPool, DescriptorSet, DescriptorSetLayout, DescriptorSetLayoutBinding},
    device::Device,
    pipelines::PipelineLayout,
    ray_tracing::{RayTracingPipeline, RayTracingShaderBindingTables, ShaderRecords},
    shaders::{
        EntryPointManifest, ParameterKind, ParameterManifest, ShaderEntryPoint, ShaderGroup,
        ShaderGroups, ShaderLibrary, ShaderStage,
    },
};
use std::{
    collections::{btree_map::Entry, BTreeMap, BTreeSet},
    sync::Arc,
};

type Scope = VariableScope<VulkanTexture, VulkanSampler>;
type Table = VariableTable<VulkanTexture, VulkanSampler>;

/// Parameters of one binding scope, merged from the entry points that share it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeLayout {
    parameters: Vec<(ParameterManifest, vk::ShaderStageFlags)>,
    constant_size: u32,
}

impl ScopeLayout {
    pub fn new(entries: &[&EntryPointManifest]) -> Self {
        let mut parameters: Vec<(ParameterManifest, vk::ShaderStageFlags)> = Vec::new();
        for entry in entries {
            let stage = vk::ShaderStageFlags::from(entry.stage);
            for parameter in &entry.parameters {
                match parameters.iter_mut().find(|(p, _)| p.name == parameter.name) {
                    Some((_, stages)) => *stages |= stage,
                    None => parameters.push((parameter.clone(), stage)),
                }
            }
        }

        let constant_size = entries
            .iter()
            .map(|entry| entry.constant_block_size())
            .max()
            .unwrap_or(0);

        Self {
            parameters,
            constant_size,
        }
    }

    pub fn names(&self) -> ParameterSet {
        ParameterSet::new(self.parameters.iter().map(|(p, _)| p.name.clone()))
    }

    pub fn constant_size(&self) -> u32 {
        self.constant_size
    }

    fn resources(&self) -> impl Iterator<Item = (&ParameterManifest, u32, vk::ShaderStageFlags)> {
        self.parameters
            .iter()
            .filter_map(|(p, stages)| p.binding.map(|binding| (p, binding, *stages)))
    }

    /// Lays out the plain data values of `scope` as the shaders read them.
    /// Unbound parameters stay zeroed.
    pub fn pack<T, S>(&self, scope: Option<&VariableScope<T, S>>) -> Vec<u8> {
        let mut block = vec![0u8; self.constant_size as usize];
        let Some(scope) = scope else {
            return block;
        };

        for (parameter, _) in &self.parameters {
            let Some(offset) = parameter.offset else {
                continue;
            };
            let Some(bytes) = scope.get(&parameter.name).and_then(|v| v.constant_bytes()) else {
                continue;
            };
            let start = offset as usize;
            let len = bytes.len().min(parameter.kind.constant_size() as usize);
            if let Some(slot) = block.get_mut(start..start + len) {
                slot.copy_from_slice(&bytes[..len]);
            }
        }
        block
    }
}

/// Merges resource parameters of every scope into descriptor set 0.
pub fn descriptor_bindings(
    source: &str,
    scopes: &[&ScopeLayout],
) -> std::result::Result<Vec<DescriptorSetLayoutBinding>, CompileError> {
    let mut bindings: BTreeMap<u32, (&str, DescriptorSetLayoutBinding)> = BTreeMap::new();
    for scope in scopes {
        for (parameter, binding, stages) in scope.resources() {
            let Some(descriptor_type) = parameter.kind.descriptor_type() else {
                return Err(CompileError::new(
                    source,
                    format!("parameter `{}` has a binding but is not a resource", parameter.name),
                ));
            };
            match bindings.entry(binding) {
                Entry::Occupied(mut occupied) => {
                    let (name, existing) = occupied.get_mut();
                    if *name != parameter.name || existing.descriptor_type != descriptor_type {
                        return Err(CompileError::new(
                            source,
                            format!(
                                "binding {} is used by both `{}` and `{}`",
                                binding, name, parameter.name
                            ),
                        ));
                    }
                    existing.stage_flags |= stages;
                }
                Entry::Vacant(vacant) => {
                    vacant.insert((
                        parameter.name.as_str(),
                        DescriptorSetLayoutBinding::new(binding, descriptor_type, 1, stages),
                    ));
                }
            }
        }
    }
    Ok(bindings.into_values().map(|(_, binding)| binding).collect())
}

/// Hit records for every instance of a scene, `records_per_instance` per
/// instance. Instance slots beyond the last hit group repeat hit group 0.
pub fn hit_records<T, S>(
    first_hit_group: u32,
    layouts: &[ScopeLayout],
    variables: &VariableTable<T, S>,
    instance_count: usize,
    records_per_instance: usize,
) -> Vec<(u32, Vec<u8>)> {
    if layouts.is_empty() {
        return Vec::new();
    }

    let mut records = Vec::with_capacity(instance_count * records_per_instance);
    for instance in 0..instance_count {
        for slot in 0..records_per_instance {
            let group = if slot < layouts.len() { slot } else { 0 };
            let scope = variables
                .hit_group(group)
                .and_then(|scopes| scopes.get(instance));
            records.push((first_hit_group + group as u32, layouts[group].pack(scope)));
        }
    }
    records
}

pub struct VulkanProgram {
    pipeline: RayTracingPipeline,
    ray_gen: ScopeLayout,
    miss: Vec<ScopeLayout>,
    hit_groups: Vec<ScopeLayout>,
}

fn resolve(
    library: &ShaderLibrary,
    entry: &ShaderEntry,
    stage: ShaderStage,
) -> Result<(ShaderEntryPoint, EntryPointManifest)> {
    let source = library
        .load(&entry.source)
        .map_err(|err| CompileError::new(entry.source.as_str(), err.to_string()))?;
    let (entry_point, manifest) = source.entry_point(&entry.entry).ok_or_else(|| {
        CompileError::new(
            entry.source.as_str(),
            format!("entry point `{}` not found", entry.entry),
        )
    })?;
    if manifest.stage != stage {
        return Err(CompileError::new(
            entry.source.as_str(),
            format!(
                "entry point `{}` is a {:?} shader, expected {:?}",
                entry.entry, manifest.stage, stage
            ),
        )
        .into());
    }
    Ok((entry_point, manifest.clone()))
}

impl VulkanProgram {
    pub fn compile(
        device: &Arc<Device>,
        library: &ShaderLibrary,
        desc: &RayProgramDesc,
    ) -> Result<(Self, ProgramReflection)> {
        let (ray_gen_entry, ray_gen_manifest) = resolve(library, &desc.ray_gen, ShaderStage::RayGen)?;
        let mut groups = vec![ShaderGroup::RayGeneration(ray_gen_entry)];
        let ray_gen = ScopeLayout::new(&[&ray_gen_manifest]);

        let mut miss = Vec::with_capacity(desc.miss.len());
        for entry in &desc.miss {
            let (entry_point, manifest) = resolve(library, entry, ShaderStage::Miss)?;
            groups.push(ShaderGroup::Miss(entry_point));
            miss.push(ScopeLayout::new(&[&manifest]));
        }

        let mut hit_groups = Vec::with_capacity(desc.hit_groups.len());
        for group in &desc.hit_groups {
            let mut manifests = Vec::new();
            let mut resolve_stage = |name: &Option<String>, stage: ShaderStage| -> Result<Option<ShaderEntryPoint>> {
                match name {
                    Some(name) => {
                        let (entry_point, manifest) =
                            resolve(library, &ShaderEntry::new(&group.source, name), stage)?;
                        manifests.push(manifest);
                        Ok(Some(entry_point))
                    }
                    None => Ok(None),
                }
            };
            let closest_hit = resolve_stage(&group.closest_hit, ShaderStage::ClosestHit)?;
            let any_hit = resolve_stage(&group.any_hit, ShaderStage::AnyHit)?;
            groups.push(ShaderGroup::TriangleHit {
                closest_hit,
                any_hit,
            });
            hit_groups.push(ScopeLayout::new(&manifests.iter().collect::<Vec<_>>()));
        }

        let scopes: Vec<&ScopeLayout> = std::iter::once(&ray_gen)
            .chain(miss.iter())
            .chain(hit_groups.iter())
            .collect();
        let bindings = descriptor_bindings(&desc.ray_gen.source, &scopes)?;

        let set_layout = DescriptorSetLayout::new(device.clone(), bindings)?;
        let layout = PipelineLayout::new(
            device.clone(),
            set_layout,
            vk::ShaderStageFlags::RAYGEN_KHR,
            ray_gen.constant_size(),
        )?;
        let pipeline = RayTracingPipeline::new(
            device.clone(),
            &ShaderGroups::new(groups),
            layout,
            desc.max_recursion_depth,
        )?;

        let reflection = ProgramReflection {
            ray_gen: ray_gen.names(),
            miss: miss.iter().map(ScopeLayout::names).collect(),
            hit_groups: hit_groups.iter().map(ScopeLayout::names).collect(),
        };

        Ok((
            Self {
                pipeline,
                ray_gen,
                miss,
                hit_groups,
            },
            reflection,
        ))
    }

    fn write_descriptors(
        &self,
        set: &DescriptorSet,
        scene: &VulkanScene,
        variables: &Table,
    ) -> Result<()> {
        let mut scopes: Vec<(&ScopeLayout, Option<&Scope>)> = vec![(&self.ray_gen, Some(variables.ray_gen()))];
        for (slot, layout) in self.miss.iter().enumerate() {
            scopes.push((layout, variables.miss(slot)));
        }
        for (slot, layout) in self.hit_groups.iter().enumerate() {
            scopes.push((layout, variables.hit_group(slot).and_then(|s| s.first())));
        }

        let mut written = BTreeSet::new();
        for (layout, scope) in scopes {
            for (parameter, binding, _) in layout.resources() {
                if written.contains(&binding) {
                    continue;
                }
                let value = scope.and_then(|scope| scope.get(&parameter.name));
                let bound = match parameter.kind {
                    ParameterKind::AccelerationStructure => {
                        set.write_acceleration_structure(
                            binding,
                            scene.scene().acceleration_structure()?,
                        );
                        true
                    }
                    ParameterKind::StorageImage => value
                        .and_then(|v| v.as_texture())
                        .map(|texture| set.write_storage_image(binding, texture.view()))
                        .is_some(),
                    ParameterKind::SampledImage => value
                        .and_then(|v| v.as_texture())
                        .map(|texture| set.write_sampled_image(binding, texture.view()))
                        .is_some(),
                    ParameterKind::Sampler => value
                        .and_then(|v| v.as_sampler())
                        .map(|sampler| set.write_sampler(binding, sampler.raw()))
                        .is_some(),
                    _ => false,
                };
                if bound {
                    written.insert(binding);
                }
            }
        }
        Ok(())
    }

    pub fn dispatch(
        &self,
        device: &Arc<Device>,
        scene: &VulkanScene,
        variables: &Table,
        extent: Extent2D,
    ) -> Result<()> {
        let layout = self.pipeline.layout();
        let set_layout = layout.descriptor_set_layout();
        let pool = DescriptorPool::new(device.clone(), 1, &set_layout.pool_sizes(1))?;
        let sets = pool.allocate_descriptor_sets(&[set_layout])?;
        let Some(set) = sets.first() else {
            return Ok(());
        };
        self.write_descriptors(set, scene, variables)?;

        let records = ShaderRecords {
            raygen: (0, Vec::new()),
            miss: self
                .miss
                .iter()
                .enumerate()
                .map(|(slot, layout)| (1 + slot as u32, layout.pack(variables.miss(slot))))
                .collect(),
            hit: hit_records(
                1 + self.miss.len() as u32,
                &self.hit_groups,
                variables,
                scene.scene().instances().len(),
                scene.scene().records_per_instance() as usize,
            ),
        };
        let tables = RayTracingShaderBindingTables::new(device, &self.pipeline, &records)?;
        let push_constants = self.ray_gen.pack(Some(variables.ray_gen()));

        CommandBuffer::now(device, "trace rays".to_string(), |cmd| {
            cmd.bind_pipeline(self.pipeline.pipeline());
            cmd.bind_descriptor_sets(self.pipeline.pipeline(), layout, &[set]);
            cmd.push_constants(layout, vk::ShaderStageFlags::RAYGEN_KHR, &push_constants);
            cmd.trace_rays(&tables, (extent.width, extent.height, 1))?;
            cmd.barrier_all();
            Ok(())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ShaderValue;
    use glam::Vec2;

    fn parameter(name: &str, kind: ParameterKind, binding: Option<u32>, offset: Option<u32>) -> ParameterManifest {
        ParameterManifest {
            name: name.to_string(),
            kind,
            binding,
            offset,
        }
    }

    fn entry(name: &str, stage: ShaderStage, parameters: Vec<ParameterManifest>) -> EntryPointManifest {
        EntryPointManifest {
            name: name.to_string(),
            stage,
            parameters,
        }
    }

    #[test]
    fn constants_are_packed_at_their_offsets() {
        let ray_gen = entry(
            "GBufferRayGen",
            ShaderStage::RayGen,
            vec![
                parameter("gPixelJitter", ParameterKind::Float2, None, Some(0)),
                parameter("gMinT", ParameterKind::Float, None, Some(8)),
                parameter("gShadows", ParameterKind::Bool, None, Some(12)),
                parameter("gOutput", ParameterKind::StorageImage, Some(1), None),
            ],
        );
        let layout = ScopeLayout::new(&[&ray_gen]);
        assert_eq!(layout.constant_size(), 16);

        let mut scope: VariableScope<u32, u32> = VariableScope::new(layout.names());
        scope.set("gPixelJitter", Vec2::new(0.25, -0.5));
        scope.set("gShadows", true);
        scope.set("gOutput", ShaderValue::Texture(3));

        let block = layout.pack(Some(&scope));
        assert_eq!(&block[0..4], &0.25f32.to_le_bytes());
        assert_eq!(&block[4..8], &(-0.5f32).to_le_bytes());
        assert_eq!(&block[8..12], &[0, 0, 0, 0]);
        assert_eq!(&block[12..16], &[1, 0, 0, 0]);
        assert_eq!(layout.pack::<u32, u32>(None), vec![0; 16]);
    }

    #[test]
    fn bindings_merge_across_stages() {
        let miss = entry(
            "GIMiss",
            ShaderStage::Miss,
            vec![
                parameter("gScene", ParameterKind::AccelerationStructure, Some(0), None),
                parameter("gEnvMap", ParameterKind::SampledImage, Some(5), None),
            ],
        );
        let ray_gen = entry(
            "DiffuseGIRayGen",
            ShaderStage::RayGen,
            vec![parameter("gScene", ParameterKind::AccelerationStructure, Some(0), None)],
        );
        let scopes = [ScopeLayout::new(&[&ray_gen]), ScopeLayout::new(&[&miss])];
        let bindings = descriptor_bindings("rtDiffuseGI", &[&scopes[0], &scopes[1]]).unwrap();

        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].binding, 0);
        assert_eq!(
            bindings[0].stage_flags,
            vk::ShaderStageFlags::RAYGEN_KHR | vk::ShaderStageFlags::MISS_KHR
        );
        assert_eq!(bindings[1].descriptor_type, vk::DescriptorType::SAMPLED_IMAGE);
    }

    #[test]
    fn conflicting_bindings_fail_to_compile() {
        let a = entry(
            "A",
            ShaderStage::RayGen,
            vec![parameter("gOutput", ParameterKind::StorageImage, Some(1), None)],
        );
        let b = entry(
            "B",
            ShaderStage::Miss,
            vec![parameter("gEnvMap", ParameterKind::SampledImage, Some(1), None)],
        );
        let scopes = [ScopeLayout::new(&[&a]), ScopeLayout::new(&[&b])];
        let err = descriptor_bindings("rt", &[&scopes[0], &scopes[1]]).unwrap_err();
        assert!(err.message.contains("binding 1"));
    }

    #[test]
    fn hit_records_pad_unused_ray_types_with_group_zero() {
        let hit = entry(
            "ClosestHit",
            ShaderStage::ClosestHit,
            vec![parameter("gIndex", ParameterKind::Uint, None, Some(0))],
        );
        let layouts = vec![ScopeLayout::new(&[&hit])];
        let mut table: VariableTable<u32, u32> = VariableTable::new(ProgramReflection {
            ray_gen: ParameterSet::default(),
            miss: vec![],
            hit_groups: vec![layouts[0].names()],
        });

        struct Two;
        impl crate::backend::RayTracingScene for Two {
            fn name(&self) -> &str {
                "two"
            }
            fn hit_group_instance_count(&self, _slot: usize) -> usize {
                2
            }
        }
        table.bind_scene(&Two);
        for (index, scope) in table.hit_group_scopes(0).unwrap().iter_mut().enumerate() {
            scope.set("gIndex", index as u32 + 10);
        }

        let records = hit_records(2, &layouts, &table, 2, 2);
        let groups: Vec<u32> = records.iter().map(|(group, _)| *group).collect();
        assert_eq!(groups, vec![2, 2, 2, 2]);
        assert_eq!(records[0].1, 10u32.to_le_bytes().to_vec());
        assert_eq!(records[1].1, 10u32.to_le_bytes().to_vec());
        assert_eq!(records[2].1, 11u32.to_le_bytes().to_vec());
    }
}
