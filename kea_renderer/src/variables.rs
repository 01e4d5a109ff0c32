use crate::{
    backend::{ParameterSet, ProgramReflection, RayTracingScene, ShaderValue},
    error::{RenderError, Result},
};
use std::collections::BTreeMap;

/// Name to value bindings for one shader scope.
///
/// Only names the compiled program declares are kept; anything else is
/// dropped, so a pass may bind parameters that only some shader variants use.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableScope<T, S> {
    declared: ParameterSet,
    values: BTreeMap<String, ShaderValue<T, S>>,
}

impl<T, S> VariableScope<T, S> {
    pub fn new(declared: ParameterSet) -> Self {
        Self {
            declared,
            values: BTreeMap::new(),
        }
    }

    /// Binds `value` to `name`, returning whether the program declares it.
    pub fn set(&mut self, name: &str, value: impl Into<ShaderValue<T, S>>) -> bool {
        if !self.declared.contains(name) {
            log::trace!("Dropping binding for undeclared parameter {}", name);
            return false;
        }
        self.values.insert(name.to_string(), value.into());
        true
    }

    pub fn set_texture(&mut self, name: &str, texture: T) -> bool {
        self.set(name, ShaderValue::Texture(texture))
    }

    pub fn set_sampler(&mut self, name: &str, sampler: S) -> bool {
        self.set(name, ShaderValue::Sampler(sampler))
    }

    pub fn get(&self, name: &str) -> Option<&ShaderValue<T, S>> {
        self.values.get(name)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.declared.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ShaderValue<T, S>)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Every binding one dispatch reads: the ray generation scope, a scope per
/// miss slot and, per hit group slot, a scope per bound geometry instance.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableTable<T, S> {
    reflection: ProgramReflection,
    ray_gen: VariableScope<T, S>,
    miss: Vec<VariableScope<T, S>>,
    hit_groups: Vec<Vec<VariableScope<T, S>>>,
}

impl<T, S> VariableTable<T, S> {
    pub fn new(reflection: ProgramReflection) -> Self {
        Self {
            ray_gen: VariableScope::new(reflection.ray_gen.clone()),
            miss: reflection
                .miss
                .iter()
                .map(|declared| VariableScope::new(declared.clone()))
                .collect(),
            hit_groups: reflection.hit_groups.iter().map(|_| Vec::new()).collect(),
            reflection,
        }
    }

    pub fn reflection(&self) -> &ProgramReflection {
        &self.reflection
    }

    /// Rebuilds the per-instance scopes for `scene`. Bindings made for a
    /// previous scene do not carry over.
    pub fn bind_scene<C: RayTracingScene + ?Sized>(&mut self, scene: &C) {
        self.hit_groups = self
            .reflection
            .hit_groups
            .iter()
            .enumerate()
            .map(|(slot, declared)| {
                (0..scene.hit_group_instance_count(slot))
                    .map(|_| VariableScope::new(declared.clone()))
                    .collect()
            })
            .collect();
    }

    pub fn ray_gen_scope(&mut self) -> &mut VariableScope<T, S> {
        &mut self.ray_gen
    }

    pub fn miss_scope(&mut self, slot: usize) -> Result<&mut VariableScope<T, S>> {
        let count = self.miss.len();
        self.miss
            .get_mut(slot)
            .ok_or(RenderError::MissSlotOutOfRange { slot, count })
    }

    pub fn hit_group_scopes(&mut self, slot: usize) -> Result<&mut [VariableScope<T, S>]> {
        let count = self.hit_groups.len();
        self.hit_groups
            .get_mut(slot)
            .map(Vec::as_mut_slice)
            .ok_or(RenderError::HitGroupSlotOutOfRange { slot, count })
    }

    pub fn ray_gen(&self) -> &VariableScope<T, S> {
        &self.ray_gen
    }

    pub fn miss(&self, slot: usize) -> Option<&VariableScope<T, S>> {
        self.miss.get(slot)
    }

    pub fn hit_group(&self, slot: usize) -> Option<&[VariableScope<T, S>]> {
        self.hit_groups.get(slot).map(Vec::as_slice)
    }

    pub fn miss_count(&self) -> usize {
        self.miss.len()
    }

    pub fn hit_group_count(&self) -> usize {
        self.hit_groups.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    struct Instances(Vec<usize>);

    impl RayTracingScene for Instances {
        fn name(&self) -> &str {
            "instances"
        }

        fn hit_group_instance_count(&self, slot: usize) -> usize {
            self.0.get(slot).copied().unwrap_or(0)
        }
    }

    fn table() -> VariableTable<u32, u32> {
        VariableTable::new(ProgramReflection {
            ray_gen: ParameterSet::new(["gMinT", "gPixelJitter"]),
            miss: vec![ParameterSet::new(["gEnvMap", "gEnvSampler"])],
            hit_groups: vec![ParameterSet::new(["gWsPos"]), ParameterSet::default()],
        })
    }

    #[test]
    fn undeclared_names_are_dropped() {
        let mut table = table();
        let scope = table.ray_gen_scope();
        assert!(scope.set("gMinT", 1.0e-4f32));
        assert!(!scope.set("gNotAParameter", 3u32));
        assert!(scope.set("gPixelJitter", Vec2::new(0.1, -0.2)));

        let names: Vec<_> = table.ray_gen().iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["gMinT", "gPixelJitter"]);
        assert!(table.ray_gen().get("gNotAParameter").is_none());
    }

    #[test]
    fn slots_out_of_range_are_faults() {
        let mut table = table();
        assert!(table.miss_scope(0).is_ok());
        assert!(matches!(
            table.miss_scope(1),
            Err(RenderError::MissSlotOutOfRange { slot: 1, count: 1 })
        ));
        assert!(matches!(
            table.hit_group_scopes(2),
            Err(RenderError::HitGroupSlotOutOfRange { slot: 2, count: 2 })
        ));
    }

    #[test]
    fn hit_group_scopes_follow_the_bound_scene() {
        let mut table = table();
        assert!(table.hit_group_scopes(0).unwrap().is_empty());

        table.bind_scene(&Instances(vec![3, 3]));
        for scope in table.hit_group_scopes(0).unwrap() {
            assert!(scope.set_texture("gWsPos", 7));
        }
        assert_eq!(table.hit_group(0).unwrap().len(), 3);

        table.bind_scene(&Instances(vec![5, 1]));
        assert_eq!(table.hit_group(0).unwrap().len(), 5);
        assert_eq!(table.hit_group(1).unwrap().len(), 1);
        assert!(table.hit_group(0).unwrap().iter().all(VariableScope::is_empty));
    }
}
