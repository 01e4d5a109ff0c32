use crate::error::{RenderError, Result};

pub const DEFAULT_MAX_RECURSION_DEPTH: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderEntry {
    pub source: String,
    pub entry: String,
}

impl ShaderEntry {
    pub fn new(source: &str, entry: &str) -> Self {
        Self {
            source: source.to_string(),
            entry: entry.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitGroupEntry {
    pub source: String,
    pub closest_hit: Option<String>,
    pub any_hit: Option<String>,
}

impl HitGroupEntry {
    /// Entry names of the group, closest hit first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.closest_hit
            .as_deref()
            .into_iter()
            .chain(self.any_hit.as_deref())
    }
}

/// Which shaders make up a ray tracing program. Miss and hit group slots are
/// their positions in `miss` and `hit_groups`, and are how dispatch-time
/// bindings address them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RayProgramDesc {
    pub ray_gen: ShaderEntry,
    pub miss: Vec<ShaderEntry>,
    pub hit_groups: Vec<HitGroupEntry>,
    pub max_recursion_depth: u32,
}

impl RayProgramDesc {
    pub fn entries(&self) -> impl Iterator<Item = ShaderEntry> + '_ {
        std::iter::once(self.ray_gen.clone())
            .chain(self.miss.iter().cloned())
            .chain(self.hit_groups.iter().flat_map(|group| {
                group
                    .entries()
                    .map(move |entry| ShaderEntry::new(&group.source, entry))
            }))
    }
}

pub struct RayProgramBuilder {
    desc: RayProgramDesc,
}

impl RayProgramBuilder {
    pub fn new(source: &str, ray_gen: &str) -> Result<Self> {
        if ray_gen.is_empty() {
            return Err(RenderError::EmptyRayGenEntry(source.to_string()));
        }

        Ok(Self {
            desc: RayProgramDesc {
                ray_gen: ShaderEntry::new(source, ray_gen),
                miss: Vec::new(),
                hit_groups: Vec::new(),
                max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            },
        })
    }

    pub fn add_miss(&mut self, source: &str, entry: &str) -> usize {
        self.desc.miss.push(ShaderEntry::new(source, entry));
        self.desc.miss.len() - 1
    }

    /// Appends a hit group. Either entry may be empty to leave that stage out.
    pub fn add_hit_group(&mut self, source: &str, closest_hit: &str, any_hit: &str) -> Result<usize> {
        let non_empty = |name: &str| (!name.is_empty()).then(|| name.to_string());
        let group = HitGroupEntry {
            source: source.to_string(),
            closest_hit: non_empty(closest_hit),
            any_hit: non_empty(any_hit),
        };
        if group.closest_hit.is_none() && group.any_hit.is_none() {
            return Err(RenderError::EmptyHitGroup {
                source_id: source.to_string(),
                slot: self.desc.hit_groups.len(),
            });
        }

        self.desc.hit_groups.push(group);
        Ok(self.desc.hit_groups.len() - 1)
    }

    pub fn with_max_recursion_depth(mut self, depth: u32) -> Self {
        self.desc.max_recursion_depth = depth.max(1);
        self
    }

    pub fn build(self) -> RayProgramDesc {
        self.desc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "rtDiffuseGI";

    #[test]
    fn slots_follow_declaration_order() {
        let mut builder = RayProgramBuilder::new(SOURCE, "DiffuseGIRayGen").unwrap();
        let mut misses = Vec::new();
        let mut groups = Vec::new();
        for i in 0..5 {
            if i % 2 == 0 {
                misses.push(builder.add_miss(SOURCE, &format!("Miss{}", i)));
            }
            groups.push(builder.add_hit_group(SOURCE, "", &format!("AnyHit{}", i)).unwrap());
        }
        assert_eq!(misses, vec![0, 1, 2]);
        assert_eq!(groups, vec![0, 1, 2, 3, 4]);

        let desc = builder.build();
        assert_eq!(desc.miss[1].entry, "Miss2");
        assert_eq!(desc.hit_groups[3].any_hit.as_deref(), Some("AnyHit3"));
    }

    #[test]
    fn empty_ray_gen_is_rejected() {
        let err = RayProgramBuilder::new(SOURCE, "").err().unwrap();
        assert!(matches!(err, RenderError::EmptyRayGenEntry(_)));
        assert!(err.is_configuration_fault());
    }

    #[test]
    fn empty_names_omit_stages() {
        let mut builder = RayProgramBuilder::new(SOURCE, "DiffuseGIRayGen").unwrap();
        builder.add_hit_group(SOURCE, "", "ShadowHit").unwrap();
        builder.add_hit_group(SOURCE, "GIClosestHit", "GIAnyHit").unwrap();
        let err = builder.add_hit_group(SOURCE, "", "").unwrap_err();
        assert!(matches!(err, RenderError::EmptyHitGroup { slot: 2, .. }));

        let desc = builder.build();
        assert_eq!(desc.hit_groups.len(), 2);
        assert_eq!(desc.hit_groups[0].closest_hit, None);
        assert_eq!(
            desc.hit_groups[1].entries().collect::<Vec<_>>(),
            vec!["GIClosestHit", "GIAnyHit"]
        );
    }

    #[test]
    fn entries_list_every_stage() {
        let mut builder = RayProgramBuilder::new("rtGBuffer", "GBufferRayGen")
            .unwrap()
            .with_max_recursion_depth(0);
        builder.add_miss("rtGBuffer", "PrimaryMiss");
        builder
            .add_hit_group("rtGBuffer", "PrimaryClosestHit", "")
            .unwrap();
        let desc = builder.build();

        assert_eq!(desc.max_recursion_depth, 1);
        let names: Vec<_> = desc.entries().map(|entry| entry.entry).collect();
        assert_eq!(names, vec!["GBufferRayGen", "PrimaryMiss", "PrimaryClosestHit"]);
    }
}
