use super::{RayTracingPipeline, RayTracingProperties};
use crate::{
    device::Device,
    shaders::ShaderGroupKind,
    storage::{buffers::Buffer, memory},
    GpuError, Result,
};
use ash::vk;
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

/// Records to place in each table. A record names a shader group by its
/// index in the pipeline and carries the data written after the group handle.
#[derive(Debug, Default, Clone)]
pub struct ShaderRecords {
    pub raygen: (u32, Vec<u8>),
    pub miss: Vec<(u32, Vec<u8>)>,
    pub hit: Vec<(u32, Vec<u8>)>,
}

/// Byte layout of the raygen, miss and hit tables inside one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderBindingTableLayout {
    pub raygen_stride: u64,
    pub miss_offset: u64,
    pub miss_stride: u64,
    pub miss_size: u64,
    pub hit_offset: u64,
    pub hit_stride: u64,
    pub hit_size: u64,
    pub total_size: u64,
}

impl ShaderBindingTableLayout {
    pub fn new(properties: &RayTracingProperties, records: &ShaderRecords) -> Self {
        let handle_size = properties.shader_group_handle_size as u64;
        let handle_alignment = properties.shader_group_handle_alignment as u64;
        let base_alignment = properties.shader_group_base_alignment as u64;

        let stride = |largest: usize| memory::align(handle_size + largest as u64, handle_alignment);
        let largest = |records: &[(u32, Vec<u8>)]| {
            records.iter().map(|(_, data)| data.len()).max().unwrap_or(0)
        };

        // The raygen region holds exactly one record, so its size equals its stride.
        let raygen_stride = memory::align(stride(records.raygen.1.len()), base_alignment);
        let miss_stride = stride(largest(&records.miss));
        let hit_stride = stride(largest(&records.hit));

        let miss_offset = raygen_stride;
        let miss_size = miss_stride * records.miss.len() as u64;
        let hit_offset = memory::align(miss_offset + miss_size, base_alignment);
        let hit_size = hit_stride * records.hit.len() as u64;
        let total_size = memory::align(hit_offset + hit_size, base_alignment);

        Self {
            raygen_stride,
            miss_offset,
            miss_stride,
            miss_size,
            hit_offset,
            hit_stride,
            hit_size,
            total_size,
        }
    }

    /// Writes every record into a buffer image, handles first then data.
    pub fn write(
        &self,
        properties: &RayTracingProperties,
        group_handles: &[u8],
        records: &ShaderRecords,
    ) -> Vec<u8> {
        let handle_size = properties.shader_group_handle_size as usize;
        let mut table = vec![0u8; self.total_size as usize];

        let mut write_record = |offset: usize, (group, data): &(u32, Vec<u8>)| {
            let handle_start = *group as usize * handle_size;
            if let Some(handle) = group_handles.get(handle_start..handle_start + handle_size) {
                table[offset..offset + handle_size].copy_from_slice(handle);
            }
            let data_start = offset + handle_size;
            table[data_start..data_start + data.len()].copy_from_slice(data);
        };

        write_record(0, &records.raygen);
        for (index, record) in records.miss.iter().enumerate() {
            write_record(
                (self.miss_offset + self.miss_stride * index as u64) as usize,
                record,
            );
        }
        for (index, record) in records.hit.iter().enumerate() {
            write_record(
                (self.hit_offset + self.hit_stride * index as u64) as usize,
                record,
            );
        }

        table
    }
}

pub struct RayTracingShaderBindingTables {
    pub raygen: ShaderBindingTable,
    pub miss: ShaderBindingTable,
    pub hit: ShaderBindingTable,
    pub callable: ShaderBindingTable,
    _buffer: Buffer,
}

impl RayTracingShaderBindingTables {
    pub fn new(
        device: &Arc<Device>,
        pipeline: &RayTracingPipeline,
        records: &ShaderRecords,
    ) -> Result<Self> {
        let properties = device.physical_device().ray_tracing_properties();
        let group_count = pipeline.group_kinds().len() as u32;

        let check = |group: u32, kind: ShaderGroupKind| match pipeline
            .group_kinds()
            .get(group as usize)
        {
            Some(actual) if *actual == kind => Ok(()),
            _ => Err(GpuError::PipelineCreation(format!(
                "shader record references group {} which is not a {:?} group",
                group, kind
            ))),
        };
        check(records.raygen.0, ShaderGroupKind::RayGeneration)?;
        for (group, _) in &records.miss {
            check(*group, ShaderGroupKind::Miss)?;
        }
        for (group, _) in &records.hit {
            check(*group, ShaderGroupKind::Hit)?;
        }

        let group_handles = unsafe {
            device
                .ext()
                .ray_tracing_pipeline()?
                .get_ray_tracing_shader_group_handles(
                    pipeline.pipeline().raw(),
                    0,
                    group_count,
                    group_count as usize * properties.shader_group_handle_size as usize,
                )
        }?;

        let layout = ShaderBindingTableLayout::new(&properties, records);
        if layout.miss_stride.max(layout.hit_stride)
            > properties.max_shader_group_stride as u64
        {
            return Err(GpuError::PipelineCreation(format!(
                "shader record stride exceeds the device limit of {}",
                properties.max_shader_group_stride
            )));
        }
        let binding_table_data = layout.write(&properties, &group_handles, records);

        let mut buffer = Buffer::new_with_alignment(
            device.clone(),
            layout.total_size,
            properties.shader_group_base_alignment as u64,
            vk::BufferUsageFlags::SHADER_BINDING_TABLE_KHR,
            "rt shader binding table".to_string(),
            MemoryLocation::CpuToGpu,
        )?;
        buffer.fill(&binding_table_data)?;
        let buffer_address = buffer.device_address();

        Ok(Self {
            raygen: ShaderBindingTable::new(
                buffer_address,
                layout.raygen_stride,
                layout.raygen_stride,
            ),
            miss: ShaderBindingTable::new(
                buffer_address + layout.miss_offset,
                layout.miss_size,
                layout.miss_stride,
            ),
            hit: ShaderBindingTable::new(
                buffer_address + layout.hit_offset,
                layout.hit_size,
                layout.hit_stride,
            ),
            callable: ShaderBindingTable::empty(),
            _buffer: buffer,
        })
    }
}

#[derive(Debug)]
pub struct ShaderBindingTable {
    raw: vk::StridedDeviceAddressRegionKHR,
}

impl ShaderBindingTable {
    pub fn new(device_address: u64, size: u64, stride: u64) -> ShaderBindingTable {
        let raw = vk::StridedDeviceAddressRegionKHR::builder()
            .device_address(device_address)
            .size(size)
            .stride(stride)
            .build();

        ShaderBindingTable { raw }
    }

    pub fn empty() -> ShaderBindingTable {
        ShaderBindingTable {
            raw: vk::StridedDeviceAddressRegionKHR::default(),
        }
    }

    pub unsafe fn raw(&self) -> &vk::StridedDeviceAddressRegionKHR {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn properties() -> RayTracingProperties {
        RayTracingProperties {
            shader_group_handle_size: 32,
            shader_group_handle_alignment: 32,
            shader_group_base_alignment: 64,
            max_shader_group_stride: 4096,
            max_ray_recursion_depth: 31,
            min_scratch_offset_alignment: 128,
        }
    }

    #[test]
    fn layout_aligns_regions_and_strides() {
        let records = ShaderRecords {
            raygen: (0, vec![]),
            miss: vec![(1, vec![0; 4]), (2, vec![])],
            hit: vec![(3, vec![0; 40]), (4, vec![0; 40]), (3, vec![0; 40])],
        };

        let layout = ShaderBindingTableLayout::new(&properties(), &records);

        assert_eq!(layout.raygen_stride, 64);
        assert_eq!(layout.miss_offset, 64);
        assert_eq!(layout.miss_stride, 64);
        assert_eq!(layout.miss_size, 128);
        assert_eq!(layout.hit_offset, 192);
        assert_eq!(layout.hit_stride, 96);
        assert_eq!(layout.hit_size, 288);
        assert_eq!(layout.total_size, 512);
    }

    #[test]
    fn write_places_handles_before_record_data() {
        let props = properties();
        let records = ShaderRecords {
            raygen: (0, vec![]),
            miss: vec![(1, vec![7, 7, 7, 7])],
            hit: vec![],
        };
        let handles: Vec<u8> = (0..2u8).flat_map(|group| [group + 1; 32]).collect();

        let layout = ShaderBindingTableLayout::new(&props, &records);
        let table = layout.write(&props, &handles, &records);

        assert_eq!(&table[0..32], &[1u8; 32]);
        let miss = layout.miss_offset as usize;
        assert_eq!(&table[miss..miss + 32], &[2u8; 32]);
        assert_eq!(&table[miss + 32..miss + 36], &[7, 7, 7, 7]);
    }
}
