use super::{
    acceleration_structure::AccelerationStructure, scratch_buffer::ScratchBuffer, GeometryInstance,
};
use crate::{commands::CommandBuffer, device::Device, storage::buffers::Buffer, GpuError, Result};
use ash::vk;
use gpu_allocator::MemoryLocation;
use std::{slice, sync::Arc};

/// A top level acceleration structure. Each instance owns `records_per_instance`
/// consecutive hit records in the shader binding table, one per ray type.
pub struct Scene {
    device: Arc<Device>,
    name: String,
    records_per_instance: u32,
    instances: Vec<GeometryInstance>,
    acceleration_structure: Option<Arc<AccelerationStructure>>,
    instances_buffer: Option<Buffer>,
}

impl Scene {
    pub fn new(device: Arc<Device>, name: String, records_per_instance: u32) -> Self {
        Self {
            device,
            name,
            records_per_instance: records_per_instance.max(1),
            instances: vec![],
            acceleration_structure: None,
            instances_buffer: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instances(&self) -> &[GeometryInstance] {
        &self.instances
    }

    pub fn records_per_instance(&self) -> u32 {
        self.records_per_instance
    }

    pub fn add_instance(&mut self, instance: GeometryInstance) {
        self.instances.push(instance);
    }

    pub fn acceleration_structure(&self) -> Result<&Arc<AccelerationStructure>> {
        self.acceleration_structure
            .as_ref()
            .ok_or_else(|| GpuError::NotBuilt(self.name.clone()))
    }

    pub fn build(&mut self) -> Result<()> {
        let instances = self
            .instances
            .iter()
            .enumerate()
            .map(|(index, instance)| instance.raw(index as u32 * self.records_per_instance))
            .collect::<Result<Vec<vk::AccelerationStructureInstanceKHR>>>()?;

        // AccelerationStructureInstanceKHR holds a union, so it is uploaded as raw bytes.
        let instance_bytes = unsafe {
            slice::from_raw_parts(
                instances.as_ptr() as *const u8,
                std::mem::size_of_val(instances.as_slice()),
            )
        };
        let instances_buffer = Buffer::new_from_data(
            self.device.clone(),
            instance_bytes,
            vk::BufferUsageFlags::ACCELERATION_STRUCTURE_BUILD_INPUT_READ_ONLY_KHR,
            format!("{} instances", self.name),
            MemoryLocation::GpuOnly,
        )?;

        let geometry_data = vk::AccelerationStructureGeometryDataKHR {
            instances: vk::AccelerationStructureGeometryInstancesDataKHR::builder()
                .data(vk::DeviceOrHostAddressConstKHR {
                    device_address: instances_buffer.device_address(),
                })
                .array_of_pointers(false)
                .build(),
        };

        let geometry = vk::AccelerationStructureGeometryKHR::builder()
            .geometry_type(vk::GeometryTypeKHR::INSTANCES)
            .geometry(geometry_data)
            .build();

        let range = vk::AccelerationStructureBuildRangeInfoKHR {
            primitive_count: instances.len() as _,
            primitive_offset: 0,
            first_vertex: 0,
            transform_offset: 0,
        };

        let geometry_info = vk::AccelerationStructureBuildGeometryInfoKHR::builder()
            .ty(vk::AccelerationStructureTypeKHR::TOP_LEVEL)
            .flags(vk::BuildAccelerationStructureFlagsKHR::PREFER_FAST_TRACE)
            .geometries(slice::from_ref(&geometry));

        let build_sizes = AccelerationStructure::build_sizes(&self.device, &geometry_info, &range)?;
        let scratch_buffer = ScratchBuffer::new(self.device.clone(), build_sizes.build_scratch)?;

        let acceleration_structure_buffer = Buffer::new(
            self.device.clone(),
            build_sizes.acceleration_structure,
            vk::BufferUsageFlags::ACCELERATION_STRUCTURE_STORAGE_KHR,
            format!("{} acceleration structure", self.name),
            MemoryLocation::GpuOnly,
        )?;
        let acceleration_structure = AccelerationStructure::new(
            &self.device,
            acceleration_structure_buffer,
            vk::AccelerationStructureTypeKHR::TOP_LEVEL,
        )?;

        let geometry_info = geometry_info
            .mode(vk::BuildAccelerationStructureModeKHR::BUILD)
            .dst_acceleration_structure(unsafe { acceleration_structure.raw() })
            .scratch_data(vk::DeviceOrHostAddressKHR {
                device_address: scratch_buffer.device_address(),
            });

        CommandBuffer::now(&self.device, format!("build TLAS {}", self.name), |cmd| {
            cmd.build_acceleration_structure(&geometry_info, &range)
        })?;

        log::info!(
            "Built scene {} with {} instances",
            self.name,
            self.instances.len()
        );

        self.instances_buffer = Some(instances_buffer);
        self.acceleration_structure = Some(Arc::new(acceleration_structure));

        Ok(())
    }
}
