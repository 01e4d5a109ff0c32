use super::{acceleration_structure::AccelerationStructure, scratch_buffer::ScratchBuffer};
use crate::{commands::CommandBuffer, device::Device, storage::buffers::Buffer, GpuError, Result};
use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use gpu_allocator::MemoryLocation;
use std::{mem, slice, sync::Arc};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

pub enum GeometryType {
    Triangles { vertices: Vec<Vec3>, indices: Vec<u32> },
    Aabbs(Vec<Aabb>),
}

impl GeometryType {
    pub fn primitive_count(&self) -> u32 {
        match self {
            GeometryType::Triangles { indices, .. } => (indices.len() / 3) as u32,
            GeometryType::Aabbs(aabbs) => aabbs.len() as u32,
        }
    }
}

/// A bottom level acceleration structure over one triangle mesh or set of boxes.
/// Alpha tested geometry is built without the opaque flag so any-hit shaders run for it.
pub struct Geometry {
    device: Arc<Device>,
    name: String,
    geometry_type: GeometryType,
    alpha_tested: bool,
    acceleration_structure: Option<Arc<AccelerationStructure>>,
    _input_buffers: Vec<Buffer>,
}

impl Geometry {
    pub fn new(
        device: Arc<Device>,
        name: String,
        geometry_type: GeometryType,
        alpha_tested: bool,
    ) -> Self {
        Self {
            device,
            name,
            geometry_type,
            alpha_tested,
            acceleration_structure: None,
            _input_buffers: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn geometry_type(&self) -> &GeometryType {
        &self.geometry_type
    }

    pub fn acceleration_structure(&self) -> Result<&Arc<AccelerationStructure>> {
        self.acceleration_structure
            .as_ref()
            .ok_or_else(|| GpuError::NotBuilt(self.name.clone()))
    }

    pub fn build(&mut self) -> Result<()> {
        if self.acceleration_structure.is_some() {
            log::warn!("Geometry {} has multiple build calls.", self.name);
        }

        let flags = if self.alpha_tested {
            vk::GeometryFlagsKHR::NO_DUPLICATE_ANY_HIT_INVOCATION
        } else {
            vk::GeometryFlagsKHR::OPAQUE
        };
        let input_usage = vk::BufferUsageFlags::ACCELERATION_STRUCTURE_BUILD_INPUT_READ_ONLY_KHR;

        let (geometry, input_buffers) = match &self.geometry_type {
            GeometryType::Aabbs(aabbs) => {
                let aabbs_buffer = Buffer::new_from_data(
                    self.device.clone(),
                    aabbs,
                    input_usage,
                    format!("{} aabbs", self.name),
                    MemoryLocation::GpuOnly,
                )?;

                let aabbs = vk::AccelerationStructureGeometryAabbsDataKHR::builder()
                    .data(vk::DeviceOrHostAddressConstKHR {
                        device_address: aabbs_buffer.device_address(),
                    })
                    .stride(mem::size_of::<Aabb>() as u64)
                    .build();

                let geometry = vk::AccelerationStructureGeometryKHR::builder()
                    .geometry_type(vk::GeometryTypeKHR::AABBS)
                    .geometry(vk::AccelerationStructureGeometryDataKHR { aabbs })
                    .flags(flags)
                    .build();

                (geometry, vec![aabbs_buffer])
            }
            GeometryType::Triangles { vertices, indices } => {
                let vertex_buffer = Buffer::new_from_data(
                    self.device.clone(),
                    vertices,
                    input_usage,
                    format!("{} vertices", self.name),
                    MemoryLocation::GpuOnly,
                )?;
                let index_buffer = Buffer::new_from_data(
                    self.device.clone(),
                    indices,
                    input_usage,
                    format!("{} indices", self.name),
                    MemoryLocation::GpuOnly,
                )?;

                let triangles = vk::AccelerationStructureGeometryTrianglesDataKHR::builder()
                    .vertex_format(vk::Format::R32G32B32_SFLOAT)
                    .vertex_data(vk::DeviceOrHostAddressConstKHR {
                        device_address: vertex_buffer.device_address(),
                    })
                    .vertex_stride(mem::size_of::<Vec3>() as _)
                    .max_vertex(vertices.len().saturating_sub(1) as _)
                    .index_type(vk::IndexType::UINT32)
                    .index_data(vk::DeviceOrHostAddressConstKHR {
                        device_address: index_buffer.device_address(),
                    })
                    .build();

                let geometry = vk::AccelerationStructureGeometryKHR::builder()
                    .geometry_type(vk::GeometryTypeKHR::TRIANGLES)
                    .geometry(vk::AccelerationStructureGeometryDataKHR { triangles })
                    .flags(flags)
                    .build();

                (geometry, vec![vertex_buffer, index_buffer])
            }
        };

        let range = vk::AccelerationStructureBuildRangeInfoKHR::builder()
            .primitive_count(self.geometry_type.primitive_count())
            .build();

        let geometry_info = vk::AccelerationStructureBuildGeometryInfoKHR::builder()
            .ty(vk::AccelerationStructureTypeKHR::BOTTOM_LEVEL)
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
            vk::AccelerationStructureTypeKHR::BOTTOM_LEVEL,
        )?;

        let geometry_info = geometry_info
            .mode(vk::BuildAccelerationStructureModeKHR::BUILD)
            .dst_acceleration_structure(unsafe { acceleration_structure.raw() })
            .scratch_data(vk::DeviceOrHostAddressKHR {
                device_address: scratch_buffer.device_address(),
            });

        CommandBuffer::now(&self.device, format!("build BLAS {}", self.name), |cmd| {
            cmd.build_acceleration_structure(&geometry_info, &range)
        })?;

        self._input_buffers = input_buffers;
        self.acceleration_structure = Some(Arc::new(acceleration_structure));

        Ok(())
    }
}
