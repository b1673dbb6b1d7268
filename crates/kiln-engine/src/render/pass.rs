use crate::device::PassStats;

/// Render pass wrapper that counts the draws it records.
///
/// Also carries the bind group that meshes without a texture fall back to.
pub struct DrawPass<'a> {
    pass: wgpu::RenderPass<'a>,
    stats: PassStats,
    default_material: Option<&'a wgpu::BindGroup>,
    material_group: u32,
}

impl<'a> DrawPass<'a> {
    /// Wraps `pass`. Materials bind at group `material_group`.
    pub fn new(
        pass: wgpu::RenderPass<'a>,
        default_material: Option<&'a wgpu::BindGroup>,
        material_group: u32,
    ) -> Self {
        Self {
            pass,
            stats: PassStats::default(),
            default_material,
            material_group,
        }
    }

    pub fn set_pipeline(&mut self, pipeline: &wgpu::RenderPipeline) {
        self.pass.set_pipeline(pipeline);
    }

    pub fn set_bind_group(&mut self, index: u32, bind_group: &wgpu::BindGroup) {
        self.pass.set_bind_group(index, bind_group, &[]);
    }

    /// Binds a material, or the default material when `None`.
    pub fn bind_material(&mut self, material: Option<&wgpu::BindGroup>) {
        if let Some(bg) = material.or(self.default_material) {
            self.pass.set_bind_group(self.material_group, bg, &[]);
        }
    }

    pub fn set_vertex_buffer(&mut self, slot: u32, slice: wgpu::BufferSlice<'_>) {
        self.pass.set_vertex_buffer(slot, slice);
    }

    pub fn set_index_buffer(&mut self, slice: wgpu::BufferSlice<'_>, format: wgpu::IndexFormat) {
        self.pass.set_index_buffer(slice, format);
    }

    pub fn set_viewport(&mut self, viewport: crate::device::Viewport) {
        self.pass.set_viewport(
            viewport.x,
            viewport.y,
            viewport.width,
            viewport.height,
            viewport.min_depth,
            viewport.max_depth,
        );
    }

    pub fn draw(&mut self, vertex_count: u32) {
        self.pass.draw(0..vertex_count, 0..1);
        self.stats.draw_calls += 1;
    }

    pub fn draw_indexed(&mut self, index_count: u32) {
        self.pass.draw_indexed(0..index_count, 0, 0..1);
        self.stats.indexed_draw_calls += 1;
        self.stats.last_index_count = index_count;
    }

    pub fn stats(&self) -> PassStats {
        self.stats
    }

    /// Ends the pass and returns what it recorded.
    pub fn finish(self) -> PassStats {
        self.stats
    }
}
