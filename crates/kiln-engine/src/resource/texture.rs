use crate::device::GraphicsDevice;

use super::{GraphicsResource, ResourceError, ResourceKind};

/// Textures with both sides at least this large get a mip chain when loaded
/// from models.
pub const MIP_THRESHOLD: u32 = 512;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MipChain {
    Single,
    /// Full chain down to 1x1, generated on the GPU from level 0.
    Full,
}

/// Everything needed to (re)create a texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
    pub mips: MipChain,
}

impl TextureDesc {
    /// Sampled, CPU-writable texture without mips.
    pub fn new(label: impl Into<String>, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            mips: MipChain::Single,
        }
    }

    pub fn with_usage(mut self, usage: wgpu::TextureUsages) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_mips(mut self, mips: MipChain) -> Self {
        self.mips = mips;
        self
    }

    pub fn mip_level_count(&self) -> u32 {
        match self.mips {
            MipChain::Single => 1,
            MipChain::Full => mip_level_count(self.width, self.height),
        }
    }

    /// Usage the image is actually created with.
    ///
    /// Mip generation renders into each level and samples the previous one.
    pub fn effective_usage(&self) -> wgpu::TextureUsages {
        match self.mips {
            MipChain::Single => self.usage,
            MipChain::Full => {
                self.usage
                    | wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_DST
            }
        }
    }
}

/// Initial texel data: `height` rows of `row_bytes` each.
#[derive(Debug, Clone)]
struct TexturePayload {
    bytes: Vec<u8>,
    row_bytes: u32,
}

/// Shader-readable view plus its bind group.
struct SampledView {
    bind_group: wgpu::BindGroup,
    view: wgpu::TextureView,
}

/// A GPU image and its sampled view, created and destroyed together.
pub(crate) struct GpuImage {
    sampled: SampledView,
    texture: wgpu::Texture,
}

impl GpuImage {
    /// Drops the view before destroying the image.
    fn destroy(self) {
        let GpuImage { sampled, texture } = self;
        drop(sampled);
        texture.destroy();
    }
}

/// 2D texture with a sampled view.
pub struct Texture {
    desc: TextureDesc,
    payload: Option<TexturePayload>,
    image: Option<GpuImage>,
}

impl Texture {
    pub fn new(desc: TextureDesc) -> Self {
        Self {
            desc,
            payload: None,
            image: None,
        }
    }

    /// Texture whose level 0 is uploaded from `bytes` on every `initialise`.
    pub fn with_payload(desc: TextureDesc, bytes: Vec<u8>, row_bytes: u32) -> Self {
        Self {
            desc,
            payload: Some(TexturePayload { bytes, row_bytes }),
            image: None,
        }
    }

    /// sRGB RGBA8 texture from tightly packed pixels.
    pub fn from_rgba8(
        label: impl Into<String>,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        mips: MipChain,
    ) -> Self {
        let desc = TextureDesc::new(label, width, height, wgpu::TextureFormat::Rgba8UnormSrgb)
            .with_mips(mips);
        Self::with_payload(desc, pixels, width * 4)
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub(crate) fn set_size(&mut self, width: u32, height: u32) {
        self.desc.width = width;
        self.desc.height = height;
    }

    pub fn raw(&self) -> Option<&wgpu::Texture> {
        self.image.as_ref().map(|i| &i.texture)
    }

    pub fn sampled_view(&self) -> Option<&wgpu::TextureView> {
        self.image.as_ref().map(|i| &i.sampled.view)
    }

    /// Bind group for sampling this texture with the device sampler.
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.image.as_ref().map(|i| &i.sampled.bind_group)
    }

    /// Builds the GPU image and its sampled view from the descriptor.
    ///
    /// An already allocated image is released first. On failure the error is
    /// logged and the texture stays unallocated.
    pub fn initialise(&mut self, device: &mut GraphicsDevice) -> Result<(), ResourceError> {
        self.initialise_as(device, ResourceKind::Texture)
    }

    pub(crate) fn initialise_as(
        &mut self,
        device: &mut GraphicsDevice,
        kind: ResourceKind,
    ) -> Result<(), ResourceError> {
        self.release();
        self.build(device, kind).inspect_err(|e| log::error!("{e}"))
    }

    fn build(&mut self, device: &mut GraphicsDevice, kind: ResourceKind) -> Result<(), ResourceError> {
        let desc = &self.desc;
        if desc.width == 0 || desc.height == 0 {
            return Err(ResourceError::ZeroSized {
                kind,
                label: desc.label.clone(),
                width: desc.width,
                height: desc.height,
            });
        }
        if !device.is_alive() {
            return Err(ResourceError::DeviceLost {
                kind,
                label: desc.label.clone(),
            });
        }

        let texture = device.device().create_texture(&wgpu::TextureDescriptor {
            label: Some(&desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: desc.mip_level_count(),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: desc.effective_usage(),
            view_formats: &[],
        });

        if let Some(payload) = &self.payload {
            if let Err(e) = upload_level0(device.queue(), &texture, desc, &payload.bytes, payload.row_bytes) {
                texture.destroy();
                return Err(e);
            }
            if desc.mips == MipChain::Full {
                device.generate_mips(&texture);
            }
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let Some(bind_group) = device.create_sampled_bind_group(Some(&desc.label), &view) else {
            drop(view);
            texture.destroy();
            return Err(ResourceError::DeviceLost {
                kind,
                label: desc.label.clone(),
            });
        };

        log::trace!(
            "{kind} '{}' allocated: {}x{} {:?}, {} mip(s)",
            desc.label,
            desc.width,
            desc.height,
            desc.format,
            desc.mip_level_count()
        );

        self.image = Some(GpuImage {
            sampled: SampledView { bind_group, view },
            texture,
        });
        Ok(())
    }

    /// Writes `height` rows of `row_bytes` each into mip level 0.
    ///
    /// Fails when the texture was created without CPU write access
    /// (`COPY_DST`) or is not allocated.
    pub fn copy_data_into_texture(
        &self,
        device: &GraphicsDevice,
        bytes: &[u8],
        row_bytes: u32,
    ) -> Result<(), ResourceError> {
        let Some(image) = &self.image else {
            return Err(ResourceError::NotAllocated {
                kind: ResourceKind::Texture,
                label: self.desc.label.clone(),
            });
        };
        if !self.desc.effective_usage().contains(wgpu::TextureUsages::COPY_DST) {
            let err = ResourceError::NotWritable {
                label: self.desc.label.clone(),
            };
            log::error!("{err}");
            return Err(err);
        }

        upload_level0(device.queue(), &image.texture, &self.desc, bytes, row_bytes)
            .inspect_err(|e| log::error!("{e}"))
    }
}

impl GraphicsResource for Texture {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Texture
    }

    fn is_allocated(&self) -> bool {
        self.image.is_some()
    }

    fn release(&mut self) {
        if let Some(image) = self.image.take() {
            image.destroy();
        }
    }
}

fn upload_level0(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    desc: &TextureDesc,
    bytes: &[u8],
    row_bytes: u32,
) -> Result<(), ResourceError> {
    let texel = desc.format.block_copy_size(None).unwrap_or(4);
    let min_row = desc.width * texel;
    if row_bytes < min_row {
        return Err(ResourceError::RowTooShort {
            label: desc.label.clone(),
            row_bytes,
            min: min_row,
        });
    }

    let needed = row_bytes as usize * desc.height as usize;
    if bytes.len() < needed {
        return Err(ResourceError::PayloadTooShort {
            label: desc.label.clone(),
            needed,
            got: bytes.len(),
        });
    }

    let stride = padded_bytes_per_row(min_row);
    let packed = pack_rows(
        bytes,
        row_bytes as usize,
        min_row as usize,
        stride as usize,
        desc.height as usize,
    );

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &packed,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(stride),
            rows_per_image: Some(desc.height),
        },
        wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        },
    );
    Ok(())
}

/// Number of levels in a full chain: `1 + floor(log2(max(w, h)))`.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Whether a texture of this size gets a mip chain.
pub fn wants_mips(width: u32, height: u32) -> bool {
    width >= MIP_THRESHOLD && height >= MIP_THRESHOLD
}

/// `row` rounded up to the copy row alignment.
pub fn padded_bytes_per_row(row: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    row.div_ceil(align) * align
}

/// Copies `rows` rows of `row_len` bytes from `src` (stride `src_stride`)
/// into a buffer with stride `dst_stride`. Padding bytes are zero.
pub fn pack_rows(src: &[u8], src_stride: usize, row_len: usize, dst_stride: usize, rows: usize) -> Vec<u8> {
    debug_assert!(row_len <= src_stride && row_len <= dst_stride);

    let mut out = vec![0u8; dst_stride * rows];
    for (dst, src) in out
        .chunks_exact_mut(dst_stride)
        .zip(src.chunks(src_stride))
        .take(rows)
    {
        let n = row_len.min(src.len());
        dst[..n].copy_from_slice(&src[..n]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── mip counts ──

    #[test]
    fn mip_count_follows_largest_side() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 1), 2);
        assert_eq!(mip_level_count(512, 512), 10);
        assert_eq!(mip_level_count(1024, 300), 11);
        assert_eq!(mip_level_count(1000, 1000), 10);
    }

    #[test]
    fn mip_threshold_needs_both_sides() {
        assert!(wants_mips(512, 512));
        assert!(wants_mips(2048, 1024));
        assert!(!wants_mips(4096, 256));
        assert!(!wants_mips(511, 1024));
    }

    #[test]
    fn full_chain_adds_render_usage() {
        let desc = TextureDesc::new("t", 1024, 1024, wgpu::TextureFormat::Rgba8UnormSrgb)
            .with_usage(wgpu::TextureUsages::TEXTURE_BINDING)
            .with_mips(MipChain::Full);
        let usage = desc.effective_usage();
        assert!(usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT));
        assert!(usage.contains(wgpu::TextureUsages::COPY_DST));
        assert_eq!(desc.mip_level_count(), 11);
    }

    // ── row packing ──

    #[test]
    fn padded_row_is_aligned() {
        assert_eq!(padded_bytes_per_row(4), 256);
        assert_eq!(padded_bytes_per_row(256), 256);
        assert_eq!(padded_bytes_per_row(257), 512);
    }

    #[test]
    fn pack_rows_pads_each_row() {
        let src = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let out = pack_rows(&src, 4, 4, 8, 2);
        assert_eq!(out, vec![1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8, 0, 0, 0, 0]);
    }

    #[test]
    fn pack_rows_drops_source_padding() {
        // Source rows carry two junk bytes each.
        let src = [1u8, 2, 9, 9, 3, 4, 9, 9];
        let out = pack_rows(&src, 4, 2, 2, 2);
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[test]
    fn from_rgba8_uses_tight_rows() {
        let t = Texture::from_rgba8("px", 3, 2, vec![0; 24], MipChain::Single);
        assert_eq!(t.payload.as_ref().map(|p| p.row_bytes), Some(12));
        assert!(!t.is_allocated());
    }
}
