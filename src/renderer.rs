// renderer.rs — 背景渲染器 (fullscreen triangle + egui overlay)
//
// The panorama is not mapped onto a sphere. It is drawn as a flat backdrop
// whose UV scale/offset come from `Projection::texture_mapping`, so what the
// GPU shows is exactly the CSS-style placement the projector computes.

use image::{GenericImage, Rgba, RgbaImage};
use panorama_tour::i18n::{tr, tr_with};
use panorama_tour::Projection;
use std::path::PathBuf;
use thiserror::Error;
use wgpu::util::DeviceExt;
use winit::window::Window;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("could not create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter")]
    NoAdapter,
    #[error("could not open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

/// Picks the first font that covers CJK text so translated labels render.
/// Falls back to egui's built-in fonts when nothing usable is installed.
fn setup_egui_ui_fonts(ctx: &egui::Context) {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if cfg!(windows) {
        let win_fonts = PathBuf::from(r"C:\Windows\Fonts");
        for f in ["msyh.ttf", "simhei.ttf", "meiryo.ttf", "malgun.ttf", "segoeui.ttf"] {
            candidates.push(win_fonts.join(f));
        }
    } else if cfg!(target_os = "macos") {
        for f in [
            "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
            "/Library/Fonts/NotoSansSC-Regular.otf",
            "/System/Library/Fonts/PingFang.ttc",
        ] {
            candidates.push(PathBuf::from(f));
        }
    } else if cfg!(unix) {
        for f in [
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/opentype/noto/NotoSansSC-Regular.otf",
            "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
        ] {
            candidates.push(PathBuf::from(f));
        }
    }

    // user-supplied font next to the exe or in ./assets
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join("assets").join("ui-font.ttf"));
        }
    }
    candidates.push(PathBuf::from("assets").join("ui-font.ttf"));

    // ab_glyph rejects some .ttc collections; those are skipped
    let chosen = candidates.into_iter().find_map(|p| {
        let bytes = std::fs::read(&p).ok()?;
        ab_glyph::FontArc::try_from_vec(bytes.clone()).ok()?;
        Some((p, bytes))
    });

    let Some((font_path, font_bytes)) = chosen else {
        log::info!("{}", tr("font.not_found"));
        return;
    };
    log::info!(
        "{}",
        tr_with("font.using", &[("path", font_path.display().to_string())])
    );

    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("ui".to_owned(), egui::FontData::from_owned(font_bytes));
    if let Some(family) = fonts.families.get_mut(&egui::FontFamily::Proportional) {
        family.insert(0, "ui".to_owned());
    }
    if let Some(family) = fonts.families.get_mut(&egui::FontFamily::Monospace) {
        family.push("ui".to_owned());
    }
    ctx.set_fonts(fonts);
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct BackdropUniform {
    uv_scale: [f32; 2],
    uv_offset: [f32; 2],
    has_image: u32,
    _pad: [u32; 3],
}

impl Default for BackdropUniform {
    fn default() -> Self {
        Self {
            uv_scale: [1.0, 1.0],
            uv_offset: [0.0, 0.0],
            has_image: 0,
            _pad: [0; 3],
        }
    }
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    render_pipeline: wgpu::RenderPipeline,

    // 纹理资源
    texture_bind_group_layout: wgpu::BindGroupLayout,
    diffuse_bind_group: wgpu::BindGroup,
    texture: wgpu::Texture,
    sampler: wgpu::Sampler,

    // Uniform 资源
    backdrop_uniform: BackdropUniform,
    backdrop_buffer: wgpu::Buffer,

    // UI
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: std::sync::Arc<Window>) -> Result<Self, RendererError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        // window outlives the surface: both are owned by main's event loop
        let surface = unsafe { instance.create_surface(window.as_ref()) }?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RendererError::NoAdapter)?;
        log::info!("GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    label: None,
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        // --- 1. Texture: 1x1 placeholder until a panorama arrives ---
        let texture = create_panorama_texture(&device, 1, 1, "placeholder_texture");
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[0, 0, 0, 255],
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );

        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat, // yaw 水平循环
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // --- 2. Uniform ---
        let backdrop_uniform = BackdropUniform::default();
        let backdrop_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Backdrop Buffer"),
            contents: bytemuck::cast_slice(&[backdrop_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("texture_bind_group_layout"),
            });

        let diffuse_bind_group = create_bind_group(
            &device,
            &texture_bind_group_layout,
            &backdrop_buffer,
            &texture_view,
            &sampler,
        );

        // --- 3. Pipeline ---
        let shader = device.create_shader_module(wgpu::include_wgsl!("shader_backdrop.wgsl"));
        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&texture_bind_group_layout],
                push_constant_ranges: &[],
            });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Backdrop Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[], // 无顶点缓冲，Shader 自生成
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        // --- 4. Egui ---
        let egui_ctx = egui::Context::default();
        setup_egui_ui_fonts(&egui_ctx);

        let mut egui_state = egui_winit::State::new(window.as_ref());
        egui_state.set_pixels_per_point(window.scale_factor() as f32);

        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            render_pipeline,
            texture_bind_group_layout,
            diffuse_bind_group,
            texture,
            sampler,
            backdrop_uniform,
            backdrop_buffer,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    pub fn update_projection(&mut self, projection: &Projection) {
        let (uv_scale, uv_offset) = projection.texture_mapping(self.aspect());
        self.backdrop_uniform.uv_scale = uv_scale;
        self.backdrop_uniform.uv_offset = uv_offset;
        self.write_uniform();
    }

    fn write_uniform(&self) {
        self.queue.write_buffer(
            &self.backdrop_buffer,
            0,
            bytemuck::cast_slice(&[self.backdrop_uniform]),
        );
    }

    /// Shows the empty backdrop (closed viewer, load in flight, or failed load).
    pub fn clear_panorama(&mut self) {
        self.backdrop_uniform.has_image = 0;
        self.write_uniform();
    }

    pub fn load_panorama(&mut self, img: RgbaImage) {
        let img = fit_to_gpu(img, self.device.limits().max_texture_dimension_2d);
        let img = frame_to_2_1(img);

        let (width, height) = img.dimensions();
        self.texture = create_panorama_texture(&self.device, width, height, "panorama_texture");
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &img,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let texture_view = self.texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.diffuse_bind_group = create_bind_group(
            &self.device,
            &self.texture_bind_group_layout,
            &self.backdrop_buffer,
            &texture_view,
            &self.sampler,
        );

        self.backdrop_uniform.has_image = 1;
        self.write_uniform();
    }

    pub fn render_with_ui(
        &mut self,
        window: &Window,
        run_ui: impl FnOnce(&egui::Context),
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // 1. Backdrop
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Backdrop Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.05,
                            g: 0.05,
                            b: 0.06,
                            a: 1.0,
                        }),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.diffuse_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        // 2. UI
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);

        self.egui_state
            .handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes);

        let screen_descriptor = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn create_panorama_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    label: &str,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        label: Some(label),
        view_formats: &[],
    })
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform: &wgpu::Buffer,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("diffuse_bind_group"),
    })
}

/// Downscales images larger than the GPU texture limit.
fn fit_to_gpu(img: RgbaImage, max_dimension: u32) -> RgbaImage {
    let (src_w, src_h) = img.dimensions();
    if src_w <= max_dimension && src_h <= max_dimension {
        return img;
    }
    let scale = max_dimension as f32 / src_w.max(src_h) as f32;
    let new_w = ((src_w as f32 * scale) as u32).max(1);
    let new_h = ((src_h as f32 * scale) as u32).max(1);
    log::warn!("panorama {src_w}x{src_h} exceeds GPU limit {max_dimension}; scaled to {new_w}x{new_h}");
    image::DynamicImage::ImageRgba8(img)
        .resize(new_w, new_h, image::imageops::FilterType::Lanczos3)
        .to_rgba8()
}

/// Pads the image with black bands so it keeps a 2:1 frame: top and bottom
/// for short images, left and right for tall ones.
fn frame_to_2_1(img: RgbaImage) -> RgbaImage {
    let (src_w, src_h) = img.dimensions();
    let (dst_w, dst_h) = if src_h * 2 < src_w {
        (src_w, src_w / 2)
    } else {
        (src_h * 2, src_h)
    };
    if (dst_w, dst_h) == (src_w, src_h) || dst_w == 0 || dst_h == 0 {
        return img;
    }
    let mut canvas = RgbaImage::from_pixel(dst_w, dst_h, Rgba([0, 0, 0, 255]));
    // both offsets keep the source inside the canvas
    let _ = canvas.copy_from(&img, (dst_w - src_w) / 2, (dst_h - src_h) / 2);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterbox_centres_wide_image() {
        let img = RgbaImage::from_pixel(400, 100, Rgba([255, 255, 255, 255]));
        let out = frame_to_2_1(img);
        assert_eq!(out.dimensions(), (400, 200));
        assert_eq!(out.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(0, 100), &Rgba([255, 255, 255, 255]));
        assert_eq!(out.get_pixel(0, 199), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn letterbox_keeps_proper_equirect() {
        let img = RgbaImage::new(200, 100);
        assert_eq!(frame_to_2_1(img).dimensions(), (200, 100));
    }

    #[test]
    fn pillarbox_centres_tall_image() {
        let img = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let out = frame_to_2_1(img);
        assert_eq!(out.dimensions(), (200, 100));
        assert_eq!(out.get_pixel(0, 50), &Rgba([0, 0, 0, 255]));
        assert_eq!(out.get_pixel(100, 50), &Rgba([255, 255, 255, 255]));
        assert_eq!(out.get_pixel(199, 50), &Rgba([0, 0, 0, 255]));

        let odd = RgbaImage::new(3, 5);
        assert_eq!(frame_to_2_1(odd).dimensions(), (10, 5));
    }

    #[test]
    fn oversized_image_is_scaled_to_limit() {
        let img = RgbaImage::new(64, 32);
        assert_eq!(fit_to_gpu(img, 16).dimensions(), (16, 8));
        let small = RgbaImage::new(8, 4);
        assert_eq!(fit_to_gpu(small, 16).dimensions(), (8, 4));
    }
}
