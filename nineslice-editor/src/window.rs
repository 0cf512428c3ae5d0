//! Interactive editor window: winit event loop driving the wgpu preview and
//! the egui settings panel.

use crate::input::{self, InputState};
use crate::ops::BACKGROUND;
use crate::panel::{self, PanelStatus};
use crate::render::{MeshRenderer, SourceTexture};
use anyhow::{Context, Result};
use image::RgbaImage;
use nineslice::{EditorSettings, MeshError, SliceSource};
use std::sync::Arc;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowBuilder},
};

/// Initial window size.
const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 800;

/// egui integration: input translation, UI context and its wgpu renderer.
struct Gui {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

/// Editor state: GPU resources plus the explicit settings edited by the panel.
struct App {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    renderer: MeshRenderer,
    gui: Gui,
    /// Uploaded source image; meshes are sliced from it each frame.
    texture: SourceTexture,
    settings: EditorSettings,
    input: InputState,
    /// Last mesh validation failure, reported once until it clears.
    last_error: Option<MeshError>,
    /// Whether the vertex buffer holds a valid mesh yet.
    has_geometry: bool,
    /// Output size is below the fixed margins.
    inverted: bool,
}

impl App {
    async fn new(window: Arc<Window>, settings: EditorSettings, source: RgbaImage) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::VULKAN | wgpu::Backends::METAL | wgpu::Backends::DX12,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("nineslice device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .context("failed to create device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no texture formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = MeshRenderer::new(&device, config.format);
        renderer.update_screen(&queue, config.width, config.height);
        let texture = renderer
            .upload_texture(&device, &queue, &source)
            .context("failed to upload source image")?;

        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            &*window,
            Some(window.scale_factor() as f32),
            Some(device.limits().max_texture_dimension_2d as usize),
        );
        let gui = Gui {
            ctx,
            state,
            renderer: egui_wgpu::Renderer::new(&device, config.format, None, 1),
        };

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            renderer,
            gui,
            texture,
            settings,
            input: InputState::default(),
            last_error: None,
            has_geometry: false,
            inverted: false,
        })
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.renderer
                .update_screen(&self.queue, new_size.width, new_size.height);
            log::debug!("Resized to {}x{}", new_size.width, new_size.height);
        }
    }

    fn reconfigure_surface(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    fn handle_key(&mut self, code: KeyCode) {
        let Some(action) = input::action_for_key(code, self.input.shift) else {
            return;
        };
        let changed = input::apply(action, &mut self.settings, &mut self.input);
        log::debug!("{:?} (changed: {})", action, changed);
    }

    fn panel_status(&self) -> PanelStatus {
        PanelStatus {
            image_size: self.texture.dimensions(),
            error: self.last_error.as_ref().map(ToString::to_string),
            inverted: self.inverted,
            margin_side: self.input.margin_side,
        }
    }

    /// Rebuilds the mesh from the settings and uploads it.
    fn update_mesh(&mut self) {
        match self.settings.build_mesh(&self.texture) {
            Ok(mesh) => {
                self.renderer.upload_mesh(&self.queue, mesh.export());
                self.has_geometry = true;
                self.inverted = mesh.is_inverted();
                if self.last_error.take().is_some() {
                    log::info!("Margins valid again");
                }
            }
            Err(e) => {
                // Keep drawing the last valid geometry.
                if self.last_error.as_ref() != Some(&e) {
                    log::warn!("Rejected settings: {}", e);
                    self.last_error = Some(e);
                }
            }
        }
    }

    /// One frame: run the panel, rebuild the mesh, draw the mesh then the panel.
    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let status = self.panel_status();
        let raw_input = self.gui.state.take_egui_input(&self.window);
        let settings = &mut self.settings;
        let full_output = self.gui.ctx.run(raw_input, |ctx| {
            if panel::settings_panel(ctx, settings, &status) {
                log::trace!("Panel edit: {:?}", settings.margins);
            }
        });
        self.gui
            .state
            .handle_platform_output(&self.window, full_output.platform_output);

        self.update_mesh();

        let paint_jobs = self
            .gui
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };
        for (id, delta) in &full_output.textures_delta.set {
            self.gui
                .renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        let gui_commands = self.gui.renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen,
        );

        {
            let [r, g, b, _] = BACKGROUND.map(|c| c as f64 / 255.0);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if self.has_geometry {
                self.renderer.draw(&mut render_pass, &self.texture);
            }
            self.gui
                .renderer
                .render(&mut render_pass, &paint_jobs, &screen);
        }

        self.queue.submit(
            gui_commands
                .into_iter()
                .chain(std::iter::once(encoder.finish())),
        );
        output.present();

        for id in &full_output.textures_delta.free {
            self.gui.renderer.free_texture(id);
        }
        Ok(())
    }
}

/// Opens the editor window and runs until it is closed.
pub fn run(settings: EditorSettings, source: RgbaImage) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;

    let window = WindowBuilder::new()
        .with_title("Nine-slice editor")
        .with_inner_size(PhysicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
        .build(&event_loop)
        .context("failed to create window")?;
    let window = Arc::new(window);

    log::info!(
        "Editor window {}x{}, source {}x{}",
        WINDOW_WIDTH,
        WINDOW_HEIGHT,
        source.width(),
        source.height()
    );
    log::info!(
        "Shortcuts: arrows resize, IJKL move, [ ] select vertex, 1-4 pick margin, -/= adjust, R/G/B/A tint (shift: fine / decrease), Space reset tints, Esc quit"
    );

    let mut app = pollster::block_on(App::new(window, settings, source))?;

    event_loop.run(move |event, control_flow| match event {
        Event::WindowEvent {
            ref event,
            window_id,
        } if window_id == app.window.id() => {
            let response = app.gui.state.on_window_event(&app.window, event);
            if response.repaint {
                app.window.request_redraw();
            }

            match event {
                WindowEvent::CloseRequested => control_flow.exit(),
                WindowEvent::Resized(physical_size) => app.resize(*physical_size),
                WindowEvent::ModifiersChanged(modifiers) => {
                    app.input.shift = modifiers.state().shift_key();
                }
                // Keys typed into panel widgets are not shortcuts.
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            physical_key: PhysicalKey::Code(code),
                            state: ElementState::Pressed,
                            ..
                        },
                    ..
                } if !response.consumed => {
                    if *code == KeyCode::Escape {
                        control_flow.exit();
                    } else {
                        app.handle_key(*code);
                    }
                }
                WindowEvent::RedrawRequested => match app.render() {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => app.resize(app.size),
                    Err(wgpu::SurfaceError::Outdated) => app.reconfigure_surface(),
                    Err(wgpu::SurfaceError::OutOfMemory) => control_flow.exit(),
                    Err(e) => log::warn!("Render error: {:?}", e),
                },
                _ => {}
            }
        }
        Event::AboutToWait => app.window.request_redraw(),
        _ => {}
    })?;

    Ok(())
}
