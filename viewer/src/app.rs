use std::ffi::CString;
use std::num::NonZeroU32;

use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, NotCurrentGlContextSurfaceAccessor,
    PossiblyCurrentContext, PossiblyCurrentContextGlSurfaceAccessor, Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SurfaceAttributesBuilder, WindowSurface};

use glutin_winit::DisplayBuilder;

use raw_window_handle::HasRawWindowHandle;

use thiserror::Error;

use winit::dpi::{PhysicalSize, Size};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use seqview::sequence::{Frame, Sequence};

use gl_wrapper::geometry::Quad;
use gl_wrapper::program::{PBError, Program, ProgramBuilder};
use gl_wrapper::renderer::GlRenderer;
use gl_wrapper::texture::{Texture2D, TextureError, TextureFilter, TextureFormats};

pub struct App {
    event_loop: EventLoop<()>,
    gl_context: PossiblyCurrentContext,
    rgb_window: GlWindow,
    view_window: GlWindow,
    quad: Quad,
    program: Program,
    rgb_texture: Texture2D,
    view_texture: Texture2D,
}

impl App {
    pub fn new(first: &Frame) -> Result<Self, AppError> {
        let event_loop = EventLoop::new();

        let rgb_builder = WindowBuilder::new()
            .with_inner_size(Size::Physical(PhysicalSize::new(
                first.rgb.width() as u32,
                first.rgb.height() as u32,
            )))
            .with_title("rgb");
        let display_builder = DisplayBuilder::new().with_window_builder(Some(rgb_builder));
        let template = ConfigTemplateBuilder::new();

        let (rgb_window, gl_config) = display_builder
            .build(&event_loop, template, |mut configs| configs.next().unwrap())
            .unwrap();
        let rgb_window = rgb_window.unwrap();

        let view_builder = WindowBuilder::new()
            .with_inner_size(Size::Physical(PhysicalSize::new(
                first.view.width() as u32,
                first.view.height() as u32,
            )))
            .with_title("view");
        let view_window =
            glutin_winit::finalize_window(&event_loop, view_builder, &gl_config).unwrap();

        let handle = rgb_window.raw_window_handle();
        let gl_display = gl_config.display();

        let context_attr = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(4, 5))))
            .build(Some(handle));

        let rgb_window = GlWindow::new(rgb_window, &gl_config);
        let view_window = GlWindow::new(view_window, &gl_config);

        let gl_context = unsafe {
            gl_display
                .create_context(&gl_config, &context_attr)
                .unwrap()
        }
        .make_current(&rgb_window.surface)
        .unwrap();

        gl::load_with(|s| {
            gl_display
                .get_proc_address(CString::new(s).unwrap().as_c_str())
                .cast()
        });

        let quad = Quad::new();
        let program = ProgramBuilder::new(
            include_str!("gl_shaders/quad.glsl"),
            include_str!("gl_shaders/blit.glsl"),
        )
        .build()?;

        let rgb_texture = Texture2D::new(
            first.rgb.width() as u32,
            first.rgb.height() as u32,
            first.rgb.data(),
            TextureFormats::RgbaU8,
            TextureFilter::Nearest,
        )?;

        let view_texture = Texture2D::new(
            first.view.width() as u32,
            first.view.height() as u32,
            first.view.data(),
            TextureFormats::RgbaU8,
            TextureFilter::Nearest,
        )?;

        Ok(Self {
            event_loop,
            gl_context,
            rgb_window,
            view_window,
            quad,
            program,
            rgb_texture,
            view_texture,
        })
    }

    /// Runs the display loop, advancing one frame per key press. Exits the
    /// process after the last frame is dismissed or a window is closed.
    pub fn run(self, sequence: Sequence, next: usize) -> ! {
        let Self {
            event_loop,
            gl_context,
            rgb_window,
            view_window,
            quad,
            program,
            rgb_texture,
            view_texture,
        } = self;

        let total = sequence.len();
        let mut next = next;
        let mut gl_renderer = GlRenderer::new();

        event_loop.run(move |event, _window_target, control_flow| {
            *control_flow = ControlFlow::Wait;
            match event {
                Event::WindowEvent { event, window_id } => match event {
                    WindowEvent::Resized(size) => {
                        if size.width != 0 && size.height != 0 {
                            let window = if window_id == rgb_window.window.id() {
                                &rgb_window
                            } else {
                                &view_window
                            };

                            window.surface.resize(
                                &gl_context,
                                NonZeroU32::new(size.width).unwrap(),
                                NonZeroU32::new(size.height).unwrap(),
                            );
                            window.window.request_redraw();
                        }
                    }
                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state != ElementState::Pressed {
                            return;
                        }

                        if next >= total {
                            control_flow.set_exit();
                            return;
                        }

                        match sequence.load_frame(next) {
                            Ok(frame) => {
                                rgb_texture
                                    .update(
                                        frame.rgb.width() as u32,
                                        frame.rgb.height() as u32,
                                        frame.rgb.data(),
                                        TextureFormats::RgbaU8,
                                    )
                                    .unwrap();
                                view_texture
                                    .update(
                                        frame.view.width() as u32,
                                        frame.view.height() as u32,
                                        frame.view.data(),
                                        TextureFormats::RgbaU8,
                                    )
                                    .unwrap();

                                next += 1;

                                rgb_window.window.request_redraw();
                                view_window.window.request_redraw();
                            }
                            Err(e) => {
                                eprintln!("Could not load frame {next}: {e}");
                                control_flow.set_exit_with_code(1);
                            }
                        }
                    }
                    WindowEvent::CloseRequested => {
                        control_flow.set_exit();
                    }
                    _ => (),
                },
                Event::RedrawRequested(window_id) => {
                    let (window, texture) = if window_id == rgb_window.window.id() {
                        (&rgb_window, &rgb_texture)
                    } else {
                        (&view_window, &view_texture)
                    };

                    gl_context.make_current(&window.surface).unwrap();

                    let size = window.window.inner_size();
                    gl_renderer.resize(size.width, size.height);
                    gl_renderer.clear_color(0.0, 0.0, 0.0);

                    texture.bind(0);
                    gl_renderer.draw(&quad, &program);

                    window.surface.swap_buffers(&gl_context).unwrap();
                }
                _ => (),
            }
        })
    }
}

pub struct GlWindow {
    // XXX the surface must be dropped before the window.
    pub surface: Surface<WindowSurface>,
    pub window: Window,
}

impl GlWindow {
    pub fn new(window: Window, config: &Config) -> Self {
        let (width, height): (u32, u32) = window.inner_size().into();
        let raw_window_handle = window.raw_window_handle();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            NonZeroU32::new(width).unwrap(),
            NonZeroU32::new(height).unwrap(),
        );

        let surface = unsafe {
            config
                .display()
                .create_window_surface(config, &attrs)
                .unwrap()
        };

        Self { window, surface }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Program(#[from] PBError),
    #[error("{0}")]
    Texture(#[from] TextureError),
}
