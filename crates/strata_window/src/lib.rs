use std::sync::Arc;

use flecs_ecs::prelude::*;
use strata_core::{App, Input, Plugin, Viewport};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

/// The OS window. Shared so the GPU surface can hold its own handle.
#[derive(Component)]
pub struct MainWindow(pub Arc<Window>);

pub struct WindowPlugin;

impl Plugin for WindowPlugin {
    fn build(&self, app: &mut App) {
        // Set by the runner once the event loop hands us a window
        app.world
            .component::<MainWindow>()
            .add_trait::<flecs::Singleton>();
    }
}

// The State Machine that holds the App while waiting for the OS
struct StrataRunner {
    app: App,
    window: Option<Arc<Window>>,
}

impl StrataRunner {
    fn new(app: App) -> Self {
        Self { app, window: None }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), winit::error::OsError> {
        let settings = self.app.config().window;
        let attributes = Window::default_attributes()
            .with_title(settings.title)
            .with_inner_size(PhysicalSize::new(settings.width, settings.height));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let size = window.inner_size();
        self.app.world.set(Viewport {
            width: size.width,
            height: size.height,
            resized: false,
        });
        self.app.world.set(MainWindow(window.clone()));
        self.window = Some(window);
        Ok(())
    }
}

impl ApplicationHandler for StrataRunner {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.create_window(event_loop) {
            log::error!("Failed to create window: {err}");
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        // raw motion keeps working when the cursor hits the window edge
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.app
                .world
                .get::<&mut Input>(|input| input.add_mouse_motion(dx as f32, dy as f32));
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => self.app.world.get::<&mut Input>(|input| match state {
                ElementState::Pressed => input.press(code),
                ElementState::Released => input.release(code),
            }),
            WindowEvent::MouseInput { state, button, .. } => {
                self.app.world.get::<&mut Input>(|input| match state {
                    ElementState::Pressed => input.press_mouse(button),
                    ElementState::Released => input.release_mouse(button),
                })
            }
            WindowEvent::Resized(size) => {
                self.app.world.set(Viewport {
                    width: size.width,
                    height: size.height,
                    resized: true,
                });
            }
            WindowEvent::CloseRequested => {
                log::info!("Close requested; stopping");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.app.update();
                if !self.app.running {
                    event_loop.exit();
                }
            }
            _ => (),
        }
    }
}

/// Runs `app` until the window closes or a system calls `world.quit()`.
pub fn run_strata_app(app: App) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;

    // ControlFlow::Poll continuously runs the event loop, even if the OS hasn't
    // dispatched any events. Frames are paced by the surface present mode.
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut runner = StrataRunner::new(app);
    event_loop.run_app(&mut runner)
}
