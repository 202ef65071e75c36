// main.rs — desktop host: trigger surface, modal viewer and input plumbing

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // 在 Release 模式下隐藏控制台窗口

mod renderer;

use panorama_tour::i18n::{self, tr, tr_with};
use panorama_tour::{
    LaunchOptions, Message, PanoramaResource, PointerInput, ProjectionSmoother, SessionEvent,
    ThreadImageLoader, TouchPhase as GesturePhase, ViewerConfig, ViewerSession, WindowFullscreen,
};
use renderer::Renderer;

use winit::{
    dpi::{LogicalSize, PhysicalPosition},
    event::*,
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

type DesktopSession = ViewerSession<ThreadImageLoader, WindowFullscreen>;

/// Browser wheel events report ~100 px per notch; winit reports lines.
const PIXELS_PER_WHEEL_LINE: f32 = 100.0;

/// The embedding page's side: what to open and how it is previewed.
struct Trigger {
    resource: Option<PanoramaResource>,
    thumbnail: Option<egui::TextureHandle>,
    auto_rotate: bool,
}

impl Trigger {
    fn new(opts: &LaunchOptions, ctx: &egui::Context) -> Self {
        let resource = opts.panorama.as_ref().map(|url| {
            let title = opts.display_title().unwrap_or_else(|| tr("app.title"));
            let resource = PanoramaResource::new(url.clone(), title);
            match &opts.thumbnail {
                Some(t) => resource.with_thumbnail(t.clone()),
                None => resource,
            }
        });
        let mut trigger = Self {
            resource: None,
            thumbnail: None,
            auto_rotate: opts.auto_rotate,
        };
        if let Some(resource) = resource {
            trigger.set_resource(resource, ctx);
        }
        trigger
    }

    fn set_resource(&mut self, resource: PanoramaResource, ctx: &egui::Context) {
        self.thumbnail = resource
            .thumbnail_url
            .as_deref()
            .and_then(|path| load_thumbnail(ctx, path));
        self.resource = Some(resource);
    }
}

fn load_thumbnail(ctx: &egui::Context, path: &str) -> Option<egui::TextureHandle> {
    let path = path.strip_prefix("file://").unwrap_or(path);
    match image::open(path) {
        Ok(img) => {
            let rgba = img.thumbnail(480, 240).to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let color = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
            Some(ctx.load_texture("thumbnail", color, egui::TextureOptions::LINEAR))
        }
        Err(e) => {
            log::warn!(
                "{}",
                tr_with(
                    "log.thumbnail_failed",
                    &[("path", path.to_string()), ("err", e.to_string())]
                )
            );
            None
        }
    }
}

/// What the UI asked for during a frame; applied once rendering is done.
enum UiAction {
    Open,
    Close,
    Pick,
    Send(Message),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts = LaunchOptions::from_env();
    i18n::init(i18n::resolve_lang(opts.lang.as_deref()));
    let config = ViewerConfig::resolve(opts.config.as_deref());

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title(tr("app.title"))
        .with_inner_size(LogicalSize::new(1280, 720))
        .build(&event_loop)
    {
        Ok(w) => Arc::new(w),
        Err(e) => {
            log::error!("could not create window: {e}");
            return;
        }
    };

    let mut renderer = match pollster::block_on(Renderer::new(window.clone())) {
        Ok(r) => r,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };

    let mut trigger = Trigger::new(&opts, &renderer.egui_ctx);
    let mut session: Option<DesktopSession> = None;
    let mut smoother = ProjectionSmoother::new();
    let mut cursor: Option<PhysicalPosition<f64>> = None;
    let mut last_frame = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match event {
            Event::WindowEvent { event, .. } => {
                // 先让 egui 处理事件
                let response = renderer.egui_state.on_event(&renderer.egui_ctx, &event);
                if response.consumed {
                    // a release over the UI must still end a drag started on the backdrop
                    if let Some(input) = drag_release(&event) {
                        send(&mut session, Message::Pointer(input));
                    }
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        if let Some(s) = session.as_mut() {
                            s.close();
                        }
                        *control_flow = ControlFlow::Exit;
                    }

                    WindowEvent::Resized(new_size) => {
                        renderer.resize(new_size);
                    }

                    WindowEvent::KeyboardInput { input, .. } => {
                        if input.state == ElementState::Pressed {
                            if let Some(key) = input.virtual_keycode {
                                let action = key_action(key, session.as_ref());
                                if let Some(action) = action {
                                    apply(
                                        action,
                                        &mut session,
                                        &mut trigger,
                                        &mut renderer,
                                        &mut smoother,
                                        &config,
                                        &window,
                                    );
                                }
                            }
                        }
                    }

                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left {
                            let input = match (state, cursor) {
                                (ElementState::Pressed, Some(p)) => PointerInput::MouseDown {
                                    x: p.x as i32,
                                    y: p.y as i32,
                                },
                                (ElementState::Pressed, None) => return,
                                (ElementState::Released, _) => PointerInput::MouseUp,
                            };
                            send(&mut session, Message::Pointer(input));
                        }
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        cursor = Some(position);
                        send(
                            &mut session,
                            Message::Pointer(PointerInput::MouseMove {
                                x: position.x as i32,
                                y: position.y as i32,
                            }),
                        );
                    }

                    WindowEvent::CursorLeft { .. } => {
                        cursor = None;
                        send(&mut session, Message::Pointer(PointerInput::Leave));
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let delta_y = match delta {
                            MouseScrollDelta::LineDelta(_, y) => -y * PIXELS_PER_WHEEL_LINE,
                            MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32),
                        };
                        send(&mut session, Message::Wheel { delta_y });
                    }

                    WindowEvent::Touch(touch) => {
                        send(&mut session, Message::Pointer(touch_input(&touch)));
                    }

                    WindowEvent::DroppedFile(path) => {
                        let title = file_title(&path);
                        trigger.set_resource(
                            PanoramaResource::new(path.to_string_lossy(), title),
                            &renderer.egui_ctx,
                        );
                    }

                    _ => {}
                }
            }

            Event::RedrawRequested(_) => {
                let now = Instant::now();
                let dt = now.duration_since(last_frame);
                last_frame = now;

                if let Some(s) = session.as_mut() {
                    s.advance_frame(dt);
                    for ev in s.pump() {
                        match ev {
                            SessionEvent::Loaded(img) => renderer.load_panorama(img),
                            SessionEvent::Failed(_) => renderer.clear_panorama(),
                            SessionEvent::FullscreenChanged(on) => {
                                log::debug!("fullscreen: {on}");
                            }
                            SessionEvent::Progress(_) => {}
                        }
                    }
                    let shown = smoother.update(s.projection(), dt);
                    renderer.update_projection(&shown);
                }

                let mut actions = Vec::new();
                let render_result = renderer.render_with_ui(&window, |ctx| {
                    draw_ui(ctx, session.as_ref(), &trigger, &mut actions);
                });

                for action in actions {
                    apply(
                        action,
                        &mut session,
                        &mut trigger,
                        &mut renderer,
                        &mut smoother,
                        &config,
                        &window,
                    );
                }

                match render_result {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => renderer.resize(renderer.size),
                    Err(wgpu::SurfaceError::OutOfMemory) => *control_flow = ControlFlow::Exit,
                    Err(e) => log::error!("render error: {e:?}"),
                }
            }

            Event::MainEventsCleared => {
                window.request_redraw();
            }

            _ => {}
        }
    });
}

fn send(session: &mut Option<DesktopSession>, message: Message) {
    if let Some(s) = session.as_mut() {
        s.dispatch(message);
    }
}

fn touch_input(touch: &Touch) -> PointerInput {
    let phase = match touch.phase {
        TouchPhase::Started => GesturePhase::Started,
        TouchPhase::Moved => GesturePhase::Moved,
        TouchPhase::Ended => GesturePhase::Ended,
        TouchPhase::Cancelled => GesturePhase::Cancelled,
    };
    PointerInput::Touch {
        id: touch.id,
        phase,
        x: touch.location.x as i32,
        y: touch.location.y as i32,
    }
}

/// Pointer releases that still matter to the viewer when egui took the event.
fn drag_release(event: &WindowEvent<'_>) -> Option<PointerInput> {
    match event {
        WindowEvent::MouseInput {
            state: ElementState::Released,
            button: MouseButton::Left,
            ..
        } => Some(PointerInput::MouseUp),
        WindowEvent::Touch(touch)
            if matches!(touch.phase, TouchPhase::Ended | TouchPhase::Cancelled) =>
        {
            Some(touch_input(touch))
        }
        _ => None,
    }
}

fn key_action(key: VirtualKeyCode, session: Option<&DesktopSession>) -> Option<UiAction> {
    let Some(s) = session else {
        return match key {
            VirtualKeyCode::Return | VirtualKeyCode::Space => Some(UiAction::Open),
            VirtualKeyCode::O => Some(UiAction::Pick),
            _ => None,
        };
    };
    match key {
        VirtualKeyCode::F11 => Some(UiAction::Send(Message::ToggleFullscreen)),
        VirtualKeyCode::Escape if s.is_fullscreen() => Some(UiAction::Send(Message::ToggleFullscreen)),
        VirtualKeyCode::Escape => Some(UiAction::Close),
        VirtualKeyCode::R => Some(UiAction::Send(Message::Reset)),
        VirtualKeyCode::Equals | VirtualKeyCode::Plus | VirtualKeyCode::NumpadAdd => {
            Some(UiAction::Send(Message::ZoomIn))
        }
        VirtualKeyCode::Minus | VirtualKeyCode::NumpadSubtract => {
            Some(UiAction::Send(Message::ZoomOut))
        }
        _ => None,
    }
}

fn apply(
    action: UiAction,
    session: &mut Option<DesktopSession>,
    trigger: &mut Trigger,
    renderer: &mut Renderer,
    smoother: &mut ProjectionSmoother,
    config: &ViewerConfig,
    window: &Arc<Window>,
) {
    match action {
        UiAction::Open => {
            let Some(resource) = trigger.resource.clone() else {
                return;
            };
            if let Some(mut old) = session.take() {
                old.close();
            }
            renderer.clear_panorama();
            smoother.reset();
            *session = Some(ViewerSession::open(
                resource,
                trigger.auto_rotate,
                config.clone(),
                ThreadImageLoader::new(),
                WindowFullscreen::new(window.clone()),
            ));
        }
        UiAction::Close => {
            if let Some(mut s) = session.take() {
                s.close();
            }
            renderer.clear_panorama();
        }
        UiAction::Pick => {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter(&tr("file.filter.images"), &["jpg", "jpeg", "png", "webp", "bmp"])
                .pick_file()
            {
                let title = file_title(&path);
                trigger.set_resource(
                    PanoramaResource::new(path.to_string_lossy(), title),
                    &renderer.egui_ctx,
                );
            }
        }
        UiAction::Send(message) => send(session, message),
    }
}

fn file_title(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| tr("app.title"))
}

fn draw_ui(
    ctx: &egui::Context,
    session: Option<&DesktopSession>,
    trigger: &Trigger,
    actions: &mut Vec<UiAction>,
) {
    match session {
        None => draw_trigger(ctx, trigger, actions),
        Some(s) => draw_viewer(ctx, s, actions),
    }
}

fn draw_trigger(ctx: &egui::Context, trigger: &Trigger, actions: &mut Vec<UiAction>) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(ui.available_height() * 0.2);

            let Some(resource) = &trigger.resource else {
                ui.label(tr("trigger.no_panorama"));
                if ui.button(tr("trigger.pick")).clicked() {
                    actions.push(UiAction::Pick);
                }
                return;
            };

            ui.heading(&resource.title);
            ui.add_space(8.0);

            if let Some(tex) = &trigger.thumbnail {
                let sized = egui::load::SizedTexture::new(tex.id(), tex.size_vec2());
                let response = ui
                    .add(egui::Image::new(sized))
                    .interact(egui::Sense::click());
                if response.clicked() {
                    actions.push(UiAction::Open);
                }
                ui.add_space(8.0);
            }

            if ui.button(tr("trigger.open")).clicked() {
                actions.push(UiAction::Open);
            }
            if ui.small_button(tr("trigger.pick")).clicked() {
                actions.push(UiAction::Pick);
            }
        });
    });
}

fn draw_viewer(ctx: &egui::Context, s: &DesktopSession, actions: &mut Vec<UiAction>) {
    egui::Area::new("viewer_title")
        .anchor(egui::Align2::LEFT_TOP, [12.0, 12.0])
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.strong(&s.resource().title);
            });
        });

    egui::Area::new("viewer_controls")
        .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(s.zoom().can_zoom_in(), egui::Button::new("+"))
                        .on_hover_text(tr("viewer.zoom_in"))
                        .clicked()
                    {
                        actions.push(UiAction::Send(Message::ZoomIn));
                    }
                    if ui
                        .add_enabled(s.zoom().can_zoom_out(), egui::Button::new("-"))
                        .on_hover_text(tr("viewer.zoom_out"))
                        .clicked()
                    {
                        actions.push(UiAction::Send(Message::ZoomOut));
                    }
                    if ui.button(tr("viewer.reset")).clicked() {
                        actions.push(UiAction::Send(Message::Reset));
                    }

                    let mut auto = s.auto_rotate_enabled();
                    if ui.checkbox(&mut auto, tr("viewer.auto_rotate")).changed() {
                        actions.push(UiAction::Send(Message::SetAutoRotate(auto)));
                    }

                    let fullscreen_label = if s.is_fullscreen() {
                        tr("viewer.fullscreen.exit")
                    } else {
                        tr("viewer.fullscreen.enter")
                    };
                    if ui.button(fullscreen_label).clicked() {
                        actions.push(UiAction::Send(Message::ToggleFullscreen));
                    }
                    if ui.button(tr("viewer.close")).clicked() {
                        actions.push(UiAction::Close);
                    }
                });
            });
        });

    let load = s.load_state();
    if load.is_loading || load.failed {
        egui::Area::new("viewer_loading")
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    if load.failed {
                        ui.label(
                            egui::RichText::new(tr("viewer.load_failed"))
                                .color(egui::Color32::LIGHT_RED),
                        );
                    } else {
                        let percent = load.progress_percent;
                        ui.add(
                            egui::ProgressBar::new(f32::from(percent) / 100.0)
                                .desired_width(260.0)
                                .text(tr_with(
                                    "viewer.loading",
                                    &[("percent", percent.to_string())],
                                )),
                        );
                    }
                });
            });
    }

    egui::Area::new("viewer_hint")
        .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -12.0])
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.label(tr("viewer.hint"));
            });
        });

    egui::Area::new("viewer_status")
        .anchor(egui::Align2::LEFT_BOTTOM, [12.0, -12.0])
        .interactable(false)
        .show(ctx, |ui| {
            let o = s.orientation();
            ui.label(
                egui::RichText::new(tr_with(
                    "status.orientation",
                    &[
                        ("yaw", format!("{:.1}", o.display_yaw())),
                        ("pitch", format!("{:.1}", o.pitch)),
                        ("fov", format!("{:.0}", s.fov())),
                    ],
                ))
                .small()
                .color(egui::Color32::from_gray(200)),
            );
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(phase: TouchPhase) -> WindowEvent<'static> {
        WindowEvent::Touch(Touch {
            device_id: unsafe { DeviceId::dummy() },
            phase,
            location: PhysicalPosition::new(640.0, 30.0),
            force: None,
            id: 7,
        })
    }

    #[test]
    fn touch_lifted_over_controls_still_ends_drag() {
        assert_eq!(
            drag_release(&touch(TouchPhase::Ended)),
            Some(PointerInput::Touch {
                id: 7,
                phase: GesturePhase::Ended,
                x: 640,
                y: 30
            })
        );
        assert!(matches!(
            drag_release(&touch(TouchPhase::Cancelled)),
            Some(PointerInput::Touch {
                phase: GesturePhase::Cancelled,
                ..
            })
        ));
        assert_eq!(drag_release(&touch(TouchPhase::Moved)), None);
        assert_eq!(drag_release(&touch(TouchPhase::Started)), None);
    }

    #[test]
    #[allow(deprecated)]
    fn mouse_release_over_controls_still_ends_drag() {
        let release = WindowEvent::MouseInput {
            device_id: unsafe { DeviceId::dummy() },
            state: ElementState::Released,
            button: MouseButton::Left,
            modifiers: ModifiersState::empty(),
        };
        assert_eq!(drag_release(&release), Some(PointerInput::MouseUp));
    }
}
