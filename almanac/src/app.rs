use anyhow::{Context, Result};
use chrono::Local;
use smithay_client_toolkit as sctk;
use sctk::activation::{ActivationHandler, ActivationState, RequestData};
use sctk::compositor::{CompositorHandler, CompositorState};
use sctk::output::{OutputHandler, OutputState};
use sctk::registry::{ProvidesRegistryState, RegistryState};
use sctk::registry_handlers;
use sctk::seat::pointer::cursor_shape::CursorShapeManager;
use sctk::seat::pointer::{AxisScroll, PointerEvent, PointerEventKind, PointerHandler};
use sctk::seat::{Capability, SeatHandler, SeatState};
use sctk::reexports::protocols::wp::cursor_shape::v1::client::wp_cursor_shape_device_v1::Shape;
use sctk::shell::wlr_layer::{
    KeyboardInteractivity, LayerShell, LayerShellHandler, LayerSurface, LayerSurfaceConfigure,
};
use sctk::shell::xdg::XdgShell;
use sctk::shell::xdg::window::{Window, WindowConfigure, WindowDecorations, WindowHandler};
use sctk::shell::WaylandSurface;
use sctk::shm::slot::SlotPool;
use sctk::shm::{Shm, ShmHandler};
use sctk::{
    delegate_activation, delegate_compositor, delegate_layer, delegate_output, delegate_pointer,
    delegate_registry, delegate_seat, delegate_shm, delegate_xdg_shell, delegate_xdg_window,
};
use tiny_skia::Pixmap;
use wayland_client::globals::GlobalList;
use wayland_client::protocol::{wl_output, wl_pointer, wl_seat, wl_shm, wl_surface};
use wayland_client::{Connection, QueueHandle};

use crate::calendar::Calendar;
use crate::cli::Options;
use crate::clock::format_clock;
use crate::config::{Config, load_colors};
use crate::controller::{Effects, WindowState};
use crate::draw::{Text, copy_to_argb};
use crate::layout::{HEIGHT, Hit, WIDTH, layout};
use crate::scroll::ScrollSteps;
use crate::view::{Style, paint};

const NAMESPACE: &str = "almanac";
const BTN_LEFT: u32 = 0x110;

/// Which shell global the surface is created with, chosen once at startup.
enum ShellGlobal {
    Layer(LayerShell),
    Xdg(XdgShell),
}

enum Shell {
    Layer(LayerSurface),
    Window(Window),
}

impl Shell {
    fn wl_surface(&self) -> &wl_surface::WlSurface {
        match self {
            Shell::Layer(layer) => layer.wl_surface(),
            Shell::Window(window) => window.wl_surface(),
        }
    }
}

/// The single window, built on the first activation.
struct Widget {
    shell: Shell,
    calendar: Calendar,
    label: String,
    configured: bool,
}

pub struct App {
    registry_state: RegistryState,
    seat_state: SeatState,
    output_state: OutputState,
    compositor: CompositorState,
    shell_global: ShellGlobal,
    activation: Option<ActivationState>,
    shm: Shm,
    pool: SlotPool,
    pointer: Option<wl_pointer::WlPointer>,
    cursor_shape_manager: Option<CursorShapeManager>,
    options: Options,
    state: WindowState,
    widget: Option<Widget>,
    width: u32,
    height: u32,
    text: Text,
    style: Style,
    hover: Hit,
    scroll: ScrollSteps,
    pub exit: bool,
}

impl App {
    pub fn new(globals: &GlobalList, qh: &QueueHandle<Self>, options: Options, cfg: Config) -> Result<Self> {
        let compositor = CompositorState::bind(globals, qh).context("wl_compositor not available")?;
        let shm = Shm::bind(globals, qh).context("wl_shm not available")?;
        let shell_global = if options.layer_shell {
            ShellGlobal::Layer(LayerShell::bind(globals, qh)
                .context("wlr-layer-shell not available, try --no-layer-shell")?)
        } else {
            ShellGlobal::Xdg(XdgShell::bind(globals, qh).context("xdg_wm_base not available")?)
        };
        let pool = SlotPool::new((WIDTH * HEIGHT * 4) as usize, &shm)
            .context("failed to create shm pool")?;
        let cursor_shape_manager = CursorShapeManager::bind(globals, qh).ok();
        // layer surfaces never take focus, so only toplevels are raised
        let activation = match &shell_global {
            ShellGlobal::Xdg(_) => ActivationState::bind(globals, qh)
                .inspect_err(|e| log::info!("xdg-activation not available: {e}"))
                .ok(),
            ShellGlobal::Layer(_) => None,
        };

        Ok(Self {
            registry_state: RegistryState::new(globals),
            seat_state: SeatState::new(globals, qh),
            output_state: OutputState::new(globals, qh),
            compositor,
            shell_global,
            activation,
            shm,
            pool,
            pointer: None,
            cursor_shape_manager,
            options,
            state: WindowState::Unborn,
            widget: None,
            width: WIDTH,
            height: HEIGHT,
            text: Text::new(cfg.font.as_deref()),
            style: Style {
                colors: load_colors(cfg.color_file.as_deref()),
                label_size: cfg.label_size,
                day_size: cfg.day_size,
            },
            hover: Hit::None,
            scroll: ScrollSteps::default(),
            exit: false,
        })
    }

    /// `token` is an xdg-activation token from whoever triggered this.
    pub fn activate(&mut self, qh: &QueueHandle<Self>, token: Option<String>) {
        let (next, action) = self.state.activate(self.options.layer_shell);
        log::debug!("activate: {:?} -> {:?} ({:?})", self.state, next, action);
        self.state = next;
        action.apply(&mut Activating { app: self, qh, token });
    }

    /// Asks the compositor to focus and raise a toplevel.
    fn raise(&self, token: Option<String>) {
        let (Some(token), Some(activation), Some(widget)) = (token, &self.activation, &self.widget) else {
            return;
        };
        if let Shell::Window(window) = &widget.shell {
            activation.activate::<Self>(window.wl_surface(), token);
        }
    }

    fn construct(&mut self, qh: &QueueHandle<Self>) {
        let surface = self.compositor.create_surface(qh);
        let shell = match &self.shell_global {
            ShellGlobal::Layer(layer_shell) => {
                let layer = layer_shell.create_layer_surface(
                    qh, surface, self.options.layer, Some(NAMESPACE), None);
                layer.set_anchor(self.options.anchors.into());
                layer.set_size(WIDTH, HEIGHT);
                layer.set_keyboard_interactivity(KeyboardInteractivity::None);
                layer.commit();
                log::info!("layer surface on {:?}, anchors {:?}", self.options.layer, self.options.anchors);
                Shell::Layer(layer)
            }
            ShellGlobal::Xdg(xdg_shell) => {
                let window = xdg_shell.create_window(surface, WindowDecorations::RequestServer, qh);
                window.set_title(NAMESPACE);
                window.set_app_id(NAMESPACE);
                window.set_min_size(Some((WIDTH, HEIGHT)));
                window.commit();
                log::info!("xdg toplevel without layer-shell");
                Shell::Window(window)
            }
        };
        self.widget = Some(Widget {
            shell,
            calendar: Calendar::new(Local::now().date_naive()),
            label: format_clock(&Local::now()),
            configured: false,
        });
    }

    fn show_today(&mut self) {
        if let Some(widget) = self.widget.as_mut() {
            widget.calendar.show_today(Local::now().date_naive());
        }
    }

    fn show(&mut self) {
        let Some(widget) = self.widget.as_ref() else { return };
        if let Shell::Layer(layer) = &widget.shell {
            if !widget.configured {
                // an unmapped layer surface is remapped by an empty commit; draw on configure
                layer.commit();
                return;
            }
        }
        self.draw();
    }

    fn hide(&mut self) {
        let Some(widget) = self.widget.as_mut() else { return };
        let surface = widget.shell.wl_surface();
        surface.attach(None, 0, 0);
        surface.commit();
        widget.configured = false;
        self.hover = Hit::None;
    }

    /// Clock timer callback. Keeps the label current even while hidden.
    pub fn tick(&mut self) {
        let Some(widget) = self.widget.as_mut() else { return };
        let label = format_clock(&Local::now());
        if label != widget.label {
            widget.label = label;
            self.draw();
        }
    }

    fn configured(&mut self, width: Option<u32>, height: Option<u32>) {
        if let Some(w) = width.filter(|w| *w > 0) { self.width = w; }
        if let Some(h) = height.filter(|h| *h > 0) { self.height = h; }
        // a configure that races a hide must not let the next show skip the remap
        if let Some(widget) = self.widget.as_mut() {
            widget.configured = self.state == WindowState::Visible;
        }
        self.draw();
    }

    fn draw(&mut self) {
        let Some(widget) = self.widget.as_ref() else { return };
        if !widget.configured || self.state != WindowState::Visible {
            return;
        }

        let (width, height) = (self.width, self.height);
        let stride = width as i32 * 4;
        let (buffer, canvas) = match self.pool
            .create_buffer(width as i32, height as i32, stride, wl_shm::Format::Argb8888)
        {
            Ok(b) => b,
            Err(e) => {
                log::warn!("failed to allocate {width}x{height} buffer: {e:?}");
                return;
            }
        };
        let Some(mut pixmap) = Pixmap::new(width, height) else { return };

        let lay = layout(width, height);
        paint(&mut pixmap, &mut self.text, &self.style, &lay,
            &widget.label, &widget.calendar, self.hover);
        copy_to_argb(canvas, &pixmap);

        let surface = widget.shell.wl_surface();
        if let Err(e) = buffer.attach_to(surface) {
            log::warn!("failed to attach buffer: {e:?}");
            return;
        }
        surface.damage_buffer(0, 0, width as i32, height as i32);
        surface.commit();
    }

    fn handle_click(&mut self, x: f64, y: f64) {
        let hit = layout(self.width, self.height).hit(x, y);
        let Some(widget) = self.widget.as_mut() else { return };
        let cal = &mut widget.calendar;
        match hit {
            Hit::PrevMonth => cal.prev_month(),
            Hit::NextMonth => cal.next_month(),
            Hit::PrevYear => cal.prev_year(),
            Hit::NextYear => cal.next_year(),
            Hit::Day { row, col } => cal.select_cell(row, col),
            Hit::None => return,
        }
        self.draw();
    }

    fn handle_scroll(&mut self, x: f64, y: f64, axis: &AxisScroll) {
        if x < 0.0 || y < 0.0 { return; }
        let lay = layout(self.width, self.height);
        if !lay.calendar().contains(x as u32, y as u32) { return; }
        let Some(widget) = self.widget.as_mut() else { return };

        let steps = self.scroll.feed(axis);
        for _ in 0..steps.unsigned_abs() {
            if steps > 0 {
                widget.calendar.next_month();
            } else {
                widget.calendar.prev_month();
            }
        }
        if steps != 0 { self.draw(); }
    }

    fn set_hover(&mut self, hover: Hit) {
        if hover != self.hover {
            self.hover = hover;
            self.draw();
        }
    }
}

/// Applies one activation's effects to the app.
struct Activating<'a> {
    app: &'a mut App,
    qh: &'a QueueHandle<App>,
    token: Option<String>,
}

impl Effects for Activating<'_> {
    fn construct(&mut self) {
        self.app.construct(self.qh);
        self.app.raise(self.token.take());
    }
    fn show_today(&mut self) { self.app.show_today(); }
    fn show(&mut self) {
        self.app.show();
        self.app.raise(self.token.take());
    }
    fn hide(&mut self) { self.app.hide(); }
}

// --- Wayland handler boilerplate ---

impl CompositorHandler for App {
    fn scale_factor_changed(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: i32) {}
    fn transform_changed(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: wl_output::Transform) {}
    fn frame(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: u32) {}
    fn surface_enter(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: &wl_output::WlOutput) {}
    fn surface_leave(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &wl_surface::WlSurface, _: &wl_output::WlOutput) {}
}

impl OutputHandler for App {
    fn output_state(&mut self) -> &mut OutputState { &mut self.output_state }
    fn new_output(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_output::WlOutput) {}
    fn update_output(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_output::WlOutput) {}
    fn output_destroyed(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_output::WlOutput) {}
}

impl SeatHandler for App {
    fn seat_state(&mut self) -> &mut SeatState { &mut self.seat_state }
    fn new_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat) {}
    fn new_capability(&mut self, _: &Connection, qh: &QueueHandle<Self>, seat: wl_seat::WlSeat, capability: Capability) {
        if capability == Capability::Pointer && self.pointer.is_none() {
            match self.seat_state.get_pointer(qh, &seat) {
                Ok(pointer) => self.pointer = Some(pointer),
                Err(e) => log::warn!("failed to get pointer: {e}"),
            }
        }
    }
    fn remove_capability(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat, capability: Capability) {
        if capability == Capability::Pointer {
            if let Some(pointer) = self.pointer.take() {
                pointer.release();
            }
        }
    }
    fn remove_seat(&mut self, _: &Connection, _: &QueueHandle<Self>, _: wl_seat::WlSeat) {}
}

impl PointerHandler for App {
    fn pointer_frame(&mut self, _: &Connection, qh: &QueueHandle<Self>, pointer: &wl_pointer::WlPointer, events: &[PointerEvent]) {
        for event in events {
            let (x, y) = event.position;
            match event.kind {
                PointerEventKind::Enter { serial } => {
                    if let Some(manager) = &self.cursor_shape_manager {
                        let device = manager.get_shape_device(pointer, qh);
                        device.set_shape(serial, Shape::Default);
                        device.destroy();
                    }
                    let hit = layout(self.width, self.height).hit(x, y);
                    self.set_hover(hit);
                }
                PointerEventKind::Press { button: BTN_LEFT, .. } => self.handle_click(x, y),
                PointerEventKind::Motion { .. } => {
                    let hit = layout(self.width, self.height).hit(x, y);
                    self.set_hover(hit);
                }
                PointerEventKind::Leave { .. } => {
                    self.scroll.reset();
                    self.set_hover(Hit::None);
                }
                PointerEventKind::Axis { ref vertical, .. } => {
                    if !vertical.is_none() {
                        self.handle_scroll(x, y, vertical);
                    }
                }
                _ => {}
            }
        }
    }
}

impl ShmHandler for App {
    fn shm_state(&mut self) -> &mut Shm { &mut self.shm }
}

impl LayerShellHandler for App {
    fn closed(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &LayerSurface) {
        log::info!("layer surface closed by compositor");
        self.exit = true;
    }
    fn configure(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &LayerSurface, configure: LayerSurfaceConfigure, _: u32) {
        self.configured(Some(configure.new_size.0), Some(configure.new_size.1));
    }
}

impl WindowHandler for App {
    fn request_close(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &Window) {
        self.exit = true;
    }
    fn configure(&mut self, _: &Connection, _: &QueueHandle<Self>, _: &Window, configure: WindowConfigure, _: u32) {
        self.configured(
            configure.new_size.0.map(|w| w.get()),
            configure.new_size.1.map(|h| h.get()),
        );
    }
}

impl ActivationHandler for App {
    type RequestData = RequestData;
    // tokens only arrive from other processes
    fn new_token(&mut self, _: String, _: &RequestData) {}
}

impl ProvidesRegistryState for App {
    fn registry(&mut self) -> &mut RegistryState { &mut self.registry_state }
    registry_handlers![OutputState, SeatState];
}

delegate_compositor!(App);
delegate_output!(App);
delegate_seat!(App);
delegate_pointer!(App);
delegate_shm!(App);
delegate_layer!(App);
delegate_xdg_shell!(App);
delegate_xdg_window!(App);
delegate_activation!(App);
delegate_registry!(App);
