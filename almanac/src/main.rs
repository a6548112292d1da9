mod app;
mod calendar;
mod cli;
mod clock;
mod config;
mod controller;
mod draw;
mod instance;
mod layout;
mod scroll;
mod view;

use std::io::ErrorKind;
use std::os::unix::net::UnixListener;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use smithay_client_toolkit::reexports::calloop::generic::Generic;
use smithay_client_toolkit::reexports::calloop::timer::{TimeoutAction, Timer};
use smithay_client_toolkit::reexports::calloop::{EventLoop, Interest, Mode, PostAction};
use smithay_client_toolkit::reexports::calloop_wayland_source::WaylandSource;
use wayland_client::Connection;
use wayland_client::globals::registry_queue_init;

use app::App;
use cli::{Cli, Options};
use clock::TICK_MS;
use instance::{Instance, Request};

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let dir = instance::runtime_dir();
    match instance::claim(&dir)? {
        Instance::Remote => {
            instance::forward_activation(&dir, instance::activation_token().as_deref())?;
            log::info!("activated the running instance");
            Ok(())
        }
        Instance::Primary { guard, listener } => {
            let result = run(cli.options(), listener);
            drop(guard);
            result
        }
    }
}

fn run(options: Options, listener: UnixListener) -> Result<()> {
    let cfg = config::load_config();

    let conn = Connection::connect_to_env().context("failed to connect to the Wayland compositor")?;
    let (globals, event_queue) = registry_queue_init::<App>(&conn)
        .context("failed to initialize the Wayland registry")?;
    let qh = event_queue.handle();

    let mut event_loop: EventLoop<App> = EventLoop::try_new().context("failed to create event loop")?;
    let loop_handle = event_loop.handle();
    WaylandSource::new(conn, event_queue)
        .insert(loop_handle.clone())
        .map_err(|e| anyhow!("failed to insert Wayland source: {}", e.error))?;

    let mut app = App::new(&globals, &qh, options, cfg)?;

    let tick = Duration::from_millis(TICK_MS);
    loop_handle
        .insert_source(Timer::from_duration(tick), move |_, _, app| {
            app.tick();
            TimeoutAction::ToDuration(tick)
        })
        .map_err(|e| anyhow!("failed to insert clock timer: {}", e.error))?;

    let activation_qh = qh.clone();
    loop_handle
        .insert_source(Generic::new(listener, Interest::READ, Mode::Level), move |_, listener, app| {
            match listener.accept() {
                Ok((stream, _)) => match instance::handle_client(stream) {
                    Ok(Request::Activate { token }) => app.activate(&activation_qh, token),
                    Ok(Request::Unknown(_)) => {}
                    Err(e) => log::warn!("activation request failed: {e:#}"),
                },
                Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) => log::warn!("failed to accept activation: {e}"),
            }
            Ok(PostAction::Continue)
        })
        .map_err(|e| anyhow!("failed to insert activation source: {}", e.error))?;

    // launching counts as the first activation
    app.activate(&qh, instance::activation_token());

    loop {
        event_loop.dispatch(tick, &mut app).context("event loop failed")?;
        if app.exit { break; }
    }
    Ok(())
}
