// Hide console window on Windows release builds
#![cfg_attr(
    all(target_os = "windows", not(debug_assertions)),
    windows_subsystem = "windows"
)]

//! Clocktray - Entry Point
//!
//! The winit event loop owns the main thread (required for the tray and
//! native windows); the scheduling core runs on a tokio runtime thread and
//! reaches the main thread through a request channel + event-loop wake.

use clocktray::{
    alarm::{AlarmOrchestrator, UPDATE_ICON_TIMER},
    audio::{AudioSurfaceManager, RodioAudioHost},
    core::events::{command_channel, AppEvent, Command, CommandHandle, CommandRequest, EventSender},
    core::settings::SettingsStore,
    host::audio::AudioHost,
    host::display::{DisplayBounds, DisplayHost, DisplayInfo},
    host::timer::{TimerService, TokioTimerService},
    host::window::{
        ViewMessage, WindowGeometry, WindowHost, WindowHostError, WindowId, WindowParams,
        WindowRecord,
    },
    tray::{TrayAction, TrayManager},
    Config, WindowRegistry,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Local;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    window::{Window, UserAttentionType},
};

/// Requests serviced on the main thread (windows and the tray are not
/// available from other threads)
enum HostRequest {
    CreateWindow {
        params: WindowParams,
        reply: oneshot::Sender<Option<WindowId>>,
    },
    GetWindow {
        id: WindowId,
        reply: oneshot::Sender<Result<WindowRecord, WindowHostError>>,
    },
    ListWindows {
        reply: oneshot::Sender<Vec<WindowRecord>>,
    },
    FocusWindow {
        id: WindowId,
        reply: oneshot::Sender<Result<(), WindowHostError>>,
    },
    RemoveWindow {
        id: WindowId,
        reply: oneshot::Sender<Result<(), WindowHostError>>,
    },
    NotifyView {
        id: WindowId,
        message: ViewMessage,
        reply: oneshot::Sender<Result<(), WindowHostError>>,
    },
    QueryDisplays {
        reply: oneshot::Sender<Vec<DisplayInfo>>,
    },
    RefreshClockFace,
    Quit,
}

/// Sender half of the main-thread request channel. Wakes the winit event
/// loop after every send so requests are serviced promptly under
/// `ControlFlow::Wait`.
#[derive(Clone)]
struct MainThreadHandle {
    tx: mpsc::UnboundedSender<HostRequest>,
    proxy: EventLoopProxy<()>,
}

impl MainThreadHandle {
    fn new(tx: mpsc::UnboundedSender<HostRequest>, proxy: EventLoopProxy<()>) -> Self {
        Self { tx, proxy }
    }

    fn send(&self, request: HostRequest) {
        let _ = self.tx.send(request);
        let _ = self.proxy.send_event(());
    }
}

/// Window management facility backed by winit windows on the main thread
struct WinitWindowHost {
    main: MainThreadHandle,
}

fn main_thread_gone() -> WindowHostError {
    WindowHostError::Unavailable("main thread gone".to_string())
}

#[async_trait]
impl WindowHost for WinitWindowHost {
    async fn list_all(&self) -> Vec<WindowRecord> {
        let (reply, rx) = oneshot::channel();
        self.main.send(HostRequest::ListWindows { reply });
        rx.await.unwrap_or_default()
    }

    async fn create(&self, params: WindowParams) -> Option<WindowId> {
        let (reply, rx) = oneshot::channel();
        self.main.send(HostRequest::CreateWindow { params, reply });
        rx.await.ok().flatten()
    }

    async fn get(&self, id: WindowId) -> Result<WindowRecord, WindowHostError> {
        let (reply, rx) = oneshot::channel();
        self.main.send(HostRequest::GetWindow { id, reply });
        rx.await.unwrap_or_else(|_| Err(main_thread_gone()))
    }

    async fn focus(&self, id: WindowId) -> Result<(), WindowHostError> {
        let (reply, rx) = oneshot::channel();
        self.main.send(HostRequest::FocusWindow { id, reply });
        rx.await.unwrap_or_else(|_| Err(main_thread_gone()))
    }

    async fn remove(&self, id: WindowId) -> Result<(), WindowHostError> {
        let (reply, rx) = oneshot::channel();
        self.main.send(HostRequest::RemoveWindow { id, reply });
        rx.await.unwrap_or_else(|_| Err(main_thread_gone()))
    }

    async fn notify_view(&self, id: WindowId, message: ViewMessage) -> Result<(), WindowHostError> {
        let (reply, rx) = oneshot::channel();
        self.main.send(HostRequest::NotifyView { id, message, reply });
        rx.await.unwrap_or_else(|_| Err(main_thread_gone()))
    }
}

/// Display enumeration backed by winit monitor handles
struct WinitDisplayHost {
    main: MainThreadHandle,
}

#[async_trait]
impl DisplayHost for WinitDisplayHost {
    async fn displays(&self) -> Vec<DisplayInfo> {
        let (reply, rx) = oneshot::channel();
        self.main.send(HostRequest::QueryDisplays { reply });
        rx.await.unwrap_or_default()
    }
}

/// Main-thread application state for the winit event loop
struct App {
    event_tx: EventSender,
    settings: SettingsStore,
    request_rx: mpsc::UnboundedReceiver<HostRequest>,
    tray_manager: Option<TrayManager>,
    /// Live clock windows keyed by host window id
    windows: HashMap<u32, Arc<Window>>,
    next_window_id: u32,
}

impl App {
    fn new(
        event_tx: EventSender,
        settings: SettingsStore,
        request_rx: mpsc::UnboundedReceiver<HostRequest>,
    ) -> Self {
        Self {
            event_tx,
            settings,
            request_rx,
            tray_manager: None,
            windows: HashMap::new(),
            next_window_id: 1,
        }
    }

    fn host_id_for(&self, winit_id: winit::window::WindowId) -> Option<u32> {
        self.windows
            .iter()
            .find(|(_, window)| window.id() == winit_id)
            .map(|(id, _)| *id)
    }

    fn record_for(&self, id: u32) -> Option<WindowRecord> {
        let window = self.windows.get(&id)?;
        let position = window
            .outer_position()
            .unwrap_or(PhysicalPosition::new(0, 0));
        let size = window.inner_size();
        Some(WindowRecord {
            id: WindowId(id),
            geometry: WindowGeometry {
                left: position.x,
                top: position.y,
                width: size.width,
                height: size.height,
            },
        })
    }

    fn create_window(
        &mut self,
        params: WindowParams,
        event_loop: &ActiveEventLoop,
    ) -> Option<WindowId> {
        let geometry = params.geometry;
        let attrs = Window::default_attributes()
            .with_title("Clock")
            .with_inner_size(PhysicalSize::new(geometry.width, geometry.height))
            .with_position(PhysicalPosition::new(geometry.left, geometry.top))
            .with_resizable(false)
            .with_active(params.focused);

        match event_loop.create_window(attrs) {
            Ok(window) => {
                let id = self.next_window_id;
                self.next_window_id += 1;
                self.windows.insert(id, Arc::new(window));
                Some(WindowId(id))
            }
            Err(e) => {
                warn!("failed to create clock window: {}", e);
                None
            }
        }
    }

    fn handle_request(&mut self, request: HostRequest, event_loop: &ActiveEventLoop) {
        match request {
            HostRequest::CreateWindow { params, reply } => {
                let id = self.create_window(params, event_loop);
                let _ = reply.send(id);
            }
            HostRequest::GetWindow { id, reply } => {
                let result = self
                    .record_for(id.0)
                    .ok_or(WindowHostError::NotFound(id));
                let _ = reply.send(result);
            }
            HostRequest::ListWindows { reply } => {
                let ids: Vec<u32> = self.windows.keys().copied().collect();
                let records = ids.iter().filter_map(|id| self.record_for(*id)).collect();
                let _ = reply.send(records);
            }
            HostRequest::FocusWindow { id, reply } => {
                let result = match self.windows.get(&id.0) {
                    Some(window) => {
                        window.focus_window();
                        Ok(())
                    }
                    None => Err(WindowHostError::NotFound(id)),
                };
                let _ = reply.send(result);
            }
            HostRequest::RemoveWindow { id, reply } => {
                let result = match self.windows.remove(&id.0) {
                    Some(window) => {
                        drop(window);
                        let _ = self.event_tx.send(AppEvent::WindowRemoved { id });
                        Ok(())
                    }
                    None => Err(WindowHostError::NotFound(id)),
                };
                let _ = reply.send(result);
            }
            HostRequest::NotifyView { id, message, reply } => {
                let result = match self.windows.get(&id.0) {
                    Some(window) => {
                        let ViewMessage::AlarmTriggered { duration } = message;
                        debug!(window = %id, duration, "alarm indicator requested");
                        window.request_user_attention(Some(UserAttentionType::Critical));
                        Ok(())
                    }
                    None => Err(WindowHostError::NotFound(id)),
                };
                let _ = reply.send(result);
            }
            HostRequest::QueryDisplays { reply } => {
                let primary = event_loop.primary_monitor();
                let displays = event_loop
                    .available_monitors()
                    .map(|monitor| {
                        let position = monitor.position();
                        let size = monitor.size();
                        DisplayInfo {
                            bounds: DisplayBounds {
                                left: position.x,
                                top: position.y,
                                width: size.width,
                                height: size.height,
                            },
                            is_primary: primary.as_ref() == Some(&monitor),
                        }
                    })
                    .collect();
                let _ = reply.send(displays);
            }
            HostRequest::RefreshClockFace => {
                if let Some(ref mut tray) = self.tray_manager {
                    tray.refresh_clock_face();
                }
            }
            HostRequest::Quit => {
                info!("Quit requested, exiting");
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        if self.tray_manager.is_none() {
            match TrayManager::new(self.event_tx.clone(), self.settings.clone()) {
                Ok(tray) => {
                    self.tray_manager = Some(tray);
                    info!("Tray manager initialized");
                }
                Err(e) => {
                    error!("Failed to initialize tray manager: {}", e);
                }
            }
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if let WindowEvent::CloseRequested | WindowEvent::Destroyed = event {
            if let Some(id) = self.host_id_for(window_id) {
                self.windows.remove(&id);
                let _ = self
                    .event_tx
                    .send(AppEvent::WindowRemoved { id: WindowId(id) });
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        while let Ok(request) = self.request_rx.try_recv() {
            self.handle_request(request, event_loop);
        }
    }
}

/// Run the scheduling core: wire the hosts together and dispatch events
async fn run_async(
    config: Config,
    settings: SettingsStore,
    event_tx: EventSender,
    mut event_rx: mpsc::UnboundedReceiver<AppEvent>,
    commands: CommandHandle,
    mut command_rx: mpsc::UnboundedReceiver<CommandRequest>,
    main: MainThreadHandle,
) {
    let timers: Arc<dyn TimerService> = Arc::new(TokioTimerService::new(event_tx.clone()));
    let window_host: Arc<dyn WindowHost> = Arc::new(WinitWindowHost { main: main.clone() });
    let display_host: Arc<dyn DisplayHost> = Arc::new(WinitDisplayHost { main: main.clone() });

    let sounds_dir = config.audio.sounds_dir().unwrap_or_else(|e| {
        warn!("failed to resolve sounds directory: {:#}", e);
        PathBuf::from("sounds")
    });
    let audio_host: Arc<dyn AudioHost> =
        Arc::new(RodioAudioHost::new(event_tx.clone(), sounds_dir));
    let audio = Arc::new(AudioSurfaceManager::new(
        audio_host,
        Duration::from_millis(config.audio.ready_timeout_ms),
    ));

    let registry = Arc::new(WindowRegistry::new(
        Arc::clone(&window_host),
        display_host,
        settings.clone(),
    ));
    let orchestrator = Arc::new(AlarmOrchestrator::new(
        timers,
        Arc::clone(&registry),
        window_host,
        Arc::clone(&audio),
        settings,
    ));

    orchestrator.schedule_icon_refresh().await;
    orchestrator.rearm_persisted_alarms().await;

    // Initial icon draw, shortly after startup
    {
        let main = main.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            main.send(HostRequest::RefreshClockFace);
        });
    }

    let mut commands_open = true;
    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                handle_event(event, &orchestrator, &registry, &audio, &commands, &main);
            }
            request = command_rx.recv(), if commands_open => {
                match request {
                    Some((command, ack_tx)) => {
                        let orchestrator = Arc::clone(&orchestrator);
                        tokio::spawn(async move {
                            let ack = orchestrator.handle_command(command).await;
                            let _ = ack_tx.send(ack);
                        });
                    }
                    None => commands_open = false,
                }
            }
        }
    }
}

/// Route one application event. Alarm handlers are spawned so concurrent
/// fires interleave instead of queueing behind each other.
fn handle_event(
    event: AppEvent,
    orchestrator: &Arc<AlarmOrchestrator>,
    registry: &Arc<WindowRegistry>,
    audio: &Arc<AudioSurfaceManager>,
    commands: &CommandHandle,
    main: &MainThreadHandle,
) {
    match event {
        AppEvent::TimerFired { name } => {
            if name == UPDATE_ICON_TIMER {
                main.send(HostRequest::RefreshClockFace);
            } else {
                let orchestrator = Arc::clone(orchestrator);
                tokio::spawn(async move {
                    orchestrator.handle_timer_fired(&name).await;
                });
            }
        }
        AppEvent::WindowRemoved { id } => {
            registry.handle_removed(id);
        }
        AppEvent::AudioSurfaceReady => {
            audio.on_surface_ready();
        }
        AppEvent::TrayAction(action) => match action {
            TrayAction::ToggleClockWindow => {
                let registry = Arc::clone(registry);
                tokio::spawn(async move {
                    registry.toggle().await;
                });
            }
            TrayAction::QuickAlarm => {
                let commands = commands.clone();
                tokio::spawn(async move {
                    let when = Local::now() + chrono::Duration::minutes(5);
                    let command = Command::SetAlarm {
                        alarm_name: "alarm-1".to_string(),
                        when,
                    };
                    if let Some(ack) = commands.submit(command).await {
                        info!(status = %ack.status, %when, "quick alarm");
                    }
                });
            }
            TrayAction::StopAlarmSound => {
                let commands = commands.clone();
                tokio::spawn(async move {
                    let _ = commands.submit(Command::StopAlarmSound).await;
                });
            }
            TrayAction::Quit => {
                main.send(HostRequest::Quit);
            }
        },
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clocktray daemon");

    let config = Config::load()?;
    let settings = SettingsStore::at_default_location()?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let event_sender = EventSender::new(event_tx);
    let (command_handle, command_rx) = command_channel();

    let event_loop = EventLoop::new()?;
    let proxy = event_loop.create_proxy();
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let main_handle = MainThreadHandle::new(request_tx, proxy);

    // The scheduling core runs on its own runtime thread; winit must own
    // the main thread
    {
        let config = config.clone();
        let settings = settings.clone();
        let event_sender = event_sender.clone();
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("Failed to create tokio runtime");

            rt.block_on(run_async(
                config,
                settings,
                event_sender,
                event_rx,
                command_handle,
                command_rx,
                main_handle,
            ));
        });
    }

    let mut app = App::new(event_sender, settings, request_rx);
    event_loop.run_app(&mut app)?;

    Ok(())
}
