use super::sample::Sample;
use crate::clock::Clock;
use crate::config::HostConfig;
use crate::d3d12::GraphicsContext;
use crate::error::exit_code_or_report;
use crate::error::HostResult;
use crate::frame_pacing::window_caption;
use crate::frame_pacing::FramePacer;
use crate::frame_pacing::FrameRate;
use crate::frame_pacing::FrameStep;
use crate::frame_pacing::PAUSED_SLEEP;
use crate::lifecycle::HostInstanceGuard;
use crate::lifecycle::HostPhase;
use crate::lifecycle::Lifecycle;
use crate::logging;
use crate::win32::report_fatal;
use crate::win32::MainWindow;
use crate::window_state::HostCommand;
use crate::window_state::MouseAction;
use crate::window_state::MouseEvent;
use crate::window_state::WindowState;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use windows::Win32::UI::WindowsAndMessaging::*;

/// Owns the window, the graphics context and the message loop for one sample.
pub struct FrameHost<S: Sample> {
    // Field order is drop order: the sample's GPU objects go before the device,
    // the device before the window.
    sample: S,
    context: GraphicsContext,
    window: MainWindow,
    window_state: WindowState,
    clock: Clock,
    pacer: FramePacer,
    lifecycle: Lifecycle,
    config: HostConfig,
    _instance: HostInstanceGuard,
}

impl<S: Sample> FrameHost<S> {
    /// Creates the window and device, sizes the swap chain, and lets the
    /// sample build its resources.
    pub fn initialize(config: HostConfig) -> HostResult<Self> {
        let instance = HostInstanceGuard::acquire()?;
        config.validate()?;
        let mut lifecycle = Lifecycle::new();

        let window = MainWindow::create(&config)?;
        let mut context = GraphicsContext::new(window.hwnd(), &config)?;

        let mut clock = Clock::new();
        let mut window_state = WindowState::new(
            config.client_width,
            config.client_height,
            config.msaa_toggle_key,
        );
        // Creating and showing the window already produced size and activation messages.
        for event in window.mailbox().drain() {
            window_state.apply(event, &mut clock);
        }
        window_state.set_device_ready(true);

        let (width, height) = window_state.client_size();
        context.resize(width, height)?;

        context.open_command_list()?;
        let mut sample = S::initialize(&mut context, &config)?;
        context.submit_and_flush()?;
        sample.on_resize(&context)?;

        lifecycle.advance(HostPhase::Initialized)?;
        info!(
            caption = %config.caption,
            width,
            height,
            warp = config.use_warp_device,
            msaa = context.msaa_enabled(),
            "frame host initialized"
        );

        Ok(Self {
            sample,
            context,
            window,
            window_state,
            clock,
            pacer: FramePacer::new(),
            lifecycle,
            config,
            _instance: instance,
        })
    }

    /// Pumps window messages and renders whenever the queue is empty.
    /// Returns the exit code carried by `WM_QUIT`.
    pub fn run(&mut self) -> HostResult<i32> {
        self.clock.reset();
        self.lifecycle.advance(HostPhase::Running)?;

        let mut message = MSG::default();
        let exit_code = loop {
            // If there are Window messages then process them.
            if unsafe { PeekMessageW(&mut message, None, 0, 0, PM_REMOVE) }.into() {
                if message.message == WM_QUIT {
                    break message.wParam.0 as i32;
                }
                unsafe {
                    _ = TranslateMessage(&message);
                    DispatchMessageW(&message);
                }
                self.handle_window_events()?;
                continue;
            }
            // Sent messages are delivered inside PeekMessageW, so check again.
            self.handle_window_events()?;

            // Otherwise, do animation/game stuff.
            match self.pacer.advance(&mut self.clock, self.window_state.is_paused()) {
                FrameStep::Idle => std::thread::sleep(PAUSED_SLEEP),
                FrameStep::Frame { rate, .. } => {
                    if let Some(rate) = rate {
                        self.show_frame_stats(rate)?;
                    }
                    self.sample.update(&self.context, &self.clock)?;
                    self.sample.draw(&mut self.context, &self.clock)?;
                }
            }
        };

        self.lifecycle.advance(HostPhase::Terminated)?;
        info!(exit_code, "message loop finished");
        Ok(exit_code)
    }

    pub fn phase(&self) -> HostPhase {
        self.lifecycle.phase()
    }

    fn handle_window_events(&mut self) -> HostResult<()> {
        let events = self.window.mailbox().drain();
        for event in events {
            let command = self.window_state.apply(event, &mut self.clock);
            self.lifecycle.set_paused(self.window_state.is_paused())?;
            match command {
                None => {}
                Some(HostCommand::Resize) => self.resize()?,
                Some(HostCommand::ToggleMsaa) => {
                    let enabled = !self.context.msaa_enabled();
                    self.context.set_msaa(enabled)?;
                    info!(enabled, "4x MSAA toggled");
                    self.resize()?;
                }
                Some(HostCommand::Quit) => unsafe { PostQuitMessage(0) },
                Some(HostCommand::Mouse(mouse)) => self.dispatch_mouse(mouse),
            }
        }
        Ok(())
    }

    fn resize(&mut self) -> HostResult<()> {
        let (width, height) = self.window_state.client_size();
        if width == 0 || height == 0 {
            debug!(width, height, "skipping resize to an empty client area");
            return Ok(());
        }
        self.context.resize(width, height)?;
        self.sample.on_resize(&self.context)
    }

    fn dispatch_mouse(&mut self, mouse: MouseEvent) {
        let MouseEvent {
            action,
            buttons,
            x,
            y,
        } = mouse;
        match action {
            MouseAction::Down => self.sample.on_mouse_down(&self.context, buttons, x, y),
            MouseAction::Up => self.sample.on_mouse_up(&self.context, buttons, x, y),
            MouseAction::Move => self.sample.on_mouse_move(&self.context, buttons, x, y),
        }
    }

    fn show_frame_stats(&self, rate: FrameRate) -> HostResult<()> {
        let caption = window_caption(&self.config.window_title(), rate);
        self.window.set_title(&caption)?;
        debug!(fps = rate.fps, mspf = rate.mspf, "frame stats");
        Ok(())
    }
}

impl<S: Sample> Drop for FrameHost<S> {
    fn drop(&mut self) {
        // Nothing may be released while the GPU could still be using it.
        if let Err(error) = self.context.flush_queue() {
            warn!(%error, "failed to flush the command queue on shutdown");
        }
    }
}

/// Sets up logging, reads the command line, then builds a [`FrameHost`] for
/// `S` and runs it to completion. Returns the process exit code.
///
/// A failure anywhere, including a bad argument, is reported in a message
/// box. The exit code is 0 in that case too.
pub fn run_sample<S: Sample>(caption: &str) -> i32 {
    let result = logging::init()
        .and_then(|()| HostConfig::from_env_args(caption))
        .and_then(FrameHost::<S>::initialize)
        .and_then(|mut host| host.run());
    exit_code_or_report(result, |report| {
        error!("{report:?}");
        report_fatal(&report.to_string());
    })
}
