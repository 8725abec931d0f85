use crate::error::HostResult;
use crate::window_state::VK_F2_CODE;
use eyre::eyre;
use eyre::WrapErr;
use tracing::debug;

/// `DirectX::Colors::LightSteelBlue`
pub const LIGHT_STEEL_BLUE: [f32; 4] = [0.690_196_1, 0.768_627_5, 0.870_588_3, 1.0];

/// Window and device settings for a frame host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    pub caption: String,
    pub client_width: u32,
    pub client_height: u32,
    pub use_warp_device: bool,
    pub msaa_enabled: bool,
    /// Virtual-key code that flips 4x MSAA on and off.
    pub msaa_toggle_key: u16,
    pub clear_color: [f32; 4],
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            caption: "d3d App".into(),
            client_width: 800,
            client_height: 600,
            use_warp_device: false,
            msaa_enabled: false,
            msaa_toggle_key: VK_F2_CODE,
            clear_color: LIGHT_STEEL_BLUE,
        }
    }
}

impl HostConfig {
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = caption.into();
        self
    }

    /// Defaults, overridden by the process arguments.
    pub fn from_env_args(caption: &str) -> HostResult<Self> {
        Self::default()
            .with_caption(caption)
            .apply_args(std::env::args().skip(1))
    }

    /// Recognises `-warp` / `/warp`, `-msaa` / `/msaa`, `--width N` and `--height N`.
    pub fn apply_args<I, A>(mut self, args: I) -> HostResult<Self>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<str>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            if arg.eq_ignore_ascii_case("-warp") || arg.eq_ignore_ascii_case("/warp") {
                self.use_warp_device = true;
            } else if arg.eq_ignore_ascii_case("-msaa") || arg.eq_ignore_ascii_case("/msaa") {
                self.msaa_enabled = true;
            } else if arg == "--width" {
                self.client_width = parse_dimension("--width", args.next())?;
            } else if arg == "--height" {
                self.client_height = parse_dimension("--height", args.next())?;
            } else {
                debug!(arg, "ignoring unrecognised argument");
            }
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> HostResult<()> {
        if self.client_width == 0 || self.client_height == 0 {
            return Err(eyre!(
                "client area must not be empty, got {}x{}",
                self.client_width,
                self.client_height
            ).into());
        }
        Ok(())
    }

    pub fn window_title(&self) -> String {
        if self.use_warp_device {
            format!("{} (WARP)", self.caption)
        } else {
            self.caption.clone()
        }
    }
}

fn parse_dimension(flag: &str, value: Option<impl AsRef<str>>) -> HostResult<u32> {
    let Some(value) = value else {
        return Err(eyre!("{flag} needs a value").into());
    };
    let value = value.as_ref();
    Ok(value
        .parse::<u32>()
        .wrap_err_with(|| format!("{flag} expects a pixel count, got {value:?}"))?)
}
