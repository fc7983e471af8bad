//! Consumer Control usages (HID usage page 0x0C) used by media actions.

/// Common consumer control usage codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum ConsumerUsage {
    PlayPause = 0x00CD,
    NextTrack = 0x00B5,
    PrevTrack = 0x00B6,
    Stop = 0x00B7,
    Mute = 0x00E2,
    VolumeUp = 0x00E9,
    VolumeDown = 0x00EA,
    BrowserHome = 0x0223,
    BrowserBack = 0x0224,
    BrowserForward = 0x0225,
    BrowserRefresh = 0x0227,
    LaunchEmail = 0x018A,
    LaunchCalculator = 0x0192,
    LaunchFileBrowser = 0x0194,
    Sleep = 0x0032,
}

impl ConsumerUsage {
    #[must_use]
    pub const fn from_code(code: u16) -> Option<Self> {
        Some(match code {
            0x00CD => ConsumerUsage::PlayPause,
            0x00B5 => ConsumerUsage::NextTrack,
            0x00B6 => ConsumerUsage::PrevTrack,
            0x00B7 => ConsumerUsage::Stop,
            0x00E2 => ConsumerUsage::Mute,
            0x00E9 => ConsumerUsage::VolumeUp,
            0x00EA => ConsumerUsage::VolumeDown,
            0x0223 => ConsumerUsage::BrowserHome,
            0x0224 => ConsumerUsage::BrowserBack,
            0x0225 => ConsumerUsage::BrowserForward,
            0x0227 => ConsumerUsage::BrowserRefresh,
            0x018A => ConsumerUsage::LaunchEmail,
            0x0192 => ConsumerUsage::LaunchCalculator,
            0x0194 => ConsumerUsage::LaunchFileBrowser,
            0x0032 => ConsumerUsage::Sleep,
            _ => return None,
        })
    }

    /// Label shown by the host application.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ConsumerUsage::PlayPause => "Play/Pause",
            ConsumerUsage::NextTrack => "Next Track",
            ConsumerUsage::PrevTrack => "Previous Track",
            ConsumerUsage::Stop => "Stop",
            ConsumerUsage::Mute => "Mute",
            ConsumerUsage::VolumeUp => "Volume Up",
            ConsumerUsage::VolumeDown => "Volume Down",
            ConsumerUsage::BrowserHome => "Browser Home",
            ConsumerUsage::BrowserBack => "Browser Back",
            ConsumerUsage::BrowserForward => "Browser Forward",
            ConsumerUsage::BrowserRefresh => "Browser Refresh",
            ConsumerUsage::LaunchEmail => "Email",
            ConsumerUsage::LaunchCalculator => "Calculator",
            ConsumerUsage::LaunchFileBrowser => "File Browser",
            ConsumerUsage::Sleep => "Sleep",
        }
    }
}
