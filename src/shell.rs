//! # Shell Helpers
//!
//! Launches the Windows "Installed apps" control panel, where Python installations can be
//! checked or removed when a build fails for environment reasons.

use log::{info, warn};

pub const PYTHON_ORG_URL: &str = "https://www.python.org";

pub const ICO_CONVERTER_URLS: &[&str] = &[
    "https://convertico.com/",
    "https://cloudconvert.com/png-to-ico",
    "https://www.icoconverter.com/",
];

const INSTALLED_APPS_APPLET: &str = "appwiz.cpl";

/// Opens `appwiz.cpl` through the shell.
///
/// # Returns
/// * `true` - If the shell accepted the request.
/// * `false` - If the call failed or the platform has no such applet.
#[cfg(windows)]
pub fn open_installed_apps() -> bool {
    use windows::Win32::UI::Shell::ShellExecuteW;
    use windows::Win32::UI::WindowsAndMessaging::SW_SHOW;
    use windows::core::{HSTRING, PCWSTR};

    info!("Opening {INSTALLED_APPS_APPLET}");
    let result = unsafe {
        ShellExecuteW(
            None,
            &HSTRING::from("open"),
            &HSTRING::from(INSTALLED_APPS_APPLET),
            PCWSTR::null(),
            PCWSTR::null(),
            SW_SHOW,
        )
    };

    // ShellExecute returns an HINSTANCE > 32 on success.
    if result.0 as isize > 32 {
        return true;
    }
    warn!("ShellExecuteW({INSTALLED_APPS_APPLET}) returned {}", result.0 as isize);
    false
}

#[cfg(not(windows))]
pub fn open_installed_apps() -> bool {
    info!("Opening {INSTALLED_APPS_APPLET}");
    warn!("{INSTALLED_APPS_APPLET} is only available on Windows");
    false
}
