use std::env;

/// Environment variable set by the login manager to name the session type.
pub const SESSION_TYPE_ENV: &str = "XDG_SESSION_TYPE";

/// Display server protocol family of the current desktop session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SessionKind {
    #[strum(serialize = "X11")]
    X11,
    #[strum(serialize = "Wayland")]
    Wayland,
}

impl SessionKind {
    /// Classifies a session type signal.
    ///
    /// Only `wayland` (case-insensitive) selects Wayland. An absent or
    /// unrecognized value falls back to X11.
    pub fn from_signal(signal: Option<&str>) -> Self {
        match signal {
            Some(v) if v.trim().eq_ignore_ascii_case("wayland") => Self::Wayland,
            _ => Self::X11,
        }
    }
}

/// Reads the session type from the environment.
///
/// This is evaluated on every call; the result is never cached.
pub fn detect_session() -> SessionKind {
    let signal = env::var(SESSION_TYPE_ENV).ok();
    let kind = SessionKind::from_signal(signal.as_deref());
    log::debug!("{SESSION_TYPE_ENV}={signal:?} -> {kind}");
    kind
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_signal() {
        assert_eq!(SessionKind::from_signal(Some("wayland")), SessionKind::Wayland);
        assert_eq!(SessionKind::from_signal(Some("Wayland ")), SessionKind::Wayland);
        assert_eq!(SessionKind::from_signal(Some("x11")), SessionKind::X11);
        assert_eq!(SessionKind::from_signal(Some("tty")), SessionKind::X11);
        assert_eq!(SessionKind::from_signal(Some("")), SessionKind::X11);
        assert_eq!(SessionKind::from_signal(None), SessionKind::X11);
    }

    #[test]
    fn test_detect_session_rereads_env() {
        let saved = env::var(SESSION_TYPE_ENV).ok();

        // SAFETY: the only test in this binary touching the environment
        unsafe { env::set_var(SESSION_TYPE_ENV, "wayland") };
        assert_eq!(detect_session(), SessionKind::Wayland);

        unsafe { env::set_var(SESSION_TYPE_ENV, "x11") };
        assert_eq!(detect_session(), SessionKind::X11);

        unsafe { env::remove_var(SESSION_TYPE_ENV) };
        assert_eq!(detect_session(), SessionKind::X11);

        if let Some(v) = saved {
            unsafe { env::set_var(SESSION_TYPE_ENV, v) };
        }
    }
}
