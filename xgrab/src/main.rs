//! Grabs the X11 root window into `captura.ppm` and converts it to
//! `captura.png`.

mod convert;
mod ppm;

use anyhow::Result;
use screen_grab::{CommandRunner, PixelBuffer, SystemRunner};
use std::{
    io::Write,
    path::{Path, PathBuf},
    process::ExitCode,
};

const PPM_FILE: &str = "captura.ppm";
const PNG_FILE: &str = "captura.png";

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "[{style}{}{style:#}] {}",
                record.level(),
                record.args()
            )
        })
        .init();
}

fn main() -> ExitCode {
    init_logger();

    let frame = match screen_grab::x11::grab_root_window() {
        Ok(frame) => frame,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match save(&SystemRunner, &frame, Path::new(".")) {
        Ok(png) => {
            log::info!("screenshot saved as {}", png.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn save(runner: &dyn CommandRunner, frame: &PixelBuffer, dir: &Path) -> Result<PathBuf> {
    let (ppm, png) = (dir.join(PPM_FILE), dir.join(PNG_FILE));

    ppm::write_ppm(&ppm, frame)?;
    log::info!("capture saved as {}", ppm.display());

    let converted = convert::ppm_to_png(runner, frame, &ppm, &png)?;
    log::debug!("converted with {converted:?}");
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use screen_grab::PixelFormat;

    struct NoTools;

    impl CommandRunner for NoTools {
        fn is_available(&self, _program: &str) -> bool {
            false
        }

        fn run(&self, program: &str, _args: &[String]) -> screen_grab::Result<()> {
            Err(screen_grab::Error::CommandNotFound(program.to_string()))
        }
    }

    #[test]
    fn test_save_leaves_only_png() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let frame = PixelBuffer::new(4, 4, PixelFormat::Rgb, vec![90; 4 * 4 * 3])?;

        let png = save(&NoTools, &frame, dir.path())?;
        assert_eq!(png, dir.path().join(PNG_FILE));
        assert!(png.exists());
        assert!(!dir.path().join(PPM_FILE).exists());
        Ok(())
    }

    #[test]
    fn test_unwritable_dir_fails() {
        let frame = PixelBuffer::new(1, 1, PixelFormat::Rgb, vec![0; 3]).unwrap();
        let missing = Path::new("/nonexistent/xgrab");
        assert!(save(&NoTools, &frame, missing).is_err());
    }
}
