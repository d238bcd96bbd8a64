use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, TimeZone};
use color_eyre::Result;
use image::{ImageFormat, RgbaImage};
use log::info;

use crate::PipelineError;

pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// `content_<YYYYMMDD_HHMMSS>.png`
pub fn output_file_name<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("content_{}.png", time.format("%Y%m%d_%H%M%S"))
}

/// Writes `image` as PNG into `dir`, creating the directory if needed. The
/// file is flushed and closed when this returns.
pub fn save_png<Tz: TimeZone>(image: &RgbaImage, dir: &Path, time: &DateTime<Tz>) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    fs::create_dir_all(dir).map_err(PipelineError::io(dir))?;
    let path = dir.join(output_file_name(time));

    let file = File::create(&path).map_err(PipelineError::io(&path))?;
    let mut writer = BufWriter::new(file);
    image
        .write_to(&mut writer, ImageFormat::Png)
        .map_err(|e| PipelineError::Render(format!("couldn't encode PNG: {e}")))?;
    writer.flush().map_err(PipelineError::io(&path))?;

    info!("Saved composed image to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use chrono::{Local, Utc};
    use image::Rgba;

    use super::*;

    fn matches_name_pattern(name: &str) -> bool {
        let Some(stamp) = name
            .strip_prefix("content_")
            .and_then(|rest| rest.strip_suffix(".png"))
        else {
            return false;
        };
        let Some((date, time)) = stamp.split_once('_') else {
            return false;
        };
        date.len() == 8
            && time.len() == 6
            && date.chars().chain(time.chars()).all(|c| c.is_ascii_digit())
    }

    #[test]
    fn file_name_embeds_timestamp() {
        let time = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(output_file_name(&time), "content_20240309_070501.png");
    }

    #[test]
    fn file_name_pattern_holds_for_now() {
        let name = output_file_name(&Local::now());
        assert!(matches_name_pattern(&name), "{name}");
        assert!(!matches_name_pattern("content_2024_070501.png"));
    }

    #[test]
    fn save_creates_directory_and_png() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("output");
        let image = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));

        let path = save_png(&image, &dir, &Local::now()).unwrap();

        assert!(path.starts_with(&dir));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(matches_name_pattern(name));

        let reloaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(reloaded, image);
    }

    #[test]
    fn unwritable_directory_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("not_a_dir");
        fs::write(&blocker, b"file").unwrap();

        let image = RgbaImage::new(1, 1);
        let err = save_png(&image, &blocker, &Local::now()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Io { .. })
        ));
    }
}
