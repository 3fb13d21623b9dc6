use std::{
    fs,
    path::{Path, PathBuf},
};

use indicatif::{ProgressBar, ProgressStyle};
use nalgebra::Vector2;
use raymarch_lib::slice::{EncodedSlice, SliceFormat};

/// Files of `format` in `dir`, sorted by name
pub fn slice_files<P>(dir: P, format: SliceFormat) -> Result<Vec<PathBuf>, std::io::Error>
where
    P: AsRef<Path>,
{
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse::<SliceFormat>().ok())
            == Some(format);
        if matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read slice files, index of a slice is its position in `files`
pub fn read_slices(
    files: &[PathBuf],
    format: SliceFormat,
    pixel_spacing: Option<Vector2<f32>>,
) -> Result<Vec<EncodedSlice>, std::io::Error> {
    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("Reading slices {bar:40} {pos}/{len}")
            .progress_chars("##-"),
    );

    let tag = format_tag(format);
    let mut slices = Vec::with_capacity(files.len());
    for (index, path) in files.iter().enumerate() {
        let blob = fs::read(path)?;
        let mut slice = EncodedSlice::new(blob, tag, index as i32);
        if let Some(spacing) = pixel_spacing {
            slice = slice.with_pixel_spacing(spacing);
        }
        slices.push(slice);
        bar.inc(1);
    }
    bar.finish();

    Ok(slices)
}

fn format_tag(format: SliceFormat) -> &'static str {
    match format {
        SliceFormat::Raw => "raw",
        SliceFormat::Png => "png",
        SliceFormat::MetaImage => "mha",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn files_filtered_and_sorted() {
        let dir = std::env::temp_dir().join(format!("vol_render_files_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for name in ["b.raw", "a.raw", "c.png", "notes.txt"] {
            fs::write(dir.join(name), [1, 2, 3, 4]).unwrap();
        }

        let files = slice_files(&dir, SliceFormat::Raw).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, vec!["a.raw", "b.raw"]);

        let slices = read_slices(&files, SliceFormat::Raw, None).unwrap();
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[1].index, 1);
        assert_eq!(slices[1].format, "raw");
        assert_eq!(slices[0].blob, vec![1, 2, 3, 4]);

        fs::remove_dir_all(&dir).unwrap();
    }
}
