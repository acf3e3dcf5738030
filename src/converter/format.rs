use std::collections::HashMap;
use std::path::Path;

use lazy_static::lazy_static;
use strum::IntoEnumIterator as _;
use strum_macros::{Display, EnumIter};

lazy_static! {
    pub static ref FORMATS: HashMap<&'static str, ImageFormat> = {
        let mut map = HashMap::new();
        map.insert("png", ImageFormat::Png);
        map.insert("webp", ImageFormat::WebP);
        map.insert("jpg", ImageFormat::Jpeg);
        map.insert("jpeg", ImageFormat::Jpeg);
        map.insert("avif", ImageFormat::Avif);
        map.insert("gif", ImageFormat::Gif);
        map.insert("tif", ImageFormat::Tiff);
        map.insert("tiff", ImageFormat::Tiff);
        map.insert("bmp", ImageFormat::Bmp);
        map
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ImageFormat {
    Png,
    WebP,
    Jpeg,
    Avif,
    Gif,
    Tiff,
    Bmp,
}

impl ImageFormat {
    /// Accepts a bare extension (`"PNG"`), a dotted one (`".png"`) or a file name.
    pub fn from_extension(s: &str) -> Option<Self> {
        let ext = s.rsplit('.').next().unwrap_or(s);
        FORMATS.get(ext.to_ascii_lowercase().as_str()).copied()
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::WebP => "webp",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Avif => "avif",
            ImageFormat::Gif => "gif",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Bmp => "bmp",
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        Self::from_path(path) == Some(*self)
    }

    pub fn supported() -> String {
        ImageFormat::iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(ImageFormat::from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension(".WebP"), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_extension("photo.JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("psd"), None);
    }

    #[test]
    fn aliases_resolve_to_one_format() {
        assert!(ImageFormat::Jpeg.matches(&PathBuf::from("a.jpg")));
        assert!(ImageFormat::Jpeg.matches(&PathBuf::from("a.jpeg")));
        assert!(ImageFormat::Tiff.matches(&PathBuf::from("scan.TIF")));
        assert!(!ImageFormat::Png.matches(&PathBuf::from("png")));
        assert!(!ImageFormat::Png.matches(&PathBuf::from("a.png.bak")));
    }

    #[test]
    fn display_names_parse_back() {
        for format in ImageFormat::iter() {
            assert_eq!(ImageFormat::from_extension(&format.to_string()), Some(format));
            assert_eq!(ImageFormat::from_extension(format.extension()), Some(format));
        }
    }
}
