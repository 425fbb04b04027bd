//! Texture sources and sinks.
//!
//! The pipeline never touches the file system directly. It opens source
//! textures by `(material, tag)` through [`TextureSource`] and hands finished
//! outputs to a [`TextureSink`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use texpack_spec::TextureTag;

use crate::buffer::ImageBuffer;
use crate::error::TextureError;
use crate::png::{self, PngConfig};

/// Where source textures come from.
pub trait TextureSource: Send + Sync {
    /// The texture stored under `tag` for `material`, or `None` when the
    /// material has no such texture.
    fn open_source_texture(
        &self,
        material: &str,
        tag: &TextureTag,
    ) -> Result<Option<ImageBuffer>, TextureError>;

    fn source_exists(&self, material: &str, tag: &TextureTag) -> bool;

    /// Last modification time, when known.
    fn source_write_time(&self, material: &str, tag: &TextureTag) -> Option<SystemTime>;
}

/// Where finished textures go.
pub trait TextureSink {
    fn write_output_texture(
        &mut self,
        material: &str,
        tag: &TextureTag,
        image: &ImageBuffer,
    ) -> Result<(), TextureError>;

    fn output_write_time(&self, material: &str, tag: &TextureTag) -> Option<SystemTime>;
}

type Key = (String, TextureTag);

fn key(material: &str, tag: &TextureTag) -> Key {
    (material.to_string(), tag.clone())
}

#[derive(Debug, Clone)]
struct Stored {
    image: ImageBuffer,
    written: SystemTime,
}

/// In-memory source and sink.
#[derive(Debug, Clone, Default)]
pub struct MemoryTextureStore {
    sources: HashMap<Key, Stored>,
    outputs: HashMap<Key, Stored>,
}

impl MemoryTextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_source(&mut self, material: &str, tag: impl Into<TextureTag>, image: ImageBuffer) {
        self.insert_source_at(material, tag, image, SystemTime::now());
    }

    /// Insert with an explicit modification time.
    pub fn insert_source_at(
        &mut self,
        material: &str,
        tag: impl Into<TextureTag>,
        image: ImageBuffer,
        written: SystemTime,
    ) {
        self.sources
            .insert(key(material, &tag.into()), Stored { image, written });
    }

    pub fn with_source(mut self, material: &str, tag: impl Into<TextureTag>, image: ImageBuffer) -> Self {
        self.insert_source(material, tag, image);
        self
    }

    pub fn output(&self, material: &str, tag: impl Into<TextureTag>) -> Option<&ImageBuffer> {
        self.outputs.get(&key(material, &tag.into())).map(|s| &s.image)
    }

    /// Tags written for `material`, sorted.
    pub fn output_tags(&self, material: &str) -> Vec<TextureTag> {
        let mut tags: Vec<TextureTag> = self
            .outputs
            .keys()
            .filter(|(m, _)| m == material)
            .map(|(_, t)| t.clone())
            .collect();
        tags.sort();
        tags
    }

    pub fn set_output_time(&mut self, material: &str, tag: impl Into<TextureTag>, written: SystemTime) {
        if let Some(stored) = self.outputs.get_mut(&key(material, &tag.into())) {
            stored.written = written;
        }
    }
}

impl TextureSource for MemoryTextureStore {
    fn open_source_texture(
        &self,
        material: &str,
        tag: &TextureTag,
    ) -> Result<Option<ImageBuffer>, TextureError> {
        Ok(self.sources.get(&key(material, tag)).map(|s| s.image.clone()))
    }

    fn source_exists(&self, material: &str, tag: &TextureTag) -> bool {
        self.sources.contains_key(&key(material, tag))
    }

    fn source_write_time(&self, material: &str, tag: &TextureTag) -> Option<SystemTime> {
        self.sources.get(&key(material, tag)).map(|s| s.written)
    }
}

impl TextureSink for MemoryTextureStore {
    fn write_output_texture(
        &mut self,
        material: &str,
        tag: &TextureTag,
        image: &ImageBuffer,
    ) -> Result<(), TextureError> {
        self.outputs.insert(
            key(material, tag),
            Stored {
                image: image.clone(),
                written: SystemTime::now(),
            },
        );
        Ok(())
    }

    fn output_write_time(&self, material: &str, tag: &TextureTag) -> Option<SystemTime> {
        self.outputs.get(&key(material, tag)).map(|s| s.written)
    }
}

/// PNG files on disk.
///
/// Sources are read from `<source_root>/<material>/<tag>.png`; outputs are
/// written to `<output_root>/<material>_<tag>.png`.
#[derive(Debug, Clone)]
pub struct PngDirectory {
    source_root: PathBuf,
    output_root: PathBuf,
    config: PngConfig,
}

impl PngDirectory {
    pub fn new(source_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
            config: PngConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PngConfig) -> Self {
        self.config = config;
        self
    }

    pub fn source_path(&self, material: &str, tag: &TextureTag) -> PathBuf {
        self.source_root
            .join(material)
            .join(format!("{}.png", tag))
    }

    pub fn output_path(&self, material: &str, tag: &TextureTag) -> PathBuf {
        self.output_root.join(format!("{}_{}.png", material, tag))
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl TextureSource for PngDirectory {
    fn open_source_texture(
        &self,
        material: &str,
        tag: &TextureTag,
    ) -> Result<Option<ImageBuffer>, TextureError> {
        let path = self.source_path(material, tag);
        if !path.is_file() {
            return Ok(None);
        }
        let file = std::fs::File::open(&path)?;
        let image = png::read_image(std::io::BufReader::new(file))?;
        tracing::debug!(path = %path.display(), width = image.width, height = image.height, "read source texture");
        Ok(Some(image))
    }

    fn source_exists(&self, material: &str, tag: &TextureTag) -> bool {
        self.source_path(material, tag).is_file()
    }

    fn source_write_time(&self, material: &str, tag: &TextureTag) -> Option<SystemTime> {
        modified(&self.source_path(material, tag))
    }
}

impl TextureSink for PngDirectory {
    fn write_output_texture(
        &mut self,
        material: &str,
        tag: &TextureTag,
        image: &ImageBuffer,
    ) -> Result<(), TextureError> {
        let path = self.output_path(material, tag);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let (data, hash) = png::write_image_to_vec_with_hash(image, &self.config)?;
        std::fs::write(&path, &data)?;
        tracing::info!(path = %path.display(), %hash, "wrote output texture");
        Ok(())
    }

    fn output_write_time(&self, material: &str, tag: &TextureTag) -> Option<SystemTime> {
        modified(&self.output_path(material, tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelFormat;
    use pretty_assertions::assert_eq;

    fn pixel() -> ImageBuffer {
        ImageBuffer::filled(2, 2, PixelFormat::Rgb8, [1, 2, 3, 255])
    }

    #[test]
    fn memory_store_is_keyed_by_material_and_tag() {
        let store = MemoryTextureStore::new().with_source("brick", "Albedo", pixel());
        let albedo = TextureTag::new("albedo");
        assert!(store.source_exists("brick", &albedo));
        assert!(!store.source_exists("stone", &albedo));
        assert_eq!(store.open_source_texture("brick", &albedo).unwrap(), Some(pixel()));
        assert_eq!(store.open_source_texture("brick", &TextureTag::new("height")).unwrap(), None);
    }

    #[test]
    fn memory_sink_records_outputs() {
        let mut store = MemoryTextureStore::new();
        let tag = TextureTag::new("mask");
        assert!(store.output_write_time("brick", &tag).is_none());
        store.write_output_texture("brick", &tag, &pixel()).unwrap();
        assert_eq!(store.output("brick", "mask"), Some(&pixel()));
        assert_eq!(store.output_tags("brick"), vec![tag.clone()]);
        assert!(store.output_write_time("brick", &tag).is_some());
    }

    #[test]
    fn png_directory_layout() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let mut dir = PngDirectory::new(source.path(), output.path());
        let tag = TextureTag::new("albedo");

        assert_eq!(
            dir.source_path("brick", &tag),
            source.path().join("brick").join("albedo.png")
        );
        assert_eq!(dir.open_source_texture("brick", &tag).unwrap(), None);

        dir.write_output_texture("brick", &tag, &pixel()).unwrap();
        let written = output.path().join("brick_albedo.png");
        assert!(written.is_file());
        assert!(dir.output_write_time("brick", &tag).is_some());

        std::fs::create_dir_all(source.path().join("brick")).unwrap();
        std::fs::copy(&written, dir.source_path("brick", &tag)).unwrap();
        assert!(dir.source_exists("brick", &tag));
        assert_eq!(dir.open_source_texture("brick", &tag).unwrap(), Some(pixel()));
    }
}
