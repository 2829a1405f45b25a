//! Background image behind the water.
//!
//! The host owns the reference (`BackgroundImage`); this module turns it into
//! a texture and makes sure there is never more than one live background
//! texture. Decode failures leave the compositor on its flat tint.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bevy::image::{CompressedImageFormats, ImageSampler, ImageType};
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

use crate::error::SurfaceError;
use crate::plugins::core::{SurfaceSet, WaterPhase};

/// Opaque background reference handed over by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundSource {
    /// `data:image/png;base64,...`
    DataUri(String),
    /// Encoded image bytes; `extension` picks the decoder ("png", "jpg"...).
    Encoded { bytes: Vec<u8>, extension: String },
    /// Raw sRGB RGBA8 pixels, row-major, top row first.
    Rgba { width: u32, height: u32, pixels: Vec<u8> },
}

/// Current background reference. Every `set`/`clear` bumps the generation,
/// which is what the loader watches.
#[derive(Resource, Debug, Clone, Default)]
pub struct BackgroundImage {
    source: Option<BackgroundSource>,
    generation: u64,
}

impl BackgroundImage {
    pub fn set(&mut self, source: BackgroundSource) {
        self.source = Some(source);
        self.generation += 1;
    }

    pub fn clear(&mut self) {
        self.source = None;
        self.generation += 1;
    }

    pub fn source(&self) -> Option<&BackgroundSource> {
        self.source.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Somewhere textures can be created and destroyed. `Assets<Image>` in the
/// app.
pub trait TextureStore {
    fn insert(&mut self, image: Image) -> Handle<Image>;
    fn release(&mut self, handle: &Handle<Image>);
}

impl TextureStore for Assets<Image> {
    fn insert(&mut self, image: Image) -> Handle<Image> {
        self.add(image)
    }

    fn release(&mut self, handle: &Handle<Image>) {
        self.remove(handle.id());
    }
}

/// Splits a base64 data URI into its MIME type and payload.
pub fn parse_data_uri(uri: &str) -> Result<(String, Vec<u8>), SurfaceError> {
    let rest = uri.trim().strip_prefix("data:").ok_or(SurfaceError::MalformedDataUri)?;
    let (meta, payload) = rest.split_once(',').ok_or(SurfaceError::MalformedDataUri)?;
    let mime = meta.strip_suffix(";base64").ok_or(SurfaceError::MalformedDataUri)?;
    if mime.is_empty() {
        return Err(SurfaceError::MalformedDataUri);
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| SurfaceError::MalformedDataUri)?;
    Ok((mime.to_string(), bytes))
}

/// Decodes a background reference into an image.
pub fn decode_background(source: &BackgroundSource) -> Result<Image, SurfaceError> {
    match source {
        BackgroundSource::DataUri(uri) => {
            let (mime, bytes) = parse_data_uri(uri)?;
            decode_encoded(&bytes, ImageType::MimeType(mime.as_str()))
        }
        BackgroundSource::Encoded { bytes, extension } => {
            decode_encoded(bytes, ImageType::Extension(extension.as_str()))
        }
        BackgroundSource::Rgba { width, height, pixels } => {
            let expected = (*width as usize)
                .checked_mul(*height as usize)
                .and_then(|n| n.checked_mul(4));
            if *width == 0 || *height == 0 || expected != Some(pixels.len()) {
                return Err(SurfaceError::ImageDecode(format!(
                    "{} bytes do not describe a {}x{} RGBA image",
                    pixels.len(),
                    width,
                    height
                )));
            }
            Ok(Image::new(
                Extent3d {
                    width: *width,
                    height: *height,
                    depth_or_array_layers: 1,
                },
                TextureDimension::D2,
                pixels.clone(),
                TextureFormat::Rgba8UnormSrgb,
                RenderAssetUsages::RENDER_WORLD,
            ))
        }
    }
}

fn decode_encoded(bytes: &[u8], image_type: ImageType) -> Result<Image, SurfaceError> {
    Image::from_buffer(
        bytes,
        image_type,
        CompressedImageFormats::NONE,
        true,
        ImageSampler::linear(),
        RenderAssetUsages::RENDER_WORLD,
    )
    .map_err(|e| SurfaceError::ImageDecode(e.to_string()))
}

/// Owns the background texture. Replacing or clearing the reference
/// releases the old texture before anything new is created.
#[derive(Resource, Debug, Default)]
pub struct BackgroundTextureLoader {
    handle: Option<Handle<Image>>,
    /// Generation of the reference last synced, `None` before the first sync.
    generation: Option<u64>,
    allocated: u64,
    released: u64,
}

impl BackgroundTextureLoader {
    pub fn handle(&self) -> Option<&Handle<Image>> {
        self.handle.as_ref()
    }

    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    pub fn released(&self) -> u64 {
        self.released
    }

    /// Textures created and not yet released. Never above 1.
    pub fn live(&self) -> u64 {
        self.allocated - self.released
    }

    /// Brings the texture in line with the reference. Does nothing if the
    /// reference has not changed since the last call.
    pub fn sync(
        &mut self,
        background: &BackgroundImage,
        store: &mut impl TextureStore,
    ) -> Result<(), SurfaceError> {
        if self.generation == Some(background.generation()) {
            return Ok(());
        }
        self.generation = Some(background.generation());
        self.dispose(store);

        let Some(source) = background.source() else {
            return Ok(());
        };
        let image = decode_background(source)?;
        self.handle = Some(store.insert(image));
        self.allocated += 1;
        Ok(())
    }

    /// Releases the texture and forgets the synced generation, so the next
    /// `sync` reloads whatever reference is current.
    pub fn release(&mut self, store: &mut impl TextureStore) {
        self.dispose(store);
        self.generation = None;
    }

    fn dispose(&mut self, store: &mut impl TextureStore) {
        if let Some(handle) = self.handle.take() {
            store.release(&handle);
            self.released += 1;
        }
    }
}

pub struct BackgroundPlugin;

impl Plugin for BackgroundPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BackgroundImage>()
            .init_resource::<BackgroundTextureLoader>()
            .add_systems(OnEnter(WaterPhase::Off), release_background_texture)
            .add_systems(Update, sync_background_texture.in_set(SurfaceSet::Render));
    }
}

pub fn sync_background_texture(
    background: Res<BackgroundImage>,
    mut loader: ResMut<BackgroundTextureLoader>,
    mut images: ResMut<Assets<Image>>,
) {
    if let Err(e) = loader.sync(&background, &mut *images) {
        warn!("Background unavailable, using flat tint: {}", e);
    }
}

fn release_background_texture(
    mut loader: ResMut<BackgroundTextureLoader>,
    mut images: ResMut<Assets<Image>>,
) {
    if loader.handle().is_some() {
        info!("Releasing background texture");
    }
    loader.release(&mut *images);
}
