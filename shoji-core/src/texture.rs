use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gpu_utils::Gpu;
use image::RgbaImage;
use log::{error, trace};
use parking_lot::Mutex;
use renderer::GpuTexture;

type LoadCallback = Box<dyn FnOnce() + Send>;

/// Pipeline stages of a texture:
///
/// 1. created empty (URL downloads) or with compressed bytes,
/// 2. decompressed on the worker thread into RGBA pixels,
/// 3. finalized on the main thread (GPU upload + load callbacks).
///
/// The decompressed/loaded flags are written by the worker and read by the
/// main thread, so they are atomics; everything else sits behind the mutex.
pub struct Texture {
    key: String,
    decompressed: AtomicBool,
    loaded: AtomicBool,
    state: Mutex<TextureState>,
}

#[derive(Default)]
struct TextureState {
    data: Option<Arc<Vec<u8>>>,
    dimensions: Option<(u32, u32)>,
    image: Option<RgbaImage>,
    gpu: Option<Arc<GpuTexture>>,
    load_callbacks: Vec<LoadCallback>,
}

impl Texture {
    /// A texture whose bytes will arrive later (URL downloads).
    pub(crate) fn pending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            decompressed: AtomicBool::new(false),
            loaded: AtomicBool::new(false),
            state: Mutex::new(TextureState::default()),
        }
    }

    /// A texture created directly from compressed bytes.
    pub(crate) fn with_data(key: impl Into<String>, data: Arc<Vec<u8>>) -> Self {
        let texture = Self::pending(key);
        texture.set_data(data);
        texture
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn has_data(&self) -> bool {
        self.state.lock().data.is_some()
    }

    pub fn is_decompressed(&self) -> bool {
        self.decompressed.load(Ordering::Acquire)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Pixel dimensions, known as soon as the compressed header has been
    /// peeked (before full decompression).
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.state.lock().dimensions
    }

    pub fn width(&self) -> f64 {
        self.dimensions().map_or(0.0, |(w, _)| w as f64)
    }

    pub fn height(&self) -> f64 {
        self.dimensions().map_or(0.0, |(_, h)| h as f64)
    }

    pub fn gpu_texture(&self) -> Option<Arc<GpuTexture>> {
        self.state.lock().gpu.clone()
    }

    /// Stores compressed bytes and peeks their header for dimensions.
    pub(crate) fn set_data(&self, data: Arc<Vec<u8>>) {
        let dimensions = image::ImageReader::new(Cursor::new(data.as_slice()))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.into_dimensions().ok());
        if dimensions.is_none() {
            trace!("texture {}: could not peek dimensions", self.key);
        }

        let mut state = self.state.lock();
        state.dimensions = dimensions;
        state.data = Some(data);
    }

    /// Decodes the compressed bytes into RGBA pixels. Runs on the worker
    /// thread; the lock is not held across the decode.
    pub(crate) fn decompress(&self) {
        let data = self.state.lock().data.clone();
        let Some(data) = data else {
            return;
        };

        match image::load_from_memory(&data) {
            Ok(decoded) => {
                let rgba = decoded.into_rgba8();
                let mut state = self.state.lock();
                state.dimensions = Some(rgba.dimensions());
                state.image = Some(rgba);
                drop(state);
                self.decompressed.store(true, Ordering::Release);
            }
            Err(err) => {
                error!("failed to decode texture {}: {err}", self.key);
            }
        }
    }

    /// Uploads the decoded pixels and fires load callbacks. Main thread
    /// only. Without a GPU (headless) the texture still becomes loaded so
    /// callers observe the same state transitions.
    pub(crate) fn finalize(&self, gpu: Option<&Gpu>) {
        if self.is_loaded() || !self.is_decompressed() {
            return;
        }

        let callbacks = {
            let mut state = self.state.lock();
            let Some(image) = state.image.take() else {
                return;
            };
            let (width, height) = image.dimensions();
            if let Some(gpu) = gpu {
                state.gpu = Some(Arc::new(GpuTexture::from_rgba(
                    gpu,
                    image.as_raw(),
                    width,
                    height,
                )));
            } else {
                state.image = Some(image);
            }
            self.loaded.store(true, Ordering::Release);
            std::mem::take(&mut state.load_callbacks)
        };

        for callback in callbacks {
            callback();
        }
    }
}

/// A cloneable handle onto a shared texture. All handles for one cache key
/// alias the same underlying `Texture`.
#[derive(Clone)]
pub struct TextureHandle {
    texture: Arc<Texture>,
}

impl TextureHandle {
    pub(crate) fn new(texture: Arc<Texture>) -> Self {
        Self { texture }
    }

    /// Another handle onto the same texture.
    pub fn new_handle(&self) -> TextureHandle {
        self.clone()
    }

    pub fn texture(&self) -> &Arc<Texture> {
        &self.texture
    }

    pub fn is_loaded(&self) -> bool {
        self.texture.is_loaded()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.texture.dimensions()
    }

    pub fn gpu_texture(&self) -> Option<Arc<GpuTexture>> {
        self.texture.gpu_texture()
    }

    /// Runs `callback` once the texture finishes loading, immediately if it
    /// already has.
    pub fn on_load(&self, callback: impl FnOnce() + Send + 'static) {
        if self.texture.is_loaded() {
            callback();
            return;
        }
        let mut state = self.texture.state.lock();
        // Re-check under the lock so a finalize racing with us cannot strand
        // the callback.
        if self.texture.is_loaded() {
            drop(state);
            callback();
        } else {
            state.load_callbacks.push(Box::new(callback));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn png_bytes(width: u32, height: u32) -> Arc<Vec<u8>> {
        let image = RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("png encoding should succeed");
        Arc::new(bytes)
    }

    #[test]
    fn test_dimensions_known_before_decompression() {
        let texture = Texture::with_data("memory: test", png_bytes(3, 5));
        assert!(!texture.is_decompressed());
        assert_eq!(texture.dimensions(), Some((3, 5)));
    }

    #[test]
    fn test_decompress_then_finalize_headless() {
        let texture = Texture::with_data("memory: test", png_bytes(2, 2));
        texture.decompress();
        assert!(texture.is_decompressed());
        assert!(!texture.is_loaded());

        texture.finalize(None);
        assert!(texture.is_loaded());
    }

    #[test]
    fn test_finalize_before_decompression_is_noop() {
        let texture = Texture::with_data("memory: test", png_bytes(2, 2));
        texture.finalize(None);
        assert!(!texture.is_loaded());
    }

    #[test]
    fn test_invalid_data_never_decompresses() {
        let texture = Texture::with_data("memory: test", Arc::new(vec![1, 2, 3, 4]));
        texture.decompress();
        assert!(!texture.is_decompressed());
        texture.finalize(None);
        assert!(!texture.is_loaded());
    }

    #[test]
    fn test_load_callbacks() {
        let texture = Arc::new(Texture::with_data("memory: test", png_bytes(2, 2)));
        let handle = TextureHandle::new(Arc::clone(&texture));
        let calls = Arc::new(AtomicUsize::new(0));

        {
            let calls = Arc::clone(&calls);
            handle.on_load(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        texture.decompress();
        texture.finalize(None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Registered after load: runs immediately.
        {
            let calls = Arc::clone(&calls);
            handle.on_load(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_gpu_upload_on_finalize() {
        let gpu = pollster::block_on(Gpu::noop_for_tests());
        let texture = Texture::with_data("memory: test", png_bytes(4, 4));
        texture.decompress();
        texture.finalize(Some(&gpu));
        assert!(texture.is_loaded());
        let uploaded = texture.gpu_texture().expect("gpu texture should exist");
        assert_eq!(uploaded.width(), 4);
        assert_eq!(uploaded.height(), 4);
    }
}
