pub mod blend;
pub mod draw_list;
pub mod gpu_texture;
pub mod quad_renderer;
pub mod render_target;

pub use blend::BlendMode;
pub use draw_list::{DrawList, Quad};
pub use gpu_texture::GpuTexture;
pub use quad_renderer::{QuadRenderer, RenderError};
pub use render_target::RenderTarget;
