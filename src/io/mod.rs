mod buf;
mod buf_mut;

pub use buf::{NzBufExt, WireNative};
pub use buf_mut::NzBufMutExt;
