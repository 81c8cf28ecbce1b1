pub mod cdp;
pub mod surface;

pub use cdp::{CdpClient, LaunchOptions};
pub use surface::HeadlessSurface;
