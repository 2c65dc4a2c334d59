//! Hardware abstraction traits
//!
//! The engine never touches a UART or a panel directly. Boards implement
//! these traits and hand them to [`Runner`](crate::runner::Runner).

pub mod display;
pub mod transport;

pub use display::DisplayDriver;
pub use transport::ByteSource;
