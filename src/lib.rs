pub mod record;
pub mod normalize;
pub mod context;
pub mod transport;
pub mod axiom;
pub mod noop;
pub mod sink;
pub mod layer;
pub mod settings;
pub mod init;
pub mod bridge;
