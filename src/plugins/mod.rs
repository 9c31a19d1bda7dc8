pub mod traits;
pub mod notifiers;

pub use traits::NotifierPlugin;
