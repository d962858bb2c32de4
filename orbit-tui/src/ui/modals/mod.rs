// Modal rendering modules
mod utils;
mod detail;
mod dialogs;
mod help;

// Re-export all public functions
pub use detail::*;
pub use dialogs::*;
pub use help::*;
