//! The main window and its window procedure. Windows only.

pub mod main_window;
pub mod window_class;

pub use main_window::report_fatal;
pub use main_window::MainWindow;
