pub mod controls;
pub mod histogram_panel;
pub mod history_panel;
pub mod image_view;
