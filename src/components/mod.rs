pub mod file_list;
pub mod preview;
pub mod status_bar;
