pub mod controller;
pub mod form;
pub mod headless;
pub mod rows;
pub mod stack_view;
pub mod toolkit;
