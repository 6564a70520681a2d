pub mod commit;
pub mod page_model;
pub mod surface;
